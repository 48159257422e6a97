pub mod self_identification;
