pub mod gpu_dto;
pub mod job_dto;
pub mod serde_helpers;
pub mod topology_dto;
