pub mod connection;
pub mod gpu_node;
pub mod metrics;
pub mod node_record;
pub mod normalize;
pub mod sample;
pub mod server_node;
pub mod snapshot;
pub mod topology_store;
