pub mod backend;
pub mod clock;
pub mod dashboard;
pub mod gpu;
pub mod graph;
pub mod jobs;
pub mod selection;
pub mod sync;
pub mod topology;
pub mod utils;
