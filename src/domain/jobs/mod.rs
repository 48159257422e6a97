pub mod duration;
pub mod job;
pub mod job_store;
pub mod lifecycle;
