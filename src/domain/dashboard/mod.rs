pub mod dashboard;
pub mod view;
