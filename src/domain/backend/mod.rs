pub mod backend_api;
pub mod backend_endpoint;
pub mod http_backend;
