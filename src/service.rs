pub mod config;
pub mod resolver;
pub mod service_runtime;
