pub mod file_cache_models;
pub mod http_models;
pub mod resolver_models;
