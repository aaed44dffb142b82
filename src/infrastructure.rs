pub mod file_cache;
pub mod http;
