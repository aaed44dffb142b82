pub mod file_cache_traits;
pub mod http_traits;
pub mod message_traits;
