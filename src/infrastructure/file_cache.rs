pub mod file_cache_backend;
