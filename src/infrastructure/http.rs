pub mod reqwest_backend;
