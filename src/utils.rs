pub mod keyed_lock;
pub mod logging;
