pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod service;
pub mod utils;

use crate::service::config::RuntimeConfig;
use crate::service::service_runtime::{InitError, ServiceRuntime};
use std::sync::Arc;

pub use crate::domain::models::resolver_models::{ResolutionOutcome, ResolveError, ResolveErrorKind};
pub use crate::service::resolver::{PathResolver, PendingResolution};

pub fn initialize(config: RuntimeConfig) -> Result<Arc<ServiceRuntime>, InitError> {
    ServiceRuntime::initialize(config)
}

pub fn init_default() -> Result<Arc<ServiceRuntime>, InitError> {
    let config = RuntimeConfig::default();
    initialize(config)
}
