//! Application state for the API server

use crate::config::Config;
use crate::registry::FileRegistry;
use crate::service::LocalConversionService;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clones) and provides
/// access to the conversion service, the registry behind it, and the
/// configuration.
#[derive(Clone)]
pub struct AppState {
    /// The in-process conversion service handling uploads
    pub service: Arc<LocalConversionService>,

    /// The registry the service stores artifacts in (for download/recent)
    pub registry: FileRegistry,

    /// Configuration (read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: Arc<LocalConversionService>, config: Arc<Config>) -> Self {
        let registry = service.registry().clone();
        Self {
            service,
            registry,
            config,
        }
    }
}
