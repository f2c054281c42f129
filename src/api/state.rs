//! Application state shared by every handler.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use super::metrics::recorder_handle;
use crate::infra::{AuthorStore, Database, HealthCheck};
use crate::services::{AuthorManager, AuthorService};

/// Services injected into the router.
#[derive(Clone)]
pub struct AppState {
    /// Author use cases
    pub author_service: Arc<dyn AuthorService>,
    /// Database liveness for `/health`
    pub health: Arc<dyn HealthCheck>,
    /// Rendered by `/metrics`
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Wire the production services over a verified database handle.
    pub fn from_database(database: Arc<Database>) -> Self {
        let repo = Arc::new(AuthorStore::new(database.get_connection()));
        Self {
            author_service: Arc::new(AuthorManager::new(repo)),
            health: database,
            metrics: recorder_handle(),
        }
    }

    /// Create state with manually injected services.
    pub fn new(author_service: Arc<dyn AuthorService>, health: Arc<dyn HealthCheck>) -> Self {
        Self {
            author_service,
            health,
            metrics: recorder_handle(),
        }
    }
}
