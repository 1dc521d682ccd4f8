//! Application state for the query console.

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::AppResult;
use common::middleware::{SharedAdminGate, SharedSecretGate};

use crate::dispatcher::{DataStoreConnector, QueryDispatcher, SqlxConnector};
use crate::pages::Pages;
use crate::registry::ConnectionRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Arc<QueryDispatcher>,
    pub pages: Arc<Pages>,
    pub gate: SharedAdminGate,
}

impl AppState {
    /// Loads the registry and wires the dispatcher to the sqlx connector.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        Self::with_connector(config, Arc::new(SqlxConnector::new())).await
    }

    /// Same as [`AppState::new`] with a caller-supplied connector.
    pub async fn with_connector(
        config: AppConfig,
        connector: Arc<dyn DataStoreConnector>,
    ) -> AppResult<Self> {
        let registry = Arc::new(ConnectionRegistry::load(config.connections_file.clone()).await);
        let dispatcher = Arc::new(QueryDispatcher::new(
            registry.clone(),
            connector,
            config.query_target.clone(),
        ));
        let gate: SharedAdminGate = Arc::new(SharedSecretGate::new(config.admin_password.clone()));

        Ok(Self {
            config: Arc::new(config),
            registry,
            dispatcher,
            pages: Arc::new(Pages::new()?),
            gate,
        })
    }
}
