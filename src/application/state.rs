//! Application state shared by command handlers
//!
//! Owns the configuration, the range sync coordinator and the cached sales
//! view, wired so that a completed sync invalidates the matching view.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::RwLock;
use tracing::info;

use crate::application::range_sync::RangeSyncCoordinator;
use crate::application::sales_view::SalesViewService;
use crate::domain::sync_backend::{SalesReader, SyncBackend};
use crate::infrastructure::backend_client::BackendClient;
use crate::infrastructure::config::AppConfig;

pub struct AppState {
    /// Application configuration
    pub config: Arc<RwLock<AppConfig>>,

    pub coordinator: Arc<RangeSyncCoordinator>,

    pub sales_view: Arc<SalesViewService>,
}

impl AppState {
    /// Build state backed by the REST client described in `config.backend`
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let client = Arc::new(BackendClient::new(&config.backend).context("Failed to create backend client")?);
        info!(base_url = %client.base_url(), "Backend client ready");
        Ok(Self::with_backends(config, client.clone(), client))
    }

    /// Build state over arbitrary backend implementations
    pub fn with_backends(config: AppConfig, backend: Arc<dyn SyncBackend>, reader: Arc<dyn SalesReader>) -> Self {
        let sales_view = Arc::new(SalesViewService::new(reader, Duration::from_secs(config.cache.ttl_secs)));
        let coordinator = Arc::new(RangeSyncCoordinator::new(backend, sales_view.clone()));
        Self {
            config: Arc::new(RwLock::new(config)),
            coordinator,
            sales_view,
        }
    }

    pub async fn config_snapshot(&self) -> AppConfig {
        self.config.read().await.clone()
    }
}
