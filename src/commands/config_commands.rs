//! Configuration commands

use tracing::info;

use crate::application::state::AppState;
use crate::infrastructure::config::{AppConfig, ConfigManager};

/// Effective configuration with the API token masked
pub async fn get_app_config(app_state: &AppState) -> AppConfig {
    let mut config = app_state.config_snapshot().await;
    if config.backend.api_token.is_some() {
        config.backend.api_token = Some("********".to_string());
    }
    config
}

/// Write the default configuration file unless one already exists
pub async fn init_app_config(manager: &ConfigManager) -> Result<AppConfig, String> {
    let existed = manager.config_path().exists();
    let config = manager
        .initialize_on_first_run()
        .await
        .map_err(|e| format!("{e:#}"))?;
    if existed {
        info!("Configuration already present at {:?}", manager.config_path());
    }
    Ok(config)
}
