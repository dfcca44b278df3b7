//! Infrastructure layer: configuration, logging, the REST backend client and
//! the in-memory read-view cache.

pub mod backend_client;
pub mod config;
pub mod logging;
pub mod view_cache;

pub use backend_client::BackendClient;
pub use config::{AppConfig, ConfigManager};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use view_cache::ViewCache;
