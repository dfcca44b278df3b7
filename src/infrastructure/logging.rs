//! Logging system configuration and initialization
//!
//! - Console and/or file output
//! - Plain or JSON formatting for the file layer
//! - Timestamps in marketplace local time (configurable UTC offset)
//! - Previous log file rotated on startup, old files cleaned up
//! - `RUST_LOG` overrides the configured filter

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::{FixedOffset, Offset, Utc};
use lazy_static::lazy_static;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

const LOG_FILE_NAME: &str = "seller-sync.log";

// Keeps the non-blocking file writer alive for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

/// Formats event timestamps at a fixed UTC offset
struct MarketplaceTimeFormatter {
    offset: FixedOffset,
}

impl MarketplaceTimeFormatter {
    fn new(utc_offset_hours: i32) -> Self {
        Self {
            offset: fixed_offset(utc_offset_hours),
        }
    }
}

impl FormatTime for MarketplaceTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let local = Utc::now().with_timezone(&self.offset);
        write!(w, "{}", local.format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

fn fixed_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours.clamp(-23, 23) * 3600).unwrap_or(Utc.fix())
}

/// Log directory under the user's local data directory
pub fn get_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("seller-sync"))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Build the filter: `RUST_LOG` if set, otherwise the configured level with
/// noisy dependencies quieted unless tracing.
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = config.level.to_lowercase();
    let mut directives = vec![level.clone()];
    if level != "trace" {
        directives.extend(
            ["reqwest=info", "hyper=warn", "hyper_util=warn", "h2=warn", "tokio=info", "runtime=warn"]
                .map(String::from),
        );
    }
    directives.push(format!("seller_sync_lib={}", level));
    directives.push(format!("seller_sync={}", level));

    let mut module_filters: Vec<_> = config.module_filters.iter().collect();
    module_filters.sort();
    directives.extend(module_filters.into_iter().map(|(module, lvl)| format!("{}={}", module, lvl)));

    let mut filter = EnvFilter::new(&level);
    for directive in directives.iter().skip(1) {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("Ignoring invalid log directive {:?}: {}", directive, e),
        }
    }
    filter
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let log_dir = get_log_directory();
    let mut file_layer = None;
    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;
        rotate_existing_log_file(&log_dir, LOG_FILE_NAME, config.utc_offset_hours)?;
        if config.auto_cleanup_logs {
            cleanup_old_logs(&log_dir, config.max_files)?;
        }

        let (file_writer, file_guard) = non_blocking(rolling::never(&log_dir, LOG_FILE_NAME));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("log guard registry poisoned"))?
            .push(file_guard);

        let layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(MarketplaceTimeFormatter::new(config.utc_offset_hours))
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(MarketplaceTimeFormatter::new(config.utc_offset_hours))
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        file_layer = Some(layer);
    }

    // Console goes to stderr so command output on stdout stays parseable
    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(MarketplaceTimeFormatter::new(config.utc_offset_hours))
            .with_target(false)
            .boxed()
    });

    Registry::default()
        .with(build_env_filter(config))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!(
        level = %config.level,
        json = config.json_format,
        console = config.console_output,
        file = config.file_output,
        "Logging system initialized"
    );
    if config.file_output {
        info!("Log directory: {:?}", log_dir);
    }
    Ok(())
}

/// Rename the previous log file with its timestamp so each run starts fresh
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str, utc_offset_hours: i32) -> Result<()> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(());
    }

    let metadata = std::fs::metadata(&log_file_path)
        .map_err(|e| anyhow!("Failed to get log file metadata: {}", e))?;
    let file_time = metadata
        .modified()
        .or_else(|_| metadata.created())
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let stamped: chrono::DateTime<Utc> = file_time.into();
    let local = stamped.with_timezone(&fixed_offset(utc_offset_hours));

    let file_stem = log_file_name.trim_end_matches(".log");
    let rotated_name = format!("{}.{}.log", file_stem, local.format("%Y%m%dT%H%M%S"));
    std::fs::rename(&log_file_path, log_dir.join(&rotated_name)).map_err(|e| {
        anyhow!("Failed to rotate log file {}: {}", log_file_path.display(), e)
    })?;
    Ok(())
}

/// Keep the `max_files` most recent `.log` files; returns how many were removed
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.extension().is_some_and(|ext| ext == "log");
        if !path.is_file() || !is_log {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(max_files as usize) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }
    Ok(removed)
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Seller Sync System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    info!("Log directory: {:?}", get_log_directory());
}
