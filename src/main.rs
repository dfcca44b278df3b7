use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tracing::{error, info};

use seller_sync_lib::application::AppState;
use seller_sync_lib::commands::{
    SyncSummary, cancel_range_sync, get_app_config, get_sales_summary, init_app_config, start_range_sync,
};
use seller_sync_lib::domain::SyncProgress;
use seller_sync_lib::infrastructure::config::ConfigManager;
use seller_sync_lib::infrastructure::logging::{init_logging_with_config, log_system_info};

#[derive(Parser, Debug)]
#[command(name = "seller-sync", version, about = "Seller dashboard range sync client")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync every day in a range, then reconcile status changes
    Sync {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// Last day (inclusive), YYYY-MM-DD
        #[arg(long)]
        to: String,
        #[arg(long)]
        seller: i64,
    },

    /// Print sales totals and the per-logistic breakdown as JSON
    Sales {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        seller: i64,
        /// Only count orders of this logistic type, e.g. fulfillment
        #[arg(long)]
        logistic: Option<String>,
    },

    /// Configuration helpers
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file if missing
    Init,
}

/// Terminal rendering of the sync progress modal
struct SyncOutput {
    bar: ProgressBar,
}

impl SyncOutput {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }

    fn update(&self, progress: &SyncProgress) {
        self.bar.set_position(u64::from(progress.percentage));
        self.bar.set_message(format!(
            "{}/{} days {} (synced {})",
            progress.current_unit, progress.total_units, progress.current_label, progress.synced_count
        ));
    }

    fn finish(&self, progress: &SyncProgress) {
        self.update(progress);
        if progress.is_terminal() && progress.error_message.is_none() {
            self.bar.finish_with_message("Sync complete");
        } else if progress.was_cancelled() {
            self.bar.abandon_with_message("Sync cancelled");
        } else {
            self.bar.abandon();
        }
    }
}

/// Mirror snapshots onto the bar until a terminal one arrives.
/// Finishing the bar is left to the caller.
async fn render_progress(mut rx: watch::Receiver<SyncProgress>, output: Arc<SyncOutput>) {
    loop {
        let progress = rx.borrow_and_update().clone();
        output.update(&progress);
        if progress.is_terminal() || rx.changed().await.is_err() {
            break;
        }
    }
}

async fn run_sync(state: Arc<AppState>, from: String, to: String, seller: i64) -> Result<SyncSummary, String> {
    let output = Arc::new(SyncOutput::new());
    let renderer = tokio::spawn(render_progress(state.coordinator.subscribe(), output.clone()));

    let ctrl_c_state = state.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_range_sync(&ctrl_c_state);
        }
    });

    let result = start_range_sync(&state, &from, &to, seller).await;
    ctrl_c.abort();
    renderer.abort();
    match renderer.await {
        Err(e) if !e.is_cancelled() => error!("Progress renderer failed: {}", e),
        _ => {}
    }

    // The final snapshot is published before run() returns
    let last = state.coordinator.snapshot();
    if last.is_terminal() {
        output.finish(&last);
    } else {
        output.bar.abandon();
    }
    result
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };

    if let Commands::Config(ConfigCommands::Init) = cli.command {
        let config = init_app_config(&manager).await.map_err(anyhow::Error::msg)?;
        println!("{}", serde_json::to_string_pretty(&config)?);
        eprintln!("Configuration file: {}", manager.config_path().display());
        return Ok(());
    }

    let config = manager.load_config()?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();

    let state = Arc::new(AppState::new(config)?);

    match cli.command {
        Commands::Sync { from, to, seller } => {
            let summary = run_sync(state, from, to, seller).await.map_err(anyhow::Error::msg)?;
            info!(synced = summary.synced_count, reconciled = summary.reconciled_count, "Range sync finished");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Sales {
            from,
            to,
            seller,
            logistic,
        } => {
            let report = get_sales_summary(&state, &from, &to, seller, logistic.as_deref())
                .await
                .map_err(anyhow::Error::msg)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config(ConfigCommands::Show) => {
            let config = get_app_config(&state).await;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Config(ConfigCommands::Init) => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = execute(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seller_sync_lib::domain::SyncPhase;

    fn terminal(phase: SyncPhase, error_message: Option<&str>) -> SyncProgress {
        SyncProgress {
            phase,
            percentage: 100,
            error_message: error_message.map(str::to_string),
            ..SyncProgress::idle()
        }
    }

    #[tokio::test]
    async fn test_renderer_stops_on_terminal_without_finishing_bar() {
        let (tx, rx) = watch::channel(SyncProgress::started(3, "2025-01-01".into()));
        let output = Arc::new(SyncOutput::with_bar(ProgressBar::hidden()));
        let renderer = tokio::spawn(render_progress(rx, output.clone()));

        tx.send_replace(terminal(SyncPhase::Complete, None));
        renderer.await.unwrap();

        assert_eq!(output.bar.position(), 100);
        assert!(!output.bar.is_finished());

        output.finish(&terminal(SyncPhase::Complete, None));
        assert!(output.bar.is_finished());
    }

    #[test]
    fn test_cli_parses_sync_command() {
        let cli = Cli::try_parse_from([
            "seller-sync", "sync", "--from", "2025-01-01", "--to", "2025-01-05", "--seller", "42",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Sync { seller: 42, .. }));
    }
}
