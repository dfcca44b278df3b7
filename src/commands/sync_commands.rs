//! Range sync commands: start, cancel, reset and progress polling

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::state::AppState;
use crate::domain::date_range::DateRange;
use crate::domain::sync_backend::OwnerId;
use crate::domain::sync_progress::{SyncPhase, SyncProgress};

/// Result of a completed range sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub range: DateRange,
    pub days: u32,
    pub synced_count: u64,
    pub reconciled_count: u64,
    pub duration_ms: u64,
}

/// Parse `from`/`to` and reject ranges the backend should never see
pub async fn parse_requested_range(app_state: &AppState, from: &str, to: &str) -> Result<DateRange, String> {
    let max_days = app_state.config.read().await.sync.max_range_days;
    let range = DateRange::parse(from, to).map_err(|e| e.to_string())?;
    range.validate(max_days).map_err(|e| e.to_string())?;
    Ok(range)
}

/// Run a range sync to completion.
///
/// Fails without touching the backend when the coordinator still holds a
/// previous run; call [`reset_range_sync`] first.
pub async fn start_range_sync(
    app_state: &AppState,
    from: &str,
    to: &str,
    seller_id: i64,
) -> Result<SyncSummary, String> {
    let range = parse_requested_range(app_state, from, to).await?;
    let coordinator = &app_state.coordinator;

    let before = coordinator.snapshot();
    if before.phase != SyncPhase::Idle {
        warn!(phase = ?before.phase, "Range sync requested while coordinator is not idle");
        return Err(format!(
            "a range sync is already {} - reset before starting another",
            if before.phase.is_active() { "running" } else { "finished" }
        ));
    }

    info!(%range, seller_id, "Starting range sync");
    let started = Instant::now();
    let succeeded = coordinator.run(range, OwnerId(seller_id)).await;
    let progress = coordinator.snapshot();

    if !succeeded {
        return Err(progress
            .error_message
            .unwrap_or_else(|| "range sync was not started".to_string()));
    }

    Ok(SyncSummary {
        range,
        days: progress.total_units,
        synced_count: progress.synced_count,
        reconciled_count: progress.reconciled_count,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

pub fn cancel_range_sync(app_state: &AppState) {
    app_state.coordinator.cancel();
}

pub fn reset_range_sync(app_state: &AppState) -> Result<(), String> {
    if app_state.coordinator.reset() {
        Ok(())
    } else {
        Err("cannot reset while a range sync is running".to_string())
    }
}

pub fn get_sync_progress(app_state: &AppState) -> SyncProgress {
    app_state.coordinator.snapshot()
}
