//! Date-range batched synchronization
//!
//! [`RangeSyncCoordinator`] splits an inclusive date range into day-units,
//! syncs them against the backend in batches of at most
//! [`CONCURRENCY`](crate::domain::constants::sync::CONCURRENCY) concurrent
//! requests, then runs one best-effort status reconciliation for the whole
//! range and invalidates the cached read-view.
//!
//! Progress is published through a `watch` channel after every batch. The
//! coordinator is the only writer.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use futures::future::join_all;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::constants::sync::{
    ABORTED_MESSAGE, BATCH_PHASE_CEILING, CONCURRENCY, COMPLETE_PERCENTAGE, GENERIC_FAILURE_MESSAGE,
};
use crate::domain::date_range::{DateRange, format_date_key};
use crate::domain::errors::SyncError;
use crate::domain::sync_backend::{OwnerId, SyncBackend, ViewInvalidator, ViewKey};
use crate::domain::sync_progress::{SyncPhase, SyncProgress};

pub struct RangeSyncCoordinator {
    backend: Arc<dyn SyncBackend>,
    invalidator: Arc<dyn ViewInvalidator>,
    progress: watch::Sender<SyncProgress>,
    cancellation_token: Mutex<CancellationToken>,
}

/// Per-batch tally folded into the progress record once the batch settles
#[derive(Debug, Default)]
struct BatchTally {
    units: u32,
    synced: u64,
    failed: u32,
    tier_info: Option<serde_json::Value>,
}

/// Moves a run to the error phase if its future is dropped before settling,
/// so the coordinator can be reset afterwards.
struct ActiveRunGuard<'a> {
    progress: &'a watch::Sender<SyncProgress>,
    armed: bool,
}

impl ActiveRunGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ActiveRunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Range sync dropped before settling");
        self.progress.send_if_modified(|progress| {
            if !progress.phase.is_active() {
                return false;
            }
            progress.phase = SyncPhase::Error;
            progress.is_running = false;
            progress.error_message = Some(ABORTED_MESSAGE.to_string());
            true
        });
    }
}

impl RangeSyncCoordinator {
    pub fn new(backend: Arc<dyn SyncBackend>, invalidator: Arc<dyn ViewInvalidator>) -> Self {
        let (progress, _) = watch::channel(SyncProgress::idle());
        Self {
            backend,
            invalidator,
            progress,
            cancellation_token: Mutex::new(CancellationToken::new()),
        }
    }

    /// Receiver observing every published progress snapshot
    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    pub fn snapshot(&self) -> SyncProgress {
        self.progress.borrow().clone()
    }

    /// Request cooperative cancellation.
    ///
    /// Takes effect at the next batch boundary or before reconciliation;
    /// requests already in flight are awaited first.
    pub fn cancel(&self) {
        info!("🛑 Range sync cancellation requested");
        self.current_token().cancel();
    }

    /// Return to idle so a new run may start. Refused while a run is active.
    pub fn reset(&self) -> bool {
        let reset = self.progress.send_if_modified(|progress| {
            if progress.phase.is_active() {
                return false;
            }
            *progress = SyncProgress::idle();
            true
        });
        if !reset {
            warn!("Refusing to reset range sync while a run is active");
            return false;
        }
        *self
            .cancellation_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = CancellationToken::new();
        debug!("Range sync progress reset to idle");
        true
    }

    /// Sync every day of `range` for `owner`.
    ///
    /// Returns `false` without touching state for a degenerate range or when
    /// the coordinator has not been reset since its last run. Dropping the
    /// returned future mid-run leaves the coordinator in the error phase.
    pub async fn run(&self, range: DateRange, owner: OwnerId) -> bool {
        let days = range.days();
        if days.is_empty() {
            debug!(%range, %owner, "Range sync skipped: no day-units in range");
            return false;
        }

        let total_units = u32::try_from(days.len()).unwrap_or(u32::MAX);
        let label = range.label();
        let started = self.progress.send_if_modified(|progress| {
            if progress.phase != SyncPhase::Idle {
                return false;
            }
            *progress = SyncProgress::started(total_units, label);
            true
        });
        if !started {
            warn!(%range, %owner, phase = ?self.progress.borrow().phase, "Range sync not started: coordinator is not idle");
            return false;
        }

        let guard = ActiveRunGuard {
            progress: &self.progress,
            armed: true,
        };
        let run_id = Uuid::new_v4();
        let token = self.current_token();
        info!(%run_id, %range, %owner, total_units, "🚀 Range sync started");

        let outcome = self.execute(&range, owner, &days, &token).await;
        guard.disarm();
        match outcome {
            Ok(()) => {
                let snapshot = self.snapshot();
                info!(
                    %run_id,
                    synced = snapshot.synced_count,
                    reconciled = snapshot.reconciled_count,
                    "✅ Range sync complete"
                );
                true
            }
            Err(err) => {
                match &err {
                    SyncError::Cancelled => info!(%run_id, "Range sync cancelled"),
                    other => error!(%run_id, error = %other, "❌ Range sync failed"),
                }
                self.fail(&err);
                false
            }
        }
    }

    async fn execute(
        &self,
        range: &DateRange,
        owner: OwnerId,
        days: &[NaiveDate],
        token: &CancellationToken,
    ) -> Result<(), SyncError> {
        let total_units = self.progress.borrow().total_units;
        let mut completed: usize = 0;

        for (batch_index, batch) in days.chunks(CONCURRENCY).enumerate() {
            if token.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            debug!(batch = batch_index + 1, size = batch.len(), "Dispatching day batch");
            let tally = self.sync_batch(batch, owner).await?;
            completed += batch.len();

            let next_label = days
                .get(completed)
                .map_or_else(|| range.label(), |day| format_date_key(*day));
            self.progress.send_modify(|progress| {
                progress.current_unit = progress.current_unit.saturating_add(tally.units).min(total_units);
                progress.synced_count += tally.synced;
                if tally.tier_info.is_some() {
                    progress.tier_info.clone_from(&tally.tier_info);
                }
                let percentage = SyncProgress::batch_percentage(progress.current_unit, total_units);
                progress.percentage = progress.percentage.max(percentage);
                progress.current_label = next_label;
            });

            info!(
                batch = batch_index + 1,
                synced = tally.synced,
                failed = tally.failed,
                completed,
                total_units,
                "📦 Day batch settled"
            );
        }

        if token.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        self.progress.send_modify(|progress| {
            progress.phase = SyncPhase::Reconciling;
            progress.percentage = progress.percentage.max(BATCH_PHASE_CEILING);
            progress.current_label = range.label();
        });

        let reconciled = self.reconcile(range, owner).await?;

        self.invalidator
            .invalidate(&ViewKey::new(*range, owner))
            .await
            .map_err(|e| SyncError::Invalidation(e.to_string()))?;

        self.progress.send_modify(|progress| {
            progress.phase = SyncPhase::Complete;
            progress.is_running = false;
            progress.percentage = COMPLETE_PERCENTAGE;
            progress.current_label = range.label();
            progress.error_message = None;
            if let Some(updated) = reconciled {
                progress.reconciled_count = updated;
            }
        });
        Ok(())
    }

    /// Dispatch one request per day and wait for all of them to settle.
    /// A failed day still counts as a completed unit.
    async fn sync_batch(&self, batch: &[NaiveDate], owner: OwnerId) -> Result<BatchTally, SyncError> {
        let handles: Vec<_> = batch
            .iter()
            .map(|&day| {
                let backend = Arc::clone(&self.backend);
                tokio::spawn(async move { (day, backend.sync_day(day, owner).await) })
            })
            .collect();

        let mut tally = BatchTally::default();
        for joined in join_all(handles).await {
            let (day, result) =
                joined.map_err(|e| SyncError::Internal(format!("day sync task failed: {e}")))?;
            tally.units += 1;
            match result {
                Ok(response) => {
                    debug!(day = %day, synced = response.synced_count, "Day synced");
                    tally.synced += response.synced_count;
                    if response.tier_info.is_some() {
                        tally.tier_info = response.tier_info;
                    }
                }
                Err(err) => {
                    warn!(day = %day, %owner, error = %err, "⚠️ Day sync failed, continuing");
                    tally.failed += 1;
                }
            }
        }
        Ok(tally)
    }

    /// Best-effort: a backend failure leaves the reconciled count unchanged.
    async fn reconcile(&self, range: &DateRange, owner: OwnerId) -> Result<Option<u64>, SyncError> {
        let backend = Arc::clone(&self.backend);
        let range = *range;
        let joined = tokio::spawn(async move { backend.reconcile_status_changes(&range, owner).await })
            .await
            .map_err(|e| SyncError::Internal(format!("reconciliation task failed: {e}")))?;

        match joined {
            Ok(response) => {
                info!(updated = response.updated_count, "🔁 Status reconciliation finished");
                Ok(Some(response.updated_count))
            }
            Err(err) => {
                warn!(error = %err, "Status reconciliation failed, keeping previous count");
                Ok(None)
            }
        }
    }

    fn fail(&self, err: &SyncError) {
        let message = err.to_string();
        self.progress.send_modify(|progress| {
            progress.phase = SyncPhase::Error;
            progress.is_running = false;
            progress.error_message = Some(if message.is_empty() {
                GENERIC_FAILURE_MESSAGE.to_string()
            } else {
                message
            });
        });
    }

    fn current_token(&self) -> CancellationToken {
        self.cancellation_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
