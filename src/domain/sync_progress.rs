//! Observable progress of a range sync run
//!
//! The coordinator owns and mutates a single [`SyncProgress`]; everyone else
//! sees cloned snapshots.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::constants::sync::{BATCH_PHASE_CEILING, CANCELLED_MESSAGE};

/// Explicit run state machine.
///
/// `idle -> running -> reconciling -> complete`, with `running -> error`
/// reachable directly. Leaving `complete`/`error` requires a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SyncPhase {
    #[default]
    Idle,
    Running,
    Reconciling,
    Complete,
    Error,
}

impl SyncPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Reconciling)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SyncProgress {
    /// True while the batch loop is active
    pub is_running: bool,
    pub current_unit: u32,
    pub total_units: u32,
    pub current_label: String,
    pub percentage: u8,
    #[ts(type = "number")]
    pub synced_count: u64,
    #[ts(type = "number")]
    pub reconciled_count: u64,
    pub error_message: Option<String>,
    pub phase: SyncPhase,
    /// Most recent tier/rate payload reported by a successful day sync.
    /// Backend-defined shape, forwarded as-is for display.
    #[ts(type = "Record<string, unknown> | null")]
    pub tier_info: Option<serde_json::Value>,
}

impl SyncProgress {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fresh record for a run over `total_units` days
    pub fn started(total_units: u32, label: String) -> Self {
        Self {
            is_running: true,
            total_units,
            current_label: label,
            phase: SyncPhase::Running,
            ..Self::default()
        }
    }

    /// Batch-phase percentage: `floor(current / total * 95)`
    pub fn batch_percentage(current_unit: u32, total_units: u32) -> u8 {
        if total_units == 0 {
            return 0;
        }
        let scaled = u64::from(current_unit.min(total_units)) * u64::from(BATCH_PHASE_CEILING)
            / u64::from(total_units);
        u8::try_from(scaled).unwrap_or(BATCH_PHASE_CEILING)
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Cancellation ends in the error phase; tell it apart from other failures.
    pub fn was_cancelled(&self) -> bool {
        self.phase == SyncPhase::Error && self.error_message.as_deref() == Some(CANCELLED_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 5, 0)]
    #[case(3, 5, 57)]
    #[case(5, 5, 95)]
    #[case(1, 1, 95)]
    #[case(1, 3, 31)]
    #[case(0, 0, 0)]
    #[case(9, 5, 95)]
    fn test_batch_percentage(#[case] current: u32, #[case] total: u32, #[case] expected: u8) {
        assert_eq!(SyncProgress::batch_percentage(current, total), expected);
    }

    #[test]
    fn test_started_record() {
        let progress = SyncProgress::started(5, "2025-01-01 → 2025-01-05".into());
        assert!(progress.is_running);
        assert_eq!(progress.phase, SyncPhase::Running);
        assert_eq!(progress.total_units, 5);
        assert_eq!(progress.current_unit, 0);
        assert_eq!(progress.percentage, 0);
        assert!(progress.error_message.is_none());
    }

    #[test]
    fn test_was_cancelled_only_for_cancel_message() {
        let mut progress = SyncProgress::idle();
        progress.phase = SyncPhase::Error;
        progress.error_message = Some("cancelled".into());
        assert!(progress.was_cancelled());

        progress.error_message = Some("boom".into());
        assert!(!progress.was_cancelled());
    }

    #[test]
    fn test_serializes_camel_case() {
        let progress = SyncProgress::started(2, "x".into());
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["isRunning"], true);
        assert_eq!(json["totalUnits"], 2);
        assert_eq!(json["phase"], "running");
        assert!(json["errorMessage"].is_null());
    }
}
