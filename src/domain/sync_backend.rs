//! Ports to the sales backend
//!
//! Order syncing, fee/margin computation and persistence all live
//! server-side. These traits describe the calls the client makes.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::date_range::DateRange;
use crate::domain::errors::BackendError;
use crate::domain::sales::SalesSummary;

/// Opaque seller account identifier scoping a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OwnerId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Result of syncing a single day
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySyncResponse {
    pub synced_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_info: Option<serde_json::Value>,
}

/// Result of the range-wide status reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub updated_count: u64,
}

/// Per-day sync and range reconciliation endpoints
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// Sync all orders of one calendar day. Expected to be idempotent per day.
    async fn sync_day(&self, day: NaiveDate, owner: OwnerId) -> Result<DaySyncResponse, BackendError>;

    /// Catch status changes (e.g. cancellations) a per-day sync would miss.
    async fn reconcile_status_changes(
        &self,
        range: &DateRange,
        owner: OwnerId,
    ) -> Result<ReconcileResponse, BackendError>;
}

/// Read side: aggregated sales for a range
#[async_trait]
pub trait SalesReader: Send + Sync {
    async fn fetch_sales(&self, range: &DateRange, owner: OwnerId) -> Result<SalesSummary, BackendError>;
}

/// Key of a cached read-view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub range: DateRange,
    pub owner: OwnerId,
}

impl ViewKey {
    pub const fn new(range: DateRange, owner: OwnerId) -> Self {
        Self { range, owner }
    }
}

/// Cache/query layer that must drop stale views after a successful sync
#[async_trait]
pub trait ViewInvalidator: Send + Sync {
    async fn invalidate(&self, key: &ViewKey) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_sync_response_tier_info_optional() {
        let plain: DaySyncResponse = serde_json::from_str(r#"{"syncedCount": 5}"#).unwrap();
        assert_eq!(plain.synced_count, 5);
        assert!(plain.tier_info.is_none());

        let tiered: DaySyncResponse =
            serde_json::from_str(r#"{"syncedCount": 2, "tierInfo": {"tier": "gold", "rate": 0.13}}"#).unwrap();
        assert_eq!(tiered.tier_info.unwrap()["tier"], "gold");
    }

    #[test]
    fn test_owner_id_is_transparent() {
        let owner: OwnerId = serde_json::from_str("123456").unwrap();
        assert_eq!(owner, OwnerId(123_456));
        assert_eq!(owner.to_string(), "123456");
    }
}
