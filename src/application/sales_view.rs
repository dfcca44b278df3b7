//! Cached sales read-view
//!
//! Serves [`SalesSummary`] aggregates for `(range, owner)` from the view
//! cache, fetching from the backend on a miss. Registered with the range sync
//! coordinator as its [`ViewInvalidator`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::date_range::DateRange;
use crate::domain::errors::BackendError;
use crate::domain::sales::{LogisticType, SalesSummary};
use crate::domain::sync_backend::{OwnerId, SalesReader, ViewInvalidator, ViewKey};
use crate::infrastructure::view_cache::ViewCache;

pub struct SalesViewService {
    reader: Arc<dyn SalesReader>,
    cache: ViewCache<SalesSummary>,
}

impl SalesViewService {
    pub fn new(reader: Arc<dyn SalesReader>, ttl: Duration) -> Self {
        Self {
            reader,
            cache: ViewCache::new(ttl),
        }
    }

    pub async fn get_summary(&self, range: DateRange, owner: OwnerId) -> Result<SalesSummary, BackendError> {
        let key = ViewKey::new(range, owner);
        if let Some(summary) = self.cache.get(&key).await {
            debug!(%range, %owner, "Sales view served from cache");
            return Ok(summary);
        }

        let summary = self.reader.fetch_sales(&range, owner).await?;
        info!(%range, %owner, orders = summary.orders.len(), "Sales view fetched");
        self.cache.insert(key, summary.clone()).await;
        Ok(summary)
    }

    /// Summary narrowed to one logistic type with totals re-summed
    pub async fn get_filtered_summary(
        &self,
        range: DateRange,
        owner: OwnerId,
        logistic: Option<LogisticType>,
    ) -> Result<SalesSummary, BackendError> {
        let summary = self.get_summary(range, owner).await?;
        Ok(summary.filter_by_logistic(logistic))
    }

    pub async fn cached_views(&self) -> usize {
        self.cache.len().await
    }
}

#[async_trait]
impl ViewInvalidator for SalesViewService {
    /// Drops every cached view of the owner that overlaps the synced range
    async fn invalidate(&self, key: &ViewKey) -> anyhow::Result<()> {
        self.cache.invalidate_overlapping(key).await;
        Ok(())
    }
}
