//! Seller Sync - range sync client for a marketplace seller dashboard
//!
//! Fetches per-day sales from the backend in small concurrent batches,
//! reports progress, reconciles status changes and keeps the cached sales
//! views fresh.

pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;

pub use application::{AppState, RangeSyncCoordinator, SalesViewService};
pub use domain::{DateRange, OwnerId, SyncPhase, SyncProgress};
