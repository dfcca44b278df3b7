//! Domain module - core types of the seller sync workflow
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod constants;
pub mod date_range;
pub mod errors;
pub mod sales;
pub mod sync_backend;
pub mod sync_progress;

pub use date_range::DateRange;
pub use errors::{BackendError, RangeError, SyncError};
pub use sales::{LogisticType, SaleOrder, SalesSummary, SalesTotals};
pub use sync_backend::{
    DaySyncResponse, OwnerId, ReconcileResponse, SalesReader, SyncBackend, ViewInvalidator, ViewKey,
};
pub use sync_progress::{SyncPhase, SyncProgress};
