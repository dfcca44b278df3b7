//! Application layer
//!
//! Orchestrates domain logic: the range sync coordinator, the cached sales
//! read-view, and the shared state that wires them to the backend.

pub mod range_sync;
pub mod sales_view;
pub mod state;

pub use range_sync::RangeSyncCoordinator;
pub use sales_view::SalesViewService;
pub use state::AppState;
