//! Marketplace and sync domain constants
//!
//! Fixed characteristics of the sales sync workflow that are not user-configurable.

/// Range sync characteristics
pub mod sync {
    /// Maximum number of per-day sync requests in flight at once.
    ///
    /// The window does not slide: a batch of at most this many days is
    /// dispatched and fully awaited before the next batch starts.
    pub const CONCURRENCY: usize = 3;

    /// Upper bound of the percentage reported during the batch phase.
    /// The remaining points belong to the reconciliation phase.
    pub const BATCH_PHASE_CEILING: u8 = 95;

    /// Percentage reported once a run has completed.
    pub const COMPLETE_PERCENTAGE: u8 = 100;

    /// Error message recorded when a run is cancelled by its owner.
    pub const CANCELLED_MESSAGE: &str = "cancelled";

    /// Error message recorded when a run is dropped before it settles.
    pub const ABORTED_MESSAGE: &str = "sync aborted";

    /// Fallback message for unexpected failures without a description.
    pub const GENERIC_FAILURE_MESSAGE: &str = "sync failed unexpectedly";
}

/// Date key formatting
pub mod date_key {
    /// Calendar date key format used on the wire and in labels (`YYYY-MM-DD`)
    pub const FORMAT: &str = "%Y-%m-%d";

    /// Separator used in range labels
    pub const RANGE_LABEL_SEPARATOR: &str = " → ";
}

/// Backend defaults
pub mod backend {
    /// Default per-request timeout in seconds; a single day sync can be slow.
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Default client-side request rate
    pub const DEFAULT_MAX_REQUESTS_PER_SECOND: u32 = 5;

    /// Default longest range accepted for a single run (about one quarter)
    pub const DEFAULT_MAX_RANGE_DAYS: u32 = 92;

    /// Default read-view cache lifetime
    pub const DEFAULT_VIEW_CACHE_TTL_SECS: u64 = 300;
}
