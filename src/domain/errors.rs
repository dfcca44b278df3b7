//! Error taxonomy for range sync
//!
//! - [`RangeError`]: rejected before a run starts
//! - [`BackendError`]: a single backend call failed; absorbed per unit or per
//!   reconciliation by the coordinator
//! - [`SyncError`]: aborts a run

use thiserror::Error;

use crate::domain::constants::sync::CANCELLED_MESSAGE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid date key {0:?}, expected YYYY-MM-DD")]
    InvalidDateKey(String),

    #[error("range start {from} is after range end {to}")]
    Reversed { from: String, to: String },

    #[error("range spans {days} days, at most {max_days} are allowed")]
    TooLong { days: usize, max_days: u32 },
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited by backend")]
    RateLimited,

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("backend client misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,

    #[error("failed to invalidate cached view: {0}")]
    Invalidation(String),

    #[error("{0}")]
    Internal(String),
}
