//! Command handlers
//!
//! Transport-agnostic entry points used by the CLI. Each returns
//! `Result<_, String>` so any shell can surface the message directly.

pub mod config_commands;
pub mod sales_commands;
pub mod sync_commands;

pub use config_commands::*;
pub use sales_commands::*;
pub use sync_commands::*;
