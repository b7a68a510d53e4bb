//! Chorewarrior - Flatastic chores for taskwarrior
//!
//! Logs in to the Flatastic household app, lists the flat's chores and maps
//! each one to a taskwarrior task with Flatastic-specific UDAs.
//!
//! # Architecture
//!
//! - **integrations**: The service contract and the Flatastic adapter
//! - **taskwarrior**: Normalized task records and UDA declarations
//! - **config**: YAML configuration and validation
//! - **logging**: tracing subscriber setup

pub mod config;
pub mod error;
pub mod integrations;
pub mod logging;
pub mod taskwarrior;

// Re-exports
pub use error::{ChoreSyncError, Result};
