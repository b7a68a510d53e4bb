//! External Integrations
//!
//! Issue services that feed taskwarrior.
//!
//! # Built-in Integrations
//!
//! - **Flatastic**: REST adapter for the Flatastic household chore app
//!
//! # Pull Flow
//!
//! 1. **Login**: open an authenticated session with the service
//! 2. **Fetch**: list the raw records once
//! 3. **Normalize**: map each record to a taskwarrior task, in source order,
//!    dropping the ones the assignment filter rejects

pub mod flatastic;
pub mod service;

// Flatastic exports
pub use flatastic::{
    filter_and_emit, ChoreRecord, FlatasticClient, FlatasticIssue, FlatasticService,
    FlatasticSession, API_KEY_HEADER,
};

// Service contract exports
pub use service::{Issue, IssueIter, IssueService, ServiceMetadata, DESCRIPTION_MARKUP};
