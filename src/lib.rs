//! Outbound direct-message analysis.
//!
//! Reads a conversation export, works out which messages the user sent,
//! classifies their sales intent, and measures how the conversations the
//! user started performed. See `pipeline` for the end-to-end entry points.

pub mod config;
pub mod direction;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod sales;
pub mod sentiment;
pub mod starters;
pub mod templates;
pub mod types;
