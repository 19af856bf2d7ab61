//! Report model and renderers.
//!
//! `model` builds the finished `ReportModel`; renderers read it and add no
//! business logic.

pub mod markdown;
pub mod model;

pub use markdown::render_summary;
pub use model::{build_report, LoadSummary, ReportModel};

use crate::error::AnalysisError;

/// Pretty-printed JSON for a report.
pub fn render_json(report: &ReportModel) -> Result<String, AnalysisError> {
    Ok(serde_json::to_string_pretty(report)?)
}
