//! Error types for export analysis
//!
//! Errors are classified by when they stop the run:
//! - Structural: the export cannot be analyzed at all (missing columns, empty file)
//! - Input: the file could not be read or decoded
//! - Configuration: config or rule files are invalid
//!
//! Row-level problems (unparseable timestamps, rows with no thread) are not
//! errors. They are counted and surfaced through `ValidationReport` and the
//! report model's load summary.

use serde::Serialize;
use thiserror::Error;

/// Error types for a single analysis run
#[derive(Debug, Error)]
pub enum AnalysisError {
    // Structural errors
    #[error("Missing required column(s): {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Export contains no header row")]
    EmptyInput,

    // Input errors
    #[error("IO error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Unsupported export format: .{0}")]
    UnsupportedFormat(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sales rule error: {0}")]
    Rules(String),

    #[error("No self-identity configured and none could be inferred from the export")]
    NoSelfIdentity,
}

impl AnalysisError {
    /// Returns true if the export itself is unusable, independent of settings
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingColumns { .. } | AnalysisError::EmptyInput
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AnalysisError::MissingColumns { .. } => {
                "Export the full messages file. It needs CONVERSATION ID, FROM, TO, DATE and CONTENT columns."
            }
            AnalysisError::EmptyInput => "The file is empty. Re-export your messages.",
            AnalysisError::Io(_) => "Check the file path and permissions.",
            AnalysisError::Csv(_) => "Check the file is a valid comma-separated export.",
            AnalysisError::Workbook(_) => "Check the spreadsheet opens and its first sheet holds the messages.",
            AnalysisError::UnsupportedFormat(_) => "Use a .csv, .tsv or .xlsx export.",
            AnalysisError::Config(_) => "Check the analyzer config JSON.",
            AnalysisError::Rules(_) => "Check the sales rules JSON; every regex pattern must compile.",
            AnalysisError::NoSelfIdentity => "Pass your name as it appears in the FROM column with --me.",
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::Io(err.to_string())
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Config(err.to_string())
    }
}

impl From<calamine::Error> for AnalysisError {
    fn from(err: calamine::Error) -> Self {
        AnalysisError::Workbook(err.to_string())
    }
}

/// A single row that needed coercion during normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDiagnostic {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub column: String,
    pub value: String,
}

/// Serializable outcome of the validation-only mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub missing_columns: Vec<String>,
    pub row_count: usize,
    pub dropped_rows: Vec<RowDiagnostic>,
    pub timestamp_warnings: Vec<RowDiagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_suggestion: Option<String>,
}

impl ValidationReport {
    pub fn from_error(err: &AnalysisError) -> Self {
        let missing_columns = match err {
            AnalysisError::MissingColumns { missing } => missing.clone(),
            _ => Vec::new(),
        };
        ValidationReport {
            valid: false,
            missing_columns,
            row_count: 0,
            dropped_rows: Vec::new(),
            timestamp_warnings: Vec::new(),
            recovery_suggestion: Some(err.recovery_suggestion().to_string()),
        }
    }
}
