//! Record normalization for direct-message exports.
//!
//! Source headers are normalized (trim, lowercase, whitespace → `_`) and
//! resolved through `COLUMN_MAP`. Structural validation runs before any row
//! is touched; after that every row-level problem is recoverable:
//! - unparseable DATE → `timestamp = None`, row kept, warning recorded
//! - empty CONVERSATION ID or FROM → row dropped, diagnostic recorded
//! - empty CONTENT → row kept (still counts toward response-rate denominators)

use std::collections::HashMap;

use crate::error::{AnalysisError, RowDiagnostic, ValidationReport};
use crate::types::Record;

use super::timestamp::parse_timestamp;
use super::RawTable;

/// Canonical fields a source column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ThreadId,
    Sender,
    Recipient,
    Timestamp,
    Content,
    SenderProfileUrl,
    RecipientProfileUrls,
    ConversationTitle,
    Attachments,
}

/// Normalized header → canonical field. Unlisted headers are ignored.
pub const COLUMN_MAP: &[(&str, Field)] = &[
    ("conversation_id", Field::ThreadId),
    ("thread_id", Field::ThreadId),
    ("from", Field::Sender),
    ("sender", Field::Sender),
    ("to", Field::Recipient),
    ("recipient", Field::Recipient),
    ("date", Field::Timestamp),
    ("timestamp", Field::Timestamp),
    ("content", Field::Content),
    ("sender_profile_url", Field::SenderProfileUrl),
    ("recipient_profile_urls", Field::RecipientProfileUrls),
    ("conversation_title", Field::ConversationTitle),
    ("attachments", Field::Attachments),
];

/// Required fields with the export column name reported when absent.
pub const REQUIRED_FIELDS: &[(Field, &str)] = &[
    (Field::ThreadId, "CONVERSATION ID"),
    (Field::Sender, "FROM"),
    (Field::Recipient, "TO"),
    (Field::Timestamp, "DATE"),
    (Field::Content, "CONTENT"),
];

/// Normalize a source header: strip BOM, trim, lowercase, whitespace runs → `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Resolved column positions for one table.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: HashMap<Field, usize>,
}

impl ColumnIndex {
    /// Map headers to fields. The first header resolving to a field wins.
    /// Fails with every missing required column at once.
    pub fn resolve(headers: &[String]) -> Result<Self, AnalysisError> {
        let mut positions = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let normalized = normalize_header(header);
            if let Some((_, field)) = COLUMN_MAP.iter().find(|(name, _)| *name == normalized) {
                positions.entry(*field).or_insert(idx);
            }
        }

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|(field, _)| !positions.contains_key(field))
            .map(|(_, name)| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(AnalysisError::MissingColumns { missing });
        }

        Ok(ColumnIndex { positions })
    }

    pub fn position(&self, field: Field) -> Option<usize> {
        self.positions.get(&field).copied()
    }
}

/// Output of normalization: records plus everything that needed coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<Record>,
    pub rows_read: usize,
    pub dropped_rows: Vec<RowDiagnostic>,
    pub timestamp_warnings: Vec<RowDiagnostic>,
}

impl NormalizedBatch {
    pub fn warning_count(&self) -> usize {
        self.timestamp_warnings.len()
    }
}

/// Normalize every row of `table` into a `Record`.
///
/// Returns `Err` only for structural problems (no headers, missing required
/// columns), before any row is parsed.
pub fn normalize(table: &RawTable) -> Result<NormalizedBatch, AnalysisError> {
    if table.headers.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let columns = ColumnIndex::resolve(&table.headers)?;

    let mut batch = NormalizedBatch {
        rows_read: table.row_count(),
        ..Default::default()
    };

    for row in 0..table.row_count() {
        let get = |field: Field| field_value(table, &columns, row, field);
        let optional = |field: Field| {
            let value = get(field);
            (!value.is_empty()).then(|| value.to_string())
        };

        let thread_id = get(Field::ThreadId);
        let sender = get(Field::Sender);
        if thread_id.is_empty() || sender.is_empty() {
            let column = if thread_id.is_empty() { "CONVERSATION ID" } else { "FROM" };
            batch.dropped_rows.push(RowDiagnostic {
                row: row + 1,
                column: column.to_string(),
                value: String::new(),
            });
            continue;
        }

        let raw_date = get(Field::Timestamp);
        let timestamp = parse_timestamp(raw_date);
        if timestamp.is_none() {
            batch.timestamp_warnings.push(RowDiagnostic {
                row: row + 1,
                column: "DATE".to_string(),
                value: raw_date.to_string(),
            });
        }

        batch.records.push(Record {
            row_index: row,
            thread_id: thread_id.to_string(),
            sender: sender.to_string(),
            recipient: get(Field::Recipient).to_string(),
            timestamp,
            content: get(Field::Content).to_string(),
            sender_profile_url: optional(Field::SenderProfileUrl),
            recipient_profile_urls: optional(Field::RecipientProfileUrls),
            conversation_title: optional(Field::ConversationTitle),
            attachments: optional(Field::Attachments),
        });
    }

    if !batch.timestamp_warnings.is_empty() {
        log::warn!(
            "normalize: {} of {} rows have unparseable timestamps (kept, excluded from timing)",
            batch.timestamp_warnings.len(),
            batch.rows_read
        );
    }
    if !batch.dropped_rows.is_empty() {
        log::warn!(
            "normalize: dropped {} rows with no conversation id or sender",
            batch.dropped_rows.len()
        );
    }
    log::debug!("normalize: {} records from {} rows", batch.records.len(), batch.rows_read);

    Ok(batch)
}

fn field_value<'a>(table: &'a RawTable, columns: &ColumnIndex, row: usize, field: Field) -> &'a str {
    columns
        .position(field)
        .map(|col| table.cell(row, col).trim())
        .unwrap_or("")
}

/// Validation-only mode: structural check plus row diagnostics, no analysis.
pub fn validate(table: &RawTable) -> ValidationReport {
    match normalize(table) {
        Ok(batch) => ValidationReport {
            valid: true,
            missing_columns: Vec::new(),
            row_count: batch.rows_read,
            dropped_rows: batch.dropped_rows,
            timestamp_warnings: batch.timestamp_warnings,
            recovery_suggestion: None,
        },
        Err(err) => ValidationReport::from_error(&err),
    }
}
