//! End-to-end analysis: normalize → direction → classify → metrics → report.
//!
//! Every run is a pure function of (table, self-identity, config, rules).
//! Nothing is cached between calls.

use crate::config::AnalyzerConfig;
use crate::direction::{build_threads, classify_directions, identify_self};
use crate::error::{AnalysisError, ValidationReport};
use crate::ingest::{self, NormalizedBatch, RawTable};
use crate::report::{build_report, LoadSummary, ReportModel};
use crate::sales::SalesClassifier;
use crate::sentiment::SentimentScorer;
use crate::types::{Message, Record};

/// Run the full analysis. The self-identity must be set in `config`.
pub fn analyze(
    table: &RawTable,
    config: &AnalyzerConfig,
    classifier: &SalesClassifier,
    scorer: &dyn SentimentScorer,
) -> Result<ReportModel, AnalysisError> {
    let identity = config
        .self_identity
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(AnalysisError::NoSelfIdentity)?;
    let batch = ingest::normalize(table)?;
    Ok(analyze_batch(batch, identity, config, classifier, scorer))
}

/// Analysis over already-normalized records.
pub fn analyze_batch(
    batch: NormalizedBatch,
    self_identity: &str,
    config: &AnalyzerConfig,
    classifier: &SalesClassifier,
    scorer: &dyn SentimentScorer,
) -> ReportModel {
    let load = LoadSummary::from_batch(&batch);
    let mut messages = classify_directions(batch.records, self_identity);
    enrich_messages(&mut messages, classifier, scorer);
    let threads = build_threads(messages, self_identity);

    let report = build_report(self_identity.trim(), load, &threads, config);
    log::info!(
        "pipeline: {} threads, {} self-initiated, {} replied",
        report.overview.total_threads,
        report.funnel.threads_initiated,
        report.funnel.threads_replied
    );
    report
}

/// Attach a sales category to every outbound message and a sentiment score
/// to every message with content.
pub fn enrich_messages(messages: &mut [Message], classifier: &SalesClassifier, scorer: &dyn SentimentScorer) {
    for message in messages.iter_mut() {
        if message.is_outbound() {
            message.category = Some(classifier.classify(message.content()));
        }
        message.sentiment = (!message.content().is_empty()).then(|| scorer.score(message.content()));
    }
}

/// The configured identity, or the most frequent sender when none is set.
pub fn resolve_identity(configured: Option<&str>, records: &[Record]) -> Result<String, AnalysisError> {
    if let Some(identity) = configured.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(identity.to_string());
    }
    let guessed = identify_self(records).ok_or(AnalysisError::NoSelfIdentity)?;
    log::warn!(
        "pipeline: no self-identity configured, assuming '{}' (pass --me to override)",
        guessed
    );
    Ok(guessed)
}

/// Structural validation plus row diagnostics, without classification or metrics.
pub fn validate_only(table: &RawTable) -> ValidationReport {
    let report = ingest::validate(table);
    if report.valid {
        log::info!(
            "pipeline: export valid, {} rows, {} dropped, {} timestamp warnings",
            report.row_count,
            report.dropped_rows.len(),
            report.timestamp_warnings.len()
        );
    } else {
        log::warn!("pipeline: export invalid, missing {:?}", report.missing_columns);
    }
    report
}
