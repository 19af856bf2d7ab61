//! The finished, read-only report model.
//!
//! Built once from classified threads; renderers only read it. Nothing in
//! here depends on wall-clock time, so identical input serializes to
//! identical JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::ingest::NormalizedBatch;
use crate::metrics::{
    category_stats, compute_funnel, compute_outcomes, direction_comparison, ghosted_contacts, sales_comparison,
    starter_analysis, summarize_contacts, CategoryStats, ContactSummary, DirectionComparison, OutboundFunnel,
    SalesComparison, StarterAnalysis, ThreadOutcome,
};
use crate::sentiment::{mean, sentiment_label};
use crate::starters::StarterType;
use crate::templates::{cluster_templates, rank_templates, TemplateCluster};
use crate::types::{SalesCategory, Thread};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportModel {
    pub overview: Overview,
    pub load_summary: LoadSummary,
    pub anomalies: Anomalies,
    pub funnel: OutboundFunnel,
    pub contacts: Vec<ContactSummary>,
    pub categories: Vec<CategoryStats>,
    pub sales_comparison: SalesComparison,
    pub starters: StarterAnalysis,
    pub direction_comparison: DirectionComparison,
    pub top_templates: Vec<TemplateCluster>,
    pub ghosted_contacts: Vec<String>,
    pub threads: Vec<ThreadDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub self_identity: String,
    pub total_messages: usize,
    pub outbound_messages: usize,
    pub inbound_messages: usize,
    pub total_threads: usize,
    pub self_initiated_threads: usize,
    pub other_initiated_threads: usize,
    pub unique_contacts: usize,
    pub sales_messages: usize,
    pub first_message_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub avg_outbound_sentiment: Option<f64>,
    pub outbound_sentiment_label: Option<String>,
}

/// What happened while loading rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub rows_read: usize,
    pub records_kept: usize,
    pub dropped_rows: usize,
    pub timestamp_warnings: usize,
}

impl LoadSummary {
    pub fn from_batch(batch: &NormalizedBatch) -> Self {
        LoadSummary {
            rows_read: batch.rows_read,
            records_kept: batch.records.len(),
            dropped_rows: batch.dropped_rows.len(),
            timestamp_warnings: batch.timestamp_warnings.len(),
        }
    }
}

/// Threads left out of some or all outbound metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomalies {
    /// Self-identity is neither sender nor recipient anywhere in the thread.
    pub threads_without_self: Vec<String>,
    /// No message in the thread has a parseable timestamp.
    pub threads_without_timestamps: Vec<String>,
}

/// One row per thread for detail tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetail {
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_title: Option<String>,
    pub contact: Option<String>,
    pub message_count: usize,
    pub outbound_count: usize,
    pub inbound_count: usize,
    pub initiated_by_self: bool,
    pub self_present: bool,
    pub first_message_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub first_category: Option<SalesCategory>,
    pub starter_type: Option<StarterType>,
    pub replied: Option<bool>,
    pub response_time_hours: Option<f64>,
    pub follow_up_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

/// Assemble the full model from classified threads.
pub fn build_report(self_identity: &str, load: LoadSummary, threads: &[Thread], config: &AnalyzerConfig) -> ReportModel {
    let outcomes = compute_outcomes(threads);
    let contacts = summarize_contacts(threads, &outcomes);
    let clusters = cluster_templates(&outcomes, config.template_similarity);
    let detail_rows = thread_details(threads, &outcomes, &clusters);
    let top_templates = rank_templates(clusters, config.min_template_size, config.top_templates);

    let anomalies = Anomalies {
        threads_without_self: threads
            .iter()
            .filter(|t| !t.self_present)
            .map(|t| t.thread_id.clone())
            .collect(),
        threads_without_timestamps: threads
            .iter()
            .filter(|t| !t.has_sortable())
            .map(|t| t.thread_id.clone())
            .collect(),
    };
    if !anomalies.threads_without_self.is_empty() || !anomalies.threads_without_timestamps.is_empty() {
        log::warn!(
            "report: {} threads without self-identity, {} without timestamps",
            anomalies.threads_without_self.len(),
            anomalies.threads_without_timestamps.len()
        );
    }

    ReportModel {
        overview: overview(self_identity, threads, &outcomes),
        load_summary: load,
        anomalies,
        funnel: compute_funnel(&outcomes, config.quick_response_hours),
        ghosted_contacts: ghosted_contacts(&contacts),
        contacts,
        categories: category_stats(threads, &outcomes),
        sales_comparison: sales_comparison(&outcomes),
        starters: starter_analysis(&outcomes, config.best_starters),
        direction_comparison: direction_comparison(threads),
        top_templates,
        threads: detail_rows,
    }
}

fn overview(self_identity: &str, threads: &[Thread], outcomes: &[ThreadOutcome]) -> Overview {
    let messages = || threads.iter().flat_map(|t| t.messages.iter());
    let outbound = messages().filter(|m| m.is_outbound()).count();
    let total = messages().count();

    let mut contacts: Vec<&str> = messages().map(|m| m.contact.as_str()).filter(|c| !c.is_empty()).collect();
    contacts.sort_unstable();
    contacts.dedup();

    let avg_sentiment = mean(messages().filter(|m| m.is_outbound()).filter_map(|m| m.sentiment));

    Overview {
        self_identity: self_identity.to_string(),
        total_messages: total,
        outbound_messages: outbound,
        inbound_messages: total - outbound,
        total_threads: threads.len(),
        self_initiated_threads: outcomes.len(),
        other_initiated_threads: threads
            .iter()
            .filter(|t| t.self_present && t.has_sortable() && !t.initiated_by_self)
            .count(),
        unique_contacts: contacts.len(),
        sales_messages: messages().filter(|m| m.category.is_some_and(|c| c.is_sales())).count(),
        first_message_at: messages().filter_map(|m| m.timestamp()).min(),
        last_message_at: messages().filter_map(|m| m.timestamp()).max(),
        avg_outbound_sentiment: avg_sentiment,
        outbound_sentiment_label: avg_sentiment.map(|s| sentiment_label(s).to_string()),
    }
}

fn thread_details(threads: &[Thread], outcomes: &[ThreadOutcome], clusters: &[TemplateCluster]) -> Vec<ThreadDetail> {
    threads
        .iter()
        .map(|thread| {
            let outcome = outcomes.iter().find(|o| o.thread_id == thread.thread_id);
            let template_id = clusters
                .iter()
                .find(|c| c.thread_ids.contains(&thread.thread_id))
                .map(|c| c.id.clone());
            let contact = outcome
                .map(|o| o.contact.clone())
                .or_else(|| thread.messages.first().map(|m| m.contact.clone()));
            let outbound_count = thread.outbound_count();

            ThreadDetail {
                thread_id: thread.thread_id.clone(),
                conversation_title: thread.messages.iter().find_map(|m| m.record.conversation_title.clone()),
                contact,
                message_count: thread.messages.len(),
                outbound_count,
                inbound_count: thread.messages.len() - outbound_count,
                initiated_by_self: thread.initiated_by_self,
                self_present: thread.self_present,
                first_message_at: thread.sortable().next().and_then(|m| m.timestamp()),
                last_message_at: thread.sortable().last().and_then(|m| m.timestamp()),
                first_category: outcome.map(|o| o.first_category),
                starter_type: outcome.map(|o| o.starter_type),
                replied: outcome.map(|o| o.replied),
                response_time_hours: outcome.and_then(|o| o.response_time_hours()),
                follow_up_count: outcome.map(|o| o.follow_up_count),
                template_id,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::{build_threads, classify_directions};
    use crate::types::Record;
    use chrono::TimeZone;

    fn make_record(row: usize, thread: &str, from: &str, to: &str, hour: Option<u32>, content: &str) -> Record {
        Record {
            row_index: row,
            thread_id: thread.to_string(),
            sender: from.to_string(),
            recipient: to.to_string(),
            timestamp: hour.map(|h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()),
            content: content.to_string(),
            sender_profile_url: None,
            recipient_profile_urls: None,
            conversation_title: None,
            attachments: None,
        }
    }

    fn sample_threads() -> Vec<Thread> {
        let records = vec![
            make_record(0, "T1", "Alice", "Bob", Some(10), "Hi Bob"),
            make_record(1, "T1", "Bob", "Alice", Some(12), "Hey"),
            make_record(2, "T2", "Carol", "Alice", Some(9), "Hello Alice"),
            make_record(3, "T3", "Dave", "Erin", Some(9), "Unrelated"),
            make_record(4, "T4", "Alice", "Frank", None, "Undated"),
        ];
        let mut messages = classify_directions(records, "Alice");
        for m in messages.iter_mut().filter(|m| m.is_outbound()) {
            m.category = Some(SalesCategory::None);
        }
        build_threads(messages, "Alice")
    }

    #[test]
    fn test_build_report_overview_and_anomalies() {
        let threads = sample_threads();
        let report = build_report("Alice", LoadSummary::default(), &threads, &AnalyzerConfig::default());

        assert_eq!(report.overview.total_messages, 5);
        assert_eq!(report.overview.outbound_messages, 2);
        assert_eq!(report.overview.total_threads, 4);
        assert_eq!(report.overview.self_initiated_threads, 1);
        // T3 never involves Alice, so it is not "started by others"
        assert_eq!(report.overview.other_initiated_threads, 1);
        assert_eq!(report.anomalies.threads_without_self, vec!["T3"]);
        assert_eq!(report.anomalies.threads_without_timestamps, vec!["T4"]);
        assert_eq!(report.funnel.threads_initiated, 1);
        assert_eq!(report.contacts.len(), 1);
        assert_eq!(report.top_templates.len(), 1);
    }

    #[test]
    fn test_thread_details_cover_every_thread() {
        let threads = sample_threads();
        let report = build_report("Alice", LoadSummary::default(), &threads, &AnalyzerConfig::default());
        let ids: Vec<&str> = report.threads.iter().map(|t| t.thread_id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T3", "T4"]);

        let t1 = &report.threads[0];
        assert_eq!(t1.replied, Some(true));
        assert_eq!(t1.response_time_hours, Some(2.0));
        assert!(t1.template_id.is_some());

        let t2 = &report.threads[1];
        assert_eq!(t2.replied, None);
        assert_eq!(t2.contact.as_deref(), Some("Carol"));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let threads = sample_threads();
        let report = build_report("Alice", LoadSummary::default(), &threads, &AnalyzerConfig::default());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["loadSummary"]["rowsRead"].is_number());
        assert_eq!(json["contacts"][0]["contactId"], "Bob");
        assert_eq!(json["categories"][0]["category"], "meeting_request");
        assert_eq!(json["starters"]["byType"][0]["starterType"], "greeting");
        assert_eq!(json["threads"][0]["starterType"], "greeting");
        assert!(json["directionComparison"]["inbound"]["avgLength"].is_number());
    }

    #[test]
    fn test_report_starters_and_direction_comparison() {
        let threads = sample_threads();
        let report = build_report("Alice", LoadSummary::default(), &threads, &AnalyzerConfig::default());

        assert_eq!(report.starters.total_starters, 1);
        assert_eq!(report.starters.best_starters.len(), 1);
        assert_eq!(report.starters.best_starters[0].thread_id, "T1");
        assert_eq!(report.threads[1].starter_type, None);

        // T3 has no Alice, so only Bob's and Carol's messages are inbound
        assert_eq!(report.direction_comparison.outbound.messages, 2);
        assert_eq!(report.direction_comparison.inbound.messages, 2);
    }
}
