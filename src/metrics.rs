//! Outbound performance metrics.
//!
//! Only threads the user started count. For each one:
//! - reply: first inbound message with a sortable timestamp strictly after
//!   the first outbound message
//! - response time: first outbound → reply, `None` without a reply
//! - follow-ups: outbound messages after the first and before the reply
//!
//! Messages without a timestamp take no part in timing or follow-up counts.
//! Outcomes roll up per contact, per sales category, per starter type, and
//! into the overall funnel.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sentiment::mean;
use crate::starters::{classify_starter, performance_score, MessageFeatures, StarterType};
use crate::types::{Direction, Message, SalesCategory, Thread};

const SECS_PER_HOUR: f64 = 3600.0;

/// Per-thread result for a self-initiated thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadOutcome {
    pub thread_id: String,
    pub contact: String,
    pub first_outbound_at: DateTime<Utc>,
    pub replied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replied_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_secs: Option<i64>,
    pub follow_up_count: usize,
    pub first_category: SalesCategory,
    pub first_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_sentiment: Option<f64>,
    pub starter_type: StarterType,
    pub first_features: MessageFeatures,
}

impl ThreadOutcome {
    pub fn response_time_hours(&self) -> Option<f64> {
        self.response_time_secs.map(|s| s as f64 / SECS_PER_HOUR)
    }
}

/// Outcome for one thread, `None` unless the user started it.
pub fn thread_outcome(thread: &Thread) -> Option<ThreadOutcome> {
    if !thread.initiated_by_self {
        return None;
    }
    let sortable: Vec<&Message> = thread.sortable().collect();
    let first_idx = sortable.iter().position(|m| m.is_outbound())?;
    let first = sortable[first_idx];
    let first_at = first.timestamp()?;

    let reply_idx = sortable
        .iter()
        .enumerate()
        .skip(first_idx + 1)
        .find(|(_, m)| !m.is_outbound() && m.timestamp().is_some_and(|ts| ts > first_at))
        .map(|(idx, _)| idx);

    let follow_up_end = reply_idx.unwrap_or(sortable.len());
    let follow_up_count = sortable[first_idx + 1..follow_up_end]
        .iter()
        .filter(|m| m.is_outbound())
        .count();

    let replied_at = reply_idx.and_then(|idx| sortable[idx].timestamp());

    Some(ThreadOutcome {
        thread_id: thread.thread_id.clone(),
        contact: first.contact.clone(),
        first_outbound_at: first_at,
        replied: replied_at.is_some(),
        replied_at,
        response_time_secs: replied_at.map(|at| (at - first_at).num_seconds()),
        follow_up_count,
        first_category: first.category.unwrap_or(SalesCategory::None),
        first_content: first.content().to_string(),
        first_sentiment: first.sentiment,
        starter_type: classify_starter(first.content()),
        first_features: MessageFeatures::of(first.content()),
    })
}

/// Outcomes for every self-initiated thread, in thread order.
pub fn compute_outcomes(threads: &[Thread]) -> Vec<ThreadOutcome> {
    threads.iter().filter_map(thread_outcome).collect()
}

/// Per-contact rollup. Contacts the user never started a thread with are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub contact_id: String,
    pub threads_initiated: usize,
    pub threads_replied: usize,
    pub response_rate: f64,
    pub avg_response_time_hours: Option<f64>,
    pub top_category: Option<SalesCategory>,
    pub messages_sent: usize,
    pub total_follow_ups: usize,
    pub avg_sentiment: Option<f64>,
    pub last_contacted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct ContactAccumulator {
    initiated: usize,
    replied: usize,
    response_secs: Vec<i64>,
    categories: HashMap<SalesCategory, usize>,
    messages_sent: usize,
    follow_ups: usize,
    sentiments: Vec<f64>,
    last_contacted_at: Option<DateTime<Utc>>,
}

/// Summaries ordered by threads initiated (desc), then contact id.
pub fn summarize_contacts(threads: &[Thread], outcomes: &[ThreadOutcome]) -> Vec<ContactSummary> {
    let by_thread: HashMap<&str, &Thread> = threads.iter().map(|t| (t.thread_id.as_str(), t)).collect();
    let mut contacts: BTreeMap<&str, ContactAccumulator> = BTreeMap::new();

    for outcome in outcomes {
        let acc = contacts.entry(outcome.contact.as_str()).or_default();
        acc.initiated += 1;
        acc.follow_ups += outcome.follow_up_count;
        if outcome.replied {
            acc.replied += 1;
        }
        if let Some(secs) = outcome.response_time_secs {
            acc.response_secs.push(secs);
        }

        let Some(thread) = by_thread.get(outcome.thread_id.as_str()) else {
            continue;
        };
        for message in thread.messages.iter().filter(|m| m.is_outbound()) {
            acc.messages_sent += 1;
            if let Some(category) = message.category.filter(|c| c.is_sales()) {
                *acc.categories.entry(category).or_insert(0) += 1;
            }
            if let Some(score) = message.sentiment {
                acc.sentiments.push(score);
            }
            if let Some(ts) = message.timestamp() {
                acc.last_contacted_at = acc.last_contacted_at.max(Some(ts));
            }
        }
    }

    let mut summaries: Vec<ContactSummary> = contacts
        .into_iter()
        .map(|(contact, acc)| ContactSummary {
            contact_id: contact.to_string(),
            threads_initiated: acc.initiated,
            threads_replied: acc.replied,
            response_rate: acc.replied as f64 / acc.initiated as f64,
            avg_response_time_hours: mean(acc.response_secs.iter().map(|&s| s as f64 / SECS_PER_HOUR)),
            top_category: top_category(&acc.categories),
            messages_sent: acc.messages_sent,
            total_follow_ups: acc.follow_ups,
            avg_sentiment: mean(acc.sentiments.iter().copied()),
            last_contacted_at: acc.last_contacted_at,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.threads_initiated
            .cmp(&a.threads_initiated)
            .then_with(|| a.contact_id.cmp(&b.contact_id))
    });
    summaries
}

/// Most frequent sales category; ties go to the higher-priority category.
fn top_category(counts: &HashMap<SalesCategory, usize>) -> Option<SalesCategory> {
    SalesCategory::PRIORITY
        .iter()
        .filter_map(|c| counts.get(c).map(|&n| (*c, n)))
        .fold(None, |best: Option<(SalesCategory, usize)>, (c, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((c, n)),
        })
        .map(|(c, _)| c)
}

/// Contacts the user reached out to who never replied, alphabetical.
pub fn ghosted_contacts(contacts: &[ContactSummary]) -> Vec<String> {
    let mut ghosted: Vec<String> = contacts
        .iter()
        .filter(|c| c.threads_initiated > 0 && c.threads_replied == 0)
        .map(|c| c.contact_id.clone())
        .collect();
    ghosted.sort();
    ghosted
}

/// Overall outbound funnel across every self-initiated thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundFunnel {
    pub threads_initiated: usize,
    pub threads_replied: usize,
    pub response_rate: Option<f64>,
    pub avg_response_time_hours: Option<f64>,
    pub median_response_time_hours: Option<f64>,
    pub p90_response_time_hours: Option<f64>,
    pub quick_response_hours: f64,
    pub quick_replies: usize,
    pub quick_reply_share: Option<f64>,
    pub avg_follow_ups: Option<f64>,
    pub replies_after_follow_up: usize,
    pub follow_up_reply_share: Option<f64>,
}

pub fn compute_funnel(outcomes: &[ThreadOutcome], quick_response_hours: f64) -> OutboundFunnel {
    let initiated = outcomes.len();
    let replied: Vec<&ThreadOutcome> = outcomes.iter().filter(|o| o.replied).collect();

    let mut response_secs: Vec<i64> = replied.iter().filter_map(|o| o.response_time_secs).collect();
    response_secs.sort_unstable();

    let quick_limit = quick_response_hours * SECS_PER_HOUR;
    let quick_replies = response_secs.iter().filter(|&&s| (s as f64) <= quick_limit).count();
    let replies_after_follow_up = replied.iter().filter(|o| o.follow_up_count > 0).count();

    OutboundFunnel {
        threads_initiated: initiated,
        threads_replied: replied.len(),
        response_rate: ratio(replied.len(), initiated),
        avg_response_time_hours: mean(response_secs.iter().map(|&s| s as f64 / SECS_PER_HOUR)),
        median_response_time_hours: percentile(&response_secs, 50.0).map(|s| s as f64 / SECS_PER_HOUR),
        p90_response_time_hours: percentile(&response_secs, 90.0).map(|s| s as f64 / SECS_PER_HOUR),
        quick_response_hours,
        quick_replies,
        quick_reply_share: ratio(quick_replies, replied.len()),
        avg_follow_ups: mean(outcomes.iter().map(|o| o.follow_up_count as f64)),
        replies_after_follow_up,
        follow_up_reply_share: ratio(replies_after_follow_up, replied.len()),
    }
}

/// Per-category performance, in report order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: SalesCategory,
    pub label: String,
    /// Outbound messages with this category in self-initiated threads.
    pub outbound_messages: usize,
    /// Self-initiated threads whose first message has this category.
    pub first_messages: usize,
    pub threads_replied: usize,
    pub response_rate: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub avg_length: Option<f64>,
}

pub fn category_stats(threads: &[Thread], outcomes: &[ThreadOutcome]) -> Vec<CategoryStats> {
    SalesCategory::ALL
        .iter()
        .map(|&category| {
            let outbound: Vec<&Message> = threads
                .iter()
                .filter(|t| t.initiated_by_self)
                .flat_map(|t| t.messages.iter())
                .filter(|m| m.is_outbound() && m.category == Some(category))
                .collect();
            let firsts: Vec<&ThreadOutcome> =
                outcomes.iter().filter(|o| o.first_category == category).collect();
            let replied = firsts.iter().filter(|o| o.replied).count();

            CategoryStats {
                category,
                label: category.label().to_string(),
                outbound_messages: outbound.len(),
                first_messages: firsts.len(),
                threads_replied: replied,
                response_rate: ratio(replied, firsts.len()),
                avg_sentiment: mean(outbound.iter().filter_map(|m| m.sentiment)),
                avg_length: mean(outbound.iter().map(|m| m.content().chars().count() as f64)),
            }
        })
        .collect()
}

/// Sales-categorized openers against uncategorized ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesComparison {
    pub sales_threads: usize,
    pub sales_replied: usize,
    pub sales_response_rate: Option<f64>,
    pub non_sales_threads: usize,
    pub non_sales_replied: usize,
    pub non_sales_response_rate: Option<f64>,
    /// Sales rate minus non-sales rate, when both exist.
    pub difference: Option<f64>,
}

pub fn sales_comparison(outcomes: &[ThreadOutcome]) -> SalesComparison {
    let (sales, non_sales): (Vec<&ThreadOutcome>, Vec<&ThreadOutcome>) =
        outcomes.iter().partition(|o| o.first_category.is_sales());
    let sales_replied = sales.iter().filter(|o| o.replied).count();
    let non_sales_replied = non_sales.iter().filter(|o| o.replied).count();
    let sales_rate = ratio(sales_replied, sales.len());
    let non_sales_rate = ratio(non_sales_replied, non_sales.len());

    SalesComparison {
        sales_threads: sales.len(),
        sales_replied,
        sales_response_rate: sales_rate,
        non_sales_threads: non_sales.len(),
        non_sales_replied,
        non_sales_response_rate: non_sales_rate,
        difference: sales_rate.zip(non_sales_rate).map(|(s, n)| s - n),
    }
}

/// Performance of one starter type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterTypeStats {
    pub starter_type: StarterType,
    pub label: String,
    pub starters: usize,
    pub replied: usize,
    pub response_rate: f64,
    /// Over replied starters only.
    pub avg_response_time_hours: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub avg_length: Option<f64>,
}

/// A replied opener with its ranking score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredStarter {
    pub thread_id: String,
    pub contact: String,
    pub starter_type: StarterType,
    pub content: String,
    pub score: f64,
    pub response_time_hours: Option<f64>,
    pub features: MessageFeatures,
}

/// How the first messages of self-initiated threads performed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterAnalysis {
    pub total_starters: usize,
    pub successful_starters: usize,
    pub response_rate: Option<f64>,
    pub avg_length: Option<f64>,
    pub avg_sentiment: Option<f64>,
    /// Types with at least one starter, in cascade order.
    pub by_type: Vec<StarterTypeStats>,
    /// Highest-scoring replied starters; ties go to the lower thread id.
    pub best_starters: Vec<ScoredStarter>,
}

pub fn starter_analysis(outcomes: &[ThreadOutcome], best_limit: usize) -> StarterAnalysis {
    let by_type = StarterType::ALL
        .iter()
        .filter_map(|&starter_type| {
            let group: Vec<&ThreadOutcome> = outcomes.iter().filter(|o| o.starter_type == starter_type).collect();
            if group.is_empty() {
                return None;
            }
            let replied = group.iter().filter(|o| o.replied).count();
            Some(StarterTypeStats {
                starter_type,
                label: starter_type.label().to_string(),
                starters: group.len(),
                replied,
                response_rate: replied as f64 / group.len() as f64,
                avg_response_time_hours: mean(group.iter().filter_map(|o| o.response_time_hours())),
                avg_sentiment: mean(group.iter().filter_map(|o| o.first_sentiment)),
                avg_length: mean(group.iter().map(|o| o.first_features.length as f64)),
            })
        })
        .collect();

    let mut best: Vec<ScoredStarter> = outcomes
        .iter()
        .filter(|o| o.replied)
        .map(|o| ScoredStarter {
            thread_id: o.thread_id.clone(),
            contact: o.contact.clone(),
            starter_type: o.starter_type,
            content: o.first_content.clone(),
            score: performance_score(o.replied, o.first_sentiment, &o.first_features),
            response_time_hours: o.response_time_hours(),
            features: o.first_features.clone(),
        })
        .collect();
    best.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.thread_id.cmp(&b.thread_id)));
    best.truncate(best_limit);

    let successful = outcomes.iter().filter(|o| o.replied).count();
    StarterAnalysis {
        total_starters: outcomes.len(),
        successful_starters: successful,
        response_rate: ratio(successful, outcomes.len()),
        avg_length: mean(outcomes.iter().map(|o| o.first_features.length as f64)),
        avg_sentiment: mean(outcomes.iter().filter_map(|o| o.first_sentiment)),
        by_type,
        best_starters: best,
    }
}

/// Message shape and tone for one direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionStats {
    pub messages: usize,
    pub avg_length: Option<f64>,
    pub avg_word_count: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub with_question: usize,
    pub with_greeting: usize,
    pub with_url: usize,
    pub with_profile_link: usize,
}

/// Sent against received messages across every thread the user takes part in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionComparison {
    pub outbound: DirectionStats,
    pub inbound: DirectionStats,
    /// Outbound minus inbound average length, when both exist.
    pub length_difference: Option<f64>,
    /// Outbound minus inbound average sentiment, when both exist.
    pub sentiment_difference: Option<f64>,
}

pub fn direction_comparison(threads: &[Thread]) -> DirectionComparison {
    let stats_for = |direction: Direction| {
        let messages: Vec<&Message> = threads
            .iter()
            .filter(|t| t.self_present)
            .flat_map(|t| t.messages.iter())
            .filter(|m| m.direction == direction)
            .collect();
        let features: Vec<MessageFeatures> = messages.iter().map(|m| MessageFeatures::of(m.content())).collect();
        DirectionStats {
            messages: messages.len(),
            avg_length: mean(features.iter().map(|f| f.length as f64)),
            avg_word_count: mean(features.iter().map(|f| f.word_count as f64)),
            avg_sentiment: mean(messages.iter().filter_map(|m| m.sentiment)),
            with_question: features.iter().filter(|f| f.question_count > 0).count(),
            with_greeting: features.iter().filter(|f| f.has_greeting).count(),
            with_url: features.iter().filter(|f| f.has_url).count(),
            with_profile_link: features.iter().filter(|f| f.has_profile_link).count(),
        }
    };
    let outbound = stats_for(Direction::Outbound);
    let inbound = stats_for(Direction::Inbound);

    DirectionComparison {
        length_difference: outbound.avg_length.zip(inbound.avg_length).map(|(o, i)| o - i),
        sentiment_difference: outbound.avg_sentiment.zip(inbound.avg_sentiment).map(|(o, i)| o - i),
        outbound,
        inbound,
    }
}

/// `num / den`, `None` when the denominator is zero.
pub fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// Nearest-rank percentile over sorted values.
fn percentile(values: &[i64], p: f64) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    let rank = ((p / 100.0) * n as f64).ceil() as usize;
    let idx = rank.saturating_sub(1).min(n - 1);
    Some(values[idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::{build_threads, classify_directions};
    use crate::types::Record;
    use chrono::TimeZone;

    fn at(h: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap())
    }

    fn make_record(row: usize, thread: &str, from: &str, to: &str, ts: Option<DateTime<Utc>>) -> Record {
        Record {
            row_index: row,
            thread_id: thread.to_string(),
            sender: from.to_string(),
            recipient: to.to_string(),
            timestamp: ts,
            content: format!("msg {}", row),
            sender_profile_url: None,
            recipient_profile_urls: None,
            conversation_title: None,
            attachments: None,
        }
    }

    fn threads_for(records: Vec<Record>) -> Vec<Thread> {
        let mut messages = classify_directions(records, "Alice");
        for m in messages.iter_mut().filter(|m| m.is_outbound()) {
            m.category = Some(SalesCategory::None);
        }
        build_threads(messages, "Alice")
    }

    #[test]
    fn test_reply_and_response_time() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(10)),
            make_record(1, "T1", "Bob", "Alice", at(12)),
        ]);
        let outcome = thread_outcome(&threads[0]).unwrap();
        assert!(outcome.replied);
        assert_eq!(outcome.response_time_secs, Some(2 * 3600));
        assert_eq!(outcome.response_time_hours(), Some(2.0));
        assert_eq!(outcome.follow_up_count, 0);
        assert_eq!(outcome.contact, "Bob");
    }

    #[test]
    fn test_follow_ups_before_reply() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(8)),
            make_record(1, "T1", "Alice", "Bob", at(9)),
            make_record(2, "T1", "Alice", "Bob", at(10)),
            make_record(3, "T1", "Bob", "Alice", at(11)),
            make_record(4, "T1", "Alice", "Bob", at(12)),
        ]);
        let outcome = thread_outcome(&threads[0]).unwrap();
        assert_eq!(outcome.follow_up_count, 2);
        assert_eq!(outcome.response_time_secs, Some(3 * 3600));
    }

    #[test]
    fn test_no_reply_counts_follow_ups_to_end() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(8)),
            make_record(1, "T1", "Alice", "Bob", at(9)),
            make_record(2, "T1", "Alice", "Bob", None),
        ]);
        let outcome = thread_outcome(&threads[0]).unwrap();
        assert!(!outcome.replied);
        assert_eq!(outcome.response_time_secs, None);
        assert_eq!(outcome.follow_up_count, 1);
    }

    #[test]
    fn test_same_instant_inbound_is_not_a_reply() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(10)),
            make_record(1, "T1", "Bob", "Alice", at(10)),
        ]);
        assert!(!thread_outcome(&threads[0]).unwrap().replied);
    }

    #[test]
    fn test_undated_inbound_is_not_a_reply() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(10)),
            make_record(1, "T1", "Bob", "Alice", None),
        ]);
        assert!(!thread_outcome(&threads[0]).unwrap().replied);
    }

    #[test]
    fn test_inbound_initiated_thread_is_excluded() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Bob", "Alice", at(9)),
            make_record(1, "T1", "Alice", "Bob", at(10)),
        ]);
        assert!(thread_outcome(&threads[0]).is_none());
        assert!(compute_outcomes(&threads).is_empty());
    }

    #[test]
    fn test_contact_rate_two_threads_one_reply() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(8)),
            make_record(1, "T1", "Bob", "Alice", at(9)),
            make_record(2, "T2", "Alice", "Bob", at(10)),
            make_record(3, "T3", "Carol", "Alice", at(10)),
        ]);
        let outcomes = compute_outcomes(&threads);
        let contacts = summarize_contacts(&threads, &outcomes);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].contact_id, "Bob");
        assert_eq!(contacts[0].threads_initiated, 2);
        assert_eq!(contacts[0].threads_replied, 1);
        assert_eq!(contacts[0].response_rate, 0.5);
        assert_eq!(contacts[0].avg_response_time_hours, Some(1.0));
        assert!(contacts.iter().all(|c| c.contact_id != "Carol"));
    }

    #[test]
    fn test_contacts_group_case_insensitively() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(8)),
            make_record(1, "T2", "Alice", "bob", at(9)),
            make_record(2, "T2", "BOB ", "Alice", at(10)),
        ]);
        let outcomes = compute_outcomes(&threads);
        let contacts = summarize_contacts(&threads, &outcomes);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].contact_id, "Bob");
        assert_eq!(contacts[0].threads_initiated, 2);
        assert_eq!(contacts[0].threads_replied, 1);
    }

    #[test]
    fn test_top_category_ties_follow_priority() {
        let mut counts = HashMap::new();
        counts.insert(SalesCategory::ServiceOffering, 2);
        counts.insert(SalesCategory::Recruiting, 2);
        counts.insert(SalesCategory::GeneralBusiness, 1);
        assert_eq!(top_category(&counts), Some(SalesCategory::Recruiting));
        assert_eq!(top_category(&HashMap::new()), None);
    }

    #[test]
    fn test_contacts_sorted_by_initiated_then_id() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Zoe", at(8)),
            make_record(1, "T2", "Alice", "Zoe", at(8)),
            make_record(2, "T3", "Alice", "Bob", at(8)),
            make_record(3, "T4", "Alice", "Amy", at(8)),
        ]);
        let outcomes = compute_outcomes(&threads);
        let ids: Vec<String> = summarize_contacts(&threads, &outcomes)
            .into_iter()
            .map(|c| c.contact_id)
            .collect();
        assert_eq!(ids, vec!["Zoe", "Amy", "Bob"]);
    }

    #[test]
    fn test_funnel_and_ghosted() {
        let threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(0)),
            make_record(1, "T1", "Bob", "Alice", at(1)),
            make_record(2, "T2", "Alice", "Carol", at(0)),
            make_record(3, "T2", "Alice", "Carol", at(1)),
            make_record(4, "T2", "Carol", "Alice", at(23)),
            make_record(5, "T3", "Alice", "Dave", at(0)),
        ]);
        let outcomes = compute_outcomes(&threads);
        let funnel = compute_funnel(&outcomes, 2.0);
        assert_eq!(funnel.threads_initiated, 3);
        assert_eq!(funnel.threads_replied, 2);
        assert_eq!(funnel.response_rate, Some(2.0 / 3.0));
        assert_eq!(funnel.avg_response_time_hours, Some(12.0));
        assert_eq!(funnel.median_response_time_hours, Some(1.0));
        assert_eq!(funnel.quick_replies, 1);
        assert_eq!(funnel.quick_reply_share, Some(0.5));
        assert_eq!(funnel.replies_after_follow_up, 1);

        let contacts = summarize_contacts(&threads, &outcomes);
        assert_eq!(ghosted_contacts(&contacts), vec!["Dave"]);
    }

    #[test]
    fn test_empty_funnel_has_no_rates() {
        let funnel = compute_funnel(&[], 24.0);
        assert_eq!(funnel.threads_initiated, 0);
        assert_eq!(funnel.response_rate, None);
        assert_eq!(funnel.median_response_time_hours, None);
    }

    #[test]
    fn test_category_stats_and_sales_comparison() {
        let mut threads = threads_for(vec![
            make_record(0, "T1", "Alice", "Bob", at(0)),
            make_record(1, "T1", "Bob", "Alice", at(1)),
            make_record(2, "T2", "Alice", "Carol", at(0)),
        ]);
        threads[0].messages[0].category = Some(SalesCategory::MeetingRequest);
        let outcomes = compute_outcomes(&threads);

        let stats = category_stats(&threads, &outcomes);
        assert_eq!(stats.len(), SalesCategory::ALL.len());
        assert_eq!(stats[0].category, SalesCategory::MeetingRequest);
        assert_eq!(stats[0].first_messages, 1);
        assert_eq!(stats[0].response_rate, Some(1.0));
        assert_eq!(stats[1].response_rate, None);
        assert_eq!(stats[5].first_messages, 1);

        let comparison = sales_comparison(&outcomes);
        assert_eq!(comparison.sales_response_rate, Some(1.0));
        assert_eq!(comparison.non_sales_response_rate, Some(0.0));
        assert_eq!(comparison.difference, Some(1.0));
    }

    #[test]
    fn test_category_stats_skip_threads_started_by_others() {
        let mut threads = threads_for(vec![
            make_record(0, "T1", "Carol", "Alice", at(9)),
            make_record(1, "T1", "Alice", "Carol", at(10)),
        ]);
        threads[0].messages[1].category = Some(SalesCategory::MeetingRequest);
        threads[0].messages[1].sentiment = Some(1.0);
        let outcomes = compute_outcomes(&threads);
        assert!(outcomes.is_empty());

        let stats = category_stats(&threads, &outcomes);
        let meeting = &stats[0];
        assert_eq!(meeting.category, SalesCategory::MeetingRequest);
        assert_eq!(meeting.outbound_messages, 0);
        assert_eq!(meeting.avg_sentiment, None);
        assert_eq!(meeting.avg_length, None);
    }

    fn with_content(mut record: Record, content: &str) -> Record {
        record.content = content.to_string();
        record
    }

    #[test]
    fn test_starter_analysis_by_type_and_best() {
        let threads = threads_for(vec![
            with_content(make_record(0, "T1", "Alice", "Bob", at(8)), "Thanks for the intro!"),
            make_record(1, "T1", "Bob", "Alice", at(9)),
            with_content(make_record(2, "T2", "Alice", "Carol", at(8)), "Hi Carol, got a minute?"),
            make_record(3, "T2", "Carol", "Alice", at(10)),
            with_content(make_record(4, "T3", "Alice", "Dave", at(8)), "Hi Dave"),
        ]);
        let outcomes = compute_outcomes(&threads);
        let analysis = starter_analysis(&outcomes, 10);

        assert_eq!(analysis.total_starters, 3);
        assert_eq!(analysis.successful_starters, 2);
        assert_eq!(analysis.response_rate, Some(2.0 / 3.0));

        let types: Vec<StarterType> = analysis.by_type.iter().map(|t| t.starter_type).collect();
        assert_eq!(types, vec![StarterType::ThankYou, StarterType::Greeting]);
        let greeting = &analysis.by_type[1];
        assert_eq!(greeting.starters, 2);
        assert_eq!(greeting.replied, 1);
        assert_eq!(greeting.response_rate, 0.5);
        assert_eq!(greeting.avg_response_time_hours, Some(2.0));
        assert_eq!(greeting.avg_length, Some(15.0));

        // The question mark lifts T2 above T1; T3 never replied
        let best: Vec<&str> = analysis.best_starters.iter().map(|s| s.thread_id.as_str()).collect();
        assert_eq!(best, vec!["T2", "T1"]);
        assert!(analysis.best_starters[0].score > analysis.best_starters[1].score);
        assert_eq!(starter_analysis(&outcomes, 1).best_starters.len(), 1);
    }

    #[test]
    fn test_starter_analysis_empty() {
        let analysis = starter_analysis(&[], 10);
        assert_eq!(analysis.total_starters, 0);
        assert_eq!(analysis.response_rate, None);
        assert!(analysis.by_type.is_empty());
        assert!(analysis.best_starters.is_empty());
    }

    #[test]
    fn test_direction_comparison_skips_threads_without_self() {
        let mut threads = threads_for(vec![
            with_content(make_record(0, "T1", "Alice", "Bob", at(8)), "Hello Bob, see https://linkedin.com/in/alice"),
            with_content(make_record(1, "T1", "Bob", "Alice", at(9)), "ok"),
            with_content(make_record(2, "T2", "Dave", "Erin", at(9)), "unrelated chatter"),
        ]);
        threads[0].messages[0].sentiment = Some(0.5);
        threads[0].messages[1].sentiment = Some(-0.5);

        let comparison = direction_comparison(&threads);
        assert_eq!(comparison.outbound.messages, 1);
        assert_eq!(comparison.outbound.with_greeting, 1);
        assert_eq!(comparison.outbound.with_url, 1);
        assert_eq!(comparison.outbound.with_profile_link, 1);
        assert_eq!(comparison.inbound.messages, 1);
        assert_eq!(comparison.inbound.avg_length, Some(2.0));
        assert_eq!(comparison.inbound.avg_word_count, Some(1.0));
        assert_eq!(comparison.length_difference, Some(42.0));
        assert_eq!(comparison.sentiment_difference, Some(1.0));
    }

    #[test]
    fn test_percentile_nearest_rank() {
        assert_eq!(percentile(&[1, 2, 3, 4], 50.0), Some(2));
        assert_eq!(percentile(&[5], 90.0), Some(5));
        assert_eq!(percentile(&[], 50.0), None);
    }
}
