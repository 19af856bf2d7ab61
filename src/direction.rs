//! Direction classification and thread reconstruction.
//!
//! A message is outbound iff its sender equals the self-identity after
//! trimming and case-folding. Threads are ordered by timestamp ascending,
//! unparseable timestamps last, with `row_index` as the explicit tie-break.

use std::collections::{BTreeMap, HashMap};

use crate::types::{Direction, Message, Record, Thread};

/// Canonical form used for every identity comparison.
pub fn normalize_identity(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn is_self(name: &str, identity: &str) -> bool {
    !identity.is_empty() && normalize_identity(name) == identity
}

/// Guess the exporting user: the most frequent sender. Ties are broken
/// alphabetically on the normalized name. Returns the sender as first seen.
pub fn identify_self(records: &[Record]) -> Option<String> {
    let mut counts: HashMap<String, (usize, &str)> = HashMap::new();
    for record in records {
        let key = normalize_identity(&record.sender);
        if key.is_empty() {
            continue;
        }
        counts.entry(key).or_insert((0, record.sender.trim())).0 += 1;
    }

    let (key, (count, display)) = counts
        .iter()
        .max_by(|(ka, (ca, _)), (kb, (cb, _))| ca.cmp(cb).then_with(|| kb.cmp(ka)))?;

    log::info!("direction: identified self as '{}' ({} messages sent)", display, count);
    log::debug!("direction: self key '{}'", key);
    Some(display.to_string())
}

/// Attach direction and contact to every record. Contacts compare like
/// identities; each keeps the spelling it was first seen with.
pub fn classify_directions(records: Vec<Record>, self_identity: &str) -> Vec<Message> {
    let identity = normalize_identity(self_identity);
    let mut display_names: HashMap<String, String> = HashMap::new();
    records
        .into_iter()
        .map(|record| {
            let (direction, other) = if is_self(&record.sender, &identity) {
                (Direction::Outbound, record.recipient.as_str())
            } else {
                (Direction::Inbound, record.sender.as_str())
            };
            let contact = display_names
                .entry(normalize_identity(other))
                .or_insert_with(|| other.trim().to_string())
                .clone();
            Message {
                record,
                direction,
                contact,
                category: None,
                sentiment: None,
            }
        })
        .collect()
}

/// Group messages into threads ordered by thread id.
pub fn build_threads(messages: Vec<Message>, self_identity: &str) -> Vec<Thread> {
    let identity = normalize_identity(self_identity);
    let mut grouped: BTreeMap<String, Vec<Message>> = BTreeMap::new();
    for message in messages {
        grouped
            .entry(message.record.thread_id.clone())
            .or_default()
            .push(message);
    }

    grouped
        .into_iter()
        .map(|(thread_id, mut messages)| {
            messages.sort_by_key(|m| (m.timestamp().is_none(), m.timestamp(), m.record.row_index));

            let self_present = messages
                .iter()
                .any(|m| is_self(&m.record.sender, &identity) || is_self(&m.record.recipient, &identity));
            let initiated_by_self = messages
                .iter()
                .find(|m| m.timestamp().is_some())
                .map(|m| m.is_outbound())
                .unwrap_or(false);

            if !self_present {
                log::warn!(
                    "direction: thread {} never involves '{}', excluded from outbound analysis",
                    thread_id,
                    self_identity
                );
            } else if !messages.iter().any(|m| m.timestamp().is_some()) {
                log::debug!("direction: thread {} has no sortable timestamps", thread_id);
            }

            Thread {
                thread_id,
                messages,
                initiated_by_self: initiated_by_self && self_present,
                self_present,
            }
        })
        .collect()
}
