//! Template clustering over opening messages.
//!
//! The first outbound message of every self-initiated thread is keyed by
//! its normalized text (NFKC, case-folded, whitespace collapsed). Equal keys
//! form a cluster. With a similarity threshold, keys are walked
//! alphabetically and each joins the first earlier cluster whose key is at
//! least that similar (normalized Levenshtein).

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use crate::metrics::{ratio, ThreadOutcome};

/// Hex characters kept from the key digest for the cluster id.
const CLUSTER_ID_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCluster {
    pub id: String,
    /// Normalized text shared by the cluster (its first key alphabetically).
    pub key: String,
    /// Original text of the cluster's first thread.
    pub sample: String,
    pub size: usize,
    pub replied: usize,
    pub response_rate: f64,
    /// Distinct normalized keys merged into this cluster.
    pub variants: usize,
    /// Single-use templates say little about the wording.
    pub low_confidence: bool,
    pub thread_ids: Vec<String>,
}

/// Normalize message text into a template key.
pub fn template_key(content: &str) -> String {
    let folded: String = content.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable cluster id from its key.
pub fn cluster_id(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..CLUSTER_ID_LEN].to_string()
}

struct Group<'a> {
    key: String,
    variants: usize,
    members: Vec<&'a ThreadOutcome>,
}

/// Cluster opening messages, returned in key order.
pub fn cluster_templates(outcomes: &[ThreadOutcome], similarity: Option<f64>) -> Vec<TemplateCluster> {
    let mut exact: BTreeMap<String, Vec<&ThreadOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        exact.entry(template_key(&outcome.first_content)).or_default().push(outcome);
    }

    let mut groups: Vec<Group> = Vec::new();
    for (key, members) in exact {
        let target = similarity.and_then(|threshold| {
            groups
                .iter()
                .position(|g| strsim::normalized_levenshtein(&g.key, &key) >= threshold)
        });
        match target {
            Some(idx) => {
                log::debug!("templates: merged '{}' into '{}'", key, groups[idx].key);
                groups[idx].variants += 1;
                groups[idx].members.extend(members);
            }
            None => groups.push(Group {
                key,
                variants: 1,
                members,
            }),
        }
    }

    groups.into_iter().map(into_cluster).collect()
}

fn into_cluster(group: Group) -> TemplateCluster {
    let mut members = group.members;
    members.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
    let size = members.len();
    let replied = members.iter().filter(|o| o.replied).count();

    TemplateCluster {
        id: cluster_id(&group.key),
        sample: members.first().map(|o| o.first_content.clone()).unwrap_or_default(),
        size,
        replied,
        response_rate: ratio(replied, size).unwrap_or(0.0),
        variants: group.variants,
        low_confidence: size == 1,
        thread_ids: members.iter().map(|o| o.thread_id.clone()).collect(),
        key: group.key,
    }
}

/// Rank by response rate (desc), then size (desc), then key; drop clusters
/// below `min_size` and keep the first `top`.
pub fn rank_templates(mut clusters: Vec<TemplateCluster>, min_size: usize, top: usize) -> Vec<TemplateCluster> {
    clusters.retain(|c| c.size >= min_size);
    clusters.sort_by(|a, b| {
        b.response_rate
            .total_cmp(&a.response_rate)
            .then_with(|| b.size.cmp(&a.size))
            .then_with(|| a.key.cmp(&b.key))
    });
    clusters.truncate(top);
    clusters
}
