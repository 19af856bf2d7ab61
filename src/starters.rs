//! Conversation-starter analysis: message features, starter type, score.
//!
//! Starter type priority (first match wins):
//!   1. Thank you: thanks, thank you
//!   2. Greeting: hi, hello, hey
//!   3. Question: any `?`
//!   4. Follow-up: follow up, following up
//!   5. Opportunity inquiry: opportunity, position, role, job
//!   6. Connection request: connect, connection, network
//!   7. Other: nothing matched, or the message is empty
//!
//! Phrases match whole words so "they" is not a greeting and "control" is
//! not a role.

use serde::{Deserialize, Serialize};

use crate::sentiment::tokenize;

pub const THANK_YOU_PHRASES: &[&str] = &["thanks", "thank you"];

pub const GREETING_PHRASES: &[&str] = &["hi", "hello", "hey"];

pub const FOLLOW_UP_PHRASES: &[&str] = &["follow up", "following up"];

pub const OPPORTUNITY_PHRASES: &[&str] = &[
    "opportunity", "opportunities", "position", "positions", "role", "roles", "job", "jobs",
];

pub const CONNECTION_PHRASES: &[&str] = &[
    "connect", "connection", "connections", "connecting", "network", "networking",
];

/// Openers and sign-offs that make a message read as friendly.
pub const FRIENDLY_PHRASES: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "hope", "good morning", "good afternoon",
];

const URL_PREFIXES: &[&str] = &["http://", "https://"];
const PROFILE_MARKER: &str = "linkedin.com/in/";

/// Score weights for ranking conversation starters.
const REPLY_WEIGHT: f64 = 10.0;
const SENTIMENT_WEIGHT: f64 = 2.0;
const GREETING_WEIGHT: f64 = 1.0;
const QUESTION_WEIGHT: f64 = 0.5;
const LENGTH_WEIGHT: f64 = 0.1;
const WORDS_PER_LENGTH_UNIT: f64 = 50.0;

/// Shape of an opening message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarterType {
    ThankYou,
    Greeting,
    Question,
    FollowUp,
    OpportunityInquiry,
    ConnectionRequest,
    Other,
}

impl StarterType {
    /// Every type in cascade order, `Other` last.
    pub const ALL: [StarterType; 7] = [
        StarterType::ThankYou,
        StarterType::Greeting,
        StarterType::Question,
        StarterType::FollowUp,
        StarterType::OpportunityInquiry,
        StarterType::ConnectionRequest,
        StarterType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StarterType::ThankYou => "thank_you",
            StarterType::Greeting => "greeting",
            StarterType::Question => "question",
            StarterType::FollowUp => "follow_up",
            StarterType::OpportunityInquiry => "opportunity_inquiry",
            StarterType::ConnectionRequest => "connection_request",
            StarterType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StarterType::ThankYou => "Thank You",
            StarterType::Greeting => "Greeting",
            StarterType::Question => "Question",
            StarterType::FollowUp => "Follow-up",
            StarterType::OpportunityInquiry => "Opportunity Inquiry",
            StarterType::ConnectionRequest => "Connection Request",
            StarterType::Other => "Other",
        }
    }
}

/// Surface features of one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFeatures {
    /// Characters, not bytes.
    pub length: usize,
    pub word_count: usize,
    pub question_count: usize,
    pub exclamation_count: usize,
    pub has_greeting: bool,
    pub has_url: bool,
    pub has_profile_link: bool,
}

impl MessageFeatures {
    pub fn of(content: &str) -> Self {
        let words = tokenize(content);
        let lower = content.to_lowercase();
        MessageFeatures {
            length: content.chars().count(),
            word_count: content.split_whitespace().count(),
            question_count: content.matches('?').count(),
            exclamation_count: content.matches('!').count(),
            has_greeting: has_any_phrase(&words, FRIENDLY_PHRASES),
            has_url: has_url(&lower),
            has_profile_link: lower.contains(PROFILE_MARKER),
        }
    }
}

/// A scheme followed by at least one non-space character.
fn has_url(lower: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| {
        lower.match_indices(prefix).any(|(idx, _)| {
            lower[idx + prefix.len()..]
                .chars()
                .next()
                .is_some_and(|c| !c.is_whitespace())
        })
    })
}

pub fn classify_starter(content: &str) -> StarterType {
    let words = tokenize(content);
    if words.is_empty() && !content.contains('?') {
        return StarterType::Other;
    }

    if has_any_phrase(&words, THANK_YOU_PHRASES) {
        StarterType::ThankYou
    } else if has_any_phrase(&words, GREETING_PHRASES) {
        StarterType::Greeting
    } else if content.contains('?') {
        StarterType::Question
    } else if has_any_phrase(&words, FOLLOW_UP_PHRASES) {
        StarterType::FollowUp
    } else if has_any_phrase(&words, OPPORTUNITY_PHRASES) {
        StarterType::OpportunityInquiry
    } else if has_any_phrase(&words, CONNECTION_PHRASES) {
        StarterType::ConnectionRequest
    } else {
        StarterType::Other
    }
}

/// Weighted score for ranking starters:
/// reply × 10 + (sentiment + 1) × 2 + greeting × 1 + questions × 0.5 + (words / 50) × 0.1.
/// A missing sentiment counts as neutral.
pub fn performance_score(replied: bool, sentiment: Option<f64>, features: &MessageFeatures) -> f64 {
    let reply = if replied { REPLY_WEIGHT } else { 0.0 };
    let greeting = if features.has_greeting { GREETING_WEIGHT } else { 0.0 };
    reply
        + (sentiment.unwrap_or(0.0) + 1.0) * SENTIMENT_WEIGHT
        + greeting
        + features.question_count as f64 * QUESTION_WEIGHT
        + (features.word_count as f64 / WORDS_PER_LENGTH_UNIT) * LENGTH_WEIGHT
}

fn has_any_phrase(words: &[String], phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| has_phrase(words, phrase))
}

/// True when the phrase's words appear consecutively in `words`.
fn has_phrase(words: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
}
