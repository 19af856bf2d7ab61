use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the conversation a message came from, relative to the
/// analyzed user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        }
    }
}

/// Business intent of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesCategory {
    MeetingRequest,
    Recruiting,
    Partnership,
    ServiceOffering,
    GeneralBusiness,
    None,
}

impl SalesCategory {
    /// Rule evaluation order. First match wins; `None` is the fallthrough.
    pub const PRIORITY: [SalesCategory; 5] = [
        SalesCategory::MeetingRequest,
        SalesCategory::Recruiting,
        SalesCategory::Partnership,
        SalesCategory::ServiceOffering,
        SalesCategory::GeneralBusiness,
    ];

    /// Every category in report order (priority order, `None` last).
    pub const ALL: [SalesCategory; 6] = [
        SalesCategory::MeetingRequest,
        SalesCategory::Recruiting,
        SalesCategory::Partnership,
        SalesCategory::ServiceOffering,
        SalesCategory::GeneralBusiness,
        SalesCategory::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesCategory::MeetingRequest => "meeting_request",
            SalesCategory::Recruiting => "recruiting",
            SalesCategory::Partnership => "partnership",
            SalesCategory::ServiceOffering => "service_offering",
            SalesCategory::GeneralBusiness => "general_business",
            SalesCategory::None => "none",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "meeting_request" => Some(SalesCategory::MeetingRequest),
            "recruiting" => Some(SalesCategory::Recruiting),
            "partnership" => Some(SalesCategory::Partnership),
            "service_offering" => Some(SalesCategory::ServiceOffering),
            "general_business" => Some(SalesCategory::GeneralBusiness),
            "none" => Some(SalesCategory::None),
            _ => None,
        }
    }

    /// Human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            SalesCategory::MeetingRequest => "Meeting Request",
            SalesCategory::Recruiting => "Recruiting",
            SalesCategory::Partnership => "Partnership",
            SalesCategory::ServiceOffering => "Service Offering",
            SalesCategory::GeneralBusiness => "General Business",
            SalesCategory::None => "Non-sales",
        }
    }

    pub fn is_sales(&self) -> bool {
        !matches!(self, SalesCategory::None)
    }

    /// Position in `ALL`, used as a deterministic tie-break.
    pub fn rank(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(Self::ALL.len())
    }
}

/// A canonical row produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Position of the row in the input, the tie-break for equal timestamps.
    pub row_index: usize,
    pub thread_id: String,
    pub sender: String,
    pub recipient: String,
    /// `None` when the source value matched none of the accepted formats.
    pub timestamp: Option<DateTime<Utc>>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_profile_urls: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<String>,
}

/// A record with its direction resolved against the self-identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(flatten)]
    pub record: Record,
    pub direction: Direction,
    /// The other party: recipient for outbound, sender for inbound.
    pub contact: String,
    /// Set for outbound messages only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SalesCategory>,
    /// Optional enrichment, `None` for empty content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

impl Message {
    pub fn is_outbound(&self) -> bool {
        self.direction == Direction::Outbound
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.record.timestamp
    }

    pub fn content(&self) -> &str {
        &self.record.content
    }
}

/// Messages sharing a thread id, ordered by timestamp ascending with
/// unparseable timestamps last and row order breaking ties.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub thread_id: String,
    pub messages: Vec<Message>,
    /// True iff the earliest sortable message is outbound.
    pub initiated_by_self: bool,
    /// False when the self-identity is neither sender nor recipient of any
    /// message in the thread.
    pub self_present: bool,
}

impl Thread {
    /// Messages with a parseable timestamp, in thread order.
    pub fn sortable(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.timestamp().is_some())
    }

    pub fn has_sortable(&self) -> bool {
        self.sortable().next().is_some()
    }

    pub fn outbound_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_outbound()).count()
    }
}
