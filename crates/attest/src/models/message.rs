//! Message models for mailbox search results

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Unique identifier for a message (provider message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display metadata for a single message in a search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Provider message ID
    pub id: MessageId,
    /// Subject line (empty when the header is missing)
    pub subject: String,
    /// Raw `Date` header value (empty when the header is missing)
    pub date: String,
}

impl MessageSummary {
    pub fn new(id: MessageId, subject: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            date: date.into(),
        }
    }

    /// Summary carrying only the identifier, used when metadata is unavailable
    pub fn id_only(id: MessageId) -> Self {
        Self::new(id, "", "")
    }

    /// Parse the sent date
    ///
    /// Mail `Date` headers are RFC 2822; RFC 3339 is accepted as a fallback.
    /// Returns `None` for empty or unparseable values.
    pub fn sent_at(&self) -> Option<DateTime<FixedOffset>> {
        let date = self.date.trim();
        if date.is_empty() {
            return None;
        }
        DateTime::parse_from_rfc2822(date)
            .or_else(|_| DateTime::parse_from_rfc3339(date))
            .ok()
    }
}

/// A message summary optionally enriched with its decoded raw body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    #[serde(flatten)]
    pub summary: MessageSummary,
    /// Decoded RFC 822 message text. `None` is a valid state: raw content
    /// was not requested, or could not be fetched or decoded.
    pub raw: Option<String>,
}

impl MessageDetail {
    pub fn new(summary: MessageSummary, raw: Option<String>) -> Self {
        Self { summary, raw }
    }

    pub fn metadata_only(summary: MessageSummary) -> Self {
        Self { summary, raw: None }
    }

    pub fn id(&self) -> &MessageId {
        &self.summary.id
    }

    pub fn subject(&self) -> &str {
        &self.summary.subject
    }

    pub fn date(&self) -> &str {
        &self.summary.date
    }

    pub fn has_raw(&self) -> bool {
        self.raw.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sent_at_rfc2822() {
        let summary = MessageSummary::new(
            MessageId::new("m1"),
            "You're registered for DevCon 2024",
            "Tue, 12 Mar 2024 09:30:00 +0000",
        );
        let sent = summary.sent_at().unwrap();
        assert_eq!(sent.timestamp(), 1710235800);
    }

    #[test]
    fn test_sent_at_rfc3339_fallback() {
        let summary = MessageSummary::new(MessageId::new("m1"), "", "2024-03-12T09:30:00Z");
        assert!(summary.sent_at().is_some());
    }

    #[test]
    fn test_sent_at_empty_or_garbage() {
        assert!(MessageSummary::id_only(MessageId::new("m1")).sent_at().is_none());
        let summary = MessageSummary::new(MessageId::new("m1"), "", "last tuesday");
        assert!(summary.sent_at().is_none());
    }

    #[test]
    fn test_detail_accessors() {
        let detail = MessageDetail::new(
            MessageSummary::new(MessageId::new("m1"), "Subject", "date"),
            Some("raw".to_string()),
        );
        assert_eq!(detail.id().as_str(), "m1");
        assert_eq!(detail.subject(), "Subject");
        assert!(detail.has_raw());
        assert!(!MessageDetail::metadata_only(detail.summary.clone()).has_raw());
    }
}
