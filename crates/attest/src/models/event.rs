//! Event record and claim artifact
//!
//! Event records live in an external store; this is the slice of one the
//! pipelines need.

use serde::{Deserialize, Serialize};
use url::Url;

/// Unique identifier for an event record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An externally managed event the user wants to prove attendance for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    /// Event name, used as the subject search term
    pub name: String,
    /// Public page of the event
    #[serde(default)]
    pub event_link: Option<String>,
    /// Mint link handed out once attendance is proven
    #[serde(default)]
    pub claim_link: Option<String>,
}

impl EventRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EventId::new(id),
            name: name.into(),
            event_link: None,
            claim_link: None,
        }
    }

    pub fn with_claim_link(mut self, link: impl Into<String>) -> Self {
        self.claim_link = Some(link.into());
        self
    }

    pub fn with_event_link(mut self, link: impl Into<String>) -> Self {
        self.event_link = Some(link.into());
        self
    }

    /// The claim artifact for this event, if a usable claim link is set
    pub fn claim_artifact(&self) -> Option<ClaimArtifact> {
        self.claim_link.as_deref().and_then(ClaimArtifact::parse)
    }
}

/// Reference to the reward revealed after a verified proof
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimArtifact {
    url: String,
}

impl ClaimArtifact {
    /// Parse a claim link. Blank or non-absolute URLs are rejected.
    pub fn parse(link: &str) -> Option<Self> {
        let link = link.trim();
        if link.is_empty() {
            return None;
        }
        let url = Url::parse(link).ok()?;
        if url.cannot_be_a_base() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for ClaimArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_artifact_from_event() {
        let event = EventRecord::new("e1", "DevCon 2024")
            .with_claim_link("https://mint.example.com/claim/abc");
        let artifact = event.claim_artifact().unwrap();
        assert_eq!(artifact.url(), "https://mint.example.com/claim/abc");
    }

    #[test]
    fn test_missing_or_blank_claim_link() {
        let event = EventRecord::new("e1", "DevCon 2024");
        assert!(event.claim_artifact().is_none());

        let event = event.with_claim_link("   ");
        assert!(event.claim_artifact().is_none());
    }

    #[test]
    fn test_relative_claim_link_rejected() {
        assert!(ClaimArtifact::parse("claim/abc").is_none());
        assert!(ClaimArtifact::parse("mailto:someone@example.com").is_none());
    }
}
