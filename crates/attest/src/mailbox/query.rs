//! Search filter construction

/// Provider search filter for one event
///
/// Built from a fixed template: messages from the event platform's sender
/// domain whose subject contains the event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    term: String,
    query: String,
}

impl QueryFilter {
    /// Sender domain used by Luma for registration and ticket emails
    pub const DEFAULT_SENDER_DOMAIN: &'static str = "calendar.luma-mail.com";

    /// Build `from:<sender_domain> subject:("<term>")`
    ///
    /// Double quotes are removed from the term so it cannot close the
    /// quoted phrase early.
    pub fn for_event(sender_domain: &str, term: &str) -> Self {
        let term: String = term.trim().chars().filter(|c| *c != '"').collect();
        let query = format!("from:{} subject:(\"{}\")", sender_domain.trim(), term);
        Self { term, query }
    }

    /// The sanitized free-text term
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The full provider query string
    pub fn as_str(&self) -> &str {
        &self.query
    }
}

impl std::fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.query)
    }
}
