//! Paginated retrieval of event messages
//!
//! [`PaginationController`] is a lazy sequence of enriched pages. Each call
//! to [`next`](PaginationController::next) continues from the cursor the
//! previous page returned, and every page is appended to an accumulator the
//! controller owns.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::error::AttestError;
use crate::mailbox::{DetailFetcher, QueryFilter, SearchClient};
use crate::models::{Cursor, MessageDetail, Page};
use crate::session::SessionGate;

/// Where the sequence stands
#[derive(Debug, Clone, PartialEq, Eq)]
enum Position {
    /// Nothing fetched yet; the next search has no cursor
    Start,
    /// The next search continues from this cursor
    At(Cursor),
    /// Last page delivered
    End,
    /// A fatal pagination error occurred; only a restart recovers
    Halted(AttestError),
}

/// Drives repeated searches for one filter
pub struct PaginationController {
    search: Arc<SearchClient>,
    fetcher: Arc<DetailFetcher>,
    gate: Arc<SessionGate>,
    filter: QueryFilter,
    include_raw: bool,
    cancel: CancelFlag,
    position: Position,
    consumed: HashSet<Cursor>,
    accumulated: Vec<MessageDetail>,
    pages_fetched: usize,
}

impl PaginationController {
    /// Start a sequence over all messages matching `filter`
    pub fn fetch_all(
        search: Arc<SearchClient>,
        fetcher: Arc<DetailFetcher>,
        gate: Arc<SessionGate>,
        filter: QueryFilter,
    ) -> Self {
        Self {
            search,
            fetcher,
            gate,
            filter,
            include_raw: false,
            cancel: CancelFlag::new(),
            position: Position::Start,
            consumed: HashSet::new(),
            accumulated: Vec::new(),
            pages_fetched: 0,
        }
    }

    /// Also fetch and decode raw content for every message
    pub fn with_raw(mut self, include_raw: bool) -> Self {
        self.include_raw = include_raw;
        self
    }

    /// Discard results once `cancel` is raised
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch the next page
    ///
    /// Returns `Ok(None)` once the last page has been delivered, and keeps
    /// returning it on further calls. On a retryable provider error the
    /// position is unchanged, so calling again retries the same page.
    ///
    /// # Errors
    /// `CursorRepeated` if the provider hands back a cursor already consumed
    /// in this session. This is fatal until [`restart`](Self::restart).
    pub fn next(&mut self) -> Result<Option<Page>, AttestError> {
        let cursor = match &self.position {
            Position::End => return Ok(None),
            Position::Halted(err) => return Err(err.clone()),
            Position::Start => None,
            Position::At(cursor) => Some(cursor.clone()),
        };

        if self.cancel.is_cancelled() {
            return Err(AttestError::Cancelled);
        }

        let search_page = self.search.search(&self.gate, &self.filter, cursor.as_deref())?;

        if let Some(next) = &search_page.next_cursor
            && (self.consumed.contains(next) || cursor.as_ref() == Some(next))
        {
            warn!("[PAGINATION] Provider repeated cursor {:?}, halting", next);
            let err = AttestError::CursorRepeated {
                cursor: next.clone(),
            };
            self.position = Position::Halted(err.clone());
            return Err(err);
        }

        let batch = self
            .fetcher
            .enrich(&self.gate, &search_page.ids, self.include_raw, &self.cancel)?;

        if let Some(cursor) = cursor {
            self.consumed.insert(cursor);
        }
        self.position = match &search_page.next_cursor {
            Some(next) => Position::At(next.clone()),
            None => Position::End,
        };
        self.pages_fetched += 1;
        self.accumulated.extend(batch.messages.iter().cloned());

        debug!(
            "[PAGINATION] Page {} for {:?}: {} messages, {} degraded, more={}",
            self.pages_fetched,
            self.filter.term(),
            batch.messages.len(),
            batch.degraded.len(),
            search_page.next_cursor.is_some()
        );

        Ok(Some(Page {
            messages: batch.messages,
            next_cursor: search_page.next_cursor,
            degraded: batch.degraded,
        }))
    }

    /// Fetch up to `max_pages` further pages, stopping at the end
    pub fn take_pages(&mut self, max_pages: usize) -> Result<Vec<Page>, AttestError> {
        let mut pages = Vec::new();
        while pages.len() < max_pages {
            match self.next()? {
                Some(page) => pages.push(page),
                None => break,
            }
        }
        Ok(pages)
    }

    /// Drop all progress and start again from the first page
    pub fn restart(&mut self) {
        info!("[PAGINATION] Restarting search for {:?}", self.filter.term());
        self.position = Position::Start;
        self.consumed.clear();
        self.accumulated.clear();
        self.pages_fetched = 0;
    }

    /// Every message delivered so far, in provider order
    pub fn messages(&self) -> &[MessageDetail] {
        &self.accumulated
    }

    pub fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Whether the last page has been delivered
    pub fn is_finished(&self) -> bool {
        matches!(self.position, Position::End)
    }

    /// Whether calling `next` could produce another page
    pub fn has_more(&self) -> bool {
        matches!(self.position, Position::Start | Position::At(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::gmail::api::ListMessagesResponse;
    use crate::mailbox::{InMemoryMailbox, MailboxCall};
    use crate::session::{Credential, DetachedSession};

    fn controller(mailbox: Arc<InMemoryMailbox>) -> PaginationController {
        let search = Arc::new(SearchClient::new(mailbox.clone()));
        let fetcher = Arc::new(DetailFetcher::new(mailbox, 1).unwrap());
        let gate = Arc::new(SessionGate::new(
            Credential::authenticated("tok"),
            Arc::new(DetachedSession),
        ));
        PaginationController::fetch_all(
            search,
            fetcher,
            gate,
            QueryFilter::for_event(QueryFilter::DEFAULT_SENDER_DOMAIN, "DevCon 2024"),
        )
    }

    fn ids(page: &Page) -> Vec<&str> {
        page.messages.iter().map(|m| m.id().as_str()).collect()
    }

    #[test]
    fn test_two_page_sequence() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page_ids(None, &["m1", "m2"], Some("p2"));
        mailbox.add_page_ids(Some("p2"), &[], None);
        mailbox.add_message("m1", "Registered: DevCon 2024", "", None);
        mailbox.add_message("m2", "Ticket: DevCon 2024", "", None);
        let mut pages = controller(mailbox);

        let first = pages.next().unwrap().unwrap();
        assert_eq!(ids(&first), vec!["m1", "m2"]);
        assert_eq!(first.next_cursor.as_deref(), Some("p2"));
        assert!(pages.has_more());

        let second = pages.next().unwrap().unwrap();
        assert!(second.is_empty());
        assert!(second.is_last());
        assert!(pages.is_finished());

        assert!(pages.next().unwrap().is_none());
        assert!(pages.next().unwrap().is_none());
        assert_eq!(pages.messages().len(), 2);
    }

    #[test]
    fn test_response_without_messages_ends_sequence() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page(None, ListMessagesResponse::default());
        let mut pages = controller(mailbox);

        let page = pages.next().unwrap().unwrap();
        assert!(page.is_empty());
        assert!(page.next_cursor.is_none());
        assert!(pages.next().unwrap().is_none());
    }

    #[test]
    fn test_accumulates_in_provider_order_with_duplicates() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page_ids(None, &["m1", "m2"], Some("p2"));
        mailbox.add_page_ids(Some("p2"), &["m2", "m3"], Some("p3"));
        mailbox.add_page_ids(Some("p3"), &["m4"], None);
        for id in ["m1", "m2", "m3", "m4"] {
            mailbox.add_message(id, id, "", None);
        }
        let mut pages = controller(mailbox);

        let all = pages.take_pages(10).unwrap();
        assert_eq!(all.len(), 3);
        let order: Vec<&str> = pages.messages().iter().map(|m| m.id().as_str()).collect();
        assert_eq!(order, vec!["m1", "m2", "m2", "m3", "m4"]);
    }

    #[test]
    fn test_repeated_cursor_is_fatal() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page_ids(None, &["m1"], Some("p2"));
        mailbox.add_page_ids(Some("p2"), &["m2"], Some("p3"));
        mailbox.add_page_ids(Some("p3"), &["m3"], Some("p2"));
        for id in ["m1", "m2", "m3"] {
            mailbox.add_message(id, id, "", None);
        }
        let mut pages = controller(mailbox.clone());

        pages.next().unwrap();
        pages.next().unwrap();
        let err = pages.next().unwrap_err();
        assert_eq!(err, AttestError::CursorRepeated { cursor: "p2".into() });

        // Halted: no further provider calls
        let calls = mailbox.call_count();
        assert_eq!(pages.next().unwrap_err(), err);
        assert_eq!(mailbox.call_count(), calls);
        assert!(!pages.has_more());
    }

    #[test]
    fn test_self_referencing_cursor_is_fatal() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page_ids(None, &["m1"], Some("p2"));
        mailbox.add_page_ids(Some("p2"), &["m2"], Some("p2"));
        mailbox.add_message("m1", "", "", None);
        mailbox.add_message("m2", "", "", None);
        let mut pages = controller(mailbox);

        pages.next().unwrap();
        assert!(matches!(
            pages.next(),
            Err(AttestError::CursorRepeated { .. })
        ));
        // The page carrying the repeated cursor is not accumulated
        assert_eq!(pages.messages().len(), 1);
    }

    #[test]
    fn test_provider_error_retries_same_cursor() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page_ids(None, &["m1"], Some("p2"));
        mailbox.add_page_ids(Some("p2"), &["m2"], None);
        mailbox.add_message("m1", "", "", None);
        mailbox.add_message("m2", "", "", None);
        mailbox.fail_list(Some("p2"), ProviderError::Status(503));
        let mut pages = controller(mailbox.clone());

        pages.next().unwrap();
        assert!(matches!(
            pages.next(),
            Err(AttestError::PaginationProvider { .. })
        ));
        assert_eq!(pages.messages().len(), 1);

        mailbox.heal_list(Some("p2"));
        let page = pages.next().unwrap().unwrap();
        assert_eq!(ids(&page), vec!["m2"]);
        let p2_searches = mailbox
            .calls()
            .into_iter()
            .filter(|c| *c == MailboxCall::List { page_token: Some("p2".into()) })
            .count();
        assert_eq!(p2_searches, 2);
    }

    #[test]
    fn test_restart_from_scratch() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page_ids(None, &["m1"], None);
        mailbox.add_message("m1", "", "", None);
        let mut pages = controller(mailbox);

        pages.next().unwrap();
        assert!(pages.next().unwrap().is_none());

        pages.restart();
        assert!(pages.messages().is_empty());
        let page = pages.next().unwrap().unwrap();
        assert_eq!(ids(&page), vec!["m1"]);
        assert_eq!(pages.messages().len(), 1);
    }

    #[test]
    fn test_cancelled_sequence_discards_page() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page_ids(None, &["m1"], None);
        mailbox.add_message("m1", "", "", None);
        let cancel = CancelFlag::new();
        let mut pages = controller(mailbox.clone()).with_cancel(cancel.clone());

        cancel.cancel();
        assert_eq!(pages.next().unwrap_err(), AttestError::Cancelled);
        assert_eq!(mailbox.call_count(), 0);
        assert!(pages.messages().is_empty());
    }
}
