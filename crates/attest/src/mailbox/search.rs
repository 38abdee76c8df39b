//! Message search against the mailbox provider

use log::{debug, warn};
use std::sync::Arc;

use super::{MailboxProvider, QueryFilter};
use crate::error::{AttestError, ProviderError};
use crate::models::{Cursor, MessageId};
use crate::session::SessionGate;

/// Maximum number of messages enriched with detail per page
pub const MAX_ENRICHED_PER_PAGE: usize = 10;

/// Identifiers from one search page, before enrichment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub ids: Vec<MessageId>,
    pub next_cursor: Option<Cursor>,
    /// Identifiers beyond the per-page cap that were discarded
    pub dropped: usize,
}

/// Issues filtered searches and caps the page size
pub struct SearchClient {
    provider: Arc<dyn MailboxProvider>,
    max_per_page: usize,
}

impl SearchClient {
    pub fn new(provider: Arc<dyn MailboxProvider>) -> Self {
        Self::with_page_cap(provider, MAX_ENRICHED_PER_PAGE)
    }

    pub fn with_page_cap(provider: Arc<dyn MailboxProvider>, max_per_page: usize) -> Self {
        Self {
            provider,
            max_per_page: max_per_page.max(1),
        }
    }

    /// Fetch one page of message identifiers
    ///
    /// The cursor is passed to the provider unmodified. A response without
    /// `messages` is an empty last page. Identifiers past the cap are
    /// dropped, not deferred to the next page.
    ///
    /// # Errors
    /// `CredentialMissing`/`CredentialExpired` when the gate refuses the call
    /// or the provider rejects the token; `PaginationProvider` for any other
    /// provider failure.
    pub fn search(
        &self,
        gate: &SessionGate,
        filter: &QueryFilter,
        cursor: Option<&str>,
    ) -> Result<SearchPage, AttestError> {
        let access_token = gate.token()?;

        let response = match self
            .provider
            .list_messages(&access_token, filter.as_str(), cursor)
        {
            Ok(response) => response,
            Err(ProviderError::Unauthorized) => return Err(gate.report_unauthorized()),
            Err(e) => {
                warn!("[SEARCH] Provider error for {:?}: {}", filter.term(), e);
                return Err(AttestError::PaginationProvider {
                    message: e.to_string(),
                });
            }
        };

        let Some(messages) = response.messages else {
            debug!("[SEARCH] No messages for {:?}", filter.term());
            return Ok(SearchPage::default());
        };

        let dropped = messages.len().saturating_sub(self.max_per_page);
        if dropped > 0 {
            warn!(
                "[SEARCH] Page has {} messages, dropping {} beyond the cap of {}",
                messages.len(),
                dropped,
                self.max_per_page
            );
        }

        let ids = messages
            .into_iter()
            .take(self.max_per_page)
            .map(|m| MessageId::new(m.id))
            .collect();

        Ok(SearchPage {
            ids,
            next_cursor: response.next_page_token,
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::api::ListMessagesResponse;
    use crate::mailbox::{InMemoryMailbox, MailboxCall};
    use crate::session::{Credential, DetachedSession};

    fn gate(token: &str) -> SessionGate {
        SessionGate::new(Credential::authenticated(token), Arc::new(DetachedSession))
    }

    fn filter() -> QueryFilter {
        QueryFilter::for_event(QueryFilter::DEFAULT_SENDER_DOMAIN, "DevCon 2024")
    }

    #[test]
    fn test_search_returns_ids_in_order() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page_ids(None, &["m1", "m2"], Some("p2"));
        let client = SearchClient::new(mailbox);

        let page = client.search(&gate("tok"), &filter(), None).unwrap();
        assert_eq!(page.ids, vec![MessageId::new("m1"), MessageId::new("m2")]);
        assert_eq!(page.next_cursor.as_deref(), Some("p2"));
        assert_eq!(page.dropped, 0);
    }

    #[test]
    fn test_missing_messages_is_empty_last_page() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.add_page(
            None,
            ListMessagesResponse {
                messages: None,
                next_page_token: Some("ignored".to_string()),
                result_size_estimate: Some(0),
            },
        );
        let client = SearchClient::new(mailbox);

        let page = client.search(&gate("tok"), &filter(), None).unwrap();
        assert!(page.ids.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_cap_drops_extra_ids() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let ids: Vec<String> = (0..13).map(|i| format!("m{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        mailbox.add_page_ids(None, &refs, Some("p2"));
        let client = SearchClient::new(mailbox);

        let page = client.search(&gate("tok"), &filter(), None).unwrap();
        assert_eq!(page.ids.len(), MAX_ENRICHED_PER_PAGE);
        assert_eq!(page.ids.last().unwrap().as_str(), "m9");
        assert_eq!(page.dropped, 3);
    }

    #[test]
    fn test_invalid_gate_makes_no_call() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let client = SearchClient::new(mailbox.clone());
        let gate = SessionGate::new(Credential::signed_out(), Arc::new(DetachedSession));

        let err = client.search(&gate, &filter(), None).unwrap_err();
        assert_eq!(err, AttestError::CredentialMissing);
        assert_eq!(mailbox.call_count(), 0);
    }

    #[test]
    fn test_unauthorized_expires_gate() {
        let mailbox = Arc::new(InMemoryMailbox::new().with_valid_token("fresh"));
        let client = SearchClient::new(mailbox.clone());
        let gate = gate("stale");

        let err = client.search(&gate, &filter(), None).unwrap_err();
        assert_eq!(err, AttestError::CredentialExpired);
        assert!(gate.is_expired());

        // No second attempt with the stale credential
        let err = client.search(&gate, &filter(), None).unwrap_err();
        assert_eq!(err, AttestError::CredentialExpired);
        assert_eq!(mailbox.calls(), vec![MailboxCall::List { page_token: None }]);
    }

    #[test]
    fn test_other_provider_errors_are_pagination_errors() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        mailbox.fail_list(Some("p2"), ProviderError::Status(503));
        let client = SearchClient::new(mailbox);

        let err = client.search(&gate("tok"), &filter(), Some("p2")).unwrap_err();
        assert!(matches!(err, AttestError::PaginationProvider { .. }));
        assert!(err.is_retryable());
    }
}
