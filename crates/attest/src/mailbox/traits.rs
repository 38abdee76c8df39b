//! Mailbox provider trait definitions

use crate::error::ProviderError;
use crate::gmail::api::{ListMessagesResponse, MetadataMessage, RawMessage};
use crate::models::MessageId;

/// Trait for mailbox provider requests
///
/// This trait abstracts over the HTTP provider and in-memory test doubles.
/// Every method takes the bearer token explicitly; callers obtain it from
/// the [`SessionGate`](crate::session::SessionGate) immediately before the call.
pub trait MailboxProvider: Send + Sync {
    /// Search messages matching `query`, starting at `page_token`
    fn list_messages(
        &self,
        access_token: &str,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse, ProviderError>;

    /// Fetch subject and date headers for a message
    fn get_metadata(
        &self,
        access_token: &str,
        id: &MessageId,
    ) -> Result<MetadataMessage, ProviderError>;

    /// Fetch the full transport-encoded message
    fn get_raw(&self, access_token: &str, id: &MessageId) -> Result<RawMessage, ProviderError>;
}
