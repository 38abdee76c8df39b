//! In-memory mailbox provider
//!
//! Scripted stand-in for the Gmail API used by tests and demos. Search
//! pages are keyed by page token, message details by ID, and failures can
//! be injected per request. Every request is recorded in a call log.

use std::collections::HashMap;
use std::sync::RwLock;

use super::MailboxProvider;
use crate::error::ProviderError;
use crate::gmail::api::{
    Header, ListMessagesResponse, MessagePayload, MessageRef, MetadataMessage, RawMessage,
};
use crate::gmail::encode_raw;
use crate::models::MessageId;

/// A request observed by [`InMemoryMailbox`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxCall {
    List { page_token: Option<String> },
    Metadata(String),
    Raw(String),
}

struct StoredMessage {
    subject: Option<String>,
    date: Option<String>,
    raw: Option<String>,
}

/// In-memory implementation of MailboxProvider
pub struct InMemoryMailbox {
    valid_token: Option<String>,
    pages: RwLock<HashMap<Option<String>, ListMessagesResponse>>,
    messages: RwLock<HashMap<String, StoredMessage>>,
    list_failures: RwLock<HashMap<Option<String>, ProviderError>>,
    metadata_failures: RwLock<HashMap<String, ProviderError>>,
    raw_failures: RwLock<HashMap<String, ProviderError>>,
    calls: RwLock<Vec<MailboxCall>>,
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMailbox {
    /// Create an empty mailbox that accepts any token
    pub fn new() -> Self {
        Self {
            valid_token: None,
            pages: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
            list_failures: RwLock::new(HashMap::new()),
            metadata_failures: RwLock::new(HashMap::new()),
            raw_failures: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Only accept `token`; any other token gets `Unauthorized`
    pub fn with_valid_token(mut self, token: impl Into<String>) -> Self {
        self.valid_token = Some(token.into());
        self
    }

    /// Script the search response for `page_token` (`None` = first page)
    pub fn add_page(&self, page_token: Option<&str>, response: ListMessagesResponse) {
        self.pages
            .write()
            .unwrap()
            .insert(page_token.map(str::to_string), response);
    }

    /// Script a search page from message IDs and a next-page token
    pub fn add_page_ids(&self, page_token: Option<&str>, ids: &[&str], next: Option<&str>) {
        self.add_page(
            page_token,
            ListMessagesResponse {
                messages: Some(ids.iter().map(|id| MessageRef::new(*id)).collect()),
                next_page_token: next.map(str::to_string),
                result_size_estimate: Some(ids.len() as u32),
            },
        );
    }

    /// Add a message with headers and a plain-text raw body
    pub fn add_message(&self, id: &str, subject: &str, date: &str, raw_text: Option<&str>) {
        self.messages.write().unwrap().insert(
            id.to_string(),
            StoredMessage {
                subject: Some(subject.to_string()),
                date: Some(date.to_string()),
                raw: raw_text.map(encode_raw),
            },
        );
    }

    /// Add a message whose raw field is returned verbatim (already encoded)
    pub fn add_message_encoded(&self, id: &str, subject: Option<&str>, date: Option<&str>, raw: Option<&str>) {
        self.messages.write().unwrap().insert(
            id.to_string(),
            StoredMessage {
                subject: subject.map(str::to_string),
                date: date.map(str::to_string),
                raw: raw.map(str::to_string),
            },
        );
    }

    pub fn fail_list(&self, page_token: Option<&str>, error: ProviderError) {
        self.list_failures
            .write()
            .unwrap()
            .insert(page_token.map(str::to_string), error);
    }

    /// Stop failing the search for `page_token`
    pub fn heal_list(&self, page_token: Option<&str>) {
        self.list_failures
            .write()
            .unwrap()
            .remove(&page_token.map(str::to_string));
    }

    pub fn fail_metadata(&self, id: &str, error: ProviderError) {
        self.metadata_failures
            .write()
            .unwrap()
            .insert(id.to_string(), error);
    }

    pub fn fail_raw(&self, id: &str, error: ProviderError) {
        self.raw_failures
            .write()
            .unwrap()
            .insert(id.to_string(), error);
    }

    /// All requests received so far, in arrival order
    pub fn calls(&self) -> Vec<MailboxCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn record(&self, call: MailboxCall) {
        self.calls.write().unwrap().push(call);
    }

    fn authorize(&self, access_token: &str) -> Result<(), ProviderError> {
        match &self.valid_token {
            Some(valid) if valid != access_token => Err(ProviderError::Unauthorized),
            _ => Ok(()),
        }
    }
}

impl MailboxProvider for InMemoryMailbox {
    fn list_messages(
        &self,
        access_token: &str,
        _query: &str,
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse, ProviderError> {
        let key = page_token.map(str::to_string);
        self.record(MailboxCall::List {
            page_token: key.clone(),
        });
        self.authorize(access_token)?;

        if let Some(err) = self.list_failures.read().unwrap().get(&key) {
            return Err(err.clone());
        }

        Ok(self
            .pages
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    fn get_metadata(
        &self,
        access_token: &str,
        id: &MessageId,
    ) -> Result<MetadataMessage, ProviderError> {
        self.record(MailboxCall::Metadata(id.as_str().to_string()));
        self.authorize(access_token)?;

        if let Some(err) = self.metadata_failures.read().unwrap().get(id.as_str()) {
            return Err(err.clone());
        }

        let messages = self.messages.read().unwrap();
        let stored = messages.get(id.as_str()).ok_or(ProviderError::Status(404))?;

        let mut headers = Vec::new();
        if let Some(subject) = &stored.subject {
            headers.push(Header {
                name: "Subject".to_string(),
                value: subject.clone(),
            });
        }
        if let Some(date) = &stored.date {
            headers.push(Header {
                name: "Date".to_string(),
                value: date.clone(),
            });
        }

        Ok(MetadataMessage {
            id: id.as_str().to_string(),
            payload: Some(MessagePayload {
                headers: Some(headers),
                mime_type: Some("text/plain".to_string()),
            }),
        })
    }

    fn get_raw(&self, access_token: &str, id: &MessageId) -> Result<RawMessage, ProviderError> {
        self.record(MailboxCall::Raw(id.as_str().to_string()));
        self.authorize(access_token)?;

        if let Some(err) = self.raw_failures.read().unwrap().get(id.as_str()) {
            return Err(err.clone());
        }

        let messages = self.messages.read().unwrap();
        let stored = messages.get(id.as_str()).ok_or(ProviderError::Status(404))?;

        Ok(RawMessage {
            id: id.as_str().to_string(),
            raw: stored.raw.clone(),
        })
    }
}
