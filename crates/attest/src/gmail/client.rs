//! Gmail API HTTP client
//!
//! Provides the search, metadata and raw endpoints used by the retrieval
//! pipeline. Uses synchronous HTTP (ureq) to be executor-agnostic.

use log::debug;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::api::{ListMessagesResponse, MetadataMessage, RawMessage};
use crate::error::ProviderError;
use crate::mailbox::MailboxProvider;
use crate::models::MessageId;

/// Gmail API client for searching and fetching messages
pub struct GmailClient {
    agent: ureq::Agent,
    base_url: String,
}

impl GmailClient {
    /// Gmail API base URL
    pub const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Create a new Gmail client against the public API
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(Self::BASE_URL, timeout)
    }

    /// Create a client against a different API root (proxies, test servers)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self, query: &str, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/users/me/messages?q={}",
            self.base_url,
            urlencoding::encode(query)
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        url
    }

    fn metadata_url(&self, id: &MessageId) -> String {
        format!(
            "{}/users/me/messages/{}?format=metadata&metadataHeaders=subject&metadataHeaders=date",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }

    fn raw_url(&self, id: &MessageId) -> String {
        format!(
            "{}/users/me/messages/{}?format=raw",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }

    /// Issue an authorized GET and parse the JSON body
    fn get_json<T: DeserializeOwned>(&self, url: &str, access_token: &str) -> Result<T, ProviderError> {
        let response = self
            .agent
            .get(url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call();

        match response {
            Ok(mut resp) => resp
                .body_mut()
                .read_json()
                .map_err(|e| ProviderError::Decode(e.to_string())),
            Err(ureq::Error::StatusCode(401)) => Err(ProviderError::Unauthorized),
            Err(ureq::Error::StatusCode(code)) => Err(ProviderError::Status(code)),
            Err(e) => Err(ProviderError::Transport(e.to_string())),
        }
    }
}

impl MailboxProvider for GmailClient {
    fn list_messages(
        &self,
        access_token: &str,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse, ProviderError> {
        debug!("[GMAIL] list messages q={:?} pageToken={:?}", query, page_token);
        self.get_json(&self.search_url(query, page_token), access_token)
    }

    fn get_metadata(
        &self,
        access_token: &str,
        id: &MessageId,
    ) -> Result<MetadataMessage, ProviderError> {
        self.get_json(&self.metadata_url(id), access_token)
    }

    fn get_raw(&self, access_token: &str, id: &MessageId) -> Result<RawMessage, ProviderError> {
        self.get_json(&self.raw_url(id), access_token)
    }
}
