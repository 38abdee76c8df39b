//! Gmail API integration
//!
//! This module provides:
//! - Gmail API client implementing [`MailboxProvider`](crate::mailbox::MailboxProvider)
//! - Wire types for the search, metadata and raw endpoints
//! - Decoding of URL-safe base64 raw payloads

mod client;
mod decode;

pub use client::GmailClient;
pub use decode::{decode_raw, encode_raw};

/// Gmail API response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        pub thread_id: Option<String>,
    }

    impl MessageRef {
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                thread_id: None,
            }
        }
    }

    /// Message fetched with `format=metadata`
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MetadataMessage {
        pub id: String,
        pub payload: Option<MessagePayload>,
    }

    impl MetadataMessage {
        /// Look up a header value by name, ignoring case
        pub fn header(&self, name: &str) -> Option<&str> {
            self.payload
                .as_ref()?
                .headers
                .as_ref()?
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        }
    }

    /// Message payload containing headers
    #[derive(Debug, Clone, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePayload {
        pub headers: Option<Vec<Header>>,
        pub mime_type: Option<String>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Message fetched with `format=raw`
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct RawMessage {
        pub id: String,
        /// Entire RFC 822 message, URL-safe base64 encoded
        pub raw: Option<String>,
    }
}
