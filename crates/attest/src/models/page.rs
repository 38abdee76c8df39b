//! One page of enriched search results

use serde::{Deserialize, Serialize};

use super::{MessageDetail, MessageId};
use crate::error::AttestError;

/// Opaque provider-issued token identifying where the next page begins
pub type Cursor = String;

/// An entry that was downgraded while enriching a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedEntry {
    pub id: MessageId,
    pub reason: AttestError,
}

/// An ordered page of messages plus the cursor for the following page
///
/// Message order is the provider's order. A `next_cursor` of `None` marks
/// the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub messages: Vec<MessageDetail>,
    pub next_cursor: Option<Cursor>,
    #[serde(skip)]
    pub degraded: Vec<DegradedEntry>,
}

impl Page {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn ids(&self) -> Vec<&MessageId> {
        self.messages.iter().map(|m| m.id()).collect()
    }
}
