//! Domain models for mail search results and event records

mod event;
mod message;
mod page;

pub use event::{ClaimArtifact, EventId, EventRecord};
pub use message::{MessageDetail, MessageId, MessageSummary};
pub use page::{Cursor, DegradedEntry, Page};
