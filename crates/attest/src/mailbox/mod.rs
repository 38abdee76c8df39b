//! Session-gated mailbox access
//!
//! [`SearchClient`] turns an event filter into pages of message IDs and
//! [`DetailFetcher`] enriches them. Both talk to the provider through the
//! [`MailboxProvider`] trait so the Gmail client and the in-memory double
//! are interchangeable.

mod detail;
mod memory;
mod query;
mod search;
mod traits;

pub use detail::{DetailFetcher, EnrichedBatch, FetchedDetail};
pub use memory::{InMemoryMailbox, MailboxCall};
pub use query::QueryFilter;
pub use search::{MAX_ENRICHED_PER_PAGE, SearchClient, SearchPage};
pub use traits::MailboxProvider;
