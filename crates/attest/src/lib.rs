//! Attest crate - Proof-of-attendance retrieval and proving
//!
//! This crate provides the platform-independent pieces behind an event
//! detail view:
//! - Session gate guarding every mailbox call with the current credential
//! - Gmail search, metadata and raw-content retrieval
//! - Cursor pagination with duplicate and repeated-cursor protection
//! - Proof pipeline and per-message claim reveal gate
//! - Event detail view orchestration
//!
//! Presentation lives outside this crate.

pub mod cancel;
pub mod config;
pub mod error;
pub mod gmail;
pub mod mailbox;
pub mod models;
pub mod pagination;
pub mod proof;
pub mod session;
pub mod view;

pub use cancel::CancelFlag;
pub use config::AttestConfig;
pub use error::{AttestError, ProviderError, ProvingError};
pub use gmail::{GmailClient, decode_raw};
pub use mailbox::{
    DetailFetcher, EnrichedBatch, FetchedDetail, InMemoryMailbox, MailboxProvider, QueryFilter,
    SearchClient, SearchPage,
};
pub use models::{
    ClaimArtifact, Cursor, DegradedEntry, EventId, EventRecord, MessageDetail, MessageId,
    MessageSummary, Page,
};
pub use pagination::PaginationController;
pub use proof::{
    Blueprint, ClaimState, ProofOutcome, ProofPipeline, ProofResult, ProofStage, Proof, Prover,
    ProvingService, RevealGate,
};
pub use session::{Credential, Liveness, SessionAuthority, SessionEvent, SessionGate, Validity};
pub use view::{EventDetailView, ViewEvent, ViewHandle, ViewServices, ViewUpdate};
