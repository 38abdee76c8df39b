//! Attendance proof pipeline
//!
//! A selected message goes through [`ProofPipeline`], and its
//! [`ProofResult`] drives the message's [`RevealGate`].

mod pipeline;
mod reveal;
mod service;

pub use pipeline::{ProofOutcome, ProofPipeline, ProofResult, ProofStage};
pub use reveal::{ClaimState, RevealGate};
pub use service::{Blueprint, Proof, Prover, ProvingService};
