//! Proving service contract
//!
//! The proving SDK is a sealed external capability: blueprints are looked
//! up by identifier, create provers, and verify the proofs those provers
//! generate. Nothing here depends on the proof format.

use serde::{Deserialize, Serialize};

use crate::error::ProvingError;

/// Proof artifact returned by a prover, opaque to this crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof(pub serde_json::Value);

/// Entry point of the proving SDK
pub trait ProvingService: Send + Sync {
    /// Resolve a blueprint (proof circuit configuration) by identifier
    fn blueprint(&self, id: &str) -> Result<Box<dyn Blueprint>, ProvingError>;
}

/// A resolved blueprint
pub trait Blueprint: Send + Sync {
    fn create_prover(&self) -> Box<dyn Prover>;

    /// Whether `proof` verifies against this blueprint
    fn verify_proof(&self, proof: &Proof) -> Result<bool, ProvingError>;
}

/// Generates proofs from raw message content
pub trait Prover: Send {
    fn generate_proof(&self, raw_content: &str) -> Result<Proof, ProvingError>;
}
