//! Proof pipeline for one selected message
//!
//! `Idle -> Generating -> Verifying -> {Verified | Failed}`. A message
//! without raw content fails before any external call, and a verified proof
//! only counts when the event has a claim link to hand out.

use log::{info, warn};
use std::sync::Arc;

use super::service::{Blueprint, Prover, ProvingService};
use crate::error::AttestError;
use crate::models::{ClaimArtifact, EventRecord, MessageDetail, MessageId};

/// Stage of a proof run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofStage {
    Idle,
    Generating,
    Verifying,
    Verified(ClaimArtifact),
    Failed(AttestError),
}

impl ProofStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProofStage::Verified(_) | ProofStage::Failed(_))
    }
}

/// How a proof run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOutcome {
    Verified { artifact: ClaimArtifact },
    Failed { reason: AttestError },
}

/// Result of a proof run, scoped to the message that triggered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofResult {
    pub message_id: MessageId,
    pub outcome: ProofOutcome,
}

impl ProofResult {
    pub fn is_verified(&self) -> bool {
        matches!(self.outcome, ProofOutcome::Verified { .. })
    }

    pub fn artifact(&self) -> Option<&ClaimArtifact> {
        match &self.outcome {
            ProofOutcome::Verified { artifact } => Some(artifact),
            ProofOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&AttestError> {
        match &self.outcome {
            ProofOutcome::Verified { .. } => None,
            ProofOutcome::Failed { reason } => Some(reason),
        }
    }
}

/// Submits a message to the proving service and verifies the proof
pub struct ProofPipeline {
    service: Arc<dyn ProvingService>,
    blueprint_id: String,
    stage: ProofStage,
}

impl ProofPipeline {
    pub fn new(service: Arc<dyn ProvingService>, blueprint_id: impl Into<String>) -> Self {
        Self {
            service,
            blueprint_id: blueprint_id.into(),
            stage: ProofStage::Idle,
        }
    }

    pub fn stage(&self) -> &ProofStage {
        &self.stage
    }

    pub fn blueprint_id(&self) -> &str {
        &self.blueprint_id
    }

    /// Run the pipeline for `message` against `event`
    pub fn run(&mut self, message: &MessageDetail, event: &EventRecord) -> ProofResult {
        self.run_with_progress(message, event, |_| {})
    }

    /// Run the pipeline, reporting every stage change to `on_stage`
    ///
    /// A previous run's terminal stage is discarded; each run starts from
    /// `Idle`.
    pub fn run_with_progress<F>(
        &mut self,
        message: &MessageDetail,
        event: &EventRecord,
        mut on_stage: F,
    ) -> ProofResult
    where
        F: FnMut(&ProofStage),
    {
        self.stage = ProofStage::Idle;
        let message_id = message.id().clone();

        let outcome = match self.prove(message, event, &mut on_stage) {
            Ok(artifact) => {
                info!("[PROOF] Message {} verified for event {}", message_id, event.id.as_str());
                self.transition(ProofStage::Verified(artifact.clone()), &mut on_stage);
                ProofOutcome::Verified { artifact }
            }
            Err(reason) => {
                warn!("[PROOF] Message {} failed: {}", message_id, reason);
                self.transition(ProofStage::Failed(reason.clone()), &mut on_stage);
                ProofOutcome::Failed { reason }
            }
        };

        ProofResult {
            message_id,
            outcome,
        }
    }

    fn prove<F>(
        &mut self,
        message: &MessageDetail,
        event: &EventRecord,
        on_stage: &mut F,
    ) -> Result<ClaimArtifact, AttestError>
    where
        F: FnMut(&ProofStage),
    {
        let raw = message.raw.as_deref().ok_or(AttestError::ProofNoContent)?;

        self.transition(ProofStage::Generating, on_stage);
        let blueprint = self
            .service
            .blueprint(&self.blueprint_id)
            .map_err(|e| AttestError::ProofGenerationFailed {
                message: e.to_string(),
            })?;
        let proof = blueprint
            .create_prover()
            .generate_proof(raw)
            .map_err(|e| AttestError::ProofGenerationFailed {
                message: e.to_string(),
            })?;

        self.transition(ProofStage::Verifying, on_stage);
        match blueprint.verify_proof(&proof) {
            Ok(true) => {}
            Ok(false) => return Err(AttestError::ProofVerificationRejected),
            Err(e) => {
                warn!("[PROOF] Verifier error: {}", e);
                return Err(AttestError::ProofVerificationRejected);
            }
        }

        event
            .claim_artifact()
            .ok_or(AttestError::ClaimArtifactMissing)
    }

    fn transition<F>(&mut self, stage: ProofStage, on_stage: &mut F)
    where
        F: FnMut(&ProofStage),
    {
        self.stage = stage;
        on_stage(&self.stage);
    }
}
