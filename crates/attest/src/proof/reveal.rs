//! Claim reveal gate
//!
//! Withholds the claim artifact for one message until a verified proof for
//! that same message arrives. Pure state, no I/O.

use log::debug;

use super::pipeline::{ProofOutcome, ProofResult};
use crate::models::{ClaimArtifact, MessageId};

/// Whether the claim artifact may be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimState {
    Hidden,
    Revealed(ClaimArtifact),
}

/// One-way reveal state machine owned by a single message view
#[derive(Debug, Clone)]
pub struct RevealGate {
    message_id: MessageId,
    state: ClaimState,
}

impl RevealGate {
    pub fn new(message_id: MessageId) -> Self {
        Self {
            message_id,
            state: ClaimState::Hidden,
        }
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn state(&self) -> &ClaimState {
        &self.state
    }

    /// The artifact, only once revealed
    pub fn artifact(&self) -> Option<&ClaimArtifact> {
        match &self.state {
            ClaimState::Hidden => None,
            ClaimState::Revealed(artifact) => Some(artifact),
        }
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.state, ClaimState::Revealed(_))
    }

    /// Apply a proof result
    ///
    /// A verified result for this gate's message reveals its artifact;
    /// re-applying the same result leaves the state unchanged. Failed
    /// results and results for other messages are ignored, so a revealed
    /// claim never goes back to hidden.
    pub fn apply(&mut self, result: &ProofResult) -> &ClaimState {
        if result.message_id != self.message_id {
            debug!(
                "[REVEAL] Ignoring result for {} on gate for {}",
                result.message_id, self.message_id
            );
            return &self.state;
        }

        if let ProofOutcome::Verified { artifact } = &result.outcome {
            self.state = ClaimState::Revealed(artifact.clone());
        }

        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttestError;

    fn verified(id: &str, url: &str) -> ProofResult {
        ProofResult {
            message_id: MessageId::new(id),
            outcome: ProofOutcome::Verified {
                artifact: ClaimArtifact::parse(url).unwrap(),
            },
        }
    }

    fn failed(id: &str) -> ProofResult {
        ProofResult {
            message_id: MessageId::new(id),
            outcome: ProofOutcome::Failed {
                reason: AttestError::ProofVerificationRejected,
            },
        }
    }

    #[test]
    fn test_starts_hidden() {
        let gate = RevealGate::new(MessageId::new("m1"));
        assert_eq!(gate.state(), &ClaimState::Hidden);
        assert!(gate.artifact().is_none());
    }

    #[test]
    fn test_verified_reveals() {
        let mut gate = RevealGate::new(MessageId::new("m1"));
        gate.apply(&verified("m1", "https://mint.example.com/c/1"));
        assert_eq!(gate.artifact().unwrap().url(), "https://mint.example.com/c/1");
    }

    #[test]
    fn test_failed_stays_hidden() {
        let mut gate = RevealGate::new(MessageId::new("m1"));
        assert_eq!(gate.apply(&failed("m1")), &ClaimState::Hidden);
    }

    #[test]
    fn test_reveal_is_idempotent() {
        let mut gate = RevealGate::new(MessageId::new("m1"));
        let result = verified("m1", "https://mint.example.com/c/1");
        let first = gate.apply(&result).clone();
        let second = gate.apply(&result).clone();
        assert_eq!(first, second);
        assert!(matches!(second, ClaimState::Revealed(_)));
    }

    #[test]
    fn test_other_message_result_is_ignored() {
        let mut gate = RevealGate::new(MessageId::new("m1"));
        gate.apply(&verified("m2", "https://mint.example.com/c/2"));
        assert!(!gate.is_revealed());
    }

    #[test]
    fn test_failure_after_reveal_keeps_artifact() {
        let mut gate = RevealGate::new(MessageId::new("m1"));
        gate.apply(&verified("m1", "https://mint.example.com/c/1"));
        gate.apply(&failed("m1"));
        assert!(gate.is_revealed());
    }
}
