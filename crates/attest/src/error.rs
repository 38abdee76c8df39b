//! Error taxonomy for the retrieval and proof pipelines
//!
//! [`AttestError`] is what callers see. [`ProviderError`] is produced by the
//! mailbox transport seam and [`ProvingError`] by the proving service seam;
//! both are classified into `AttestError` at the component boundary.

/// Errors surfaced by the retrieval and proof pipelines
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttestError {
    #[error("No credential available")]
    CredentialMissing,

    #[error("Credential rejected by the mailbox provider")]
    CredentialExpired,

    #[error("Mailbox search failed: {message}")]
    PaginationProvider { message: String },

    #[error("Provider repeated pagination cursor {cursor}")]
    CursorRepeated { cursor: String },

    #[error("Message detail degraded: {message}")]
    DetailFetchDegraded { message: String },

    #[error("Malformed raw payload: {message}")]
    DecodeFailure { message: String },

    #[error("Message has no raw content to prove")]
    ProofNoContent,

    #[error("Proof generation failed: {message}")]
    ProofGenerationFailed { message: String },

    #[error("Proof verification rejected")]
    ProofVerificationRejected,

    #[error("No claim artifact configured for this event")]
    ClaimArtifactMissing,

    #[error("Request cancelled")]
    Cancelled,
}

impl AttestError {
    /// Sentence suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            AttestError::CredentialMissing | AttestError::CredentialExpired => {
                "Session expired or invalid. Please sign in again."
            }
            AttestError::PaginationProvider { .. } => {
                "Could not load emails from your mailbox. Press Refresh to try again."
            }
            AttestError::CursorRepeated { .. } => {
                "The mailbox returned the same page twice. Press Refresh to start over."
            }
            AttestError::DetailFetchDegraded { .. } => {
                "Some email details could not be loaded."
            }
            AttestError::DecodeFailure { .. } => {
                "The email content could not be decoded."
            }
            AttestError::ProofNoContent => {
                "This email has no content to prove. Refresh and select it again."
            }
            AttestError::ProofGenerationFailed { .. } => {
                "The proving service could not generate a proof for this email."
            }
            AttestError::ProofVerificationRejected => {
                "The proof for this email did not verify."
            }
            AttestError::ClaimArtifactMissing => {
                "Your attendance is proven, but this event has no claim link configured."
            }
            AttestError::Cancelled => "The request was cancelled.",
        }
    }

    /// Whether the only way forward is a fresh sign-in
    pub fn is_recoverable_by_sign_in(&self) -> bool {
        matches!(
            self,
            AttestError::CredentialMissing | AttestError::CredentialExpired
        )
    }

    /// Whether an explicit user retry (e.g. Refresh) may succeed with the
    /// same credential
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AttestError::PaginationProvider { .. }
                | AttestError::CursorRepeated { .. }
                | AttestError::ProofGenerationFailed { .. }
                | AttestError::ProofVerificationRejected
        )
    }
}

/// Errors reported by a mailbox provider request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ProviderError::Unauthorized)
    }
}

/// Errors reported by the external proving service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvingError {
    #[error("Blueprint {0} not found")]
    BlueprintNotFound(String),

    #[error("Prover failed: {0}")]
    Prover(String),

    #[error("Verifier failed: {0}")]
    Verifier(String),
}
