//! Session gate for mailbox requests
//!
//! The access token itself is obtained by an external authentication
//! provider. The gate consumes a read-only [`Credential`] snapshot per
//! request, refuses to let network calls proceed without a usable token,
//! and tears the session down when the provider rejects the token
//! mid-flight.

use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::AttestError;

/// Liveness of the external session a credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Authenticated,
    Unauthenticated,
    Unknown,
}

/// Bearer token snapshot handed to the gate for one request
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    liveness: Liveness,
}

impl Credential {
    pub fn new(token: impl Into<String>, liveness: Liveness) -> Self {
        Self {
            token: token.into(),
            liveness,
        }
    }

    /// Credential from a currently authenticated session
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self::new(token, Liveness::Authenticated)
    }

    /// Placeholder for a signed-out session
    pub fn signed_out() -> Self {
        Self::new("", Liveness::Unauthenticated)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &mask_token(&self.token))
            .field("liveness", &self.liveness)
            .finish()
    }
}

/// Mask a token for logs, keeping only a short prefix
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    let prefix: String = token.chars().take(4).collect();
    format!("{}***", prefix)
}

/// Why a credential is not usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Missing,
    Expired,
}

/// Outcome of [`SessionGate::check_valid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid(InvalidReason),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

impl From<InvalidReason> for AttestError {
    fn from(reason: InvalidReason) -> Self {
        match reason {
            InvalidReason::Missing => AttestError::CredentialMissing,
            InvalidReason::Expired => AttestError::CredentialExpired,
        }
    }
}

/// External authentication collaborator
///
/// Implemented by whatever owns the sign-in session (a web session, a
/// keychain-backed token store, ...). The gate only ever asks it to sign out.
pub trait SessionAuthority: Send + Sync {
    /// Tear down the session so the stale credential is not reused
    fn sign_out(&self);
}

/// Authority that does nothing on sign-out, for hosts without a session
/// to tear down (e.g. a token passed on the command line)
pub struct DetachedSession;

impl SessionAuthority for DetachedSession {
    fn sign_out(&self) {}
}

/// Typed session events raised by user actions or the provider
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(Credential),
    SignedOut,
    ProviderUnauthorized,
}

/// Gatekeeper in front of every mailbox request
pub struct SessionGate {
    credential: RwLock<Credential>,
    expired: AtomicBool,
    authority: Arc<dyn SessionAuthority>,
}

impl SessionGate {
    /// Create a gate over a credential snapshot
    pub fn new(credential: Credential, authority: Arc<dyn SessionAuthority>) -> Self {
        Self {
            credential: RwLock::new(credential),
            expired: AtomicBool::new(false),
            authority,
        }
    }

    /// Classify a credential without touching the network
    ///
    /// A credential is valid only when it carries a non-empty token from a
    /// currently authenticated session.
    pub fn check_valid(credential: &Credential) -> Validity {
        if credential.token.trim().is_empty() {
            return Validity::Invalid(InvalidReason::Missing);
        }
        match credential.liveness {
            Liveness::Authenticated => Validity::Valid,
            Liveness::Unauthenticated | Liveness::Unknown => {
                Validity::Invalid(InvalidReason::Missing)
            }
        }
    }

    /// Current validity, taking a mid-flight rejection into account
    pub fn validity(&self) -> Validity {
        let credential = self.credential.read().unwrap();
        self.validity_of(&credential)
    }

    /// Token to use for the next request
    ///
    /// Must be called before every provider call; an error means the call
    /// must not be made. Validity and token come from the same read of the
    /// credential, so a concurrent teardown cannot hand out its empty token.
    pub fn token(&self) -> Result<String, AttestError> {
        let credential = self.credential.read().unwrap();
        match self.validity_of(&credential) {
            Validity::Valid => Ok(credential.token.clone()),
            Validity::Invalid(reason) => Err(reason.into()),
        }
    }

    /// Validity of `credential`, read while its lock is held
    fn validity_of(&self, credential: &Credential) -> Validity {
        if self.expired.load(Ordering::SeqCst) {
            return Validity::Invalid(InvalidReason::Expired);
        }
        Self::check_valid(credential)
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Record a provider-level unauthorized response
    ///
    /// Reclassifies the credential as expired and signs the session out.
    /// Concurrent reports tear down only once.
    pub fn report_unauthorized(&self) -> AttestError {
        let first = {
            let mut credential = self.credential.write().unwrap();
            let first = !self.expired.swap(true, Ordering::SeqCst);
            if first {
                *credential = Credential::signed_out();
            }
            first
        };

        if first {
            warn!("[SESSION] Provider rejected credential, signing out");
            self.authority.sign_out();
        }
        AttestError::CredentialExpired
    }

    /// Apply a session event
    pub fn handle(&self, event: SessionEvent) {
        match event {
            SessionEvent::SignedIn(credential) => {
                info!("[SESSION] Signed in ({:?})", credential);
                let mut current = self.credential.write().unwrap();
                *current = credential;
                self.expired.store(false, Ordering::SeqCst);
            }
            SessionEvent::SignedOut => {
                info!("[SESSION] Signed out");
                *self.credential.write().unwrap() = Credential::signed_out();
                self.authority.sign_out();
            }
            SessionEvent::ProviderUnauthorized => {
                self.report_unauthorized();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingAuthority {
        sign_outs: AtomicUsize,
    }

    impl SessionAuthority for CountingAuthority {
        fn sign_out(&self) {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_check_valid() {
        assert_eq!(
            SessionGate::check_valid(&Credential::authenticated("ya29.token")),
            Validity::Valid
        );
        assert_eq!(
            SessionGate::check_valid(&Credential::authenticated("")),
            Validity::Invalid(InvalidReason::Missing)
        );
        assert_eq!(
            SessionGate::check_valid(&Credential::new("ya29.token", Liveness::Unknown)),
            Validity::Invalid(InvalidReason::Missing)
        );
        assert_eq!(
            SessionGate::check_valid(&Credential::signed_out()),
            Validity::Invalid(InvalidReason::Missing)
        );
    }

    #[test]
    fn test_token_requires_valid_credential() {
        let gate = SessionGate::new(Credential::signed_out(), Arc::new(DetachedSession));
        assert_eq!(gate.token(), Err(AttestError::CredentialMissing));

        let gate = SessionGate::new(
            Credential::authenticated("ya29.token"),
            Arc::new(DetachedSession),
        );
        assert_eq!(gate.token().unwrap(), "ya29.token");
    }

    #[test]
    fn test_unauthorized_tears_down_once() {
        let authority = Arc::new(CountingAuthority::default());
        let gate = SessionGate::new(Credential::authenticated("ya29.token"), authority.clone());

        assert_eq!(gate.report_unauthorized(), AttestError::CredentialExpired);
        assert_eq!(gate.report_unauthorized(), AttestError::CredentialExpired);

        assert_eq!(authority.sign_outs.load(Ordering::SeqCst), 1);
        assert!(gate.is_expired());
        assert_eq!(gate.validity(), Validity::Invalid(InvalidReason::Expired));
        assert_eq!(gate.token(), Err(AttestError::CredentialExpired));
    }

    #[test]
    fn test_token_never_hands_out_torn_down_credential() {
        for _ in 0..50 {
            let gate = Arc::new(SessionGate::new(
                Credential::authenticated("ya29.token"),
                Arc::new(DetachedSession),
            ));

            std::thread::scope(|scope| {
                let readers: Vec<_> = (0..4)
                    .map(|_| {
                        let gate = gate.clone();
                        scope.spawn(move || {
                            (0..200)
                                .filter_map(|_| gate.token().ok())
                                .all(|token| token == "ya29.token")
                        })
                    })
                    .collect();
                gate.report_unauthorized();

                for reader in readers {
                    assert!(reader.join().unwrap());
                }
            });
            assert_eq!(gate.token(), Err(AttestError::CredentialExpired));
        }
    }

    #[test]
    fn test_sign_in_after_expiry_revives_gate() {
        let gate = SessionGate::new(
            Credential::authenticated("old"),
            Arc::new(DetachedSession),
        );
        gate.handle(SessionEvent::ProviderUnauthorized);
        assert!(gate.token().is_err());

        gate.handle(SessionEvent::SignedIn(Credential::authenticated("new")));
        assert_eq!(gate.token().unwrap(), "new");
    }

    #[test]
    fn test_sign_out_event() {
        let authority = Arc::new(CountingAuthority::default());
        let gate = SessionGate::new(Credential::authenticated("tok"), authority.clone());
        gate.handle(SessionEvent::SignedOut);
        assert_eq!(gate.token(), Err(AttestError::CredentialMissing));
        assert_eq!(authority.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_masks_token() {
        let debug = format!("{:?}", Credential::authenticated("ya29.secret-token"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("ya29***"));
    }
}
