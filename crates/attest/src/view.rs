//! Event detail view orchestration
//!
//! Presentation lives elsewhere; this is the state behind one open event
//! detail view. User actions arrive as [`ViewEvent`]s and are routed to the
//! session gate, the pagination controller or the proof pipeline. Each
//! message selected for proving gets its own [`RevealGate`].

use anyhow::Result;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::config::AttestConfig;
use crate::error::AttestError;
use crate::mailbox::{DetailFetcher, MailboxProvider, SearchClient};
use crate::models::{EventRecord, MessageDetail, MessageId};
use crate::pagination::PaginationController;
use crate::proof::{ClaimState, ProofPipeline, ProofResult, ProvingService, RevealGate};
use crate::session::{Credential, SessionEvent, SessionGate};

/// Shown when a search finishes without any matching message
pub const NO_EMAILS_MESSAGE: &str = "No emails found.";

/// Shown when proof generation is requested but no proving service is set up
pub const NO_PROVER_MESSAGE: &str = "Proof generation is not configured for this event.";

/// User actions on an event detail view
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// Start the message list over from the first page
    Refresh,
    /// Fetch the next page of messages
    LoadMore,
    SignIn(Credential),
    SignOut,
    /// Prove attendance with the selected message
    GenerateProof(MessageId),
    Close,
}

/// What changed in response to a [`ViewEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    /// New messages were appended to the list
    Messages { added: usize, has_more: bool },
    /// The search finished without any message
    Empty,
    /// No credential, or the provider rejected it
    SignInRequired,
    SignedOut,
    Proof(ProofResult),
    Error(AttestError),
    Closed,
    /// The view was closed; the event or its result was discarded
    Ignored,
}

impl ViewUpdate {
    /// Legible status line for the update, if it warrants one
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ViewUpdate::Empty => Some(NO_EMAILS_MESSAGE),
            ViewUpdate::SignInRequired => Some(AttestError::CredentialExpired.user_message()),
            ViewUpdate::Error(err) => Some(err.user_message()),
            ViewUpdate::Proof(result) => result.failure().map(AttestError::user_message),
            _ => None,
        }
    }
}

/// Shared services a view is built from
#[derive(Clone)]
pub struct ViewServices {
    pub search: Arc<SearchClient>,
    pub fetcher: Arc<DetailFetcher>,
    pub prover: Option<(Arc<dyn ProvingService>, String)>,
    pub config: AttestConfig,
}

impl ViewServices {
    /// Build services over a mailbox provider using `config`
    ///
    /// Proof generation is available only when both a proving service and
    /// a blueprint ID are configured.
    pub fn from_config(
        config: AttestConfig,
        provider: Arc<dyn MailboxProvider>,
        proving: Option<Arc<dyn ProvingService>>,
    ) -> Result<Self> {
        let search = Arc::new(SearchClient::with_page_cap(
            provider.clone(),
            config.max_enriched_per_page,
        ));
        let fetcher = Arc::new(DetailFetcher::new(provider, config.detail_concurrency)?);
        let prover = match (proving, config.blueprint_id.clone()) {
            (Some(service), Some(blueprint_id)) => Some((service, blueprint_id)),
            _ => None,
        };

        Ok(Self {
            search,
            fetcher,
            prover,
            config,
        })
    }
}

/// Closes a view from another thread
#[derive(Debug, Clone)]
pub struct ViewHandle {
    cancel: CancelFlag,
}

impl ViewHandle {
    /// Discard outstanding results of the view
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

/// State behind one open event detail view
pub struct EventDetailView {
    event: EventRecord,
    gate: Arc<SessionGate>,
    fetcher: Arc<DetailFetcher>,
    pagination: PaginationController,
    pipeline: Option<ProofPipeline>,
    claims: HashMap<MessageId, RevealGate>,
    cancel: CancelFlag,
}

impl EventDetailView {
    /// Open a view for `event`. Nothing is fetched until the first
    /// [`ViewEvent::Refresh`].
    pub fn open(event: EventRecord, gate: Arc<SessionGate>, services: &ViewServices) -> Self {
        let cancel = CancelFlag::new();
        let filter = services.config.filter_for(&event.name);
        let pagination = PaginationController::fetch_all(
            services.search.clone(),
            services.fetcher.clone(),
            gate.clone(),
            filter,
        )
        .with_cancel(cancel.clone());
        let pipeline = services
            .prover
            .as_ref()
            .map(|(service, blueprint_id)| ProofPipeline::new(service.clone(), blueprint_id.clone()));

        Self {
            event,
            gate,
            fetcher: services.fetcher.clone(),
            pagination,
            pipeline,
            claims: HashMap::new(),
            cancel,
        }
    }

    pub fn handle_for_close(&self) -> ViewHandle {
        ViewHandle {
            cancel: self.cancel.clone(),
        }
    }

    pub fn event(&self) -> &EventRecord {
        &self.event
    }

    /// Messages listed so far, in provider order
    pub fn messages(&self) -> &[MessageDetail] {
        self.pagination.messages()
    }

    pub fn has_more(&self) -> bool {
        self.pagination.has_more()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Claim state for a message; unknown messages are hidden
    pub fn claim_state(&self, id: &MessageId) -> ClaimState {
        self.claims
            .get(id)
            .map(|gate| gate.state().clone())
            .unwrap_or(ClaimState::Hidden)
    }

    /// Apply a user action
    pub fn handle(&mut self, event: ViewEvent) -> ViewUpdate {
        if self.is_closed() {
            return ViewUpdate::Ignored;
        }

        match event {
            ViewEvent::Refresh => {
                self.pagination.restart();
                self.load_more()
            }
            ViewEvent::LoadMore => self.load_more(),
            ViewEvent::SignIn(credential) => {
                self.gate.handle(SessionEvent::SignedIn(credential));
                self.pagination.restart();
                self.load_more()
            }
            ViewEvent::SignOut => {
                self.gate.handle(SessionEvent::SignedOut);
                self.pagination.restart();
                ViewUpdate::SignedOut
            }
            ViewEvent::GenerateProof(id) => self.generate_proof(id),
            ViewEvent::Close => {
                self.cancel.cancel();
                info!("[VIEW] Closed view for event {}", self.event.id.as_str());
                ViewUpdate::Closed
            }
        }
    }

    fn load_more(&mut self) -> ViewUpdate {
        if !self.gate.validity().is_valid() {
            return ViewUpdate::SignInRequired;
        }

        match self.pagination.next() {
            Ok(Some(page)) => {
                let has_more = !page.is_last();
                if self.pagination.messages().is_empty() && !has_more {
                    ViewUpdate::Empty
                } else {
                    ViewUpdate::Messages {
                        added: page.len(),
                        has_more,
                    }
                }
            }
            Ok(None) if self.pagination.messages().is_empty() => ViewUpdate::Empty,
            Ok(None) => ViewUpdate::Messages {
                added: 0,
                has_more: false,
            },
            Err(err) => self.classify(err),
        }
    }

    fn generate_proof(&mut self, id: MessageId) -> ViewUpdate {
        let Some(pipeline) = self.pipeline.as_mut() else {
            warn!("[VIEW] Proof requested without a proving service");
            return ViewUpdate::Error(AttestError::ProofGenerationFailed {
                message: NO_PROVER_MESSAGE.to_string(),
            });
        };

        let detail = match self.fetcher.detail(&self.gate, &id, true) {
            Ok(fetched) => {
                for reason in &fetched.degraded {
                    warn!("[VIEW] Proving {} with partial detail: {}", id, reason);
                }
                fetched.detail
            }
            Err(err) => return self.classify(err),
        };
        if self.cancel.is_cancelled() {
            return ViewUpdate::Ignored;
        }

        let result = pipeline.run(&detail, &self.event);
        if self.cancel.is_cancelled() {
            return ViewUpdate::Ignored;
        }

        self.claims
            .entry(id.clone())
            .or_insert_with(|| RevealGate::new(id))
            .apply(&result);

        ViewUpdate::Proof(result)
    }

    fn classify(&self, err: AttestError) -> ViewUpdate {
        match err {
            err if err.is_recoverable_by_sign_in() => ViewUpdate::SignInRequired,
            AttestError::Cancelled => ViewUpdate::Ignored,
            err => ViewUpdate::Error(err),
        }
    }
}
