//! Message detail enrichment
//!
//! Resolves message identifiers to subject/date metadata and, optionally,
//! the decoded raw message. Metadata and raw content are separate requests
//! so they can fail independently.

use anyhow::{Context, Result};
use log::{debug, warn};
use rayon::prelude::*;
use std::sync::Arc;

use super::MailboxProvider;
use crate::cancel::CancelFlag;
use crate::error::{AttestError, ProviderError};
use crate::gmail::decode_raw;
use crate::models::{DegradedEntry, MessageDetail, MessageId, MessageSummary};
use crate::session::SessionGate;

/// A detail lookup that may have been downgraded along the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDetail {
    pub detail: MessageDetail,
    /// Why metadata or raw content is missing; empty when both arrived
    pub degraded: Vec<AttestError>,
}

/// Enriched messages for one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedBatch {
    pub messages: Vec<MessageDetail>,
    pub degraded: Vec<DegradedEntry>,
}

/// Fetches message details, fanning out over a bounded thread pool
pub struct DetailFetcher {
    provider: Arc<dyn MailboxProvider>,
    pool: rayon::ThreadPool,
}

impl DetailFetcher {
    /// Create a fetcher running at most `concurrency` requests at once
    pub fn new(provider: Arc<dyn MailboxProvider>, concurrency: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency.max(1))
            .thread_name(|i| format!("attest-detail-{}", i))
            .build()
            .context("Failed to build detail fetch thread pool")?;

        Ok(Self { provider, pool })
    }

    /// Resolve one message
    ///
    /// Metadata is always requested. Raw content is requested only when
    /// `include_raw` is set. The two requests fail independently: a failed
    /// metadata request leaves subject and date empty, a failed raw request
    /// or undecodable payload leaves raw absent. Both are recorded in
    /// `degraded` instead of failing the lookup.
    ///
    /// # Errors
    /// `CredentialMissing`/`CredentialExpired` when the gate refuses a call
    /// or the provider rejects the token.
    pub fn detail(
        &self,
        gate: &SessionGate,
        id: &MessageId,
        include_raw: bool,
    ) -> Result<FetchedDetail, AttestError> {
        let access_token = gate.token()?;
        let mut degraded = Vec::new();

        let summary = match self.provider.get_metadata(&access_token, id) {
            Ok(metadata) => MessageSummary::new(
                id.clone(),
                metadata.header("Subject").unwrap_or_default(),
                metadata.header("Date").unwrap_or_default(),
            ),
            Err(ProviderError::Unauthorized) => return Err(gate.report_unauthorized()),
            Err(e) => {
                debug!("[DETAIL] Metadata unavailable for {}: {}", id, e);
                degraded.push(AttestError::DetailFetchDegraded {
                    message: format!("metadata for {}: {}", id, e),
                });
                MessageSummary::id_only(id.clone())
            }
        };

        if !include_raw {
            return Ok(FetchedDetail {
                detail: MessageDetail::metadata_only(summary),
                degraded,
            });
        }

        let raw = match self.fetch_raw(gate, id)? {
            Ok(raw) => Some(raw),
            Err(reason) => {
                debug!("[DETAIL] Raw content unavailable for {}: {}", id, reason);
                degraded.push(reason);
                None
            }
        };

        Ok(FetchedDetail {
            detail: MessageDetail::new(summary, raw),
            degraded,
        })
    }

    /// Fetch and decode raw content
    ///
    /// The outer error aborts the detail call (credential problems); the
    /// inner one only downgrades it.
    fn fetch_raw(
        &self,
        gate: &SessionGate,
        id: &MessageId,
    ) -> Result<Result<String, AttestError>, AttestError> {
        let access_token = gate.token()?;

        let raw = match self.provider.get_raw(&access_token, id) {
            Ok(message) => message.raw,
            Err(ProviderError::Unauthorized) => return Err(gate.report_unauthorized()),
            Err(e) => {
                return Ok(Err(AttestError::DetailFetchDegraded {
                    message: format!("raw content for {}: {}", id, e),
                }));
            }
        };

        Ok(match raw {
            Some(data) => decode_raw(&data),
            None => Err(AttestError::DetailFetchDegraded {
                message: format!("raw content for {}: response has no raw field", id),
            }),
        })
    }

    /// Enrich a page of identifiers concurrently
    ///
    /// Order follows `ids`. A failed request downgrades that one entry; a
    /// rejected credential or a cancelled view fails the whole batch, and
    /// lookups that had not started yet are never issued.
    pub fn enrich(
        &self,
        gate: &SessionGate,
        ids: &[MessageId],
        include_raw: bool,
        cancel: &CancelFlag,
    ) -> Result<EnrichedBatch, AttestError> {
        let results: Vec<Result<FetchedDetail, AttestError>> = self.pool.install(|| {
            ids.par_iter()
                .map(|id| {
                    if cancel.is_cancelled() {
                        return Err(AttestError::Cancelled);
                    }
                    self.detail(gate, id, include_raw)
                })
                .collect()
        });

        if cancel.is_cancelled() {
            return Err(AttestError::Cancelled);
        }

        let mut batch = EnrichedBatch::default();
        for (id, result) in ids.iter().zip(results) {
            let fetched = result?;
            for reason in fetched.degraded {
                warn!("[DETAIL] Degraded {}: {}", id, reason);
                batch.degraded.push(DegradedEntry {
                    id: id.clone(),
                    reason,
                });
            }
            batch.messages.push(fetched.detail);
        }

        Ok(batch)
    }
}
