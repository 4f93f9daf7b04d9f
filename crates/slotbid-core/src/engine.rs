//! The `select_winners` pipeline.
//!
//! resolve slot → load candidates → fetch tags → classify → select →
//! submit audit batch → assemble. Each call is independent; the engine holds
//! no mutable state beyond the audit queue handle.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::audit::{build_rows, AuctionRun, BidAuditLogger};
use crate::config::{AppConfig, EngineConfig};
use crate::error::AuctionError;
use crate::model::{Candidate, Slot};
use crate::resolve::{CandidateLoader, SlotResolver};
use crate::result::{assemble, WinnerResult};
use crate::selector::select;
use crate::store::{AuditStore, CampaignStore, SlotStore, StoreError, TagStore};
use crate::targeting::UserTags;
use crate::tiers::{classify, Classification};

fn new_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// The collaborators an engine is built over.
#[derive(Clone)]
pub struct Stores {
    pub slots: Arc<dyn SlotStore>,
    pub campaigns: Arc<dyn CampaignStore>,
    pub tags: Arc<dyn TagStore>,
    pub audit: Arc<dyn AuditStore>,
}

/// Everything read from the stores for one run.
struct Inputs {
    slot: Slot,
    candidates: Vec<Candidate>,
    tags: Option<UserTags>,
}

pub struct AuctionEngine {
    slots: SlotResolver,
    loader: CandidateLoader,
    tags: Arc<dyn TagStore>,
    audit: BidAuditLogger,
    config: EngineConfig,
}

impl AuctionEngine {
    /// Build an engine and start its audit writer. Must be called from
    /// within a tokio runtime.
    pub fn new(stores: Stores, config: &AppConfig) -> Self {
        Self {
            slots: SlotResolver::new(stores.slots),
            loader: CandidateLoader::new(stores.campaigns),
            tags: stores.tags,
            audit: BidAuditLogger::spawn(stores.audit, config.audit.queue_capacity),
            config: config.engine.clone(),
        }
    }

    /// Pick the campaigns to display on `slot_key`, in display order.
    ///
    /// A missing or inactive slot, an empty candidate set and an expired
    /// deadline all yield `Ok(vec![])`. Only slot and campaign store failures
    /// are errors.
    pub async fn select_winners(
        &self,
        slot_key: &str,
        viewer_id: Option<u64>,
        deadline: Option<Duration>,
    ) -> Result<Vec<WinnerResult>, AuctionError> {
        self.select_winners_at(slot_key, viewer_id, deadline, Utc::now()).await
    }

    /// As [`select_winners`](Self::select_winners) with an explicit auction time.
    pub async fn select_winners_at(
        &self,
        slot_key: &str,
        viewer_id: Option<u64>,
        deadline: Option<Duration>,
        at: DateTime<Utc>,
    ) -> Result<Vec<WinnerResult>, AuctionError> {
        let started = Instant::now();
        let result = self.run(slot_key, viewer_id, deadline, at).await;
        self.observe(slot_key, started.elapsed());
        result
    }

    /// Drain pending audit batches and stop the writer.
    pub async fn shutdown(self) {
        self.audit.close().await;
    }

    async fn run(
        &self,
        slot_key: &str,
        viewer_id: Option<u64>,
        deadline: Option<Duration>,
        at: DateTime<Utc>,
    ) -> Result<Vec<WinnerResult>, AuctionError> {
        let deadline = deadline.or_else(|| self.config.default_deadline());
        let read = self.read_inputs(slot_key, viewer_id, at);
        let inputs = match deadline {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(inputs) => inputs?,
                Err(_) => {
                    log::warn!(
                        "auction: slot '{}' exceeded deadline of {:?}; returning no winners",
                        slot_key,
                        limit
                    );
                    return Ok(Vec::new());
                }
            },
            None => read.await?,
        };

        let Some(Inputs {
            slot,
            candidates,
            tags,
        }) = inputs
        else {
            log::debug!("auction: slot '{}' missing or inactive", slot_key);
            return Ok(Vec::new());
        };

        if candidates.is_empty() {
            log::debug!("auction: no eligible campaigns for slot '{}'", slot_key);
            return Ok(Vec::new());
        }

        let loaded = candidates.len();
        let Classification {
            system,
            operational,
            fixed_daily,
            bidding,
            targeting_rejected,
        } = classify(candidates, tags.as_ref());
        let selection = select(
            system,
            operational,
            fixed_daily,
            bidding,
            slot.max_display_count,
        );

        let run = AuctionRun {
            auction_id: new_id(),
            slot_id: slot.slot_id,
            user_id: viewer_id,
            at,
        };
        log::info!(
            "auction {}: slot '{}' candidates={} winners={} outbid={} targeting_mismatch={}",
            run.auction_id,
            slot.slot_key,
            loaded,
            selection.winners.len(),
            selection.losers.len(),
            targeting_rejected.len()
        );
        self.audit.submit(build_rows(&run, &targeting_rejected, &selection));

        Ok(assemble(selection.winners))
    }

    async fn read_inputs(
        &self,
        slot_key: &str,
        viewer_id: Option<u64>,
        at: DateTime<Utc>,
    ) -> Result<Option<Inputs>, StoreError> {
        let Some(slot) = self.slots.resolve(slot_key).await? else {
            return Ok(None);
        };
        let candidates = self.loader.load(&slot, at).await?;

        let needs_tags = candidates
            .iter()
            .any(|c| c.campaign.is_commercial() && c.campaign.targeting_rules.is_some());
        let tags = match viewer_id {
            Some(viewer) if needs_tags => self.fetch_tags(viewer).await,
            _ => None,
        };

        Ok(Some(Inputs {
            slot,
            candidates,
            tags,
        }))
    }

    /// Tag failures never abort a run; targeting then fails open.
    async fn fetch_tags(&self, viewer_id: u64) -> Option<UserTags> {
        match self.tags.get_tags(viewer_id).await {
            Ok(tags) => Some(tags),
            Err(e) => {
                log::warn!(
                    "auction: tag lookup for viewer {} failed, targeting fails open: {}",
                    viewer_id,
                    e
                );
                None
            }
        }
    }

    fn observe(&self, slot_key: &str, elapsed: Duration) {
        if elapsed > self.config.sla_warn() {
            log::warn!(
                "auction: slot '{}' took {} ms, over the {} ms SLA",
                slot_key,
                elapsed.as_millis(),
                self.config.sla_warn_ms
            );
        } else {
            log::debug!("auction: slot '{}' took {} ms", slot_key, elapsed.as_millis());
        }
    }
}
