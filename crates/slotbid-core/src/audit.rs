//! Append-only bid audit trail.
//!
//! Every candidate that was loaded for a run gets exactly one row: targeting
//! rejects, winners and truncation losers. Rows for a run are written as a
//! single batch by a background worker so the caller never waits on audit
//! durability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::model::Candidate;
use crate::selector::Selection;
use crate::store::AuditStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoseReason {
    TargetingMismatch,
    Outbid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidLogRow {
    pub auction_id: String,
    pub slot_id: u64,
    pub campaign_id: u64,
    pub user_id: Option<u64>,
    pub is_winner: bool,
    pub lose_reason: Option<LoseReason>,
    pub bid_amount: u64,
    pub created_at: DateTime<Utc>,
}

/// Identity of one auction run, stamped onto each of its rows.
#[derive(Debug, Clone)]
pub struct AuctionRun {
    pub auction_id: String,
    pub slot_id: u64,
    pub user_id: Option<u64>,
    pub at: DateTime<Utc>,
}

impl AuctionRun {
    fn row(
        &self,
        candidate: &Candidate,
        is_winner: bool,
        lose_reason: Option<LoseReason>,
    ) -> BidLogRow {
        BidLogRow {
            auction_id: self.auction_id.clone(),
            slot_id: self.slot_id,
            campaign_id: candidate.campaign_id(),
            user_id: self.user_id,
            is_winner,
            lose_reason,
            bid_amount: candidate.campaign.daily_bid_diamond,
            created_at: self.at,
        }
    }
}

/// One row per candidate, in the order rejects, winners, losers.
pub fn build_rows(
    run: &AuctionRun,
    targeting_rejected: &[Candidate],
    selection: &Selection,
) -> Vec<BidLogRow> {
    let mut rows = Vec::with_capacity(
        targeting_rejected.len() + selection.winners.len() + selection.losers.len(),
    );
    rows.extend(
        targeting_rejected
            .iter()
            .map(|c| run.row(c, false, Some(LoseReason::TargetingMismatch))),
    );
    rows.extend(selection.winners.iter().map(|c| run.row(c, true, None)));
    rows.extend(
        selection
            .losers
            .iter()
            .map(|c| run.row(c, false, Some(LoseReason::Outbid))),
    );
    rows
}

/// Bounded queue in front of an [`AuditStore`].
pub struct BidAuditLogger {
    tx: mpsc::Sender<Vec<BidLogRow>>,
    worker: JoinHandle<()>,
}

impl BidAuditLogger {
    /// Start the writer task. Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn AuditStore>, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Vec<BidLogRow>>(queue_capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                let n = batch.len();
                let auction_id = batch
                    .first()
                    .map(|r| r.auction_id.clone())
                    .unwrap_or_default();
                match store.bulk_insert_bid_logs(batch).await {
                    Ok(()) => log::debug!("audit: wrote {} row(s) for auction {}", n, auction_id),
                    Err(e) => log::error!(
                        "audit: failed to write {} row(s) for auction {}: {}",
                        n,
                        auction_id,
                        e
                    ),
                }
            }
            log::debug!("audit: writer stopped");
        });
        Self { tx, worker }
    }

    /// Queue a batch without waiting. Returns `false` if the batch was dropped.
    pub fn submit(&self, rows: Vec<BidLogRow>) -> bool {
        if rows.is_empty() {
            return true;
        }
        match self.tx.try_send(rows) {
            Ok(()) => true,
            Err(TrySendError::Full(rows)) => {
                log::warn!("audit: queue full, dropping {} row(s)", rows.len());
                false
            }
            Err(TrySendError::Closed(rows)) => {
                log::warn!("audit: writer closed, dropping {} row(s)", rows.len());
                false
            }
        }
    }

    /// Stop accepting batches, drain what is queued and wait for the writer.
    pub async fn close(self) {
        let Self { tx, worker } = self;
        drop(tx);
        if let Err(e) = worker.await {
            log::error!("audit: writer task failed: {}", e);
        }
    }
}
