//! Collaborator interfaces the engine reads from and writes to.
//!
//! The engine owns no persistent state; everything lives behind these traits.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::audit::BidLogRow;
use crate::model::{Candidate, Slot};
use crate::targeting::UserTags;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("write failed: {0}")]
    Write(String),
}

#[async_trait]
pub trait SlotStore: Send + Sync {
    /// The slot with this key, or `None` if it is missing or inactive.
    async fn get_active_slot(&self, slot_key: &str) -> Result<Option<Slot>, StoreError>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Campaigns booked on `slot_id` that are eligible at `at`, each paired
    /// with its approved creative.
    ///
    /// Implementations apply status, time window, remaining budget and the
    /// approved-creative join in the query itself. Order is the store's load
    /// order and is used as the tie-breaker downstream.
    async fn list_eligible(
        &self,
        slot_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Vec<Candidate>, StoreError>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn get_tags(&self, viewer_id: u64) -> Result<UserTags, StoreError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append rows; rows are never updated.
    async fn bulk_insert_bid_logs(&self, rows: Vec<BidLogRow>) -> Result<(), StoreError>;
}
