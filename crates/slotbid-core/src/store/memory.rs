//! In-memory stores for tests and the local adapter.
//!
//! Each store can be flipped into a failing mode to exercise error paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{AuditStore, CampaignStore, SlotStore, StoreError, TagStore};
use crate::audit::BidLogRow;
use crate::model::{Campaign, Candidate, Slot};
use crate::targeting::UserTags;

#[derive(Debug, Default)]
struct FailSwitch(AtomicBool);

impl FailSwitch {
    fn set(&self, fail: bool) {
        self.0.store(fail, Ordering::SeqCst);
    }

    fn check(&self, what: &str) -> Result<(), StoreError> {
        if self.0.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{} store offline", what)))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: RwLock<HashMap<String, Slot>>,
    fail: FailSwitch,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, slot: Slot) {
        self.slots.write().await.insert(slot.slot_key.clone(), slot);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn get_active_slot(&self, slot_key: &str) -> Result<Option<Slot>, StoreError> {
        self.fail.check("slot")?;
        let slots = self.slots.read().await;
        Ok(slots.get(slot_key).filter(|s| s.is_active).cloned())
    }
}

/// Campaigns kept in insertion order, which is the load order reported.
#[derive(Debug, Default)]
pub struct MemoryCampaignStore {
    campaigns: RwLock<Vec<Campaign>>,
    fail: FailSwitch,
}

impl MemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, campaign: Campaign) {
        self.campaigns.write().await.push(campaign);
    }

    /// Overwrite the spend of an existing campaign, as the budget ledger would.
    pub async fn set_spent(&self, campaign_id: u64, spent: u64) -> bool {
        let mut campaigns = self.campaigns.write().await;
        match campaigns.iter_mut().find(|c| c.campaign_id == campaign_id) {
            Some(c) => {
                c.budget_spent_diamond = spent;
                true
            }
            None => false,
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn list_eligible(
        &self,
        slot_id: u64,
        at: DateTime<Utc>,
    ) -> Result<Vec<Candidate>, StoreError> {
        self.fail.check("campaign")?;
        let campaigns = self.campaigns.read().await;
        Ok(campaigns
            .iter()
            .filter(|c| c.slot_id == slot_id && c.is_eligible_at(at))
            .filter_map(|c| Candidate::from_campaign(c.clone()))
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTagStore {
    tags: RwLock<HashMap<u64, UserTags>>,
    fail: FailSwitch,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, viewer_id: u64, tags: UserTags) {
        self.tags.write().await.insert(viewer_id, tags);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn get_tags(&self, viewer_id: u64) -> Result<UserTags, StoreError> {
        self.fail.check("tag")?;
        Ok(self
            .tags
            .read()
            .await
            .get(&viewer_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryAuditStore {
    rows: Arc<RwLock<Vec<BidLogRow>>>,
    fail: Arc<FailSwitch>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rows(&self) -> Vec<BidLogRow> {
        self.rows.read().await.clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn bulk_insert_bid_logs(&self, rows: Vec<BidLogRow>) -> Result<(), StoreError> {
        self.fail
            .check("audit")
            .map_err(|e| StoreError::Write(e.to_string()))?;
        self.rows.write().await.extend(rows);
        Ok(())
    }
}
