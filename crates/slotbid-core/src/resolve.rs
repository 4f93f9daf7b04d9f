//! Slot lookup and candidate loading over the collaborator stores.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::model::{Candidate, Slot};
use crate::store::{CampaignStore, SlotStore, StoreError};

pub struct SlotResolver {
    store: Arc<dyn SlotStore>,
}

impl SlotResolver {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    /// `Ok(None)` for a missing or disabled slot; that is a normal outcome.
    pub async fn resolve(&self, slot_key: &str) -> Result<Option<Slot>, StoreError> {
        let slot = self.store.get_active_slot(slot_key).await?;
        Ok(slot.filter(|s| s.is_active))
    }
}

pub struct CandidateLoader {
    store: Arc<dyn CampaignStore>,
}

impl CandidateLoader {
    pub fn new(store: Arc<dyn CampaignStore>) -> Self {
        Self { store }
    }

    /// Eligible candidates for `slot` at `at`, in store load order.
    pub async fn load(&self, slot: &Slot, at: DateTime<Utc>) -> Result<Vec<Candidate>, StoreError> {
        let mut candidates = self.store.list_eligible(slot.slot_id, at).await?;
        candidates.retain(|c| {
            let keep = c.campaign.is_eligible_at(at) && c.creative.is_approved();
            if !keep {
                log::debug!(
                    "loader: store returned ineligible campaign {} for slot {}",
                    c.campaign_id(),
                    slot.slot_key
                );
            }
            keep
        });
        Ok(candidates)
    }
}
