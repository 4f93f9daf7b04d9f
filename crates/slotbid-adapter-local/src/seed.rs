//! TOML fixture that seeds the in-memory stores.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use slotbid_core::model::{Campaign, Slot};
use slotbid_core::store::memory::{MemoryCampaignStore, MemorySlotStore, MemoryTagStore};
use slotbid_core::targeting::UserTags;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub slots: Vec<Slot>,
    pub campaigns: Vec<Campaign>,
    /// Keyed by viewer id.
    pub tags: HashMap<String, UserTags>,
}

impl Seed {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let seed: Seed = toml::from_str(s).context("invalid fixture")?;
        for campaign in &seed.campaigns {
            if let Some(rule) = &campaign.targeting_rules {
                rule.validate().with_context(|| {
                    format!("campaign {} has invalid targeting rules", campaign.campaign_id)
                })?;
            }
        }
        Ok(seed)
    }

    pub fn load(path: &Path) -> Result<(String, Self)> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let seed = Self::from_toml_str(&text)?;
        Ok((text, seed))
    }

    pub async fn populate(
        self,
        slots: &MemorySlotStore,
        campaigns: &MemoryCampaignStore,
        tags: &MemoryTagStore,
    ) -> Result<()> {
        for slot in self.slots {
            slots.insert(slot).await;
        }
        for campaign in self.campaigns {
            campaigns.insert(campaign).await;
        }
        for (viewer, viewer_tags) in self.tags {
            let Ok(id) = viewer.parse::<u64>() else {
                bail!("tag table key '{}' is not a viewer id", viewer);
            };
            tags.insert(id, viewer_tags).await;
        }
        Ok(())
    }
}
