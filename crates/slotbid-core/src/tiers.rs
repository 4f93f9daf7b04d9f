//! Partition candidates into priority tiers.
//!
//! Algorithm, in order:
//! 1. Commercial candidates with targeting rules are matched against the
//!    viewer's tags; a mismatch removes the candidate from every tier.
//! 2. Survivors are routed by category, and commercial ones by billing mode.
//! 3. System and operational tiers are sorted by `priority`, bidding by
//!    `daily_bid_diamond`, all descending and stable.
//! 4. Fixed-daily keeps load order; those placements are pre-negotiated.

use crate::model::{BillingMode, Candidate, CampaignCategory};
use crate::targeting::{self, UserTags};

#[derive(Debug, Default, Clone)]
pub struct Classification {
    pub system: Vec<Candidate>,
    pub operational: Vec<Candidate>,
    pub fixed_daily: Vec<Candidate>,
    pub bidding: Vec<Candidate>,
    /// Dropped at step 1; these never reach the selector.
    pub targeting_rejected: Vec<Candidate>,
}

impl Classification {
    /// Candidates still competing for display.
    pub fn ranked_len(&self) -> usize {
        self.system.len() + self.operational.len() + self.fixed_daily.len() + self.bidding.len()
    }
}

pub fn classify(candidates: Vec<Candidate>, tags: Option<&UserTags>) -> Classification {
    let mut out = Classification::default();

    for candidate in candidates {
        let campaign = &candidate.campaign;
        if campaign.is_commercial() {
            if let Some(rule) = campaign.targeting_rules.as_ref() {
                if !targeting::matches(Some(rule), tags) {
                    log::debug!("tiers: campaign {} failed targeting", campaign.campaign_id);
                    out.targeting_rejected.push(candidate);
                    continue;
                }
            }
        }

        match (campaign.campaign_category, campaign.billing_mode) {
            (CampaignCategory::System, _) => out.system.push(candidate),
            (CampaignCategory::Operational, _) => out.operational.push(candidate),
            (CampaignCategory::Commercial, BillingMode::FixedDaily) => {
                out.fixed_daily.push(candidate)
            }
            (CampaignCategory::Commercial, BillingMode::Bidding) => out.bidding.push(candidate),
        }
    }

    // sort_by is stable; equal keys keep load order
    out.system.sort_by(|a, b| b.campaign.priority.cmp(&a.campaign.priority));
    out.operational.sort_by(|a, b| b.campaign.priority.cmp(&a.campaign.priority));
    out.bidding.sort_by(|a, b| b.campaign.daily_bid_diamond.cmp(&a.campaign.daily_bid_diamond));

    out
}
