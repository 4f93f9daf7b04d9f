//! Caller-facing payload for winning campaigns.

use serde::Serialize;

use crate::model::{BillingMode, CampaignCategory, Candidate, Creative, FrequencyRule};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreativePayload {
    pub id: u64,
    pub title: Option<String>,
    pub content_type: String,
    pub image_url: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub text_content: Option<String>,
    pub link_url: Option<String>,
    pub link_type: Option<String>,
    pub display_mode: Option<String>,
}

impl From<Creative> for CreativePayload {
    fn from(c: Creative) -> Self {
        Self {
            id: c.creative_id,
            title: c.title,
            content_type: c.content_type,
            image_url: c.image_url,
            image_width: c.image_width,
            image_height: c.image_height,
            text_content: c.text_content,
            link_url: c.link_url,
            link_type: c.link_type,
            display_mode: c.display_mode,
        }
    }
}

/// A winning campaign and its creative, in display order.
///
/// The frequency and force-show fields are hints for client-side display
/// logic and are copied from the campaign unmodified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinnerResult {
    pub campaign_id: u64,
    pub campaign_category: CampaignCategory,
    pub billing_mode: BillingMode,
    pub priority: i32,
    pub creative: CreativePayload,
    pub frequency_rule: Option<FrequencyRule>,
    pub frequency_value: Option<u32>,
    pub force_show: bool,
    pub slide_interval_ms: Option<u32>,
}

impl From<Candidate> for WinnerResult {
    fn from(candidate: Candidate) -> Self {
        let Candidate { campaign, creative } = candidate;
        Self {
            campaign_id: campaign.campaign_id,
            campaign_category: campaign.campaign_category,
            billing_mode: campaign.billing_mode,
            priority: campaign.priority,
            creative: creative.into(),
            frequency_rule: campaign.frequency_rule,
            frequency_value: campaign.frequency_value,
            force_show: campaign.force_show,
            slide_interval_ms: campaign.slide_interval_ms,
        }
    }
}

pub fn assemble(winners: Vec<Candidate>) -> Vec<WinnerResult> {
    winners.into_iter().map(WinnerResult::from).collect()
}
