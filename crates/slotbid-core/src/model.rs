//! Slot, campaign and creative records as the auction engine reads them.
//!
//! These are read-only views; the engine never mutates a campaign.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::targeting::TargetingRule;

/// A named display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub slot_id: u64,
    pub slot_key: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub max_display_count: u32,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignCategory {
    /// Legal and compliance content; always shown first.
    System,
    /// Merchandising content; shown before any paid content.
    Operational,
    Commercial,
}

/// Only meaningful for `CampaignCategory::Commercial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    #[default]
    FixedDaily,
    Bidding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Pending,
    Active,
    Paused,
    Ended,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// Client-side frequency capping hint, passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyRule {
    OncePerSession,
    OncePerDay,
    OncePerNDays,
    NTimesPerDay,
    Always,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creative {
    pub creative_id: u64,
    pub review_status: ReviewStatus,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_width: Option<u32>,
    #[serde(default)]
    pub image_height: Option<u32>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub display_mode: Option<String>,
}

fn default_content_type() -> String {
    "image".to_string()
}

impl Creative {
    pub fn is_approved(&self) -> bool {
        self.review_status == ReviewStatus::Approved
    }
}

/// A demand unit competing for a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: u64,
    /// Slot this campaign is booked against.
    pub slot_id: u64,
    pub campaign_category: CampaignCategory,
    #[serde(default)]
    pub billing_mode: BillingMode,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub daily_bid_diamond: u64,
    pub status: CampaignStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// `None` means unlimited.
    #[serde(default)]
    pub budget_total_diamond: Option<u64>,
    #[serde(default)]
    pub budget_spent_diamond: u64,
    #[serde(default)]
    pub targeting_rules: Option<TargetingRule>,
    #[serde(default)]
    pub frequency_rule: Option<FrequencyRule>,
    #[serde(default)]
    pub frequency_value: Option<u32>,
    #[serde(default)]
    pub force_show: bool,
    #[serde(default)]
    pub slide_interval_ms: Option<u32>,
    #[serde(default)]
    pub creatives: Vec<Creative>,
}

impl Campaign {
    /// Status, time window and remaining budget all allow serving at `at`.
    ///
    /// The spend figure is owned by an external ledger and may be stale by
    /// the time the auction finishes; near exhaustion a campaign can be
    /// over-served.
    pub fn is_eligible_at(&self, at: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active
            && self.start_date <= at
            && at <= self.end_date
            && self.has_budget_left()
    }

    pub fn has_budget_left(&self) -> bool {
        match self.budget_total_diamond {
            None => true,
            Some(total) => self.budget_spent_diamond < total,
        }
    }

    /// First approved creative in stored order.
    pub fn eligible_creative(&self) -> Option<&Creative> {
        self.creatives.iter().find(|c| c.is_approved())
    }

    pub fn is_commercial(&self) -> bool {
        self.campaign_category == CampaignCategory::Commercial
    }
}

/// An eligible campaign with the creative it would display.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub campaign: Campaign,
    pub creative: Creative,
}

impl Candidate {
    /// Pair a campaign with its first approved creative, if it has one.
    pub fn from_campaign(campaign: Campaign) -> Option<Self> {
        let creative = campaign.eligible_creative()?.clone();
        Some(Self { campaign, creative })
    }

    pub fn campaign_id(&self) -> u64 {
        self.campaign.campaign_id
    }
}
