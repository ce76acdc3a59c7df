//! Marketplace domain types: campaigns, deals, lifecycle history, API payloads.

use chrono::{DateTime, NaiveDate, Utc};
use podsponsor_core::Role;
use podsponsor_reporting::{EpisodeMetrics, PerformanceRecord, RecordMetrics, RollupReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub podcast_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub ad_format: AdFormat,
    pub ad_duration_secs: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_episodes: u32,
    pub episodes_completed: u32,
    /// Set by the advertiser at creation, never changed afterwards.
    pub proposed_rate: f64,
    pub negotiated_rate: Option<f64>,
    /// Always `rate_in_effect() * total_episodes`.
    pub total_budget: f64,
    pub ad_script: Option<String>,
    pub promo_code: String,
    pub tracking_url: String,
    pub content_approval_status: ContentApprovalStatus,
    pub content_notes: Option<String>,
    pub status: CampaignStatus,
    pub target_impressions: Option<u64>,
    pub target_conversions: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Negotiated rate if one exists, else the proposed rate.
    pub fn rate_in_effect(&self) -> f64 {
        self.negotiated_rate.unwrap_or(self.proposed_rate)
    }

    pub fn set_negotiated_rate(&mut self, rate: f64) {
        self.negotiated_rate = Some(rate);
        self.recompute_budget();
    }

    pub fn recompute_budget(&mut self) {
        self.total_budget = self.rate_in_effect() * f64::from(self.total_episodes);
    }

    pub fn remaining_episodes(&self) -> u32 {
        self.total_episodes.saturating_sub(self.episodes_completed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Pending,
    Negotiating,
    Approved,
    Active,
    Completed,
    Cancelled,
    /// Turned down by the producer through a direct status update.
    Rejected,
}

impl CampaignStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CampaignStatus::Completed | CampaignStatus::Cancelled | CampaignStatus::Rejected
        )
    }

    /// States in which the rate is still open for negotiation.
    pub fn is_negotiable(self) -> bool {
        matches!(
            self,
            CampaignStatus::Draft
                | CampaignStatus::Pending
                | CampaignStatus::Negotiating
                | CampaignStatus::Approved
        )
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Pending => "pending",
            CampaignStatus::Negotiating => "negotiating",
            CampaignStatus::Approved => "approved",
            CampaignStatus::Active => "active",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
            CampaignStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AdFormat {
    PreRoll,
    MidRoll,
    PostRoll,
    #[serde(alias = "host-read")]
    HostNarrated,
    #[serde(alias = "produced")]
    FullyProduced,
}

// ─── Deal (ledger entry) ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub author_id: Uuid,
    pub author_role: Role,
    pub offer_kind: OfferKind,
    pub offered_rate: f64,
    pub terms: Option<String>,
    pub response_status: ResponseStatus,
    pub responded_by: Option<Uuid>,
    pub response_message: Option<String>,
    pub response_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    Initial,
    #[default]
    Counter,
    Final,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Countered,
}

/// What a counterparty may answer to an offer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DealOutcome {
    Accepted,
    Rejected,
    Countered,
}

impl From<DealOutcome> for ResponseStatus {
    fn from(outcome: DealOutcome) -> Self {
        match outcome {
            DealOutcome::Accepted => ResponseStatus::Accepted,
            DealOutcome::Rejected => ResponseStatus::Rejected,
            DealOutcome::Countered => ResponseStatus::Countered,
        }
    }
}

// ─── Direct status update & content review ─────────────────────────────────

/// Statuses a producer may set directly, outside the offer sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusUpdate {
    Approved,
    Rejected,
    Negotiating,
}

impl From<StatusUpdate> for CampaignStatus {
    fn from(update: StatusUpdate) -> Self {
        match update {
            StatusUpdate::Approved => CampaignStatus::Approved,
            StatusUpdate::Rejected => CampaignStatus::Rejected,
            StatusUpdate::Negotiating => CampaignStatus::Negotiating,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentDecision {
    Approved,
    Rejected,
}

impl From<ContentDecision> for ContentApprovalStatus {
    fn from(decision: ContentDecision) -> Self {
        match decision {
            ContentDecision::Approved => ContentApprovalStatus::Approved,
            ContentDecision::Rejected => ContentApprovalStatus::Rejected,
        }
    }
}

// ─── Lifecycle history ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    OfferSubmitted,
    OfferAccepted,
    OfferRejected,
    StatusUpdate,
    ContentApproved,
    EpisodeRecorded,
    Completed,
    Cancelled,
}

/// A recorded status change in a campaign's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleTransition {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub from_status: CampaignStatus,
    pub to_status: CampaignStatus,
    pub trigger: TransitionTrigger,
    pub actor_id: Uuid,
    pub actor_role: Role,
    pub timestamp: DateTime<Utc>,
}

// ─── Registry entries ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub accepting_ads: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// ─── Analytics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AnalyticsScope {
    Campaign(Uuid),
    Podcast(Uuid),
    Brand(Uuid),
}

/// A stored performance record together with its derived rates.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceView {
    #[serde(flatten)]
    pub record: PerformanceRecord,
    #[serde(flatten)]
    pub derived: RecordMetrics,
}

impl PerformanceView {
    pub fn new(record: PerformanceRecord, campaign: &Campaign) -> Self {
        let derived = record.derived(campaign.rate_in_effect());
        Self { record, derived }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub scope: AnalyticsScope,
    #[serde(flatten)]
    pub rollup: RollupReport,
    pub campaigns: Vec<Campaign>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<PerformanceView>,
}

// ─── API Request/Response types ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub brand_id: Uuid,
    pub podcast_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub ad_format: AdFormat,
    #[serde(default)]
    pub ad_duration_secs: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_total_episodes")]
    pub total_episodes: u32,
    pub proposed_rate: Option<f64>,
    #[serde(default)]
    pub ad_script: Option<String>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub target_impressions: Option<u64>,
    #[serde(default)]
    pub target_conversions: Option<u64>,
}

fn default_total_episodes() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SubmitOfferRequest {
    pub offered_rate: Option<f64>,
    #[serde(default)]
    pub offer_kind: OfferKind,
    #[serde(default)]
    pub terms: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub outcome: DealOutcome,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: StatusUpdate,
}

#[derive(Debug, Deserialize)]
pub struct ContentApprovalRequest {
    pub outcome: ContentDecision,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordEpisodeRequest {
    #[serde(default)]
    pub episode_title: Option<String>,
    #[serde(default)]
    pub episode_date: Option<NaiveDate>,
    #[serde(default = "default_episode_number")]
    pub episode_number: u32,
    #[serde(flatten)]
    pub metrics: EpisodeMetrics,
    #[serde(default)]
    pub attribution_days: Option<u32>,
    #[serde(default)]
    pub tracked_date: Option<NaiveDate>,
}

fn default_episode_number() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RegisterPodcastRequest {
    pub title: String,
    #[serde(default = "default_accepting_ads")]
    pub accepting_ads: bool,
}

fn default_accepting_ads() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RegisterBrandRequest {
    pub name: String,
}

/// Result of a ledger operation: the deal and the campaign it touched.
#[derive(Debug, Clone, Serialize)]
pub struct OfferOutcome {
    pub deal: Deal,
    pub campaign: Campaign,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeOutcome {
    pub performance: PerformanceView,
    pub campaign: Campaign,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignDeals {
    pub campaign: Campaign,
    pub deals: Vec<Deal>,
    /// Most recent offer, if nobody has answered it yet.
    pub open_offer_id: Option<Uuid>,
    pub last_accepted_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ad_format_accepts_legacy_tags() {
        let f: AdFormat = serde_json::from_str("\"host-read\"").unwrap();
        assert_eq!(f, AdFormat::HostNarrated);
        let f: AdFormat = serde_json::from_str("\"fully-produced\"").unwrap();
        assert_eq!(f, AdFormat::FullyProduced);
        assert_eq!(serde_json::to_string(&AdFormat::MidRoll).unwrap(), "\"mid-roll\"");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(CampaignStatus::Completed.is_terminal());
        assert!(CampaignStatus::Cancelled.is_terminal());
        assert!(CampaignStatus::Rejected.is_terminal());
        assert!(!CampaignStatus::Active.is_terminal());
        assert!(!CampaignStatus::Active.is_negotiable());
    }

    #[test]
    fn test_scope_wire_format() {
        let id = Uuid::nil();
        let json = serde_json::to_value(AnalyticsScope::Brand(id)).unwrap();
        assert_eq!(json["kind"], "brand");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn test_offer_kind_defaults_to_counter() {
        let req: SubmitOfferRequest = serde_json::from_str(r#"{"offered_rate": 250}"#).unwrap();
        assert_eq!(req.offer_kind, OfferKind::Counter);
        assert_eq!(req.offered_rate, Some(250.0));
    }
}
