//! In-memory marketplace store backed by DashMap.
//!
//! Arena layout: the campaign id is the key, and each entry owns its deals,
//! performance records and lifecycle history, so removing a campaign removes
//! everything that hangs off it. Every operation locks one entry, validates,
//! applies changes to copies, and writes them back only when every check
//! passed.

use crate::authz::{self, Action};
use crate::ledger;
use crate::lifecycle::{self, LifecycleEvent, StatusChange};
use crate::models::*;
use crate::registry::OwnershipRegistry;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use podsponsor_core::config::MarketplaceConfig;
use podsponsor_core::{
    Advertiser, CampaignParties, Caller, MarketError, MarketResult, NegotiationParticipant,
    Producer, Role,
};
use podsponsor_reporting::{CampaignRollupInput, PerformanceRecord, Rollup};
use rand::Rng;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Unambiguous upper-case alphabet for generated tracking codes.
const TRACKING_CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// One campaign and everything owned by it.
#[derive(Debug, Clone)]
pub struct CampaignEntry {
    pub campaign: Campaign,
    pub deals: Vec<Deal>,
    pub performance: Vec<PerformanceRecord>,
    pub history: Vec<LifecycleTransition>,
}

impl CampaignEntry {
    fn rollup_input(&self) -> CampaignRollupInput<'_> {
        CampaignRollupInput {
            rate_in_effect: self.campaign.rate_in_effect(),
            episodes_completed: self.campaign.episodes_completed,
            is_active: self.campaign.status == CampaignStatus::Active,
            is_completed: self.campaign.status == CampaignStatus::Completed,
            records: &self.performance,
        }
    }
}

/// Thread-safe store for campaigns and their ledgers.
pub struct MarketplaceStore {
    campaigns: DashMap<Uuid, CampaignEntry>,
    /// deal_id -> campaign_id
    deal_index: DashMap<Uuid, Uuid>,
    registry: Arc<dyn OwnershipRegistry>,
    config: MarketplaceConfig,
}

impl MarketplaceStore {
    pub fn new(registry: Arc<dyn OwnershipRegistry>, config: MarketplaceConfig) -> Self {
        info!("Marketplace store initialized (in-memory)");
        Self {
            campaigns: DashMap::new(),
            deal_index: DashMap::new(),
            registry,
            config,
        }
    }

    pub fn contains_campaign(&self, campaign_id: Uuid) -> bool {
        self.campaigns.contains_key(&campaign_id)
    }

    fn parties(&self, campaign: &Campaign) -> MarketResult<CampaignParties> {
        let producer = self.registry.podcast_owner(campaign.podcast_id).ok_or_else(|| {
            MarketError::not_found(format!("podcast {} not found", campaign.podcast_id))
        })?;
        let advertiser = self.registry.brand_owner(campaign.brand_id).ok_or_else(|| {
            MarketError::not_found(format!("brand {} not found", campaign.brand_id))
        })?;
        Ok(CampaignParties {
            producer,
            advertiser,
        })
    }

    fn record_transition<P: NegotiationParticipant + ?Sized>(
        entry: &mut CampaignEntry,
        change: Option<StatusChange>,
        event: &LifecycleEvent,
        actor: &P,
        now: DateTime<Utc>,
    ) {
        if let Some(change) = change {
            info!(
                campaign_id = %entry.campaign.id,
                from = %change.from,
                to = %change.to,
                trigger = ?event.trigger(),
                "Campaign status changed"
            );
            entry.history.push(LifecycleTransition {
                id: Uuid::new_v4(),
                campaign_id: entry.campaign.id,
                from_status: change.from,
                to_status: change.to,
                trigger: event.trigger(),
                actor_id: actor.user_id(),
                actor_role: actor.role(),
                timestamp: now,
            });
        }
    }

    /// Authorize `action`, then apply `event` to the campaign as one commit.
    fn transition<P: NegotiationParticipant + ?Sized>(
        &self,
        who: &P,
        campaign_id: Uuid,
        action: Action,
        event: LifecycleEvent,
    ) -> MarketResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| MarketError::not_found(format!("campaign {campaign_id} not found")))?;
        let parties = self.parties(&entry.campaign)?;
        authz::authorize(who, action, &parties)?;

        let now = Utc::now();
        let mut next = entry.campaign.clone();
        let change = lifecycle::apply(&mut next, &event, now)?;

        entry.campaign = next;
        Self::record_transition(&mut entry, change, &event, who, now);
        Ok(entry.campaign.clone())
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub fn create_campaign(
        &self,
        advertiser: &Advertiser,
        req: CreateCampaignRequest,
    ) -> MarketResult<Campaign> {
        let brand_owner = self
            .registry
            .brand_owner(req.brand_id)
            .ok_or_else(|| MarketError::not_found(format!("brand {} not found", req.brand_id)))?;
        if brand_owner != advertiser.user_id() {
            return Err(MarketError::unauthorized(
                "only the brand's owner may propose campaigns for it",
            ));
        }
        if self.registry.podcast_owner(req.podcast_id).is_none() {
            return Err(MarketError::not_found(format!(
                "podcast {} not found",
                req.podcast_id
            )));
        }
        if !self.registry.accepts_ads(req.podcast_id) {
            return Err(MarketError::validation("this podcast is not accepting ads"));
        }

        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Err(MarketError::validation("title is required"));
        }
        let proposed_rate = ledger::validate_rate(req.proposed_rate, "proposed_rate")?;
        if req.total_episodes == 0 {
            return Err(MarketError::validation("total_episodes must be at least 1"));
        }
        if req.total_episodes > self.config.max_episodes_per_campaign {
            return Err(MarketError::validation(format!(
                "total_episodes may not exceed {}",
                self.config.max_episodes_per_campaign
            )));
        }
        if let (Some(start), Some(end)) = (req.start_date, req.end_date) {
            if start > end {
                return Err(MarketError::validation("start_date must not be after end_date"));
            }
        }

        let promo_code = match req.promo_code.map(|c| c.trim().to_string()) {
            Some(code) if !code.is_empty() => code,
            _ => self.generate_tracking_code(),
        };
        let tracking_url = match req.tracking_url.map(|u| u.trim().to_string()) {
            Some(url) if !url.is_empty() => url,
            _ => format!(
                "{}/{}",
                self.config.tracking_base_url.trim_end_matches('/'),
                promo_code
            ),
        };

        let now = Utc::now();
        let mut campaign = Campaign {
            id: Uuid::new_v4(),
            brand_id: req.brand_id,
            podcast_id: req.podcast_id,
            title,
            description: req.description,
            ad_format: req.ad_format,
            ad_duration_secs: req
                .ad_duration_secs
                .unwrap_or(self.config.default_ad_duration_secs),
            start_date: req.start_date,
            end_date: req.end_date,
            total_episodes: req.total_episodes,
            episodes_completed: 0,
            proposed_rate,
            negotiated_rate: None,
            total_budget: 0.0,
            ad_script: req.ad_script,
            promo_code,
            tracking_url,
            content_approval_status: ContentApprovalStatus::Pending,
            content_notes: None,
            status: CampaignStatus::Pending,
            target_impressions: req.target_impressions,
            target_conversions: req.target_conversions,
            created_at: now,
            updated_at: now,
            approved_at: None,
            completed_at: None,
        };
        campaign.recompute_budget();

        info!(
            campaign_id = %campaign.id,
            brand_id = %campaign.brand_id,
            podcast_id = %campaign.podcast_id,
            total_budget = campaign.total_budget,
            "Campaign proposed"
        );
        self.campaigns.insert(
            campaign.id,
            CampaignEntry {
                campaign: campaign.clone(),
                deals: Vec::new(),
                performance: Vec::new(),
                history: Vec::new(),
            },
        );
        Ok(campaign)
    }

    fn generate_tracking_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.config.tracking_code_len.max(1))
            .map(|_| {
                let idx = rng.gen_range(0..TRACKING_CODE_CHARSET.len());
                TRACKING_CODE_CHARSET[idx] as char
            })
            .collect()
    }

    pub fn get_campaign(&self, caller: &Caller, campaign_id: Uuid) -> MarketResult<Campaign> {
        let entry = self.view_entry(caller, campaign_id)?;
        Ok(entry.campaign)
    }

    /// Campaigns on podcasts or brands the caller owns, newest first.
    pub fn list_campaigns(&self, caller: &Caller) -> Vec<Campaign> {
        let user = caller.user_id();
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| {
                let c = &r.value().campaign;
                match caller.role() {
                    Role::Producer => self.registry.podcast_owner(c.podcast_id) == Some(user),
                    Role::Advertiser => self.registry.brand_owner(c.brand_id) == Some(user),
                }
            })
            .map(|r| r.value().campaign.clone())
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    /// Snapshot of one entry, after checking view rights.
    fn view_entry(&self, caller: &Caller, campaign_id: Uuid) -> MarketResult<CampaignEntry> {
        let entry = self
            .campaigns
            .get(&campaign_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| MarketError::not_found(format!("campaign {campaign_id} not found")))?;
        let parties = self.parties(&entry.campaign)?;
        authz::authorize(caller, Action::View, &parties)?;
        Ok(entry)
    }

    pub fn history(
        &self,
        caller: &Caller,
        campaign_id: Uuid,
    ) -> MarketResult<Vec<LifecycleTransition>> {
        Ok(self.view_entry(caller, campaign_id)?.history)
    }

    pub fn update_status(
        &self,
        producer: &Producer,
        campaign_id: Uuid,
        status: StatusUpdate,
    ) -> MarketResult<Campaign> {
        self.transition(
            producer,
            campaign_id,
            Action::UpdateStatus,
            LifecycleEvent::StatusUpdate(status),
        )
    }

    pub fn set_content_approval(
        &self,
        advertiser: &Advertiser,
        campaign_id: Uuid,
        decision: ContentDecision,
        notes: Option<String>,
    ) -> MarketResult<Campaign> {
        self.transition(
            advertiser,
            campaign_id,
            Action::ReviewContent,
            LifecycleEvent::ContentReviewed { decision, notes },
        )
    }

    pub fn complete(&self, producer: &Producer, campaign_id: Uuid) -> MarketResult<Campaign> {
        self.transition(
            producer,
            campaign_id,
            Action::Complete,
            LifecycleEvent::Complete,
        )
    }

    pub fn cancel(&self, caller: &Caller, campaign_id: Uuid) -> MarketResult<Campaign> {
        self.transition(caller, campaign_id, Action::Cancel, LifecycleEvent::Cancel)
    }

    /// Remove a campaign with its deals, records and history.
    pub fn delete_campaign(&self, advertiser: &Advertiser, campaign_id: Uuid) -> MarketResult<()> {
        {
            let entry = self.campaigns.get(&campaign_id).ok_or_else(|| {
                MarketError::not_found(format!("campaign {campaign_id} not found"))
            })?;
            let parties = self.parties(&entry.campaign)?;
            authz::authorize(advertiser, Action::Delete, &parties)?;
        }
        if let Some((_, entry)) = self.campaigns.remove(&campaign_id) {
            for deal in &entry.deals {
                self.deal_index.remove(&deal.id);
            }
            info!(
                campaign_id = %campaign_id,
                deals = entry.deals.len(),
                records = entry.performance.len(),
                "Campaign deleted"
            );
        }
        Ok(())
    }

    // ─── Negotiation ledger ────────────────────────────────────────────────

    pub fn submit_offer(
        &self,
        caller: &Caller,
        campaign_id: Uuid,
        req: SubmitOfferRequest,
    ) -> MarketResult<OfferOutcome> {
        let mut entry = self
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| MarketError::not_found(format!("campaign {campaign_id} not found")))?;
        let parties = self.parties(&entry.campaign)?;
        authz::authorize(caller, Action::SubmitOffer, &parties)?;

        let now = Utc::now();
        let deal = ledger::new_offer(campaign_id, caller, req, now)?;
        let event = ledger::submission_event(&deal);
        let mut next = entry.campaign.clone();
        let change = lifecycle::apply(&mut next, &event, now)?;

        entry.campaign = next;
        entry.deals.push(deal.clone());
        self.deal_index.insert(deal.id, campaign_id);
        Self::record_transition(&mut entry, change, &event, caller, now);

        info!(
            campaign_id = %campaign_id,
            deal_id = %deal.id,
            rate = deal.offered_rate,
            kind = ?deal.offer_kind,
            "Offer submitted"
        );
        Ok(OfferOutcome {
            deal,
            campaign: entry.campaign.clone(),
        })
    }

    pub fn respond(
        &self,
        caller: &Caller,
        deal_id: Uuid,
        outcome: DealOutcome,
        message: Option<String>,
    ) -> MarketResult<OfferOutcome> {
        let campaign_id = self
            .deal_index
            .get(&deal_id)
            .map(|r| *r.value())
            .ok_or_else(|| MarketError::not_found(format!("deal {deal_id} not found")))?;
        let mut entry = self
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| MarketError::not_found(format!("deal {deal_id} not found")))?;
        let parties = self.parties(&entry.campaign)?;

        let idx = entry
            .deals
            .iter()
            .position(|d| d.id == deal_id)
            .ok_or_else(|| MarketError::not_found(format!("deal {deal_id} not found")))?;
        let author = entry.deals[idx].author_id;
        authz::authorize(caller, Action::Respond { author }, &parties)?;
        if !entry.campaign.status.is_negotiable() {
            return Err(MarketError::invalid_state(format!(
                "offers on a {} campaign can no longer be answered",
                entry.campaign.status
            )));
        }

        let now = Utc::now();
        let mut deal = entry.deals[idx].clone();
        ledger::resolve(&mut deal, caller, outcome, message, now)?;

        let mut next = entry.campaign.clone();
        let event = ledger::response_event(&deal, outcome);
        let change = match &event {
            Some(event) => lifecycle::apply(&mut next, event, now)?,
            None => None,
        };

        entry.campaign = next;
        entry.deals[idx] = deal.clone();
        if let Some(event) = &event {
            Self::record_transition(&mut entry, change, event, caller, now);
        }

        info!(
            campaign_id = %campaign_id,
            deal_id = %deal_id,
            outcome = ?outcome,
            "Offer answered"
        );
        Ok(OfferOutcome {
            deal,
            campaign: entry.campaign.clone(),
        })
    }

    pub fn list_deals(&self, caller: &Caller, campaign_id: Uuid) -> MarketResult<CampaignDeals> {
        let entry = self.view_entry(caller, campaign_id)?;
        let open_offer_id = ledger::open_offer(&entry.deals).map(|d| d.id);
        let last_accepted_rate = ledger::latest_accepted(&entry.deals).map(|d| d.offered_rate);
        Ok(CampaignDeals {
            campaign: entry.campaign,
            deals: entry.deals,
            open_offer_id,
            last_accepted_rate,
        })
    }

    pub fn get_deal(&self, caller: &Caller, deal_id: Uuid) -> MarketResult<Deal> {
        let campaign_id = self
            .deal_index
            .get(&deal_id)
            .map(|r| *r.value())
            .ok_or_else(|| MarketError::not_found(format!("deal {deal_id} not found")))?;
        self.view_entry(caller, campaign_id)?
            .deals
            .into_iter()
            .find(|d| d.id == deal_id)
            .ok_or_else(|| MarketError::not_found(format!("deal {deal_id} not found")))
    }

    // ─── Performance ───────────────────────────────────────────────────────

    pub fn record_episode(
        &self,
        producer: &Producer,
        campaign_id: Uuid,
        req: RecordEpisodeRequest,
    ) -> MarketResult<EpisodeOutcome> {
        let mut entry = self
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| MarketError::not_found(format!("campaign {campaign_id} not found")))?;
        let parties = self.parties(&entry.campaign)?;
        authz::authorize(producer, Action::RecordPerformance, &parties)?;
        req.metrics.validate()?;

        let now = Utc::now();
        let event = LifecycleEvent::EpisodeRecorded;
        let mut next = entry.campaign.clone();
        let change = lifecycle::apply(&mut next, &event, now)?;

        let record = PerformanceRecord {
            id: Uuid::new_v4(),
            campaign_id,
            episode_title: req.episode_title,
            episode_date: req.episode_date,
            episode_number: req.episode_number,
            metrics: req.metrics,
            attribution_days: req
                .attribution_days
                .unwrap_or(self.config.default_attribution_days),
            tracked_date: req.tracked_date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        };

        entry.campaign = next;
        entry.performance.push(record.clone());
        Self::record_transition(&mut entry, change, &event, producer, now);

        info!(
            campaign_id = %campaign_id,
            record_id = %record.id,
            episodes_completed = entry.campaign.episodes_completed,
            remaining = entry.campaign.remaining_episodes(),
            "Episode performance recorded"
        );
        Ok(EpisodeOutcome {
            performance: PerformanceView::new(record, &entry.campaign),
            campaign: entry.campaign.clone(),
        })
    }

    pub fn list_performance(
        &self,
        caller: &Caller,
        campaign_id: Uuid,
    ) -> MarketResult<Vec<PerformanceView>> {
        let entry = self.view_entry(caller, campaign_id)?;
        let mut records = entry.performance;
        records.sort_by(|a, b| a.tracked_date.cmp(&b.tracked_date));
        Ok(records
            .into_iter()
            .map(|r| PerformanceView::new(r, &entry.campaign))
            .collect())
    }

    // ─── Analytics ─────────────────────────────────────────────────────────

    /// Roll up delivery metrics over `scope`, computed from stored records.
    pub fn analytics(&self, caller: &Caller, scope: AnalyticsScope) -> MarketResult<AnalyticsReport> {
        let entries: Vec<CampaignEntry> = match scope {
            AnalyticsScope::Campaign(id) => vec![self.view_entry(caller, id)?],
            AnalyticsScope::Podcast(id) => {
                let owner = self
                    .registry
                    .podcast_owner(id)
                    .ok_or_else(|| MarketError::not_found(format!("podcast {id} not found")))?;
                authz::authorize_catalog(caller, Role::Producer, owner)?;
                self.collect_entries(|c| c.podcast_id == id)
            }
            AnalyticsScope::Brand(id) => {
                let owner = self
                    .registry
                    .brand_owner(id)
                    .ok_or_else(|| MarketError::not_found(format!("brand {id} not found")))?;
                authz::authorize_catalog(caller, Role::Advertiser, owner)?;
                self.collect_entries(|c| c.brand_id == id)
            }
        };

        let rollup = Rollup::compute(entries.iter().map(CampaignEntry::rollup_input));
        let records = match scope {
            AnalyticsScope::Campaign(_) => entries
                .iter()
                .flat_map(|e| {
                    e.performance
                        .iter()
                        .map(move |r| PerformanceView::new(r.clone(), &e.campaign))
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(AnalyticsReport {
            scope,
            rollup: rollup.report(),
            campaigns: entries.into_iter().map(|e| e.campaign).collect(),
            records,
        })
    }

    fn collect_entries<F>(&self, filter: F) -> Vec<CampaignEntry>
    where
        F: Fn(&Campaign) -> bool,
    {
        let mut entries: Vec<CampaignEntry> = self
            .campaigns
            .iter()
            .filter(|r| filter(&r.value().campaign))
            .map(|r| r.value().clone())
            .collect();
        entries.sort_by(|a, b| b.campaign.created_at.cmp(&a.campaign.created_at));
        entries
    }
}
