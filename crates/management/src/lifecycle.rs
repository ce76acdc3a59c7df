//! Campaign lifecycle engine.
//!
//! ```text
//! pending ──offer──▶ negotiating ──accept──▶ approved ──content ok──▶ active
//!    ▲                   │                      │                      │
//!    └─────reject────────┘                      └──────complete────────┴──▶ completed
//! ```
//!
//! `next_status` is the transition table; `apply` runs it against a campaign
//! and performs the side effects (rates, budget, timestamps). Callers apply
//! events to a copy and only store it on success.

use crate::models::{
    Campaign, CampaignStatus, ContentApprovalStatus, ContentDecision, StatusUpdate,
    TransitionTrigger,
};
use chrono::{DateTime, Utc};
use podsponsor_core::{MarketError, MarketResult};

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Either party put a rate on the table.
    OfferSubmitted { rate: f64 },
    OfferAccepted { rate: f64 },
    OfferRejected,
    /// Producer sets the status directly, bypassing the ledger.
    StatusUpdate(StatusUpdate),
    ContentReviewed {
        decision: ContentDecision,
        notes: Option<String>,
    },
    EpisodeRecorded,
    Complete,
    Cancel,
}

impl LifecycleEvent {
    pub fn trigger(&self) -> TransitionTrigger {
        match self {
            LifecycleEvent::OfferSubmitted { .. } => TransitionTrigger::OfferSubmitted,
            LifecycleEvent::OfferAccepted { .. } => TransitionTrigger::OfferAccepted,
            LifecycleEvent::OfferRejected => TransitionTrigger::OfferRejected,
            LifecycleEvent::StatusUpdate(_) => TransitionTrigger::StatusUpdate,
            LifecycleEvent::ContentReviewed { .. } => TransitionTrigger::ContentApproved,
            LifecycleEvent::EpisodeRecorded => TransitionTrigger::EpisodeRecorded,
            LifecycleEvent::Complete => TransitionTrigger::Completed,
            LifecycleEvent::Cancel => TransitionTrigger::Cancelled,
        }
    }
}

/// A status change produced by [`apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: CampaignStatus,
    pub to: CampaignStatus,
}

/// Target status for `event` from `campaign`'s current state.
pub fn next_status(campaign: &Campaign, event: &LifecycleEvent) -> MarketResult<CampaignStatus> {
    use CampaignStatus::*;

    let current = campaign.status;
    let invalid = || {
        MarketError::invalid_state(format!(
            "cannot apply {:?} to a campaign that is {}",
            event.trigger(),
            current
        ))
    };

    match event {
        LifecycleEvent::OfferSubmitted { .. } if current.is_negotiable() => Ok(Negotiating),
        LifecycleEvent::OfferAccepted { .. } if current.is_negotiable() => Ok(Approved),
        LifecycleEvent::OfferRejected if current.is_negotiable() => Ok(Pending),
        LifecycleEvent::StatusUpdate(target) if matches!(current, Pending | Negotiating) => {
            Ok((*target).into())
        }
        LifecycleEvent::ContentReviewed { decision, .. } if !current.is_terminal() => {
            if *decision == ContentDecision::Approved && current == Approved {
                Ok(Active)
            } else {
                Ok(current)
            }
        }
        LifecycleEvent::EpisodeRecorded if !current.is_terminal() => {
            if campaign.episodes_completed + 1 >= campaign.total_episodes {
                Ok(Completed)
            } else {
                Ok(current)
            }
        }
        LifecycleEvent::Complete if matches!(current, Approved | Active) => Ok(Completed),
        LifecycleEvent::Cancel if current.is_negotiable() => Ok(Cancelled),
        _ => Err(invalid()),
    }
}

/// Apply `event` to `campaign` in place. Returns the status change, if any.
///
/// On error `campaign` is left untouched.
pub fn apply(
    campaign: &mut Campaign,
    event: &LifecycleEvent,
    now: DateTime<Utc>,
) -> MarketResult<Option<StatusChange>> {
    let from = campaign.status;
    let to = next_status(campaign, event)?;

    match event {
        LifecycleEvent::OfferSubmitted { rate } => {
            // Asking price becomes the negotiated rate before anyone accepts it.
            campaign.set_negotiated_rate(*rate);
        }
        LifecycleEvent::OfferAccepted { rate } => {
            campaign.set_negotiated_rate(*rate);
            campaign.approved_at = Some(now);
        }
        LifecycleEvent::OfferRejected => {}
        LifecycleEvent::StatusUpdate(StatusUpdate::Approved) => {
            if campaign.negotiated_rate.is_none() {
                campaign.set_negotiated_rate(campaign.proposed_rate);
            }
            campaign.approved_at = Some(now);
        }
        LifecycleEvent::StatusUpdate(_) => {}
        LifecycleEvent::ContentReviewed { decision, notes } => {
            campaign.content_approval_status = ContentApprovalStatus::from(*decision);
            campaign.content_notes = notes.clone();
        }
        LifecycleEvent::EpisodeRecorded => {
            campaign.episodes_completed += 1;
        }
        LifecycleEvent::Complete | LifecycleEvent::Cancel => {}
    }

    if to == CampaignStatus::Completed && from != CampaignStatus::Completed {
        campaign.completed_at = Some(now);
    }
    campaign.status = to;
    campaign.updated_at = now;

    Ok((from != to).then_some(StatusChange { from, to }))
}
