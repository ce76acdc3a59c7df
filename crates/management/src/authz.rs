//! Authorization gate. Role and ownership predicate consulted before every
//! campaign read or mutation.

use podsponsor_core::{CampaignParties, MarketError, MarketResult, NegotiationParticipant, Role};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the campaign, its ledger, history or performance.
    View,
    SubmitOffer,
    /// Answer an offer written by `author`.
    Respond { author: Uuid },
    UpdateStatus,
    Complete,
    ReviewContent,
    RecordPerformance,
    Cancel,
    Delete,
}

impl Action {
    fn describe(self) -> &'static str {
        match self {
            Action::View => "view this campaign",
            Action::SubmitOffer => "negotiate this campaign",
            Action::Respond { .. } => "respond to this offer",
            Action::UpdateStatus => "update this campaign's status",
            Action::Complete => "complete this campaign",
            Action::ReviewContent => "approve this campaign's content",
            Action::RecordPerformance => "add performance data to this campaign",
            Action::Cancel => "cancel this campaign",
            Action::Delete => "delete this campaign",
        }
    }
}

/// Pure predicate: may `who` perform `action` on a campaign owned by `parties`?
pub fn can<P: NegotiationParticipant + ?Sized>(
    who: &P,
    action: Action,
    parties: &CampaignParties,
) -> bool {
    let owns = who.owns(parties);
    match action {
        Action::View | Action::SubmitOffer | Action::Cancel => owns,
        Action::Respond { author } => owns && who.user_id() != author,
        Action::UpdateStatus | Action::Complete | Action::RecordPerformance => {
            who.role() == Role::Producer && owns
        }
        Action::ReviewContent | Action::Delete => who.role() == Role::Advertiser && owns,
    }
}

pub fn authorize<P: NegotiationParticipant + ?Sized>(
    who: &P,
    action: Action,
    parties: &CampaignParties,
) -> MarketResult<()> {
    if can(who, action, parties) {
        Ok(())
    } else {
        Err(MarketError::unauthorized(format!(
            "{} {} may not {}",
            who.role(),
            who.user_id(),
            action.describe()
        )))
    }
}

/// Catalog-wide reads (all campaigns of a podcast or a brand) need the
/// matching role and ownership of that catalog entry.
pub fn authorize_catalog<P: NegotiationParticipant + ?Sized>(
    who: &P,
    required: Role,
    owner: Uuid,
) -> MarketResult<()> {
    if who.role() == required && who.user_id() == owner {
        Ok(())
    } else {
        Err(MarketError::unauthorized(format!(
            "only the owning {required} may view these analytics"
        )))
    }
}
