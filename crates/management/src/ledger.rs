//! Negotiation ledger: the append-only sequence of offers on one campaign.
//!
//! Entries are immutable except for their response fields, which are written
//! exactly once by the counterparty. Ledger outcomes are translated into
//! [`LifecycleEvent`]s; the store applies both in one commit.

use crate::lifecycle::LifecycleEvent;
use crate::models::{Deal, DealOutcome, ResponseStatus, SubmitOfferRequest};
use chrono::{DateTime, Utc};
use podsponsor_core::{MarketError, MarketResult, NegotiationParticipant};
use uuid::Uuid;

pub fn validate_rate(rate: Option<f64>, field: &str) -> MarketResult<f64> {
    match rate {
        None => Err(MarketError::validation(format!("{field} is required"))),
        Some(r) if !r.is_finite() || r <= 0.0 => Err(MarketError::validation(format!(
            "{field} must be a positive amount"
        ))),
        Some(r) => Ok(r),
    }
}

/// Build a new pending offer authored by `author`.
pub fn new_offer<P: NegotiationParticipant + ?Sized>(
    campaign_id: Uuid,
    author: &P,
    req: SubmitOfferRequest,
    now: DateTime<Utc>,
) -> MarketResult<Deal> {
    let offered_rate = validate_rate(req.offered_rate, "offered_rate")?;
    Ok(Deal {
        id: Uuid::new_v4(),
        campaign_id,
        author_id: author.user_id(),
        author_role: author.role(),
        offer_kind: req.offer_kind,
        offered_rate,
        terms: req.terms.filter(|t| !t.trim().is_empty()),
        response_status: ResponseStatus::Pending,
        responded_by: None,
        response_message: None,
        response_date: None,
        created_at: now,
    })
}

/// Lifecycle event fired by submitting `deal`.
pub fn submission_event(deal: &Deal) -> LifecycleEvent {
    LifecycleEvent::OfferSubmitted {
        rate: deal.offered_rate,
    }
}

/// Record the counterparty's answer on `deal`.
///
/// Fails with `InvalidState` if the deal was already answered; the author
/// check happens in the authorization gate before this is reached.
pub fn resolve<P: NegotiationParticipant + ?Sized>(
    deal: &mut Deal,
    responder: &P,
    outcome: DealOutcome,
    message: Option<String>,
    now: DateTime<Utc>,
) -> MarketResult<()> {
    if deal.response_status != ResponseStatus::Pending {
        return Err(MarketError::invalid_state(format!(
            "deal {} was already {:?}",
            deal.id, deal.response_status
        )));
    }
    debug_assert_ne!(deal.author_id, responder.user_id());

    deal.response_status = outcome.into();
    deal.responded_by = Some(responder.user_id());
    deal.response_message = message;
    deal.response_date = Some(now);
    Ok(())
}

/// Lifecycle event fired by a response, if any. A counter fires nothing:
/// the responder submits their own offer separately.
pub fn response_event(deal: &Deal, outcome: DealOutcome) -> Option<LifecycleEvent> {
    match outcome {
        DealOutcome::Accepted => Some(LifecycleEvent::OfferAccepted {
            rate: deal.offered_rate,
        }),
        DealOutcome::Rejected => Some(LifecycleEvent::OfferRejected),
        DealOutcome::Countered => None,
    }
}

/// The most recently accepted offer, which carries the authoritative rate.
pub fn latest_accepted(deals: &[Deal]) -> Option<&Deal> {
    deals
        .iter()
        .rev()
        .find(|d| d.response_status == ResponseStatus::Accepted)
}

/// The most recently submitted offer if it is still open.
pub fn open_offer(deals: &[Deal]) -> Option<&Deal> {
    deals
        .last()
        .filter(|d| d.response_status == ResponseStatus::Pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OfferKind;
    use podsponsor_core::{Advertiser, Producer};

    fn offer(author: &Producer, rate: f64) -> Deal {
        new_offer(
            Uuid::new_v4(),
            author,
            SubmitOfferRequest {
                offered_rate: Some(rate),
                offer_kind: OfferKind::Counter,
                terms: Some("Two mentions per episode".to_string()),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_rate_validation() {
        assert!(matches!(
            validate_rate(None, "offered_rate"),
            Err(MarketError::Validation(_))
        ));
        assert!(validate_rate(Some(0.0), "offered_rate").is_err());
        assert!(validate_rate(Some(-5.0), "offered_rate").is_err());
        assert!(validate_rate(Some(f64::NAN), "offered_rate").is_err());
        assert_eq!(validate_rate(Some(250.0), "offered_rate").unwrap(), 250.0);
    }

    #[test]
    fn test_new_offer_is_pending() {
        let host = Producer(Uuid::new_v4());
        let deal = offer(&host, 250.0);
        assert_eq!(deal.response_status, ResponseStatus::Pending);
        assert_eq!(deal.author_id, host.0);
        assert!(deal.responded_by.is_none());
        assert_eq!(
            submission_event(&deal),
            LifecycleEvent::OfferSubmitted { rate: 250.0 }
        );
    }

    #[test]
    fn test_resolve_exactly_once() {
        let host = Producer(Uuid::new_v4());
        let brand = Advertiser(Uuid::new_v4());
        let mut deal = offer(&host, 250.0);

        resolve(
            &mut deal,
            &brand,
            DealOutcome::Accepted,
            Some("Deal".to_string()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(deal.response_status, ResponseStatus::Accepted);
        assert_eq!(deal.responded_by, Some(brand.0));
        assert!(deal.response_date.is_some());

        let err = resolve(&mut deal, &brand, DealOutcome::Rejected, None, Utc::now()).unwrap_err();
        assert!(matches!(err, MarketError::InvalidState(_)));
        assert_eq!(deal.response_status, ResponseStatus::Accepted);
    }

    #[test]
    fn test_response_events() {
        let host = Producer(Uuid::new_v4());
        let deal = offer(&host, 180.0);
        assert_eq!(
            response_event(&deal, DealOutcome::Accepted),
            Some(LifecycleEvent::OfferAccepted { rate: 180.0 })
        );
        assert_eq!(
            response_event(&deal, DealOutcome::Rejected),
            Some(LifecycleEvent::OfferRejected)
        );
        assert_eq!(response_event(&deal, DealOutcome::Countered), None);
    }

    #[test]
    fn test_latest_accepted_and_open_offer() {
        let host = Producer(Uuid::new_v4());
        let brand = Advertiser(Uuid::new_v4());

        let mut first = offer(&host, 300.0);
        resolve(&mut first, &brand, DealOutcome::Accepted, None, Utc::now()).unwrap();
        let second = offer(&host, 350.0);
        let deals = vec![first.clone(), second.clone()];

        assert_eq!(latest_accepted(&deals).map(|d| d.id), Some(first.id));
        assert_eq!(open_offer(&deals).map(|d| d.id), Some(second.id));
        assert!(open_offer(&deals[..1]).is_none());
    }
}
