//! Axum REST handlers for the marketplace API.

use crate::auth::CallerIdentity;
use crate::models::*;
use crate::registry::InMemoryRegistry;
use crate::store::MarketplaceStore;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use podsponsor_core::{Advertiser, Caller, MarketError, Producer};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Shared marketplace state.
#[derive(Clone)]
pub struct MarketplaceState {
    pub store: Arc<MarketplaceStore>,
    pub registry: Arc<InMemoryRegistry>,
}

// ─── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    Market(MarketError),
    /// No usable caller identity on the request.
    Unauthenticated(String),
}

impl From<MarketError> for ApiError {
    fn from(e: MarketError) -> Self {
        ApiError::Market(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Market(MarketError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Market(MarketError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", msg)
            }
            ApiError::Market(e) => {
                let status = match &e {
                    MarketError::Validation(_) => StatusCode::BAD_REQUEST,
                    MarketError::Unauthorized(_) => StatusCode::FORBIDDEN,
                    MarketError::NotFound(_) => StatusCode::NOT_FOUND,
                    MarketError::InvalidState(_) => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code(), e.to_string())
            }
        };
        warn!(status = status.as_u16(), error, %message, "Marketplace request failed");
        metrics::counter!("marketplace.errors", "kind" => error).increment(1);
        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body extractor that reports malformed bodies as validation errors.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidJson<T>(pub T);

/// Path extractor that reports malformed ids as validation errors.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ValidPath<T>(pub T);

/// Narrow the caller to a producer. A caller of the wrong role on a missing
/// campaign still sees NotFound first.
fn require_producer(
    state: &MarketplaceState,
    caller: &Caller,
    campaign_id: Uuid,
) -> Result<Producer, MarketError> {
    match caller.as_producer() {
        Some(p) => Ok(*p),
        None if !state.store.contains_campaign(campaign_id) => Err(MarketError::not_found(
            format!("campaign {campaign_id} not found"),
        )),
        None => Err(MarketError::unauthorized(
            "only the podcast's producer may do this",
        )),
    }
}

fn require_advertiser(
    state: &MarketplaceState,
    caller: &Caller,
    campaign_id: Uuid,
) -> Result<Advertiser, MarketError> {
    match caller.as_advertiser() {
        Some(a) => Ok(*a),
        None if !state.store.contains_campaign(campaign_id) => Err(MarketError::not_found(
            format!("campaign {campaign_id} not found"),
        )),
        None => Err(MarketError::unauthorized(
            "only the brand's advertiser may do this",
        )),
    }
}

// ─── Registry ──────────────────────────────────────────────────────────────

pub async fn register_podcast(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidJson(req): ValidJson<RegisterPodcastRequest>,
) -> ApiResult<(StatusCode, Json<CatalogEntry>)> {
    let producer = caller
        .as_producer()
        .ok_or_else(|| MarketError::unauthorized("only producers may register podcasts"))?;
    let entry = state
        .registry
        .register_podcast(producer, &req.title, req.accepting_ads)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn register_brand(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidJson(req): ValidJson<RegisterBrandRequest>,
) -> ApiResult<(StatusCode, Json<BrandProfile>)> {
    let advertiser = caller
        .as_advertiser()
        .ok_or_else(|| MarketError::unauthorized("only advertisers may register brands"))?;
    let brand = state.registry.register_brand(advertiser, &req.name)?;
    Ok((StatusCode::CREATED, Json(brand)))
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
) -> Json<Vec<Campaign>> {
    Json(state.store.list_campaigns(&caller))
}

pub async fn create_campaign(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidJson(req): ValidJson<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    let advertiser = caller
        .as_advertiser()
        .ok_or_else(|| MarketError::unauthorized("only advertisers may propose campaigns"))?;
    let campaign = state.store.create_campaign(advertiser, req)?;
    metrics::counter!("marketplace.campaigns.created").increment(1);
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get_campaign(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.get_campaign(&caller, id)?))
}

pub async fn delete_campaign(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<StatusCode> {
    let advertiser = require_advertiser(&state, &caller, id)?;
    state.store.delete_campaign(&advertiser, id)?;
    metrics::counter!("marketplace.campaigns.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_status(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<UpdateStatusRequest>,
) -> ApiResult<Json<Campaign>> {
    let producer = require_producer(&state, &caller, id)?;
    Ok(Json(state.store.update_status(&producer, id, req.status)?))
}

pub async fn content_approval(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<ContentApprovalRequest>,
) -> ApiResult<Json<Campaign>> {
    let advertiser = require_advertiser(&state, &caller, id)?;
    Ok(Json(state.store.set_content_approval(
        &advertiser,
        id,
        req.outcome,
        req.notes,
    )?))
}

pub async fn complete_campaign(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<Campaign>> {
    let producer = require_producer(&state, &caller, id)?;
    let campaign = state.store.complete(&producer, id)?;
    metrics::counter!("marketplace.campaigns.completed").increment(1);
    Ok(Json(campaign))
}

pub async fn cancel_campaign(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.cancel(&caller, id)?))
}

pub async fn campaign_history(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<Vec<LifecycleTransition>>> {
    Ok(Json(state.store.history(&caller, id)?))
}

// ─── Deals ─────────────────────────────────────────────────────────────────

pub async fn list_deals(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<CampaignDeals>> {
    Ok(Json(state.store.list_deals(&caller, id)?))
}

pub async fn submit_offer(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<SubmitOfferRequest>,
) -> ApiResult<(StatusCode, Json<OfferOutcome>)> {
    let outcome = state.store.submit_offer(&caller, id, req)?;
    metrics::counter!("marketplace.deals.submitted").increment(1);
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn get_deal(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<Deal>> {
    Ok(Json(state.store.get_deal(&caller, id)?))
}

pub async fn respond_to_deal(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<RespondRequest>,
) -> ApiResult<Json<OfferOutcome>> {
    let outcome = state.store.respond(&caller, id, req.outcome, req.message)?;
    metrics::counter!("marketplace.deals.responded").increment(1);
    Ok(Json(outcome))
}

// ─── Performance ───────────────────────────────────────────────────────────

pub async fn list_performance(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<Vec<PerformanceView>>> {
    Ok(Json(state.store.list_performance(&caller, id)?))
}

pub async fn record_performance(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<RecordEpisodeRequest>,
) -> ApiResult<(StatusCode, Json<EpisodeOutcome>)> {
    let producer = require_producer(&state, &caller, id)?;
    let outcome = state.store.record_episode(&producer, id, req)?;
    metrics::counter!("marketplace.performance.recorded").increment(1);
    Ok((StatusCode::CREATED, Json(outcome)))
}

// ─── Analytics ─────────────────────────────────────────────────────────────

pub async fn campaign_analytics(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<AnalyticsReport>> {
    Ok(Json(
        state.store.analytics(&caller, AnalyticsScope::Campaign(id))?,
    ))
}

pub async fn podcast_analytics(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<AnalyticsReport>> {
    Ok(Json(
        state.store.analytics(&caller, AnalyticsScope::Podcast(id))?,
    ))
}

pub async fn brand_analytics(
    State(state): State<MarketplaceState>,
    CallerIdentity(caller): CallerIdentity,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Json<AnalyticsReport>> {
    Ok(Json(state.store.analytics(&caller, AnalyticsScope::Brand(id))?))
}
