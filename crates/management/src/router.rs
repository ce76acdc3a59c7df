//! Marketplace API router — mounts all marketplace endpoints under /api/v1/marketplace.

use crate::handlers::{self, MarketplaceState};
use crate::registry::InMemoryRegistry;
use crate::store::MarketplaceStore;
use axum::routing::{get, post};
use axum::Router;
use podsponsor_core::config::MarketplaceConfig;
use std::sync::Arc;

/// Build the marketplace router with a fresh in-memory store.
/// Returns a Router that should be merged into the main app.
pub fn marketplace_router(config: MarketplaceConfig) -> Router {
    let registry = Arc::new(InMemoryRegistry::new());
    let store = Arc::new(MarketplaceStore::new(registry.clone(), config));
    marketplace_router_with_state(MarketplaceState { store, registry })
}

pub fn marketplace_router_with_state(state: MarketplaceState) -> Router {
    Router::new()
        // Registry
        .route("/api/v1/marketplace/registry/podcasts", post(handlers::register_podcast))
        .route("/api/v1/marketplace/registry/brands", post(handlers::register_brand))
        // Campaigns
        .route("/api/v1/marketplace/campaigns", get(handlers::list_campaigns).post(handlers::create_campaign))
        .route("/api/v1/marketplace/campaigns/:id", get(handlers::get_campaign).delete(handlers::delete_campaign))
        .route("/api/v1/marketplace/campaigns/:id/status", post(handlers::update_status))
        .route("/api/v1/marketplace/campaigns/:id/content-approval", post(handlers::content_approval))
        .route("/api/v1/marketplace/campaigns/:id/complete", post(handlers::complete_campaign))
        .route("/api/v1/marketplace/campaigns/:id/cancel", post(handlers::cancel_campaign))
        .route("/api/v1/marketplace/campaigns/:id/history", get(handlers::campaign_history))
        // Negotiation ledger
        .route("/api/v1/marketplace/campaigns/:id/deals", get(handlers::list_deals).post(handlers::submit_offer))
        .route("/api/v1/marketplace/deals/:id", get(handlers::get_deal))
        .route("/api/v1/marketplace/deals/:id/respond", post(handlers::respond_to_deal))
        // Performance
        .route("/api/v1/marketplace/campaigns/:id/performance", get(handlers::list_performance).post(handlers::record_performance))
        // Analytics
        .route("/api/v1/marketplace/analytics/campaigns/:id", get(handlers::campaign_analytics))
        .route("/api/v1/marketplace/analytics/podcasts/:id", get(handlers::podcast_analytics))
        .route("/api/v1/marketplace/analytics/brands/:id", get(handlers::brand_analytics))
        .with_state(state)
}
