//! End-to-end marketplace flows over the HTTP router.

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use podsponsor_core::config::MarketplaceConfig;
use podsponsor_management::marketplace_router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct Party {
    id: Uuid,
    role: &'static str,
}

impl Party {
    fn producer() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: "producer",
        }
    }

    fn advertiser() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: "advertiser",
        }
    }
}

async fn call(app: &Router, method: &str, uri: &str, who: Option<&Party>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(p) = who {
        req = req
            .header("x-user-id", p.id.to_string())
            .header("x-user-role", p.role);
    }
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

struct Market {
    app: Router,
    host: Party,
    brand: Party,
    podcast_id: String,
    brand_id: String,
}

async fn market() -> Market {
    let app = marketplace_router(MarketplaceConfig::default());
    let host = Party::producer();
    let brand = Party::advertiser();

    let (status, podcast) = call(
        &app,
        "POST",
        "/api/v1/marketplace/registry/podcasts",
        Some(&host),
        Some(json!({ "title": "Night Shift" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, profile) = call(
        &app,
        "POST",
        "/api/v1/marketplace/registry/brands",
        Some(&brand),
        Some(json!({ "name": "Acme Coffee" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    Market {
        podcast_id: podcast["id"].as_str().unwrap().to_string(),
        brand_id: profile["id"].as_str().unwrap().to_string(),
        app,
        host,
        brand,
    }
}

async fn propose(m: &Market, rate: f64, episodes: u32) -> String {
    let (status, campaign) = call(
        &m.app,
        "POST",
        "/api/v1/marketplace/campaigns",
        Some(&m.brand),
        Some(json!({
            "brand_id": m.brand_id,
            "podcast_id": m.podcast_id,
            "title": "Autumn roast",
            "ad_format": "mid-roll",
            "total_episodes": episodes,
            "proposed_rate": rate,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(campaign["status"], "pending");
    campaign["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn negotiate_approve_and_deliver() {
    let m = market().await;
    let id = propose(&m, 300.0, 2).await;

    let (status, offer) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/campaigns/{id}/deals"),
        Some(&m.host),
        Some(json!({ "offered_rate": 250.0, "terms": "Two reads per episode" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(offer["campaign"]["status"], "negotiating");
    let deal_id = offer["deal"]["id"].as_str().unwrap().to_string();

    // The author cannot answer their own offer.
    let (status, err) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/deals/{deal_id}/respond"),
        Some(&m.host),
        Some(json!({ "outcome": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "permission_denied");

    let (status, accepted) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/deals/{deal_id}/respond"),
        Some(&m.brand),
        Some(json!({ "outcome": "accepted", "message": "Deal" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["campaign"]["status"], "approved");
    assert_eq!(accepted["campaign"]["total_budget"], 500.0);

    let (status, _) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/deals/{deal_id}/respond"),
        Some(&m.brand),
        Some(json!({ "outcome": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, active) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/campaigns/{id}/content-approval"),
        Some(&m.brand),
        Some(json!({ "outcome": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["status"], "active");

    for n in 1..=2 {
        let (status, recorded) = call(
            &m.app,
            "POST",
            &format!("/api/v1/marketplace/campaigns/{id}/performance"),
            Some(&m.host),
            Some(json!({
                "episode_number": n,
                "impressions": 1000,
                "click_throughs": 50,
                "conversions": 10,
                "revenue_generated": 400.0,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recorded["performance"]["click_through_rate"], 5.0);
        assert_eq!(recorded["performance"]["conversion_rate"], 20.0);
        assert_eq!(recorded["campaign"]["episodes_completed"], n);
    }

    let (_, campaign) = call(
        &m.app,
        "GET",
        &format!("/api/v1/marketplace/campaigns/{id}"),
        Some(&m.brand),
        None,
    )
    .await;
    assert_eq!(campaign["status"], "completed");

    let (status, report) = call(
        &m.app,
        "GET",
        &format!("/api/v1/marketplace/analytics/campaigns/{id}"),
        Some(&m.brand),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["scope"]["kind"], "campaign");
    assert_eq!(report["aggregate_cost"], 500.0);
    assert_eq!(report["roi"], 60.0);
    assert_eq!(report["records"].as_array().unwrap().len(), 2);

    let (_, history) = call(
        &m.app,
        "GET",
        &format!("/api/v1/marketplace/campaigns/{id}/history"),
        Some(&m.host),
        None,
    )
    .await;
    let last = history.as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["to_status"], "completed");
}

#[tokio::test]
async fn advertiser_cannot_record_performance() {
    let m = market().await;
    let id = propose(&m, 300.0, 4).await;

    let (status, err) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/campaigns/{id}/performance"),
        Some(&m.brand),
        Some(json!({ "impressions": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "permission_denied");

    let (_, records) = call(
        &m.app,
        "GET",
        &format!("/api/v1/marketplace/campaigns/{id}/performance"),
        Some(&m.brand),
        None,
    )
    .await;
    assert!(records.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rejects_bad_requests() {
    let m = market().await;

    let (status, err) = call(&m.app, "GET", "/api/v1/marketplace/campaigns", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "unauthenticated");

    let (status, err) = call(
        &m.app,
        "POST",
        "/api/v1/marketplace/campaigns",
        Some(&m.brand),
        Some(json!({ "title": "no ids" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation_error");

    let missing = Uuid::new_v4();
    let (status, _) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/campaigns/{missing}/performance"),
        Some(&m.brand),
        Some(json!({ "impressions": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = propose(&m, 300.0, 1).await;
    let (status, _) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/campaigns/{id}/complete"),
        Some(&m.host),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_removes_campaign_and_ledger() {
    let m = market().await;
    let id = propose(&m, 300.0, 4).await;
    let (_, offer) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/campaigns/{id}/deals"),
        Some(&m.host),
        Some(json!({ "offered_rate": 280.0 })),
    )
    .await;
    let deal_id = offer["deal"]["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &m.app,
        "DELETE",
        &format!("/api/v1/marketplace/campaigns/{id}"),
        Some(&m.host),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &m.app,
        "DELETE",
        &format!("/api/v1/marketplace/campaigns/{id}"),
        Some(&m.brand),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &m.app,
        "GET",
        &format!("/api/v1/marketplace/deals/{deal_id}"),
        Some(&m.brand),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_status_update_leaves_campaign_unchanged() {
    let m = market().await;
    let id = propose(&m, 300.0, 4).await;

    for body in [json!({ "status": "active" }), json!({ "status": "bogus" })] {
        let (status, err) = call(
            &m.app,
            "POST",
            &format!("/api/v1/marketplace/campaigns/{id}/status"),
            Some(&m.host),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "validation_error");
    }

    let (_, campaign) = call(
        &m.app,
        "GET",
        &format!("/api/v1/marketplace/campaigns/{id}"),
        Some(&m.host),
        None,
    )
    .await;
    assert_eq!(campaign["status"], "pending");
    assert_eq!(campaign["negotiated_rate"], Value::Null);

    let (_, history) = call(
        &m.app,
        "GET",
        &format!("/api/v1/marketplace/campaigns/{id}/history"),
        Some(&m.host),
        None,
    )
    .await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn producer_cannot_review_content() {
    let m = market().await;
    let id = propose(&m, 300.0, 4).await;

    let (status, err) = call(
        &m.app,
        "POST",
        &format!("/api/v1/marketplace/campaigns/{id}/content-approval"),
        Some(&m.host),
        Some(json!({ "outcome": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "permission_denied");

    let (_, campaign) = call(
        &m.app,
        "GET",
        &format!("/api/v1/marketplace/campaigns/{id}"),
        Some(&m.brand),
        None,
    )
    .await;
    assert_eq!(campaign["content_approval_status"], "pending");
}

#[tokio::test]
async fn malformed_id_is_a_validation_error() {
    let m = market().await;

    let (status, err) = call(
        &m.app,
        "GET",
        "/api/v1/marketplace/campaigns/not-a-uuid",
        Some(&m.brand),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "validation_error");
    assert!(err["message"].as_str().is_some());
}
