//! Caller identity extraction.
//!
//! An upstream gateway authenticates users and forwards the identity as
//! `x-user-id` (UUID) and `x-user-role` (`producer` or `advertiser`).
//! Requests without a usable identity are rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use podsponsor_core::{Caller, Role};
use uuid::Uuid;

use crate::handlers::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a marketplace request.
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Caller);

/// Read the caller from forwarded identity headers.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, String> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| format!("{USER_ID_HEADER} header required"))?;
    let user_id: Uuid = user_id
        .trim()
        .parse()
        .map_err(|_| format!("{USER_ID_HEADER} must be a UUID"))?;

    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| format!("{USER_ROLE_HEADER} header required"))?;
    let role: Role = role.parse()?;

    Ok(Caller::new(user_id, role))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers)
            .map(CallerIdentity)
            .map_err(ApiError::Unauthenticated)
    }
}
