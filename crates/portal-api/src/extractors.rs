// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use std::net::IpAddr;

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
    Json,
};
use portal_core::{ClaimType, StatusFilter};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::{ApiError, ValidationErrors};

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Extracts the `AuthContext` from the request extensions. Returns 401 if
/// the user is not authenticated.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.user_id)
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .filter(|ctx| !ctx.is_anonymous())
            .map(Auth)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

// =============================================================================
// Optional Auth Extractor
// =============================================================================

/// Extractor for optionally authenticated requests.
///
/// Extracts the `AuthContext` if available, returns `None` for unauthenticated requests.
pub struct OptionalAuth(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .filter(|ctx| !ctx.is_anonymous());
        Ok(OptionalAuth(ctx))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Request bodies that check their own shape after deserialization.
pub trait Validate {
    /// Collects field errors. An empty set means the body is acceptable.
    fn validate(&self) -> ValidationErrors {
        ValidationErrors::new()
    }
}

/// Extractor for validated JSON payloads.
///
/// Malformed JSON is a 400; a well-formed body that fails [`Validate`] is a
/// 422 with per-field details.
pub struct ValidatedJson<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        let errors = value.validate();
        if !errors.is_empty() {
            return Err(ApiError::validation_with_errors("Request validation failed", errors));
        }

        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Request Metadata Extractors
// =============================================================================

/// Extractor for the request id assigned by the auth layer.
pub struct RequestId(pub Uuid);

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<AuthContext>()
            .map(|ctx| ctx.request_id)
            .unwrap_or_else(Uuid::now_v7);
        Ok(RequestId(id))
    }
}

/// Extractor for the client address.
///
/// Reads `X-Forwarded-For`, then `X-Real-IP`, then the connection address
/// recorded by the auth layer. Informational only; rate limiting keys on the
/// connection address.
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse().ok());

        let real_ip = || {
            parts
                .headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        };

        let ip = forwarded.or_else(real_ip).or_else(|| {
            parts
                .extensions
                .get::<AuthContext>()
                .and_then(|ctx| ctx.client_ip)
        });

        Ok(ClientIp(ip))
    }
}

// =============================================================================
// Path and Query Extractors
// =============================================================================

/// Extractor for `/{type}/{id}` lookup paths.
pub struct LookupPath {
    /// Parsed record type.
    pub claim_type: ClaimType,
    /// Primary key as given.
    pub id: String,
}

impl<S> FromRequestParts<S> for LookupPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((raw_type, id)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid lookup path: {}", e)))?;

        let claim_type = ClaimType::parse(&raw_type)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown record type '{}'", raw_type)))?;

        Ok(LookupPath { claim_type, id })
    }
}

#[derive(Debug, serde::Deserialize)]
struct StatusParams {
    status: Option<String>,
}

/// Extractor for the `?status=` claim listing filter. Defaults to pending.
pub struct StatusQuery(pub StatusFilter);

impl<S> FromRequestParts<S> for StatusQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<StatusParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid query parameters: {}", e)))?;

        let filter = match params.status.as_deref() {
            None | Some("") => StatusFilter::Only(portal_core::ClaimStatus::Pending),
            Some(raw) => StatusFilter::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown claim status '{}'", raw)))?,
        };

        Ok(StatusQuery(filter))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use portal_core::{ClaimStatus, Role};

    fn parts(uri: &str) -> Parts {
        let (parts, _) = Request::builder().uri(uri).body(Body::empty()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_auth_rejects_anonymous() {
        let mut parts = parts("/api/claims");
        parts.extensions.insert(AuthContext::anonymous());

        let result = Auth::from_request_parts(&mut parts, &()).await;
        let err = result.err().unwrap();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_accepts_user() {
        let mut parts = parts("/api/claims");
        parts
            .extensions
            .insert(AuthContext::from_claims(&Claims::new("u-1", Role::Student, 60)));

        let Auth(ctx) = Auth::from_request_parts(&mut parts, &()).await.ok().unwrap();
        assert_eq!(ctx.user_id, "u-1");
    }

    #[tokio::test]
    async fn test_optional_auth() {
        let mut parts = parts("/api/audit");
        let OptionalAuth(ctx) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(ctx.is_none());
    }

    #[tokio::test]
    async fn test_client_ip_prefers_forwarded_header() {
        let (mut parts, _) = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, Some("203.0.113.9".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_status_query_defaults_to_pending() {
        let mut parts = parts("/api/admin/claims");
        let StatusQuery(filter) = StatusQuery::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(filter, StatusFilter::Only(ClaimStatus::Pending));

        let mut parts = self::parts("/api/admin/claims?status=all");
        let StatusQuery(filter) = StatusQuery::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(filter, StatusFilter::All);

        let mut parts = self::parts("/api/admin/claims?status=bogus");
        assert!(StatusQuery::from_request_parts(&mut parts, &()).await.is_err());
    }
}
