// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Public master record lookup.

use axum::{extract::State, response::IntoResponse, Json};
use portal_core::CoreError;

use crate::error::ApiResult;
use crate::extractors::LookupPath;
use crate::response::LookupResponse;
use crate::state::AppState;

/// GET /api/lookup/{type}/{id}
///
/// Returns the public view of an unclaimed record. Short keys, absent
/// records and claimed records all answer with the same 404.
pub async fn lookup(
    State(state): State<AppState>,
    LookupPath { claim_type, id }: LookupPath,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .matcher
        .lookup_master(claim_type, &id)
        .await?
        .ok_or_else(CoreError::no_match)?;

    Ok(Json(LookupResponse::new(claim_type, record)))
}
