// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{str::FromStr, sync::Arc};

use alloy::primitives::Address;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use lrt_points::{
    entities::{address_id, Recipient, Summary},
    FindQuery, Store,
};

use crate::{
    db::AppState,
    el_points::CACHE_TTL,
    handler::{cached, ApiError},
    models::{ElPointsTotalResponse, RecipientResponse, SummaryResponse},
};

/// Ledger rows change at most once per block.
const LEDGER_MAX_AGE: u32 = 60;

/// Create points routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/el-points/total", get(get_el_points_total))
        .route("/summary", get(get_summary))
        .route("/recipients/:address", get(get_recipient))
}

/// GET /v1/el-points/total
/// Returns the protocol wide EL points reported upstream
async fn get_el_points_total(State(state): State<Arc<AppState>>) -> Response {
    let total = state.el_points.total().await;
    cached(Json(ElPointsTotalResponse::from(total)), CACHE_TTL.as_secs() as u32)
}

/// GET /v1/summary
/// Returns the latest ledger checkpoint
async fn get_summary(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let summary = state
        .db
        .find_one::<Summary>(FindQuery::latest())
        .await?
        .ok_or(ApiError::NoCheckpoint)?;
    Ok(cached(Json(SummaryResponse::from(summary)), LEDGER_MAX_AGE))
}

/// GET /v1/recipients/:address
/// Returns the totals of a single recipient, addressed in any hex casing
async fn get_recipient(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    let address = Address::from_str(&address)
        .map_err(|e| ApiError::InvalidAddress(format!("{address}: {e}")))?;
    let id = address_id(address);
    tracing::debug!("Fetching recipient {}", id);
    let recipient = state.db.get::<Recipient>(&id).await?;
    let recipient = recipient.ok_or(ApiError::UnknownRecipient(id))?;
    Ok(cached(Json(RecipientResponse::from(recipient)), LEDGER_MAX_AGE))
}
