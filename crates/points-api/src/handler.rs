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

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use lrt_points::StoreError;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::{db::AppState, routes::points};

/// Ways a points API request can fail.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("no checkpoint has been recorded yet")]
    NoCheckpoint,

    #[error("unknown recipient {0}")]
    UnknownRecipient(String),

    #[error("the requested endpoint does not exist")]
    UnknownRoute,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            Self::NoCheckpoint | Self::UnknownRecipient(_) | Self::UnknownRoute => {
                StatusCode::NOT_FOUND
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Rejected request, code {status}: {self}");
        }
        let error = status.canonical_reason().unwrap_or("Error");
        (status, Json(json!({ "error": error, "message": self.to_string() }))).into_response()
    }
}

/// Creates the axum application with all routes
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/v1", points::routes().with_state(state))
        .layer(cors)
        .fallback(|| async { ApiError::UnknownRoute })
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "points-api"
    }))
}

/// Responds with `body` and a public `Cache-Control` of `max_age` seconds.
pub fn cached(body: impl IntoResponse, max_age: u32) -> Response {
    let mut res = body.into_response();
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={max_age}")) {
        res.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status() {
        assert_eq!(ApiError::InvalidAddress("0x1".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NoCheckpoint.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::UnknownRecipient("0x1".into()).status(), StatusCode::NOT_FOUND);

        let res = ApiError::from(StoreError::Backend("connection reset".into())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
