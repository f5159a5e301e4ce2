// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for sessions, health and the OAuth2 callback.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::oauth::CallbackQuery;
use crate::session::Session;
use crate::state::GatewayState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body of a 409 from `POST /create_session`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConflictResponse {
    pub detail: String,
    pub session_id: String,
}

/// Map a core error onto the standard error envelope.
pub fn error_response(err: &GatewayError) -> Response {
    match err {
        GatewayError::Store(_) | GatewayError::Engine(_) => tracing::error!("{err}"),
        _ => tracing::debug!("{err}"),
    }
    err.code().to_http_response(err.to_string()).into_response()
}

/// `GET /health` and `GET /oauth/health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy".to_owned() })
}

/// `POST /create_session`
pub async fn create_session(
    State(s): State<Arc<GatewayState>>,
    Json(session): Json<Session>,
) -> Response {
    match s.sessions.create_session(session).await {
        Ok(created) => Json(created).into_response(),
        Err(GatewayError::SessionAlreadyExists(id)) => {
            let detail = GatewayError::SessionAlreadyExists(id.clone()).to_string();
            (StatusCode::CONFLICT, Json(ConflictResponse { detail, session_id: id }))
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /oauth/callback?code=..&state=..` or `?error=..`
pub async fn oauth_callback(
    State(s): State<Arc<GatewayState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    match s.codes.handle_callback(&query).await {
        Ok(outcome) => {
            let status =
                StatusCode::from_u16(outcome.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
            (status, Html(outcome.html())).into_response()
        }
        Err(e) => error_response(&e),
    }
}
