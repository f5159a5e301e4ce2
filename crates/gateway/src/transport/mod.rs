// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport: run streaming, session registration, the OAuth2 callback
//! and the tool hook webhooks.

pub mod auth;
pub mod http;
pub mod sse;
pub mod tools;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::GatewayState;

/// Build the axum `Router` with all gateway routes.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/health", get(http::health))
        // Conversation
        .route("/create_session", post(http::create_session))
        .route("/run_sse", post(sse::run_sse))
        // Engine-facing tool hooks
        .route("/tools/before", post(tools::before_tool))
        .route("/tools/after", post(tools::after_tool))
        // OAuth2 provider redirects (no auth)
        .route("/oauth/callback", get(http::oauth_callback))
        .route("/oauth/health", get(http::health))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
