// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agentgate: streaming agent gateway that resolves third-party OAuth2
//! authorization inline, mid-conversation.

pub mod agent;
pub mod auth;
pub mod config;
pub mod credential;
pub mod engine;
pub mod error;
pub mod oauth;
pub mod session;
pub mod state;
pub mod store;
pub mod test_support;
pub mod tools;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::agent::{AgentCaller, ChatService};
use crate::config::{GatewayConfig, ToolAuthConfig};
use crate::engine::remote::RemoteEngine;
use crate::oauth::CallbackStore;
use crate::session::InMemorySessionService;
use crate::state::GatewayState;
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::tools::ToolHookRegistry;
use crate::transport::build_router;

/// Pick the key/value backend once, from configuration. Codes and cached
/// tool credentials share it.
pub fn shared_store(config: &GatewayConfig) -> Arc<dyn KeyValueStore> {
    match &config.store_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using durable store");
            Arc::new(FileStore::new(path.clone()))
        }
        None => {
            tracing::info!("using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Callback store over `store`. Codes expire only when the store is durable.
pub fn callback_store(config: &GatewayConfig, store: Arc<dyn KeyValueStore>) -> CallbackStore {
    match config.store_path {
        Some(_) => CallbackStore::durable(store, config.code_ttl()),
        None => CallbackStore::new(store, None),
    }
}

/// Tool hooks from `--tool-auth`, caching credentials in `store`.
pub fn tool_hooks(
    config: &GatewayConfig,
    store: Arc<dyn KeyValueStore>,
) -> anyhow::Result<ToolHookRegistry> {
    let Some(path) = &config.tool_auth else {
        return Ok(ToolHookRegistry::new());
    };
    let auth = ToolAuthConfig::load(path)?;
    tracing::info!(tools = ?auth.tools, "credential cache enabled");
    Ok(ToolHookRegistry::new().with_credential_cache(
        auth.tools,
        &auth.auth_scheme,
        &auth.auth_credential,
        store,
    )?)
}

/// Run the gateway server until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let addr = config.addr();
    let store = shared_store(&config);
    let codes = callback_store(&config, Arc::clone(&store));
    let tools = Arc::new(tool_hooks(&config, store)?);
    let engine = Arc::new(RemoteEngine::new(
        config.engine_url.clone(),
        config.app_name.clone(),
        config.engine_token.clone(),
    ));
    let sessions = Arc::new(InMemorySessionService::new());

    let mut caller = AgentCaller::builder(engine, sessions.clone(), codes.clone())
        .app_name(config.app_name.clone())
        .redirect_uri(config.redirect_uri())
        .poll_interval(config.poll_interval())
        .auth_timeout(config.auth_timeout());
    if let Some(name) = &config.agent_name {
        caller = caller.agent_name(name.clone());
    }
    let chat = ChatService::new(Arc::new(caller.build()));
    let state = Arc::new(
        GatewayState::new(chat, sessions, codes)
            .with_tools(tools)
            .with_auth_token(config.auth_token.clone()),
    );

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        engine = %config.engine_url,
        redirect_uri = %config.redirect_uri(),
        "agentgate listening on {addr}"
    );
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
