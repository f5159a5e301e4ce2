// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth2 callback store: provider redirects land here, keyed by `state`.
//!
//! [`CallbackStore::handle_callback`] is the only write path.
//! [`CallbackStore::consume_code`] is the only read the authorization
//! handshake may use, which guarantees at-most-once handoff of a code.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::GatewayError;
use crate::store::{KeyValueStore, MemoryStore};

/// Default lifetime of an unconsumed authorization code in durable stores.
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(300);

const STATE_PREFIX: &str = "oauth_state:";

/// Query parameters of a provider redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of handling one provider redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Stored,
    /// Provider reported an error; nothing was stored.
    Failed(String),
    /// `code` or `state` missing; nothing was stored.
    InvalidRequest,
}

impl CallbackOutcome {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Stored => 200,
            Self::Failed(_) | Self::InvalidRequest => 400,
        }
    }

    /// Human-readable confirmation page for the browser tab.
    pub fn html(&self) -> String {
        match self {
            Self::Stored => "<html>\n  <body>\n    <h1>Authentication Successful!</h1>\n    \
                 <p>You can now close this window and return to the application.</p>\n    \
                 <script>window.close();</script>\n  </body>\n</html>\n"
                .to_owned(),
            Self::Failed(error) => format!(
                "<html>\n  <body>\n    <h1>Authentication Failed</h1>\n    \
                 <p>Error: {}</p>\n  </body>\n</html>\n",
                escape_html(error)
            ),
            Self::InvalidRequest => "<html>\n  <body>\n    <h1>Invalid Request</h1>\n    \
                 <p>Missing code or state parameter.</p>\n  </body>\n</html>\n"
                .to_owned(),
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `state -> code` mapping backed by a pluggable [`KeyValueStore`].
#[derive(Clone)]
pub struct CallbackStore {
    store: Arc<dyn KeyValueStore>,
    ttl: Option<Duration>,
}

impl CallbackStore {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    /// Process-local variant; codes never expire.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), None)
    }

    /// Durable variant; unconsumed codes expire after `ttl`.
    pub fn durable(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl: Some(ttl) }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn key(state: &str) -> String {
        format!("{STATE_PREFIX}{state}")
    }

    /// Record a provider redirect. Overwrites any earlier code for the state.
    pub async fn handle_callback(
        &self,
        query: &CallbackQuery,
    ) -> Result<CallbackOutcome, GatewayError> {
        if let Some(error) = query.error.as_deref().filter(|e| !e.is_empty()) {
            tracing::warn!(error, "oauth provider reported an error");
            return Ok(CallbackOutcome::Failed(error.to_owned()));
        }
        let (Some(code), Some(state)) = (
            query.code.as_deref().filter(|c| !c.is_empty()),
            query.state.as_deref().filter(|s| !s.is_empty()),
        ) else {
            tracing::warn!("oauth callback missing code or state");
            return Ok(CallbackOutcome::InvalidRequest);
        };

        self.store
            .set(&Self::key(state), serde_json::Value::String(code.to_owned()), self.ttl)
            .await
            .map_err(GatewayError::Store)?;
        tracing::info!(state, "oauth authorization code stored");
        Ok(CallbackOutcome::Stored)
    }

    /// Non-destructive read.
    pub async fn get_code(&self, state: &str) -> Result<Option<String>, GatewayError> {
        let value = self.store.get(&Self::key(state)).await.map_err(GatewayError::Store)?;
        Ok(value.and_then(into_code))
    }

    /// Destructive read: returns the code at most once per stored value.
    pub async fn consume_code(&self, state: &str) -> Result<Option<String>, GatewayError> {
        let value = self.store.take(&Self::key(state)).await.map_err(GatewayError::Store)?;
        Ok(value.and_then(into_code))
    }
}

fn into_code(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(code) => Some(code),
        _ => None,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
