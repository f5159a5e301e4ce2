// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio::time::Instant;

use crate::credential::AuthConfig;
use crate::error::GatewayError;
use crate::oauth::CallbackStore;

/// Holds the active negotiation for one run and waits for its authorization
/// code to land in the [`CallbackStore`].
pub struct AuthConfigHandler {
    auth_config: Option<AuthConfig>,
    codes: CallbackStore,
    redirect_uri: String,
    poll_interval: Duration,
}

impl AuthConfigHandler {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    pub fn new(codes: CallbackStore, redirect_uri: impl Into<String>) -> Self {
        Self {
            auth_config: None,
            codes,
            redirect_uri: redirect_uri.into(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn auth_config(&self) -> Option<&AuthConfig> {
        self.auth_config.as_ref()
    }

    /// Replace the active negotiation with one decoded from the engine's
    /// `authConfig` argument.
    pub fn set_auth_config(
        &mut self,
        value: serde_json::Value,
    ) -> Result<&AuthConfig, GatewayError> {
        let config: AuthConfig = serde_json::from_value(value)
            .map_err(|e| GatewayError::malformed(format!("invalid authConfig: {e}")))?;
        Ok(self.auth_config.insert(config))
    }

    /// Poll the callback store until a code for the negotiation's state
    /// arrives, then record the provider redirect on the negotiation.
    ///
    /// The code is consumed, so it is handed out at most once. Overshoot past
    /// `timeout` is bounded by one poll interval.
    pub async fn wait_for_user_authentication(
        &mut self,
        timeout: Duration,
    ) -> Result<AuthConfig, GatewayError> {
        let state = self
            .auth_config
            .as_ref()
            .and_then(AuthConfig::state)
            .ok_or_else(|| GatewayError::malformed("state not found in authConfig"))?
            .to_owned();

        tracing::info!(%state, "waiting for user authentication");
        let started = Instant::now();
        loop {
            if let Some(code) = self.codes.consume_code(&state).await? {
                tracing::info!(%state, "authorization code received");
                tracing::debug!(%state, code, "authorization code");
                return self.complete(&state, &code);
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                tracing::warn!(%state, ?timeout, "user authentication timed out");
                return Err(GatewayError::AuthTimeout { state, timeout });
            }
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    fn complete(&mut self, state: &str, code: &str) -> Result<AuthConfig, GatewayError> {
        let redirect_uri = self.redirect_uri.clone();
        let config = self
            .auth_config
            .as_mut()
            .ok_or_else(|| GatewayError::malformed("no active authConfig"))?;
        config.record_auth_response(format!("{redirect_uri}?code={code}&state={state}"), redirect_uri);
        Ok(config.clone())
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
