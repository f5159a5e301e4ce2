// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::pin::Pin;
use std::time::Duration;

use futures_util::Stream;

use crate::auth::AuthConfigHandler;
use crate::credential::AuthConfig;
use crate::engine::{Content, Event, FunctionCall, FunctionResponse, Part, Role};
use crate::error::GatewayError;

/// Function name the engine uses to ask the client for a credential.
pub const REQUEST_CREDENTIAL_FUNCTION: &str = "adk_request_credential";

/// Events produced while resolving one credential request.
pub type AuthEventStream<'a> = Pin<Box<dyn Stream<Item = Result<Event, GatewayError>> + Send + 'a>>;

/// Turns an engine credential request into a user-facing notice followed by
/// the function response that resumes the run.
///
/// Holds per-run state only; build one per conversation turn.
pub struct AuthInterceptor {
    handler: AuthConfigHandler,
    agent_name: Option<String>,
    timeout: Duration,
}

impl AuthInterceptor {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(handler: AuthConfigHandler, agent_name: Option<String>) -> Self {
        Self { handler, agent_name, timeout: Self::DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn handler(&self) -> &AuthConfigHandler {
        &self.handler
    }

    /// The pending credential request carried by `event`, if any.
    ///
    /// A call only counts while its id is still listed as long-running, which
    /// separates a live request from one that was already answered.
    pub fn auth_request_call(event: &Event) -> Option<&FunctionCall> {
        event.parts().iter().filter_map(|p| p.function_call.as_ref()).find(|call| {
            call.name == REQUEST_CREDENTIAL_FUNCTION
                && call.id.as_ref().is_some_and(|id| event.long_running_tool_ids.contains(id))
        })
    }

    pub fn is_auth_event(event: &Event) -> bool {
        Self::auth_request_call(event).is_some()
    }

    /// Whether `event` answers a credential request.
    pub fn is_auth_response(event: &Event) -> bool {
        event.parts().iter().any(|p| {
            p.function_response.as_ref().is_some_and(|r| r.name == REQUEST_CREDENTIAL_FUNCTION)
        })
    }

    /// Resolve the credential request in `event`.
    ///
    /// Yields exactly two events, in order: the `AUTH_REQUIRED` notice for
    /// the user, then (once the callback delivers a code) the function
    /// response to feed back into the engine. Any failure ends the stream
    /// with a single error.
    pub fn intercept_auth_event(&mut self, event: Event) -> AuthEventStream<'_> {
        Box::pin(async_stream::stream! {
            let call_id = match self.begin(&event) {
                Ok((call_id, notice)) => {
                    yield Ok::<Event, GatewayError>(notice);
                    call_id
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            match self.handler.wait_for_user_authentication(self.timeout).await {
                Ok(updated) => {
                    yield self.credential_response(call_id, &updated);
                }
                Err(e) => {
                    yield Err(e);
                }
            }
        })
    }

    /// Load the negotiation from the request and build the user notice.
    fn begin(&mut self, event: &Event) -> Result<(String, Event), GatewayError> {
        let call = Self::auth_request_call(event)
            .ok_or_else(|| GatewayError::malformed("event does not contain an auth request"))?;
        let call_id = call
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::malformed("credential request has no call id"))?;
        let auth_config = call
            .args
            .get("authConfig")
            .filter(|v| !v.is_null())
            .ok_or_else(|| GatewayError::malformed("credential request has no authConfig"))?;
        if !auth_config.is_object() {
            return Err(GatewayError::malformed(format!(
                "authConfig is not an object: {auth_config}"
            )));
        }

        let config = self.handler.set_auth_config(auth_config.clone())?;
        let auth_uri = config
            .authorization_uri()
            .ok_or_else(|| GatewayError::malformed("auth URI not found in authConfig"))?
            .to_owned();
        let state = config
            .state()
            .ok_or_else(|| GatewayError::malformed("state not found in authConfig"))?
            .to_owned();
        tracing::info!(call_id = %call_id, state = %state, "credential request intercepted");

        let text = format!("AUTH_REQUIRED: {auth_uri}&redirect_uri={}", self.handler.redirect_uri());
        Ok((call_id, Event::model_text(self.agent_name.clone(), text)))
    }

    fn credential_response(&self, call_id: String, config: &AuthConfig) -> Result<Event, GatewayError> {
        let response = serde_json::to_value(config)
            .map_err(|e| GatewayError::malformed(format!("cannot encode authConfig: {e}")))?;
        let part = Part::function_response(FunctionResponse {
            id: Some(call_id),
            name: REQUEST_CREDENTIAL_FUNCTION.to_owned(),
            response,
        });
        Ok(Event::new(self.agent_name.clone(), Content::new(Role::User, vec![part])))
    }
}

#[cfg(test)]
#[path = "interceptor_tests.rs"]
mod tests;
