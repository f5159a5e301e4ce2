// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation turn driver.
//!
//! One [`AgentCaller::call_agent`] drives a turn through these phases:
//!
//! ```text
//! Idle -> Running -> Completed
//!            |  ^
//!            v  |   (code arrives, run restarted with the credential response)
//!        AuthPending
//!            |
//!            v
//!          Failed   (timeout, malformed negotiation, engine or store error)
//! ```

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};

use crate::auth::{AuthConfigHandler, AuthInterceptor};
use crate::engine::{AgentEngine, Content, Event};
use crate::error::GatewayError;
use crate::oauth::CallbackStore;
use crate::session::SessionService;

/// Output policy: returns `true` to **suppress** an event.
pub type EventFilter = fn(&Event) -> bool;

/// Renders a surviving event as text for the client.
pub type EventParser = fn(&Event) -> String;

/// Text chunks of one conversation turn.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

/// Suppresses events without any text part.
pub fn default_event_filter(event: &Event) -> bool {
    event.texts().next().is_none()
}

/// Joins every text part of the event with single spaces.
pub fn default_event_parser(event: &Event) -> String {
    event.texts().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    AuthPending,
    Completed,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::AuthPending => "auth_pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-turn settings, cloned into every response stream.
#[derive(Clone)]
struct TurnSettings {
    agent_name: Option<String>,
    redirect_uri: String,
    poll_interval: Duration,
    auth_timeout: Duration,
    event_parser: EventParser,
    event_filter: EventFilter,
}

impl TurnSettings {
    fn interceptor(&self, codes: CallbackStore) -> AuthInterceptor {
        let handler = AuthConfigHandler::new(codes, self.redirect_uri.clone())
            .with_poll_interval(self.poll_interval);
        AuthInterceptor::new(handler, self.agent_name.clone()).with_timeout(self.auth_timeout)
    }

    fn render(&self, event: &Event) -> Option<String> {
        if (self.event_filter)(event) {
            None
        } else {
            Some((self.event_parser)(event))
        }
    }
}

/// Drives the agent engine for one app, resolving credential requests inline.
pub struct AgentCaller {
    engine: Arc<dyn AgentEngine>,
    sessions: Arc<dyn SessionService>,
    codes: CallbackStore,
    app_name: String,
    settings: TurnSettings,
}

pub struct AgentCallerBuilder {
    engine: Arc<dyn AgentEngine>,
    sessions: Arc<dyn SessionService>,
    codes: CallbackStore,
    app_name: String,
    settings: TurnSettings,
}

impl AgentCallerBuilder {
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.settings.agent_name = Some(agent_name.into());
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.settings.redirect_uri = redirect_uri.into();
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.settings.poll_interval = poll_interval;
        self
    }

    pub fn auth_timeout(mut self, auth_timeout: Duration) -> Self {
        self.settings.auth_timeout = auth_timeout;
        self
    }

    pub fn event_parser(mut self, parser: EventParser) -> Self {
        self.settings.event_parser = parser;
        self
    }

    pub fn event_filter(mut self, filter: EventFilter) -> Self {
        self.settings.event_filter = filter;
        self
    }

    pub fn build(self) -> AgentCaller {
        AgentCaller {
            engine: self.engine,
            sessions: self.sessions,
            codes: self.codes,
            app_name: self.app_name,
            settings: self.settings,
        }
    }
}

impl AgentCaller {
    pub fn builder(
        engine: Arc<dyn AgentEngine>,
        sessions: Arc<dyn SessionService>,
        codes: CallbackStore,
    ) -> AgentCallerBuilder {
        AgentCallerBuilder {
            engine,
            sessions,
            codes,
            app_name: "agentgate".to_owned(),
            settings: TurnSettings {
                agent_name: None,
                redirect_uri: "http://localhost:8000/oauth/callback".to_owned(),
                poll_interval: AuthConfigHandler::DEFAULT_POLL_INTERVAL,
                auth_timeout: AuthInterceptor::DEFAULT_TIMEOUT,
                event_parser: default_event_parser,
                event_filter: default_event_filter,
            },
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub async fn check_session_exists(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<bool, GatewayError> {
        let session = self.sessions.get_session(&self.app_name, user_id, session_id).await?;
        Ok(session.is_some())
    }

    /// Run one conversation turn and stream the agent's text output.
    ///
    /// The session must already exist: absence fails here, before the
    /// engine sees anything. Credential requests raised by the engine are
    /// resolved inside the stream: the `AUTH_REQUIRED` notice is yielded,
    /// the stream waits for the OAuth callback, and the run restarts with
    /// the credential response. A failure ends the stream with one error.
    pub async fn call_agent(
        &self,
        message: &str,
        session_id: &str,
        user_id: &str,
    ) -> Result<ResponseStream, GatewayError> {
        if !self.check_session_exists(session_id, user_id).await? {
            return Err(GatewayError::SessionNotFound(session_id.to_owned()));
        }

        let engine = Arc::clone(&self.engine);
        let settings = self.settings.clone();
        let mut interceptor = settings.interceptor(self.codes.clone());
        let session_id = session_id.to_owned();
        let user_id = user_id.to_owned();
        let mut message = Content::user_text(message);

        Ok(Box::pin(async_stream::stream! {
            let mut phase = RunPhase::Idle;
            loop {
                transition(&session_id, &mut phase, RunPhase::Running);
                let mut events = match engine.run(&user_id, &session_id, message.clone()).await {
                    Ok(events) => events,
                    Err(e) => {
                        transition(&session_id, &mut phase, RunPhase::Failed);
                        yield Err(GatewayError::Engine(e));
                        return;
                    }
                };

                let mut resume = None;
                while let Some(next) = events.next().await {
                    let event = match next {
                        Ok(event) => event,
                        Err(e) => {
                            transition(&session_id, &mut phase, RunPhase::Failed);
                            yield Err(GatewayError::Engine(e));
                            return;
                        }
                    };

                    if !AuthInterceptor::is_auth_event(&event) {
                        if let Some(text) = settings.render(&event) {
                            yield Ok(text);
                        }
                        continue;
                    }

                    transition(&session_id, &mut phase, RunPhase::AuthPending);
                    let mut auth_events = interceptor.intercept_auth_event(event);
                    while let Some(next) = auth_events.next().await {
                        match next {
                            Ok(auth_event) if AuthInterceptor::is_auth_response(&auth_event) => {
                                resume = auth_event.content;
                            }
                            Ok(auth_event) => {
                                if let Some(text) = settings.render(&auth_event) {
                                    yield Ok(text);
                                }
                            }
                            Err(e) => {
                                transition(&session_id, &mut phase, RunPhase::Failed);
                                yield Err(e);
                                return;
                            }
                        }
                    }
                    // the rest of this run is stale; restart with the credential
                    break;
                }

                match resume {
                    Some(content) => message = content,
                    None => break,
                }
            }
            transition(&session_id, &mut phase, RunPhase::Completed);
        }))
    }
}

fn transition(session_id: &str, phase: &mut RunPhase, next: RunPhase) {
    tracing::debug!(session_id, from = %phase, to = %next, "run phase");
    *phase = next;
}

#[cfg(test)]
#[path = "caller_tests.rs"]
mod tests;
