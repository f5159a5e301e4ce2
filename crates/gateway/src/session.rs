// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation sessions: registered once, then checked before every run.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::GatewayError;

/// A series of interactions between one user and the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(alias = "appName")]
    pub app_name: String,
    #[serde(alias = "userId")]
    pub user_id: String,
}

impl Session {
    pub fn new(id: impl Into<String>, app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { id: id.into(), app_name: app_name.into(), user_id: user_id.into() }
    }
}

#[async_trait]
pub trait SessionService: Send + Sync {
    /// Look up a session. Returns `None` unless id, app and user all match.
    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, GatewayError>;

    /// Register a new session. Fails with
    /// [`GatewayError::SessionAlreadyExists`] if the id is taken.
    async fn create_session(&self, session: Session) -> Result<Session, GatewayError>;
}

/// Process-local session registry keyed by session id.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, GatewayError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|s| s.app_name == app_name && s.user_id == user_id)
            .cloned())
    }

    async fn create_session(&self, session: Session) -> Result<Session, GatewayError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(GatewayError::SessionAlreadyExists(session.id));
        }
        sessions.insert(session.id.clone(), session.clone());
        tracing::info!(session_id = %session.id, user_id = %session.user_id, "session registered");
        Ok(session)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
