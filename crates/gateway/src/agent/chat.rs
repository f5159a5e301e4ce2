// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentCaller, ResponseStream};
use crate::error::GatewayError;

/// Body of a run request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAgentRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: String,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_delta: Option<serde_json::Map<String, serde_json::Value>>,
}

impl RunAgentRequest {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        new_message: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            new_message: new_message.into(),
            streaming: false,
            state_delta: None,
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        let required = [
            (&self.new_message, "message cannot be empty"),
            (&self.session_id, "session ID is required"),
            (&self.user_id, "user ID is required"),
            (&self.app_name, "app name is required"),
        ];
        for (value, message) in required {
            if value.trim().is_empty() {
                return Err(GatewayError::InvalidRequest(message.to_owned()));
            }
        }
        Ok(())
    }
}

/// Chat use case: validate a run request, then hand it to the caller.
#[derive(Clone)]
pub struct ChatService {
    caller: Arc<AgentCaller>,
}

impl ChatService {
    pub fn new(caller: Arc<AgentCaller>) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &AgentCaller {
        &self.caller
    }

    pub async fn execute(&self, request: &RunAgentRequest) -> Result<ResponseStream, GatewayError> {
        request.validate()?;
        tracing::info!(
            session_id = %request.session_id,
            user_id = %request.user_id,
            "chat turn started"
        );
        self.caller.call_agent(&request.new_message, &request.session_id, &request.user_id).await
    }
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
