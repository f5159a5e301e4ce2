// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::agent::ChatService;
use crate::oauth::CallbackStore;
use crate::session::SessionService;
use crate::tools::ToolHookRegistry;

/// Shared gateway state handed to every HTTP handler.
pub struct GatewayState {
    pub chat: ChatService,
    pub sessions: Arc<dyn SessionService>,
    pub codes: CallbackStore,
    /// Hooks the engine runs around tool calls, backed by the same store as
    /// `codes`.
    pub tools: Arc<ToolHookRegistry>,
    /// Bearer token for the API. `None` disables auth.
    pub auth_token: Option<String>,
}

impl GatewayState {
    pub fn new(chat: ChatService, sessions: Arc<dyn SessionService>, codes: CallbackStore) -> Self {
        Self { chat, sessions, codes, tools: Arc::new(ToolHookRegistry::new()), auth_token: None }
    }

    pub fn with_tools(mut self, tools: Arc<ToolHookRegistry>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }
}
