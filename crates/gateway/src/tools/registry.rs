// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::credential::key::KeyError;
use crate::credential::{AuthCredential, AuthScheme};
use crate::error::GatewayError;
use crate::store::KeyValueStore;
use crate::tools::{CredentialCacheHook, NoopHook, ToolContext, ToolHook};

/// Tool name to hook mapping with a no-op fallback.
pub struct ToolHookRegistry {
    hooks: HashMap<String, Arc<dyn ToolHook>>,
    fallback: Arc<dyn ToolHook>,
}

impl Default for ToolHookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolHookRegistry {
    pub fn new() -> Self {
        Self { hooks: HashMap::new(), fallback: Arc::new(NoopHook) }
    }

    /// Register `hook` for `tool`, replacing any earlier registration.
    pub fn register(&mut self, tool: impl Into<String>, hook: Arc<dyn ToolHook>) {
        self.hooks.insert(tool.into(), hook);
    }

    /// Attach a [`CredentialCacheHook`] to each of `tools`.
    ///
    /// Every hook gets its own copy of the scheme and credential.
    pub fn with_credential_cache<I, S>(
        mut self,
        tools: I,
        scheme: &AuthScheme,
        credential: &AuthCredential,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tool in tools {
            let hook =
                CredentialCacheHook::new(scheme.clone(), credential.clone(), Arc::clone(&store))?;
            self.register(tool, Arc::new(hook));
        }
        Ok(self)
    }

    pub fn is_registered(&self, tool: &str) -> bool {
        self.hooks.contains_key(tool)
    }

    fn hook(&self, tool: &str) -> &Arc<dyn ToolHook> {
        self.hooks.get(tool).unwrap_or(&self.fallback)
    }

    pub async fn before_tool(
        &self,
        tool: &str,
        args: &Map<String, Value>,
        ctx: &mut ToolContext,
    ) -> Result<(), GatewayError> {
        self.hook(tool).before(tool, args, ctx).await
    }

    pub async fn after_tool(
        &self,
        tool: &str,
        args: &Map<String, Value>,
        ctx: &mut ToolContext,
        response: Value,
    ) -> Result<Value, GatewayError> {
        self.hook(tool).after(tool, args, ctx, response).await
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
