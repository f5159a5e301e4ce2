// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hooks the engine runs around tool invocations, dispatched by tool name.

pub mod callbacks;
pub mod registry;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::session::Session;

pub use callbacks::CredentialCacheHook;
pub use registry::ToolHookRegistry;

/// What a hook sees of the run invoking the tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolContext {
    pub session: Session,
    /// Run state shared with the engine. A `null` value means "unset".
    pub state: Map<String, Value>,
}

impl ToolContext {
    pub fn new(session: Session) -> Self {
        Self { session, state: Map::new() }
    }

    /// Value under `key`, treating `null` as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key).filter(|v| !v.is_null())
    }
}

/// Capability run before and after one tool invocation.
#[async_trait]
pub trait ToolHook: Send + Sync {
    async fn before(
        &self,
        _tool: &str,
        _args: &Map<String, Value>,
        _ctx: &mut ToolContext,
    ) -> Result<(), GatewayError> {
        Ok(())
    }

    /// May rewrite the tool's response. Defaults to passing it through.
    async fn after(
        &self,
        _tool: &str,
        _args: &Map<String, Value>,
        _ctx: &mut ToolContext,
        response: Value,
    ) -> Result<Value, GatewayError> {
        Ok(response)
    }
}

/// Hook used for tools without a registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl ToolHook for NoopHook {}
