// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use crate::session::Session;
use crate::store::MemoryStore;
use crate::test_support::{oauth_credential, oauth_scheme};

use super::*;

#[derive(Default)]
struct Counting {
    before: AtomicUsize,
}

#[async_trait]
impl ToolHook for Counting {
    async fn before(
        &self,
        _tool: &str,
        _args: &Map<String, Value>,
        _ctx: &mut ToolContext,
    ) -> Result<(), GatewayError> {
        self.before.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn after(
        &self,
        tool: &str,
        _args: &Map<String, Value>,
        _ctx: &mut ToolContext,
        response: Value,
    ) -> Result<Value, GatewayError> {
        Ok(json!({ "tool": tool, "inner": response }))
    }
}

fn ctx() -> ToolContext {
    ToolContext::new(Session::new("s1", "app", "u1"))
}

#[tokio::test]
async fn dispatches_by_tool_name() -> anyhow::Result<()> {
    let counting = Arc::new(Counting::default());
    let mut registry = ToolHookRegistry::new();
    registry.register("search", counting.clone());

    let mut ctx = ctx();
    registry.before_tool("search", &Map::new(), &mut ctx).await?;
    registry.before_tool("other", &Map::new(), &mut ctx).await?;
    assert_eq!(counting.before.load(Ordering::SeqCst), 1);

    let wrapped = registry.after_tool("search", &Map::new(), &mut ctx, json!(1)).await?;
    assert_eq!(wrapped, json!({ "tool": "search", "inner": 1 }));
    Ok(())
}

#[tokio::test]
async fn unregistered_tool_passes_response_through() -> anyhow::Result<()> {
    let registry = ToolHookRegistry::default();
    let mut ctx = ctx();
    let response = registry.after_tool("anything", &Map::new(), &mut ctx, json!({"a": 1})).await?;
    assert_eq!(response, json!({"a": 1}));
    assert!(ctx.state.is_empty());
    Ok(())
}

#[test]
fn credential_cache_registers_each_tool() -> anyhow::Result<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let registry = ToolHookRegistry::new().with_credential_cache(
        ["gmail_list", "gmail_get"],
        &oauth_scheme(),
        &oauth_credential(),
        store,
    )?;
    assert!(registry.is_registered("gmail_list"));
    assert!(registry.is_registered("gmail_get"));
    assert!(!registry.is_registered("weather"));
    Ok(())
}
