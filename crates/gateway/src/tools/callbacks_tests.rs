// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use crate::session::Session;
use crate::store::MemoryStore;
use crate::test_support::{exchanged_credential, oauth_credential, oauth_scheme};

use super::*;

fn setup() -> anyhow::Result<(CredentialCacheHook, Arc<MemoryStore>)> {
    let store = Arc::new(MemoryStore::new());
    let hook = CredentialCacheHook::new(oauth_scheme(), oauth_credential(), store.clone())?;
    Ok((hook, store))
}

fn ctx() -> ToolContext {
    ToolContext::new(Session::new("s1", "app", "u1"))
}

fn args(account: &str) -> Map<String, Value> {
    let value = json!({
        "connector_input_payload": { "Path parameters": { "userId": account } },
        "operation": "list",
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn without_account_nothing_happens() -> anyhow::Result<()> {
    let (hook, store) = setup()?;
    let mut ctx = ctx();
    ctx.state.insert(hook.keys().canonical().to_owned(), exchanged_credential("tok"));
    let before = ctx.clone();

    hook.before("gmail_list", &Map::new(), &mut ctx).await?;
    let response = hook.after("gmail_list", &Map::new(), &mut ctx, json!({"ok": true})).await?;

    assert_eq!(ctx, before);
    assert_eq!(response, json!({"ok": true}));
    assert!(store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn after_persists_and_before_restores() -> anyhow::Result<()> {
    let (hook, store) = setup()?;
    let mut first = ctx();
    hook.before("gmail_list", &args("me@example.com"), &mut first).await?;
    first.state.insert(hook.keys().canonical().to_owned(), exchanged_credential("tok-1"));
    hook.after("gmail_list", &args("me@example.com"), &mut first, json!({})).await?;

    let key = hook.keys().persistent("s1", "u1", "me@example.com");
    assert_eq!(store.get(&key).await?, Some(exchanged_credential("tok-1")));

    // a later run starts with empty state
    let mut second = ctx();
    hook.before("gmail_list", &args("me@example.com"), &mut second).await?;
    assert_eq!(second.get(hook.keys().canonical()), Some(&exchanged_credential("tok-1")));
    Ok(())
}

#[tokio::test]
async fn before_keeps_credential_already_in_state() -> anyhow::Result<()> {
    let (hook, store) = setup()?;
    let key = hook.keys().persistent("s1", "u1", "me@example.com");
    store.set(&key, exchanged_credential("stored"), None).await?;

    let mut ctx = ctx();
    ctx.state.insert(hook.keys().canonical().to_owned(), exchanged_credential("live"));
    hook.before("gmail_list", &args("me@example.com"), &mut ctx).await?;
    assert_eq!(ctx.get(hook.keys().canonical()), Some(&exchanged_credential("live")));
    Ok(())
}

#[tokio::test]
async fn account_switch_purges_previous_account() -> anyhow::Result<()> {
    let (hook, store) = setup()?;
    let mut ctx = ctx();
    hook.before("gmail_list", &args("a@example.com"), &mut ctx).await?;
    ctx.state.insert(hook.keys().canonical().to_owned(), exchanged_credential("tok-a"));
    hook.after("gmail_list", &args("a@example.com"), &mut ctx, json!({})).await?;

    hook.before("gmail_list", &args("b@example.com"), &mut ctx).await?;

    assert_eq!(ctx.get(hook.keys().canonical()), None);
    let old = hook.keys().persistent("s1", "u1", "a@example.com");
    assert_eq!(store.get(&old).await?, None);
    Ok(())
}

#[tokio::test]
async fn account_switch_loads_new_account_credential() -> anyhow::Result<()> {
    let (hook, store) = setup()?;
    let key_b = hook.keys().persistent("s1", "u1", "b@example.com");
    store.set(&key_b, exchanged_credential("tok-b"), None).await?;

    let mut ctx = ctx();
    hook.before("gmail_list", &args("a@example.com"), &mut ctx).await?;
    hook.before("gmail_list", &args("b@example.com"), &mut ctx).await?;
    assert_eq!(ctx.get(hook.keys().canonical()), Some(&exchanged_credential("tok-b")));
    Ok(())
}

#[tokio::test]
async fn last_account_lives_in_run_state() -> anyhow::Result<()> {
    let (hook, _store) = setup()?;
    let mut one = ctx();
    let mut two = ToolContext::new(Session::new("s2", "app", "u2"));

    hook.before("gmail_list", &args("a@example.com"), &mut one).await?;
    one.state.insert(hook.keys().canonical().to_owned(), exchanged_credential("tok-one"));
    hook.before("gmail_list", &args("b@example.com"), &mut two).await?;

    // another session's account is not a switch for this one
    hook.before("gmail_list", &args("a@example.com"), &mut one).await?;
    assert_eq!(one.get(hook.keys().canonical()), Some(&exchanged_credential("tok-one")));
    Ok(())
}

#[test]
fn refreshed_transient_token_clears_canonical() -> anyhow::Result<()> {
    let (hook, _store) = setup()?;
    let mut ctx = ctx();
    ctx.state.insert(hook.keys().canonical().to_owned(), exchanged_credential("old"));
    ctx.state.insert(hook.keys().transient().to_owned(), exchanged_credential("new"));

    assert!(hook.purge_if_refreshed(&mut ctx));
    assert_eq!(ctx.get(hook.keys().canonical()), None);
    Ok(())
}

#[test]
fn matching_transient_token_is_left_alone() -> anyhow::Result<()> {
    let (hook, _store) = setup()?;
    let mut ctx = ctx();
    ctx.state.insert(hook.keys().canonical().to_owned(), exchanged_credential("same"));
    ctx.state.insert(hook.keys().transient().to_owned(), exchanged_credential("same"));
    assert!(!hook.purge_if_refreshed(&mut ctx));

    ctx.state.remove(hook.keys().transient());
    assert!(!hook.purge_if_refreshed(&mut ctx));
    assert_eq!(ctx.get(hook.keys().canonical()), Some(&exchanged_credential("same")));
    Ok(())
}

#[tokio::test]
async fn same_account_with_refreshed_exchange_drops_stale_entry() -> anyhow::Result<()> {
    let (hook, _store) = setup()?;
    let mut ctx = ctx();
    hook.before("gmail_list", &args("a@example.com"), &mut ctx).await?;
    ctx.state.insert(hook.keys().canonical().to_owned(), exchanged_credential("stale"));
    ctx.state.insert(hook.keys().transient().to_owned(), exchanged_credential("fresh"));

    hook.before("gmail_list", &args("a@example.com"), &mut ctx).await?;
    assert_eq!(ctx.get(hook.keys().canonical()), None);
    Ok(())
}

#[test]
fn account_path_is_configurable() -> anyhow::Result<()> {
    let (hook, _store) = setup()?;
    let hook = hook.with_account_path(["account"]);
    let mut args = Map::new();
    args.insert("account".into(), json!(42));
    assert_eq!(hook.external_account(&args).as_deref(), Some("42"));
    args.insert("account".into(), json!(""));
    assert_eq!(hook.external_account(&args), None);
    Ok(())
}

#[test]
fn refresh_check_reads_tokens_from_unmodeled_shapes() -> anyhow::Result<()> {
    let (hook, _store) = setup()?;
    let mut ctx = ctx();
    let shaped = |token: &str| json!({ "authType": "openIdConnect", "oauth2": { "accessToken": token } });
    ctx.state.insert(hook.keys().canonical().to_owned(), shaped("old"));
    ctx.state.insert(hook.keys().transient().to_owned(), shaped("new"));
    assert!(hook.purge_if_refreshed(&mut ctx));
    assert_eq!(ctx.get(hook.keys().canonical()), None);
    Ok(())
}

#[test]
fn refresh_check_accepts_snake_case_token_key() -> anyhow::Result<()> {
    let (hook, _store) = setup()?;
    let mut ctx = ctx();
    ctx.state.insert(
        hook.keys().canonical().to_owned(),
        json!({ "auth_type": "oauth2", "oauth2": { "access_token": "old" } }),
    );
    ctx.state.insert(
        hook.keys().transient().to_owned(),
        json!({ "auth_type": "oauth2", "oauth2": { "access_token": "new" } }),
    );
    assert!(hook.purge_if_refreshed(&mut ctx));
    Ok(())
}
