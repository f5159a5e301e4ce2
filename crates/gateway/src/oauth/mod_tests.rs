// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::store::FileStore;

use super::*;

fn query(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> CallbackQuery {
    CallbackQuery {
        code: code.map(String::from),
        state: state.map(String::from),
        error: error.map(String::from),
    }
}

#[tokio::test]
async fn stores_code_under_state() -> anyhow::Result<()> {
    let codes = CallbackStore::in_memory();
    let outcome = codes.handle_callback(&query(Some("c1"), Some("s1"), None)).await?;
    assert_eq!(outcome, CallbackOutcome::Stored);
    assert_eq!(codes.get_code("s1").await?.as_deref(), Some("c1"));
    // get is non-destructive
    assert_eq!(codes.get_code("s1").await?.as_deref(), Some("c1"));
    Ok(())
}

#[tokio::test]
async fn consume_is_single_use() -> anyhow::Result<()> {
    let codes = CallbackStore::in_memory();
    codes.handle_callback(&query(Some("c1"), Some("s1"), None)).await?;
    assert_eq!(codes.consume_code("s1").await?.as_deref(), Some("c1"));
    assert_eq!(codes.consume_code("s1").await?, None);
    assert_eq!(codes.get_code("s1").await?, None);
    Ok(())
}

#[tokio::test]
async fn later_callback_overwrites() -> anyhow::Result<()> {
    let codes = CallbackStore::in_memory();
    codes.handle_callback(&query(Some("old"), Some("s1"), None)).await?;
    codes.handle_callback(&query(Some("new"), Some("s1"), None)).await?;
    assert_eq!(codes.consume_code("s1").await?.as_deref(), Some("new"));
    Ok(())
}

#[tokio::test]
async fn invalid_request_stores_nothing() -> anyhow::Result<()> {
    let cases = [(None, Some("s1")), (Some("c1"), None), (Some(""), Some("s1")), (None, None)];
    for (code, state) in cases {
        let codes = CallbackStore::in_memory();
        let outcome = codes.handle_callback(&query(code, state, None)).await?;
        assert_eq!(outcome, CallbackOutcome::InvalidRequest, "code={code:?} state={state:?}");
        assert_eq!(codes.get_code("s1").await?, None);
    }
    Ok(())
}

#[tokio::test]
async fn provider_error_stores_nothing() -> anyhow::Result<()> {
    let codes = CallbackStore::in_memory();
    let outcome =
        codes.handle_callback(&query(Some("c1"), Some("s1"), Some("access_denied"))).await?;
    assert_eq!(outcome, CallbackOutcome::Failed("access_denied".into()));
    assert_eq!(outcome.http_status(), 400);
    assert_eq!(codes.get_code("s1").await?, None);
    Ok(())
}

#[test]
fn failure_page_escapes_error() -> anyhow::Result<()> {
    let html = CallbackOutcome::Failed("<script>x</script>".into()).html();
    assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    assert!(!html.contains("<script>x"));
    Ok(())
}

#[tokio::test]
async fn durable_variant_expires_codes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path().join("codes.json")));
    let codes = CallbackStore::durable(store, Duration::from_millis(30));
    assert_eq!(codes.ttl(), Some(Duration::from_millis(30)));

    codes.handle_callback(&query(Some("c1"), Some("s1"), None)).await?;
    assert_eq!(codes.get_code("s1").await?.as_deref(), Some("c1"));
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(codes.consume_code("s1").await?, None);
    Ok(())
}

#[tokio::test]
async fn durable_variant_shares_backing_store() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("codes.json");
    let writer = CallbackStore::durable(Arc::new(FileStore::new(&path)), DEFAULT_CODE_TTL);
    let reader = CallbackStore::durable(Arc::new(FileStore::new(&path)), DEFAULT_CODE_TTL);

    writer.handle_callback(&query(Some("c1"), Some("s1"), None)).await?;
    assert_eq!(reader.consume_code("s1").await?.as_deref(), Some("c1"));
    assert_eq!(writer.consume_code("s1").await?, None);
    Ok(())
}
