// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use super::*;

#[test]
fn defaults() -> anyhow::Result<()> {
    let config = GatewayConfig::try_parse_from(["agentgate"])?;
    assert_eq!(config.addr(), "127.0.0.1:8000");
    assert_eq!(config.redirect_uri(), "http://localhost:8000/oauth/callback");
    assert_eq!(config.poll_interval(), Duration::from_secs(2));
    assert_eq!(config.auth_timeout(), Duration::from_secs(300));
    assert_eq!(config.code_ttl(), Duration::from_secs(300));
    assert!(config.store_path.is_none());
    assert!(config.tool_auth.is_none());
    Ok(())
}

#[test]
fn explicit_redirect_wins() -> anyhow::Result<()> {
    let config = GatewayConfig::try_parse_from([
        "agentgate",
        "--port",
        "9000",
        "--redirect-uri",
        "https://gw.example.com/oauth/callback",
        "--poll-ms",
        "100",
    ])?;
    assert_eq!(config.redirect_uri(), "https://gw.example.com/oauth/callback");
    assert_eq!(config.poll_interval(), Duration::from_millis(100));
    Ok(())
}

#[test]
fn tool_auth_file_loads() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tool-auth.json");
    let body = serde_json::json!({
        "tools": ["gmail_list", "gmail_get"],
        "authScheme": crate::test_support::oauth_scheme(),
        "authCredential": { "authType": "oauth2", "oauth2": { "clientId": "cid", "clientSecret": "cs" } },
    });
    std::fs::write(&path, body.to_string())?;

    let loaded = ToolAuthConfig::load(&path)?;
    assert_eq!(loaded.tools, vec!["gmail_list".to_owned(), "gmail_get".to_owned()]);
    assert_eq!(loaded.auth_scheme, crate::test_support::oauth_scheme());
    assert_eq!(loaded.auth_credential, AuthCredential::oauth2("cid", "cs"));
    Ok(())
}

#[test]
fn missing_tool_auth_file_names_the_path() -> anyhow::Result<()> {
    let err = ToolAuthConfig::load(Path::new("/nonexistent/tool-auth.json"))
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected error"))?;
    assert!(err.to_string().contains("/nonexistent/tool-auth.json"));
    Ok(())
}
