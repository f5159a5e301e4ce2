// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::credential::{AuthCredential, AuthScheme};

/// Configuration for the agentgate server.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "agentgate", version, about = "Streaming agent gateway with inline OAuth2")]
pub struct GatewayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "AGENTGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "AGENTGATE_PORT")]
    pub port: u16,

    /// Bearer token for the API. If unset, auth is disabled.
    #[arg(long, env = "AGENTGATE_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Application name sessions are registered under.
    #[arg(long, default_value = "agentgate", env = "AGENTGATE_APP_NAME")]
    pub app_name: String,

    /// Author name put on gateway-generated events.
    #[arg(long, env = "AGENTGATE_AGENT_NAME")]
    pub agent_name: Option<String>,

    /// OAuth2 redirect URI. Defaults to this server's `/oauth/callback`.
    #[arg(long, env = "AGENTGATE_REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Callback store poll interval in milliseconds.
    #[arg(long, default_value_t = 2000, env = "AGENTGATE_POLL_MS")]
    pub poll_ms: u64,

    /// How long a run waits for the user to authorize, in seconds.
    #[arg(long, default_value_t = 300, env = "AGENTGATE_AUTH_TIMEOUT_SECS")]
    pub auth_timeout_secs: u64,

    /// Lifetime of unconsumed authorization codes in the durable store.
    #[arg(long, default_value_t = 300, env = "AGENTGATE_CODE_TTL_SECS")]
    pub code_ttl_secs: u64,

    /// JSON file backing codes and credentials. In-memory when unset.
    #[arg(long, env = "AGENTGATE_STORE_PATH")]
    pub store_path: Option<PathBuf>,

    /// JSON file naming OAuth-protected tools and their scheme and credential.
    /// Their credentials are cached per external account in the shared store.
    #[arg(long, env = "AGENTGATE_TOOL_AUTH")]
    pub tool_auth: Option<PathBuf>,

    /// Base URL of the agent engine.
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "AGENTGATE_ENGINE_URL")]
    pub engine_url: String,

    /// Bearer token sent to the agent engine.
    #[arg(long, env = "AGENTGATE_ENGINE_TOKEN")]
    pub engine_token: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "AGENTGATE_LOG_JSON")]
    pub log_json: bool,
}

impl GatewayConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn redirect_uri(&self) -> String {
        match &self.redirect_uri {
            Some(uri) => uri.clone(),
            None => format!("http://localhost:{}/oauth/callback", self.port),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    pub fn code_ttl(&self) -> Duration {
        Duration::from_secs(self.code_ttl_secs)
    }
}

/// Contents of the `--tool-auth` file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAuthConfig {
    pub tools: Vec<String>,
    pub auth_scheme: AuthScheme,
    pub auth_credential: AuthCredential,
}

impl ToolAuthConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
