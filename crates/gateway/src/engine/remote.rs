// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for an agent runtime that speaks newline-delimited JSON events.

use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::Serialize;

use crate::engine::{AgentEngine, Content, Event, EventStream};

#[derive(Debug, Serialize)]
struct RunBody<'a> {
    app_name: &'a str,
    user_id: &'a str,
    session_id: &'a str,
    new_message: Content,
}

/// Agent engine reached over HTTP: `POST {base_url}/run` returns one JSON
/// [`Event`] per line.
pub struct RemoteEngine {
    base_url: String,
    app_name: String,
    auth_token: Option<String>,
    client: Client,
}

impl RemoteEngine {
    pub fn new(base_url: String, app_name: String, auth_token: Option<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { base_url: base_url.trim_end_matches('/').to_owned(), app_name, auth_token, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl AgentEngine for RemoteEngine {
    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        message: Content,
    ) -> anyhow::Result<EventStream> {
        let body = RunBody { app_name: &self.app_name, user_id, session_id, new_message: message };
        let req = self.client.post(self.url("/run")).json(&body);
        let resp = self.apply_auth(req).send().await?.error_for_status()?;
        tracing::debug!(session_id, "remote engine run started");

        Ok(Box::pin(event_lines(resp.bytes_stream())))
    }
}

/// Split a byte stream into NDJSON lines and decode each as an [`Event`].
pub fn event_lines<S, E>(chunks: S) -> impl Stream<Item = anyhow::Result<Event>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::try_stream! {
        futures_util::pin_mut!(chunks);
        let mut buf = BytesMut::new();
        while let Some(chunk) = chunks.next().await {
            buf.extend_from_slice(&chunk?);
            while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line = buf.split_to(pos);
                buf.advance(1);
                if let Some(event) = parse_line(&line)? {
                    yield event;
                }
            }
        }
        if let Some(event) = parse_line(&buf)? {
            yield event;
        }
    }
}

/// Parse one NDJSON line. Blank lines are skipped.
pub fn parse_line(line: &[u8]) -> anyhow::Result<Option<Event>> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(trimmed)?))
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
