// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /run_sse`: one conversation turn as a Server-Sent Events stream.
//!
//! Every frame is `data: {json}\n\n`. Agent text arrives as `agent_response`
//! frames; a failure mid-turn produces one `error` frame; the stream always
//! ends with a `completion` frame. Failures found before the turn starts
//! (invalid request, unknown session) are plain HTTP errors instead.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::agent::{ResponseStream, RunAgentRequest};
use crate::state::GatewayState;
use crate::transport::http::error_response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    AgentResponse,
    Error,
    Completion,
}

/// JSON payload of one SSE frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub session_id: String,
    pub user_id: String,
}

pub async fn run_sse(
    State(s): State<Arc<GatewayState>>,
    Json(req): Json<RunAgentRequest>,
) -> Response {
    let responses = match s.chat.execute(&req).await {
        Ok(responses) => responses,
        Err(e) => return error_response(&e),
    };
    Sse::new(frames(responses, req.session_id, req.user_id)).into_response()
}

fn frames(
    mut responses: ResponseStream,
    session_id: String,
    user_id: String,
) -> impl Stream<Item = Result<SseEvent, Infallible>> + Send {
    let frame = move |kind: FrameKind, content: Option<String>| -> Result<SseEvent, Infallible> {
        let frame =
            StreamFrame { kind, content, session_id: session_id.clone(), user_id: user_id.clone() };
        Ok(SseEvent::default().json_data(frame).unwrap_or_default())
    };

    async_stream::stream! {
        while let Some(next) = responses.next().await {
            match next {
                Ok(text) => {
                    yield frame(FrameKind::AgentResponse, Some(text));
                }
                Err(e) => {
                    tracing::warn!(err = %e, "run failed mid-stream");
                    yield frame(FrameKind::Error, Some(e.to_string()));
                    break;
                }
            }
        }
        yield frame(FrameKind::Completion, None);
    }
}
