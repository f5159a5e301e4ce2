// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool hook webhooks: an out-of-process engine calls these around each tool
//! invocation and adopts the returned run state.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::state::GatewayState;
use crate::tools::ToolContext;

use super::http::error_response;

/// Body of `POST /tools/before` and `POST /tools/after`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHookRequest {
    /// Defaults to the gateway's own app name.
    #[serde(default)]
    pub app_name: Option<String>,
    pub user_id: String,
    pub session_id: String,
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default)]
    pub state: Map<String, Value>,
    /// Tool output. Only meaningful for `after`.
    #[serde(default)]
    pub response: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHookResponse {
    pub state: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

async fn context(s: &GatewayState, req: &mut ToolHookRequest) -> Result<ToolContext, GatewayError> {
    let app_name = req.app_name.as_deref().unwrap_or(s.chat.caller().app_name());
    let session = s
        .sessions
        .get_session(app_name, &req.user_id, &req.session_id)
        .await?
        .ok_or_else(|| GatewayError::SessionNotFound(req.session_id.clone()))?;
    Ok(ToolContext { session, state: std::mem::take(&mut req.state) })
}

/// `POST /tools/before`
pub async fn before_tool(
    State(s): State<Arc<GatewayState>>,
    Json(mut req): Json<ToolHookRequest>,
) -> Response {
    let result = async {
        let mut ctx = context(&s, &mut req).await?;
        s.tools.before_tool(&req.tool, &req.args, &mut ctx).await?;
        Ok::<_, GatewayError>(ToolHookResponse { state: ctx.state, response: None })
    }
    .await;
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `POST /tools/after`
pub async fn after_tool(
    State(s): State<Arc<GatewayState>>,
    Json(mut req): Json<ToolHookRequest>,
) -> Response {
    let result = async {
        let mut ctx = context(&s, &mut req).await?;
        let response = std::mem::take(&mut req.response);
        let response = s.tools.after_tool(&req.tool, &req.args, &mut ctx, response).await?;
        Ok::<_, GatewayError>(ToolHookResponse { state: ctx.state, response: Some(response) })
    }
    .await;
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(&e),
    }
}
