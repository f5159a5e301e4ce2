// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent engine boundary: the event types the engine produces and the trait
//! the gateway drives it through.
//!
//! The engine itself (LLM reasoning, tool execution) is opaque. All wire types
//! use camelCase field names.

pub mod remote;

use std::collections::BTreeSet;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};

/// Who a piece of content is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// The result of a tool invocation, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub response: serde_json::Value,
}

/// One piece of content. Normally exactly one field is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    pub fn function_call(call: FunctionCall) -> Self {
        Self { function_call: Some(call), ..Self::default() }
    }

    pub fn function_response(response: FunctionResponse) -> Self {
        Self { function_response: Some(response), ..Self::default() }
    }
}

/// A message: a role plus ordered parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role: Some(role), parts }
    }

    /// A plain user text message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }
}

/// One item of the engine's output stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Ids of function calls that stay pending until the client answers them.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub long_running_tool_ids: BTreeSet<String>,
}

impl Event {
    pub fn new(author: Option<String>, content: Content) -> Self {
        Self { author, content: Some(content), long_running_tool_ids: BTreeSet::new() }
    }

    /// A model-authored text event.
    pub fn model_text(author: Option<String>, text: impl Into<String>) -> Self {
        Self::new(author, Content::new(Role::Model, vec![Part::text(text)]))
    }

    pub fn parts(&self) -> &[Part] {
        self.content.as_ref().map(|c| c.parts.as_slice()).unwrap_or_default()
    }

    /// Text of every part that carries some, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts().iter().filter_map(|p| p.text.as_deref())
    }
}

/// Stream of events produced by one engine run.
pub type EventStream = Pin<Box<dyn Stream<Item = anyhow::Result<Event>> + Send>>;

/// An agent execution engine.
#[async_trait]
pub trait AgentEngine: Send + Sync {
    /// Feed `message` into the given session and stream the resulting events.
    ///
    /// Dropping the returned stream abandons the run.
    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        message: Content,
    ) -> anyhow::Result<EventStream>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
