// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod caller;
pub mod chat;

pub use caller::{
    default_event_filter, default_event_parser, AgentCaller, AgentCallerBuilder, EventFilter,
    EventParser, ResponseStream, RunPhase,
};
pub use chat::{ChatService, RunAgentRequest};
