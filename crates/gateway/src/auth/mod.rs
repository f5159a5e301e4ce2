// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mid-conversation OAuth2 handshake: detect the engine's credential request,
//! surface the authorization URL, wait for the callback, and hand the updated
//! negotiation back to the engine.

pub mod handler;
pub mod interceptor;

pub use handler::AuthConfigHandler;
pub use interceptor::{AuthEventStream, AuthInterceptor, REQUEST_CREDENTIAL_FUNCTION};
