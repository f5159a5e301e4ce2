// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error codes for the gateway API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Unauthorized,
    BadRequest,
    SessionNotFound,
    SessionExists,
    AuthMalformed,
    AuthTimeout,
    UpstreamError,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::SessionNotFound => 404,
            Self::SessionExists => 409,
            Self::AuthMalformed => 422,
            Self::AuthTimeout => 504,
            Self::UpstreamError => 502,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::SessionExists => "SESSION_EXISTS",
            Self::AuthMalformed => "AUTH_MALFORMED",
            Self::AuthTimeout => "AUTH_TIMEOUT",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Failures raised by the conversation core.
///
/// Store and engine failures carry the underlying error untouched: a swallowed
/// store error would silently turn into an unauthenticated run.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("session with ID '{0}' not found")]
    SessionNotFound(String),

    #[error("session with ID '{0}' already exists")]
    SessionAlreadyExists(String),

    #[error("malformed auth negotiation: {0}")]
    AuthNegotiationMalformed(String),

    #[error("authentication timeout after {}s for state: {state}", timeout.as_secs_f64())]
    AuthTimeout { state: String, timeout: Duration },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("store error: {0:#}")]
    Store(anyhow::Error),

    #[error("engine error: {0:#}")]
    Engine(anyhow::Error),
}

impl GatewayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SessionNotFound(_) => ErrorCode::SessionNotFound,
            Self::SessionAlreadyExists(_) => ErrorCode::SessionExists,
            Self::AuthNegotiationMalformed(_) => ErrorCode::AuthMalformed,
            Self::AuthTimeout { .. } => ErrorCode::AuthTimeout,
            Self::InvalidRequest(_) => ErrorCode::BadRequest,
            Self::Store(_) => ErrorCode::Internal,
            Self::Engine(_) => ErrorCode::UpstreamError,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::AuthNegotiationMalformed(message.into())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
