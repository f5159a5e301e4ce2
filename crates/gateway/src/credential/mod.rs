// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication value objects exchanged with the agent engine.
//!
//! [`AuthScheme`] describes *how* a tool authenticates and [`AuthCredential`]
//! *with what* client identity. Both are immutable descriptors: the gateway
//! only hashes them into cache keys (see [`key`]). [`AuthConfig`] is the one
//! mutable record, tracking a single in-flight authorization-code exchange.
//!
//! The shapes are provider-defined. Every struct keeps the fields it does not
//! model in a flattened `extra` map, so a negotiation survives decode and
//! re-encode unchanged apart from the fields the gateway writes.

pub mod key;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of authentication scheme, as declared by the tool provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemeKind {
    ApiKey,
    Http,
    Oauth2,
    OpenIdConnect,
}

impl SchemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "apiKey",
            Self::Http => "http",
            Self::Oauth2 => "oauth2",
            Self::OpenIdConnect => "openIdConnect",
        }
    }
}

/// Kind of client credential supplied alongside a scheme.
///
/// Engines send camelCase names. Snake-case spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialKind {
    #[serde(alias = "api_key")]
    ApiKey,
    Http,
    Oauth2,
    #[serde(alias = "open_id_connect")]
    OpenIdConnect,
    #[serde(alias = "service_account")]
    ServiceAccount,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "apiKey",
            Self::Http => "http",
            Self::Oauth2 => "oauth2",
            Self::OpenIdConnect => "openIdConnect",
            Self::ServiceAccount => "serviceAccount",
        }
    }
}

/// Authorization-code flow endpoints of an OAuth2 scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCodeFlow {
    pub authorization_url: String,
    pub token_url: String,
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<AuthorizationCodeFlow>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How a tool authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthScheme {
    #[serde(rename = "type")]
    pub kind: SchemeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthScheme {
    /// OAuth2 scheme with a single authorization-code flow.
    pub fn oauth2_authorization_code(
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
        scopes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            kind: SchemeKind::Oauth2,
            flows: Some(OAuthFlows {
                authorization_code: Some(AuthorizationCodeFlow {
                    authorization_url: authorization_url.into(),
                    token_url: token_url.into(),
                    scopes,
                    extra: Map::new(),
                }),
                extra: Map::new(),
            }),
            open_id_connect_url: None,
            extra: Map::new(),
        }
    }
}

/// OAuth2 client identity plus whatever the exchange has produced so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Auth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_response_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client credential for a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCredential {
    pub auth_type: CredentialKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2: Option<OAuth2Auth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthCredential {
    pub fn oauth2(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            auth_type: CredentialKind::Oauth2,
            oauth2: Some(OAuth2Auth {
                client_id: Some(client_id.into()),
                client_secret: Some(client_secret.into()),
                ..OAuth2Auth::default()
            }),
            api_key: None,
            extra: Map::new(),
        }
    }

    /// Access token carried by this credential, if the exchange produced one.
    pub fn access_token(&self) -> Option<&str> {
        self.oauth2.as_ref()?.access_token.as_deref()
    }
}

/// One in-flight OAuth2 authorization-code negotiation.
///
/// Fields the gateway does not interpret are kept in `extra` so the
/// negotiation handed back to the engine is the one it sent, plus our edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub auth_scheme: AuthScheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_auth_credential: Option<AuthCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchanged_auth_credential: Option<AuthCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthConfig {
    fn exchanged_oauth2(&self) -> Option<&OAuth2Auth> {
        self.exchanged_auth_credential.as_ref()?.oauth2.as_ref()
    }

    /// Provider authorization URI the user must visit.
    pub fn authorization_uri(&self) -> Option<&str> {
        self.exchanged_oauth2()?.auth_uri.as_deref().filter(|s| !s.is_empty())
    }

    /// OAuth2 correlation token for this negotiation.
    pub fn state(&self) -> Option<&str> {
        self.exchanged_oauth2()?.state.as_deref().filter(|s| !s.is_empty())
    }

    /// Record the provider redirect on the exchanged credential, creating the
    /// OAuth2 sub-object if the engine did not send one.
    pub fn record_auth_response(&mut self, auth_response_uri: String, redirect_uri: String) {
        let exchanged = self.exchanged_auth_credential.get_or_insert_with(|| AuthCredential {
            auth_type: CredentialKind::Oauth2,
            oauth2: None,
            api_key: None,
            extra: Map::new(),
        });
        let oauth2 = exchanged.oauth2.get_or_insert_with(OAuth2Auth::default);
        oauth2.auth_response_uri = Some(auth_response_uri);
        oauth2.redirect_uri = Some(redirect_uri);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
