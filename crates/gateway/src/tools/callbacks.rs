// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-account credential cache around OAuth-protected tools.
//!
//! The engine keeps an exchanged credential in run state under the canonical
//! key. This hook mirrors it into a durable store under the persistent key
//! (scoped to session, user and external account) and restores it on later
//! calls, so a finished OAuth2 exchange is reused instead of re-prompting.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::credential::key::{CredentialKeys, KeyError};
use crate::credential::{AuthCredential, AuthScheme};
use crate::error::GatewayError;
use crate::store::KeyValueStore;
use crate::tools::{ToolContext, ToolHook};

/// Run-state key prefix remembering the external account of the previous call.
pub const LAST_ACCOUNT_PREFIX: &str = "temp:last_external_account:";

/// Where the external account id sits in the tool arguments by default.
pub const DEFAULT_ACCOUNT_PATH: [&str; 3] = ["connector_input_payload", "Path parameters", "userId"];

pub struct CredentialCacheHook {
    keys: CredentialKeys,
    store: Arc<dyn KeyValueStore>,
    account_path: Vec<String>,
}

impl CredentialCacheHook {
    pub fn new(
        scheme: AuthScheme,
        credential: AuthCredential,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, KeyError> {
        Ok(Self {
            keys: CredentialKeys::new(&scheme, &credential)?,
            store,
            account_path: DEFAULT_ACCOUNT_PATH.iter().map(|s| (*s).to_owned()).collect(),
        })
    }

    pub fn with_account_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.account_path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn keys(&self) -> &CredentialKeys {
        &self.keys
    }

    /// External account id from the call arguments. Strings and numbers only.
    pub fn external_account(&self, args: &Map<String, Value>) -> Option<String> {
        let (first, rest) = self.account_path.split_first()?;
        let mut value = args.get(first)?;
        for segment in rest {
            value = value.get(segment)?;
        }
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn last_account_key(&self) -> String {
        format!("{LAST_ACCOUNT_PREFIX}{}", self.keys.stem())
    }

    /// Drop the credential cached for `account` from run state and the store.
    async fn purge_account(&self, ctx: &mut ToolContext, account: &str) -> Result<(), GatewayError> {
        if ctx.state.contains_key(self.keys.canonical()) {
            ctx.state.insert(self.keys.canonical().to_owned(), Value::Null);
        }
        let key = self.keys.persistent(&ctx.session.id, &ctx.session.user_id, account);
        self.store.delete(&key).await.map_err(GatewayError::Store)?;
        tracing::info!(
            session_id = %ctx.session.id,
            account,
            "external account changed, cached credential purged"
        );
        Ok(())
    }

    /// Heuristic: clear the canonical entry when the engine's post-exchange
    /// credential carries a different access token.
    ///
    /// After switching accounts and re-authorizing, the engine has been seen
    /// to keep serving the previous account's canonical entry even though
    /// [`purge_account`](Self::purge_account) cleared it. A transient
    /// credential with a newer token is the only signal of that race, so this
    /// is a workaround for observed engine behavior rather than a protocol
    /// rule. Revisit once the engine's refresh path is confirmed.
    pub fn purge_if_refreshed(&self, ctx: &mut ToolContext) -> bool {
        if !CredentialKeys::same_stem(self.keys.canonical(), self.keys.transient()) {
            return false;
        }
        let Some(fresh) = ctx.get(self.keys.transient()).and_then(access_token).map(str::to_owned)
        else {
            return false;
        };
        let Some(cached) = ctx.get(self.keys.canonical()) else {
            return false;
        };
        if access_token(cached) == Some(fresh.as_str()) {
            return false;
        }
        ctx.state.insert(self.keys.canonical().to_owned(), Value::Null);
        tracing::debug!(session_id = %ctx.session.id, "canonical credential superseded by fresh exchange");
        true
    }
}

/// Access token of a run-state credential. Only the token is read, so
/// credential shapes the gateway does not model still compare.
fn access_token(value: &Value) -> Option<&str> {
    ["/oauth2/accessToken", "/oauth2/access_token"]
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
}

#[async_trait]
impl ToolHook for CredentialCacheHook {
    async fn before(
        &self,
        tool: &str,
        args: &Map<String, Value>,
        ctx: &mut ToolContext,
    ) -> Result<(), GatewayError> {
        let Some(account) = self.external_account(args) else {
            tracing::debug!(tool, "no external account in tool args, credential cache skipped");
            return Ok(());
        };

        let last_key = self.last_account_key();
        let previous = ctx.get(&last_key).and_then(Value::as_str).map(str::to_owned);
        match previous {
            Some(previous) if previous != account => self.purge_account(ctx, &previous).await?,
            Some(_) => {
                self.purge_if_refreshed(ctx);
            }
            None => {}
        }
        ctx.state.insert(last_key, Value::String(account.clone()));

        if ctx.get(self.keys.canonical()).is_some() {
            return Ok(());
        }
        let key = self.keys.persistent(&ctx.session.id, &ctx.session.user_id, &account);
        if let Some(credential) = self.store.get(&key).await.map_err(GatewayError::Store)? {
            tracing::info!(
                tool,
                session_id = %ctx.session.id,
                account = %account,
                "credential restored from store"
            );
            ctx.state.insert(self.keys.canonical().to_owned(), credential);
        }
        Ok(())
    }

    async fn after(
        &self,
        tool: &str,
        args: &Map<String, Value>,
        ctx: &mut ToolContext,
        response: Value,
    ) -> Result<Value, GatewayError> {
        let Some(account) = self.external_account(args) else {
            return Ok(response);
        };
        if let Some(credential) = ctx.get(self.keys.canonical()) {
            let key = self.keys.persistent(&ctx.session.id, &ctx.session.user_id, &account);
            self.store.set(&key, credential.clone(), None).await.map_err(GatewayError::Store)?;
            tracing::info!(
                tool,
                session_id = %ctx.session.id,
                account = %account,
                "credential persisted"
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
#[path = "callbacks_tests.rs"]
mod tests;
