// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential key codec: pure derivation of cache keys, no I/O.
//!
//! Key shapes:
//!
//! ```text
//! stem        {scheme_kind}_{hash(scheme)}_{credential_kind}_{hash(credential)}
//! canonical   {stem}_existing_exchanged_credential
//! transient   temp:{stem}
//! persistent  {canonical}-{session_id}:{user_id}:{external_account_id}
//! ```
//!
//! `hash` is SHA-256 over the value's JSON serialization, so equal content
//! always produces equal keys, across processes and restarts.
//!
//! Reserved characters: session and user ids must not contain `:`. The
//! canonical key never contains `-` or `:`, which is what makes the
//! persistent key decodable. External account ids are unrestricted.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::credential::{AuthCredential, AuthScheme};

/// Marker prefix of keys that live only in a run's transient state.
pub const TRANSIENT_PREFIX: &str = "temp:";

/// Suffix distinguishing the canonical (durable) key from the stem.
pub const CANONICAL_SUFFIX: &str = "_existing_exchanged_credential";

/// Separator between the canonical key and the identity segment.
pub const ACCOUNT_SEPARATOR: char = '-';

/// Separator between session id, user id, and external account id.
pub const SESSION_USER_SEPARATOR: char = ':';

/// Bytes of the digest kept in each hash segment.
const HASH_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("malformed persistent credential key: {0}")]
    Malformed(String),
    #[error("cannot encode {0} for key derivation")]
    Encode(String),
}

fn content_hash<T: Serialize>(value: &T) -> Result<String, KeyError> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, value).map_err(|e| KeyError::Encode(e.to_string()))?;
    let digest = hasher.finalize();
    Ok(digest[..HASH_BYTES].iter().map(|b| format!("{b:02x}")).collect())
}

fn stem(scheme: &AuthScheme, credential: &AuthCredential) -> Result<String, KeyError> {
    Ok(format!(
        "{}_{}_{}_{}",
        scheme.kind.as_str(),
        content_hash(scheme)?,
        credential.auth_type.as_str(),
        content_hash(credential)?,
    ))
}

/// Durable cache key for a (scheme, credential) pair.
pub fn canonical_key(scheme: &AuthScheme, credential: &AuthCredential) -> Result<String, KeyError> {
    Ok(format!("{}{CANONICAL_SUFFIX}", stem(scheme, credential)?))
}

/// Run-scoped key for a (scheme, credential) pair.
pub fn transient_key(scheme: &AuthScheme, credential: &AuthCredential) -> Result<String, KeyError> {
    Ok(format!("{TRANSIENT_PREFIX}{}", stem(scheme, credential)?))
}

/// Scope a canonical key to one session, platform user and external account.
pub fn persistent_key(
    canonical_key: &str,
    session_id: &str,
    session_user_id: &str,
    external_account_id: &str,
) -> String {
    format!(
        "{canonical_key}{ACCOUNT_SEPARATOR}{session_id}{SESSION_USER_SEPARATOR}\
         {session_user_id}{SESSION_USER_SEPARATOR}{external_account_id}"
    )
}

/// Recover `(session_id, user_id)` from a key built by [`persistent_key`].
pub fn session_user_from_persistent_key(key: &str) -> Result<(String, String), KeyError> {
    let malformed = || KeyError::Malformed(key.to_owned());
    let (_, identity) = key.split_once(ACCOUNT_SEPARATOR).ok_or_else(malformed)?;
    let mut fields = identity.splitn(3, SESSION_USER_SEPARATOR);
    let session_id = fields.next().ok_or_else(malformed)?;
    let user_id = fields.next().ok_or_else(malformed)?;
    if fields.next().is_none() {
        return Err(malformed());
    }
    Ok((session_id.to_owned(), user_id.to_owned()))
}

/// Both key flavors for one (scheme, credential) pair, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    stem: String,
    canonical: String,
    transient: String,
}

impl CredentialKeys {
    pub fn new(scheme: &AuthScheme, credential: &AuthCredential) -> Result<Self, KeyError> {
        let stem = stem(scheme, credential)?;
        Ok(Self {
            canonical: format!("{stem}{CANONICAL_SUFFIX}"),
            transient: format!("{TRANSIENT_PREFIX}{stem}"),
            stem,
        })
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn transient(&self) -> &str {
        &self.transient
    }

    pub fn persistent(&self, session_id: &str, user_id: &str, external_account_id: &str) -> String {
        persistent_key(&self.canonical, session_id, user_id, external_account_id)
    }

    /// Whether a canonical and a transient key name the same credential once
    /// their namespace markers are stripped.
    pub fn same_stem(canonical: &str, transient: &str) -> bool {
        match (canonical.strip_suffix(CANONICAL_SUFFIX), transient.strip_prefix(TRANSIENT_PREFIX)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
