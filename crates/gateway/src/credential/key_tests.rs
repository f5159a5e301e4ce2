// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use super::*;

fn scheme() -> AuthScheme {
    AuthScheme::oauth2_authorization_code(
        "https://accounts.example.com/o/oauth2/auth",
        "https://oauth2.example.com/token",
        BTreeMap::from([("mail.readonly".to_owned(), "View your email".to_owned())]),
    )
}

fn credential() -> AuthCredential {
    AuthCredential::oauth2("client-1", "secret-1")
}

#[test]
fn canonical_key_is_content_based() -> anyhow::Result<()> {
    let a = canonical_key(&scheme(), &credential())?;
    let b = canonical_key(&scheme(), &credential())?;
    assert_eq!(a, b);
    assert!(a.starts_with("oauth2_"));
    assert!(a.ends_with(CANONICAL_SUFFIX));
    Ok(())
}

#[test]
fn unencodable_value_is_an_error() -> anyhow::Result<()> {
    let tuple_keys = BTreeMap::from([((1u8, 2u8), 3u8)]);
    assert!(matches!(content_hash(&tuple_keys), Err(KeyError::Encode(_))));
    Ok(())
}

#[test]
fn unknown_scheme_fields_feed_the_hash() -> anyhow::Result<()> {
    let mut other = scheme();
    other.extra.insert("description".into(), "Gmail".into());
    assert_ne!(canonical_key(&scheme(), &credential())?, canonical_key(&other, &credential())?);
    Ok(())
}

#[test]
fn canonical_key_changes_with_scheme() -> anyhow::Result<()> {
    let mut other = scheme();
    if let Some(flow) = other.flows.as_mut().and_then(|f| f.authorization_code.as_mut()) {
        flow.scopes.insert("mail.send".into(), "Send email".into());
    }
    assert_ne!(canonical_key(&scheme(), &credential())?, canonical_key(&other, &credential())?);
    Ok(())
}

#[test]
fn canonical_key_changes_with_credential() -> anyhow::Result<()> {
    let other = AuthCredential::oauth2("client-2", "secret-1");
    assert_ne!(canonical_key(&scheme(), &credential())?, canonical_key(&scheme(), &other)?);
    Ok(())
}

#[test]
fn canonical_key_has_no_separators() -> anyhow::Result<()> {
    let key = canonical_key(&scheme(), &credential())?;
    assert!(!key.contains(ACCOUNT_SEPARATOR));
    assert!(!key.contains(SESSION_USER_SEPARATOR));
    Ok(())
}

#[test]
fn transient_key_is_namespaced() -> anyhow::Result<()> {
    let transient = transient_key(&scheme(), &credential())?;
    let canonical = canonical_key(&scheme(), &credential())?;
    assert!(transient.starts_with(TRANSIENT_PREFIX));
    assert_ne!(transient, canonical);
    assert!(CredentialKeys::same_stem(&canonical, &transient));
    Ok(())
}

#[test]
fn credential_keys_match_free_functions() -> anyhow::Result<()> {
    let keys = CredentialKeys::new(&scheme(), &credential())?;
    assert_eq!(keys.canonical(), canonical_key(&scheme(), &credential())?);
    assert_eq!(keys.transient(), transient_key(&scheme(), &credential())?);
    assert_eq!(
        keys.persistent("s", "u", "acct"),
        persistent_key(keys.canonical(), "s", "u", "acct")
    );
    Ok(())
}

#[test]
fn same_stem_rejects_unrelated_keys() -> anyhow::Result<()> {
    let a = CredentialKeys::new(&scheme(), &credential())?;
    let b = CredentialKeys::new(&scheme(), &AuthCredential::oauth2("other", "x"))?;
    assert!(!CredentialKeys::same_stem(a.canonical(), b.transient()));
    assert!(!CredentialKeys::same_stem(a.transient(), a.canonical()));
    Ok(())
}

#[yare::parameterized(
    plain = { "s1", "u1", "me@example.com" },
    uuid_session = { "7c9e6679-7425-40de-944b-e07fc1f90ae7", "user-42", "acct" },
    account_with_colons = { "s", "u", "urn:acct:1" },
    empty_ids = { "", "", "" },
)]
fn persistent_key_round_trips(session_id: &str, user_id: &str, account: &str) {
    let canonical = canonical_key(&scheme(), &credential()).unwrap_or_default();
    let key = persistent_key(&canonical, session_id, user_id, account);
    let decoded = session_user_from_persistent_key(&key);
    assert_eq!(decoded, Ok((session_id.to_owned(), user_id.to_owned())));
}

#[test]
fn persistent_key_is_unique_per_identity() -> anyhow::Result<()> {
    let keys = CredentialKeys::new(&scheme(), &credential())?;
    let a = keys.persistent("s1", "u1", "alice");
    let b = keys.persistent("s1", "u1", "bob");
    let c = keys.persistent("s2", "u1", "alice");
    assert_ne!(a, b);
    assert_ne!(a, c);
    Ok(())
}

#[yare::parameterized(
    no_dash = { "abc" },
    no_user = { "ck-session" },
    no_account = { "ck-session:user" },
)]
fn malformed_persistent_key_is_rejected(key: &str) {
    assert!(session_user_from_persistent_key(key).is_err());
}
