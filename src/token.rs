use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

use crate::error::Error;
use crate::types::UserId;

/// Who the current access token says the user is.
///
/// Derived from the token payload on every login/refresh; never stored on
/// its own.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SessionIdentity {
    pub user_id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub email: Option<String>,
    /// Access token expiry (`exp` claim), if the token carries one.
    pub expires_at: Option<OffsetDateTime>,
}

impl SessionIdentity {
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_admin,
            email: None,
            expires_at: None,
        }
    }

    /// Whether the access token's `exp` lies at or before `now`.
    ///
    /// Tokens without `exp` never report as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Payload claims read from an access token **without** signature verification.
#[derive(Debug, Clone)]
pub struct UnverifiedClaims {
    inner: JsonValue,
}

impl UnverifiedClaims {
    /// Gets a claim value by key.
    #[must_use]
    pub fn get_claim(&self, key: &str) -> Option<&JsonValue> {
        self.inner.get(key)
    }

    /// Gets the inner JSON value.
    #[must_use]
    pub fn as_json(&self) -> &JsonValue {
        &self.inner
    }
}

#[derive(Deserialize)]
struct AccessClaims {
    #[serde(default)]
    id: Option<UserId>,
    #[serde(default)]
    user_id: Option<UserId>,
    username: String,
    is_admin: bool,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decodes the payload segment of a JWT-shaped access token.
///
/// # Errors
///
/// Returns [`Error::MalformedCredential`] if the token does not have three
/// segments or the payload is not base64url-encoded JSON.
pub fn decode_claims(token: &str) -> Result<UnverifiedClaims, Error> {
    let payload = payload_segment(token)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::MalformedCredential(format!("payload is not base64url: {e}")))?;
    let inner: JsonValue = serde_json::from_slice(&bytes)
        .map_err(|e| Error::MalformedCredential(format!("payload is not JSON: {e}")))?;
    if !inner.is_object() {
        return Err(Error::MalformedCredential("payload is not a JSON object".into()));
    }
    Ok(UnverifiedClaims { inner })
}

/// Decodes the session identity carried by an access token.
///
/// # Errors
///
/// Returns [`Error::MalformedCredential`] if the payload cannot be decoded or
/// lacks a user id, `username`, or `is_admin`.
pub fn decode_identity(access_token: &str) -> Result<SessionIdentity, Error> {
    let claims = decode_claims(access_token)?;
    let claims: AccessClaims = serde_json::from_value(claims.inner)
        .map_err(|e| Error::MalformedCredential(format!("invalid claims: {e}")))?;

    let user_id = claims
        .id
        .or(claims.user_id)
        .ok_or_else(|| Error::MalformedCredential("missing claim: id".into()))?;

    let expires_at = claims
        .exp
        .map(OffsetDateTime::from_unix_timestamp)
        .transpose()
        .map_err(|e| Error::MalformedCredential(format!("invalid claim exp: {e}")))?;

    Ok(SessionIdentity {
        user_id,
        username: claims.username,
        is_admin: claims.is_admin,
        email: claims.email,
        expires_at,
    })
}

fn payload_segment(token: &str) -> Result<&str, Error> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => Ok(payload),
        _ => Err(Error::MalformedCredential("invalid token format".into())),
    }
}

/// Builds an unsigned JWT-shaped token around `claims`.
#[cfg(test)]
pub(crate) fn mint(claims: &JsonValue) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
