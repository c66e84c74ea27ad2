//! crates/padho_likho_core/src/token.rs
//!
//! Reads the claims out of a bearer token without trusting it.
//!
//! Tokens are JWT-shaped (`header.payload.signature`). Only the payload is
//! decoded; the signature is the backend's business. The role found here is
//! an optimistic guess that the backend's answer always overrides.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::Role;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is not made of three dot-separated parts")]
    Malformed,
    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),
    #[error("token payload is not a JSON object: {0}")]
    Json(String),
    #[error("token carries no role claim")]
    MissingRole,
    #[error("token claims unknown role '{0}'")]
    UnknownRole(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub subject: Option<String>,
    pub role: Role,
    /// Expiry in seconds since the epoch.
    pub expires_at: Option<i64>,
}

impl TokenClaims {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now.timestamp() >= exp)
    }
}

/// Outcome of the optimistic role lookup. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDecode {
    Decoded(Role),
    Undecodable,
}

impl RoleDecode {
    pub fn role(self) -> Option<Role> {
        match self {
            RoleDecode::Decoded(role) => Some(role),
            RoleDecode::Undecodable => None,
        }
    }
}

pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(TokenError::Malformed),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenError::Encoding(e.to_string()))?;
    let claims: Value =
        serde_json::from_slice(&bytes).map_err(|e| TokenError::Json(e.to_string()))?;
    if !claims.is_object() {
        return Err(TokenError::Json("payload is not an object".to_string()));
    }

    // Some issuers nest the user record inside the claims.
    let role_claim = claims
        .get("role")
        .or_else(|| claims.get("user").and_then(|user| user.get("role")))
        .and_then(Value::as_str)
        .ok_or(TokenError::MissingRole)?;
    let role = role_claim
        .parse::<Role>()
        .map_err(|_| TokenError::UnknownRole(role_claim.to_string()))?;

    let subject = claims
        .get("sub")
        .or_else(|| claims.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let expires_at = claims.get("exp").and_then(Value::as_i64);

    Ok(TokenClaims {
        subject,
        role,
        expires_at,
    })
}

/// Guesses the role from a token, treating expired tokens as undecodable.
pub fn decode_role(token: &str, now: DateTime<Utc>) -> RoleDecode {
    match decode_claims(token) {
        Ok(claims) if !claims.is_expired(now) => RoleDecode::Decoded(claims.role),
        Ok(_) => {
            tracing::debug!("Token is past its expiry");
            RoleDecode::Undecodable
        }
        Err(e) => {
            tracing::debug!("Could not decode token: {}", e);
            RoleDecode::Undecodable
        }
    }
}

#[cfg(test)]
pub(crate) fn make_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
