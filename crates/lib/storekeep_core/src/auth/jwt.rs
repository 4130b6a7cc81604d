//! Signed token issuance and verification (HS256).
//!
//! A [`TokenCodec`] is built once at startup from the configured secret and
//! shared by clone. Every token carries a `typ` claim so an access token can
//! never be replayed as a refresh token and vice versa.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthError;
use crate::models::auth::{AccessClaims, RefreshClaims, Verified};

/// The only accepted signing algorithm.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for TokenSettings {
    /// 15 minute access tokens, 7 day refresh tokens.
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

/// Wire payload: caller claims plus the registered claims we manage.
#[derive(Debug, Serialize, Deserialize)]
struct Payload<C> {
    #[serde(flatten)]
    claims: C,
    typ: TokenKind,
    iat: i64,
    exp: i64,
}

/// Encodes and decodes signed tokens with a single process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from the signing secret. An empty secret is a
    /// configuration error and must stop startup.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::Config("signing secret is empty".into()));
        }
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign an access token for `claims`, expiring `ttl` from now.
    pub fn issue_access_token(&self, claims: &AccessClaims, ttl: Duration) -> Result<String, AuthError> {
        self.issue(claims, TokenKind::Access, ttl)
    }

    /// Sign a refresh token for `user_id`, expiring `ttl` from now.
    pub fn issue_refresh_token(&self, user_id: i64, ttl: Duration) -> Result<String, AuthError> {
        self.issue(&RefreshClaims { sub: user_id }, TokenKind::Refresh, ttl)
    }

    /// Verify an access token: algorithm, signature, expiry and claim shape.
    pub fn validate_access(&self, token: &str) -> Result<Verified<AccessClaims>, AuthError> {
        self.validate(token, TokenKind::Access)
    }

    /// Verify a refresh token: algorithm, signature, expiry and claim shape.
    pub fn validate_refresh(&self, token: &str) -> Result<Verified<RefreshClaims>, AuthError> {
        self.validate(token, TokenKind::Refresh)
    }

    fn issue<C: Serialize>(&self, claims: &C, typ: TokenKind, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Internal(format!("token lifetime out of range: {ttl}")))?;
        let payload = Payload {
            claims,
            typ,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::new(ALGORITHM), &payload, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    fn validate<C: DeserializeOwned>(&self, token: &str, expected: TokenKind) -> Result<Verified<C>, AuthError> {
        check_header(token)?;

        let data = decode::<Payload<C>>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(kind = ?e.kind(), "token rejected");
            classify(e.kind())
        })?;
        let payload = data.claims;

        if payload.typ != expected {
            debug!(expected = ?expected, found = ?payload.typ, "token kind mismatch");
            return Err(AuthError::InvalidToken);
        }

        Ok(Verified {
            claims: payload.claims,
            issued_at: timestamp(payload.iat)?,
            expires_at: timestamp(payload.exp)?,
        })
    }
}

/// Reject anything not signed with [`ALGORITHM`] before trusting the body.
///
/// Done by hand because a header naming an algorithm the library does not
/// model (e.g. `none`) fails header parsing, which would otherwise surface
/// as a malformed token rather than an untrusted one.
fn check_header(token: &str) -> Result<(), AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::MalformedToken);
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedToken)?;
    let header: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|_| AuthError::MalformedToken)?;

    match header.get("alg").and_then(|alg| alg.as_str()) {
        Some("HS256") => Ok(()),
        Some(other) => {
            debug!(alg = other, "token signed with unexpected algorithm");
            Err(AuthError::InvalidToken)
        }
        None => Err(AuthError::MalformedToken),
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidKeyFormat => AuthError::InvalidToken,
        _ => AuthError::MalformedToken,
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, AuthError> {
    DateTime::from_timestamp(secs, 0).ok_or(AuthError::MalformedToken)
}
