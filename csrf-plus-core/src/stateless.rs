//! Self-contained signed tokens.
//!
//! Wire layout (after decoding): `payload ‖ 0x2E ‖ mac`, where `mac` is the
//! 32-byte HMAC-SHA256 of `payload` under the signing key. The payload is
//! normally a JSON object carrying `iat` and `exp` in epoch milliseconds.
//!
//! The MAC is located by length, not by searching for the separator: the
//! final 32 bytes are the MAC and the byte before them must be `0x2E`.

use crate::crypto::{MAC_LEN, constant_time_eq, hmac_sha256};
use crate::encoding;
use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Byte separating the payload from the MAC
pub const SEPARATOR: u8 = b'.';

/// Claims carried by tokens minted through [`create_stateless_token`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatelessClaims {
    /// Issued-at, epoch milliseconds
    pub iat: i64,

    /// Expiry, epoch milliseconds
    pub exp: i64,

    /// Additional application claims, preserved through sign/verify
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatelessClaims {
    /// Claims issued now and expiring `ttl_ms` later. A negative TTL yields
    /// claims that are already expired.
    pub fn new(ttl_ms: i64) -> Self {
        let iat = Utc::now().timestamp_millis();
        Self {
            iat,
            exp: iat.saturating_add(ttl_ms),
            extra: Map::new(),
        }
    }

    /// Attach an extra claim
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.exp
    }
}

/// Result of checking a signed token.
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureCheck {
    /// The MAC matched. `payload` is `None` when the signed bytes are not JSON.
    Valid { payload: Option<Value> },
    /// Undecodable, truncated, or signed with a different key.
    Invalid,
}

impl SignatureCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, SignatureCheck::Valid { .. })
    }

    /// The parsed payload, if the signature was valid and the payload is JSON
    pub fn payload(&self) -> Option<&Value> {
        match self {
            SignatureCheck::Valid { payload } => payload.as_ref(),
            SignatureCheck::Invalid => None,
        }
    }

    pub fn into_payload(self) -> Option<Value> {
        match self {
            SignatureCheck::Valid { payload } => payload,
            SignatureCheck::Invalid => None,
        }
    }
}

/// Sign an arbitrary payload string
pub fn sign_payload(payload: &str, key: &[u8]) -> Result<String> {
    let mac = hmac_sha256(key, payload.as_bytes())?;

    let mut buf = Vec::with_capacity(payload.len() + 1 + MAC_LEN);
    buf.extend_from_slice(payload.as_bytes());
    buf.push(SEPARATOR);
    buf.extend_from_slice(&mac);

    Ok(encoding::encode(buf))
}

/// Check a signed token. Never fails; every problem maps to
/// [`SignatureCheck::Invalid`].
pub fn verify_signed_token(token: &str, key: &[u8]) -> SignatureCheck {
    let Ok(decoded) = encoding::decode(token) else {
        return SignatureCheck::Invalid;
    };

    if decoded.len() < MAC_LEN + 1 {
        return SignatureCheck::Invalid;
    }

    let (body, mac) = decoded.split_at(decoded.len() - MAC_LEN);
    let Some((&separator, payload)) = body.split_last() else {
        return SignatureCheck::Invalid;
    };
    if separator != SEPARATOR {
        return SignatureCheck::Invalid;
    }

    let Ok(expected) = hmac_sha256(key, payload) else {
        return SignatureCheck::Invalid;
    };
    if !constant_time_eq(mac, &expected) {
        return SignatureCheck::Invalid;
    }

    SignatureCheck::Valid {
        payload: serde_json::from_slice(payload).ok(),
    }
}

/// Mint a token carrying `{"iat": now, "exp": now + ttl_ms}`
pub fn create_stateless_token(ttl_ms: i64, key: &[u8]) -> Result<String> {
    create_stateless_token_with_claims(&StatelessClaims::new(ttl_ms), key)
}

/// Mint a token carrying the given claims
pub fn create_stateless_token_with_claims(claims: &StatelessClaims, key: &[u8]) -> Result<String> {
    let payload = serde_json::to_string(claims)?;
    sign_payload(&payload, key)
}
