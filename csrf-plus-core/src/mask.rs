//! Masked tokens.
//!
//! A masked token is `encode(pad ‖ (pad XOR secret))` with a fresh random pad
//! per call, so the wire value changes on every render while the secret it
//! carries stays the same. Verification always unmasks and compares the
//! recovered secret; two masked tokens are never compared with each other.

use crate::crypto::random_bytes;
use crate::encoding;
use crate::error::CodecError;

/// Mask `secret` with a fresh pad of the same length
pub fn mask_token(secret: &[u8]) -> String {
    let pad = random_bytes(secret.len());

    let mut buf = Vec::with_capacity(secret.len() * 2);
    buf.extend_from_slice(&pad);
    buf.extend(pad.iter().zip(secret).map(|(p, s)| p ^ s));

    encoding::encode(buf)
}

/// Recover the secret carried by a masked token.
///
/// # Errors
///
/// [`CodecError::MalformedToken`] if the text does not decode, or the decoded
/// buffer is empty or cannot be split into two equal halves.
pub fn unmask_token(token: &str) -> Result<Vec<u8>, CodecError> {
    let decoded = encoding::decode(token).map_err(|_| CodecError::MalformedToken)?;

    if decoded.is_empty() || decoded.len() % 2 != 0 {
        return Err(CodecError::MalformedToken);
    }

    let (pad, masked) = decoded.split_at(decoded.len() / 2);
    Ok(pad.iter().zip(masked).map(|(p, m)| p ^ m).collect())
}
