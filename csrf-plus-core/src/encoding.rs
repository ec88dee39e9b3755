//! URL-safe text encoding for tokens and stored secrets.
//!
//! Encodes without `=` padding; decoding accepts input with or without it.

use crate::error::CodecError;
use base64::Engine;
use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode raw bytes as unpadded URL-safe base64
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    TOKEN_ENGINE.encode(bytes)
}

/// Decode URL-safe base64, padded or not
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    TOKEN_ENGINE
        .decode(text)
        .map_err(|_| CodecError::InvalidEncoding)
}
