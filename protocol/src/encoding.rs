//! # Binary & Text Encodings
//!
//! The fixed-width encodings every other module builds on. Sia encodes
//! integers as little-endian u64 and byte slices with a u64 length prefix;
//! portals speak hex for hashes and signatures and URL-safe base64 for links.
//!
//! Everything that parses text here treats its input as untrusted.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use thiserror::Error;

/// URL-safe decoder that doesn't care whether the `=` padding is present.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors from decoding untrusted encodings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("hex input has odd length")]
    OddHexLength,

    #[error("hex input has invalid character")]
    InvalidHex,

    #[error("provided string is not valid base64")]
    InvalidBase64,
}

/// Encode a u64 as 8 little-endian bytes.
pub fn encode_u64(n: u64) -> [u8; 8] {
    n.to_le_bytes()
}

/// Decode exactly 8 little-endian bytes into a u64.
pub fn decode_u64(bytes: &[u8]) -> Result<u64, EncodingError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| EncodingError::WrongLength {
        expected: 8,
        got: bytes.len(),
    })?;
    Ok(u64::from_le_bytes(arr))
}

/// Prefix `bytes` with their length as a little-endian u64.
pub fn encode_prefixed_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + bytes.len());
    out.extend_from_slice(&encode_u64(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out
}

/// Lowercase hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode untrusted hex. An empty string is an empty buffer, not an error.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, EncodingError> {
    if s.len() % 2 != 0 {
        return Err(EncodingError::OddHexLength);
    }
    hex::decode(s).map_err(|_| EncodingError::InvalidHex)
}

/// Decode untrusted hex into a fixed-size array.
pub fn hex_to_array<const N: usize>(s: &str) -> Result<[u8; N], EncodingError> {
    let bytes = hex_to_bytes(s)?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| EncodingError::WrongLength { expected: N, got })
}

/// URL-safe base64 without padding. This is the textual form of a link.
pub fn bytes_to_b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode untrusted base64. Both the URL-safe and the standard alphabet are
/// accepted, with or without padding.
pub fn b64_to_bytes(s: &str) -> Result<Vec<u8>, EncodingError> {
    let normalized: String = s
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_LENIENT
        .decode(normalized.as_bytes())
        .map_err(|_| EncodingError::InvalidBase64)
}
