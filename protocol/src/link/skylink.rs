//! The [`Skylink`] value type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::bitfield::{decode_bitfield, encode_v1_bitfield, Bitfield, LinkVersion};
use super::LinkError;
use crate::config::{BITFIELD_LENGTH, HASH_SIZE, LINK_LENGTH};
use crate::encoding::{b64_to_bytes, bytes_to_b64url};

/// A raw 34-byte link.
///
/// Construction never validates the bitfield, because a proof chain may hand
/// us structurally broken bytes that we still need to report on. Call
/// [`Skylink::bitfield`] (or [`Skylink::is_valid`]) before trusting it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Skylink([u8; LINK_LENGTH]);

impl Skylink {
    pub fn from_bytes(bytes: [u8; LINK_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Copy a link out of an untrusted slice. Only the length is checked.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, LinkError> {
        let bytes: [u8; LINK_LENGTH] = slice
            .try_into()
            .map_err(|_| LinkError::WrongLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Build an immutable link for `data_size` bytes at the start of the
    /// sector with the given Merkle root.
    pub fn new_v1(data_size: u64, merkle_root: &[u8; HASH_SIZE]) -> Result<Self, LinkError> {
        let bitfield = encode_v1_bitfield(data_size)?;
        let mut bytes = [0u8; LINK_LENGTH];
        bytes[..BITFIELD_LENGTH].copy_from_slice(&bitfield);
        bytes[BITFIELD_LENGTH..].copy_from_slice(merkle_root);
        Ok(Self(bytes))
    }

    /// Build a resolver link pointing at a registry entry.
    pub fn resolver(entry_id: &[u8; HASH_SIZE]) -> Self {
        let mut bytes = [0u8; LINK_LENGTH];
        bytes[0] = 1;
        bytes[BITFIELD_LENGTH..].copy_from_slice(entry_id);
        Self(bytes)
    }

    /// Parse the textual (base64) form. Both alphabets are accepted.
    pub fn from_text(text: &str) -> Result<Self, LinkError> {
        let bytes = b64_to_bytes(text).map_err(|_| LinkError::InvalidText)?;
        Self::try_from_slice(&bytes)
    }

    /// URL-safe base64, no padding. Always 46 characters.
    pub fn to_text(&self) -> String {
        bytes_to_b64url(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; LINK_LENGTH] {
        &self.0
    }

    /// Merkle root (V1) or registry entry ID (V2).
    pub fn root(&self) -> [u8; HASH_SIZE] {
        let mut root = [0u8; HASH_SIZE];
        root.copy_from_slice(&self.0[BITFIELD_LENGTH..]);
        root
    }

    pub fn bitfield(&self) -> Result<Bitfield, LinkError> {
        decode_bitfield(&self.0)
    }

    pub fn version(&self) -> Result<LinkVersion, LinkError> {
        Ok(self.bitfield()?.version)
    }

    pub fn is_valid(&self) -> bool {
        self.bitfield().is_ok()
    }
}

impl fmt::Display for Skylink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl fmt::Debug for Skylink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Skylink({})", self.to_text())
    }
}

impl FromStr for Skylink {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

// Links travel as text in every JSON payload portals deal with.
impl Serialize for Skylink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Skylink {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_text(&text).map_err(serde::de::Error::custom)
    }
}
