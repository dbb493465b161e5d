//! # Links
//!
//! A link is 34 bytes: a 2-byte bitfield that says what kind of link it is
//! and which slice of a sector it covers, followed by a 32-byte root. For an
//! immutable (V1) link the root is the sector's Merkle root. For a resolver
//! (V2) link it is the ID of a registry entry whose data is another link.
//!
//! Nothing about a link is trusted until the bitfield has been decoded, and
//! a link coming back from a portal is never trusted at all: we always
//! recompute it locally.

pub mod bitfield;
pub mod skylink;

use thiserror::Error;

pub use bitfield::{decode_bitfield, encode_v1_bitfield, Bitfield, LinkVersion};
pub use skylink::Skylink;

/// Errors from parsing or building links.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("link has incorrect length: expected 34 bytes, got {0}")]
    WrongLength(usize),

    #[error("link has unrecognized version {0}")]
    UnknownVersion(u8),

    #[error("link has an invalid v1 bitfield mode")]
    InvalidMode,

    #[error("link range is out of bounds: offset {offset} + fetch size {fetch_size} exceeds sector")]
    RangeOutOfBounds { offset: u64, fetch_size: u64 },

    #[error("data size {0} does not fit in a sector")]
    DataTooLarge(u64),

    #[error("link text is not valid base64")]
    InvalidText,
}
