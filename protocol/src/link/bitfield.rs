//! The 2-byte link bitfield.
//!
//! ```text
//!  bit 15                                            bit 0
//!  ┌──────────────┬───────────┬───┬──────────┬─────────┐
//!  │ block index  │ fetch sel │ 0 │ mode 1s  │ version │
//!  │ (remaining)  │ (3 bits)  │   │ (0..=7)  │ (2 bits)│
//!  └──────────────┴───────────┴───┴──────────┴─────────┘
//! ```
//!
//! The mode is a unary run of set bits. Higher modes trade offset precision
//! for larger fetch sizes, which is how a 16-bit field can address anything
//! from a 4 KiB blob to a whole 4 MiB sector.

use super::LinkError;
use crate::config::{BITFIELD_LENGTH, LINK_LENGTH, SECTOR_SIZE};

/// Smallest fetch-size and offset granularity (mode 0).
const BASE_INCREMENT: u64 = 4096;

/// Fetch sizes for mode `m > 0` start at `2^15 · 2^(m-1)`.
const BASE_FETCH_START: u64 = 1 << 15;

/// The largest valid mode. A run of eight set bits is not a link.
const MAX_MODE: u32 = 7;

/// Link format version, taken from the low two bits of the bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkVersion {
    /// Immutable link: the root is a sector Merkle root.
    V1,
    /// Resolver link: the root is a registry entry ID.
    V2,
}

impl LinkVersion {
    pub fn as_u8(self) -> u8 {
        match self {
            LinkVersion::V1 => 1,
            LinkVersion::V2 => 2,
        }
    }
}

/// Everything a bitfield says about where a link's data lives.
///
/// For V2 links `offset` and `fetch_size` are both zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitfield {
    pub version: LinkVersion,
    pub offset: u64,
    pub fetch_size: u64,
}

/// Parse the bitfield of a raw 34-byte link.
pub fn decode_bitfield(link: &[u8]) -> Result<Bitfield, LinkError> {
    if link.len() != LINK_LENGTH {
        return Err(LinkError::WrongLength(link.len()));
    }

    let raw = u16::from_le_bytes([link[0], link[1]]);
    let version_bits = raw & 0b11;
    let version = match version_bits + 1 {
        1 => LinkVersion::V1,
        2 => LinkVersion::V2,
        other => return Err(LinkError::UnknownVersion(other as u8)),
    };

    if version == LinkVersion::V2 {
        if raw != version_bits {
            return Err(LinkError::UnknownVersion(2));
        }
        return Ok(Bitfield {
            version,
            offset: 0,
            fetch_size: 0,
        });
    }

    let mut bits = raw >> 2;
    let mode = (bits & 0xff).trailing_ones();
    if mode > MAX_MODE {
        return Err(LinkError::InvalidMode);
    }
    // Drop the run of ones and the terminating zero.
    bits >>= mode + 1;

    let offset_increment = BASE_INCREMENT << mode;
    let (fetch_increment, fetch_start) = if mode == 0 {
        (BASE_INCREMENT, 0)
    } else {
        (BASE_INCREMENT << (mode - 1), BASE_FETCH_START << (mode - 1))
    };

    let fetch_size_bits = u64::from(bits & 0b111) + 1;
    let fetch_size = fetch_size_bits * fetch_increment + fetch_start;
    bits >>= 3;

    let offset = u64::from(bits) * offset_increment;
    if offset + fetch_size > SECTOR_SIZE {
        return Err(LinkError::RangeOutOfBounds { offset, fetch_size });
    }

    Ok(Bitfield {
        version,
        offset,
        fetch_size,
    })
}

/// Build the V1 bitfield for `data_size` bytes at offset 0, choosing the
/// smallest fetch size that covers the data.
pub fn encode_v1_bitfield(data_size: u64) -> Result<[u8; BITFIELD_LENGTH], LinkError> {
    if data_size > SECTOR_SIZE {
        return Err(LinkError::DataTooLarge(data_size));
    }

    let mut mode: u32 = 0;
    let mut bucket = BASE_FETCH_START;
    while bucket < data_size {
        mode += 1;
        bucket *= 2;
    }

    let download_number: u64 = if mode == 0 {
        data_size.saturating_sub(1) / BASE_INCREMENT
    } else {
        let step = 1u64 << (11 + mode);
        let target = data_size - (1u64 << (14 + mode));
        target.saturating_sub(1) / step
    };

    let raw = ((download_number << (mode + 1)) | ((1u64 << mode) - 1)) << 2;
    // Every operand above is bounded by the sector size check, so the value
    // always fits in 16 bits.
    Ok((raw as u16).to_le_bytes())
}
