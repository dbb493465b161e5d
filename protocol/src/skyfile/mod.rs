//! # Skyfiles
//!
//! A small file lives entirely in one base sector:
//!
//! ```text
//!   [ layout (99) | fanout | metadata JSON | file bytes | zero padding ... ] 4 MiB
//! ```
//!
//! Sectors built here always have an empty fanout. Larger files downloaded
//! from the network carry one between the layout and the metadata.
//!
//! Uploading goes through the portal's restore endpoint, which takes a
//! pre-built sector. Because we build the sector ourselves we also know its
//! Merkle root, and therefore its link, before any portal sees it. A portal
//! that answers with a different link is lying.

pub mod layout;
pub mod metadata;

use thiserror::Error;

use crate::config::{LAYOUT_SIZE, SECTOR_SIZE};
use crate::encoding::{encode_prefixed_bytes, EncodingError};
use crate::link::{LinkError, Skylink};
use crate::merkle::{merkle_root, MerkleError};

pub use layout::SkyfileLayout;
pub use metadata::{validate_metadata, validate_path, SkyfileMetadata};

const BACKUP_HEADER_TITLE: &str = "Skyfile Backup\n";
const BACKUP_HEADER_VERSION: &str = "v1.5.5\n";

/// Size of the restore header: three u64-prefixed strings, the last being a
/// 46-character link.
pub const BACKUP_HEADER_SIZE: usize = 8 + 15 + 8 + 7 + 8 + 46;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkyfileError {
    #[error("skyfile layout needs 99 bytes, got {0}")]
    LayoutTooShort(usize),

    #[error("invalid skyfile path {0}")]
    InvalidPath(String),

    #[error("invalid skyfile metadata: {0}")]
    InvalidMetadata(String),

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("skyfile is {0} bytes, which does not fit in a single sector")]
    TooLarge(u64),

    #[error("could not encode skyfile: {0}")]
    Encoding(String),

    #[error(transparent)]
    Decode(#[from] EncodingError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

/// A fully built base sector together with its locally computed link.
#[derive(Clone)]
pub struct BaseSector {
    pub sector: Vec<u8>,
    /// Bytes actually used: layout, metadata and file.
    pub used_size: u64,
    pub link: Skylink,
}

impl std::fmt::Debug for BaseSector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseSector")
            .field("used_size", &self.used_size)
            .field("link", &self.link)
            .finish()
    }
}

/// Lay out `file` with its metadata in a zero-padded sector.
pub fn build_base_sector(file: &[u8], metadata: &SkyfileMetadata) -> Result<BaseSector, SkyfileError> {
    let metadata_bytes = metadata.to_json()?;
    let used_size = (LAYOUT_SIZE + metadata_bytes.len()) as u64 + file.len() as u64;
    if used_size > SECTOR_SIZE {
        return Err(SkyfileError::TooLarge(used_size));
    }

    let layout = SkyfileLayout::plaintext(file.len() as u64, metadata_bytes.len() as u64);
    let mut sector = Vec::with_capacity(SECTOR_SIZE as usize);
    sector.extend_from_slice(&layout.encode());
    sector.extend_from_slice(&metadata_bytes);
    sector.extend_from_slice(file);
    sector.resize(SECTOR_SIZE as usize, 0);

    let root = merkle_root(&sector)?;
    let link = Skylink::new_v1(used_size, &root)?;
    Ok(BaseSector {
        sector,
        used_size,
        link,
    })
}

/// The link a portal must return for this upload.
pub fn compute_skylink(file: &[u8], metadata: &SkyfileMetadata) -> Result<Skylink, SkyfileError> {
    Ok(build_base_sector(file, metadata)?.link)
}

/// Body for `POST /skynet/restore`: backup header followed by the sector.
pub fn restore_request_body(base: &BaseSector) -> Vec<u8> {
    let mut body = Vec::with_capacity(BACKUP_HEADER_SIZE + base.sector.len());
    body.extend_from_slice(&encode_prefixed_bytes(BACKUP_HEADER_TITLE.as_bytes()));
    body.extend_from_slice(&encode_prefixed_bytes(BACKUP_HEADER_VERSION.as_bytes()));
    body.extend_from_slice(&encode_prefixed_bytes(base.link.to_text().as_bytes()));
    body.extend_from_slice(&base.sector);
    body
}
