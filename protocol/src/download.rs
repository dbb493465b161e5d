//! # Download Verification
//!
//! A trustless base sector download returns `data ∥ merkle proof`, where
//! `data` is exactly the range the link's bitfield names. For a V2 link the
//! portal also sends the resolver chain it followed in a response header.
//!
//! Verification order matters for fault attribution:
//!
//! 1. resolve V2 links through the proof header
//! 2. split the body at the fetch size
//! 3. check the range proof against the link's Merkle root
//! 4. read the layout and cut the file out of the verified data
//!
//! Anything that goes wrong in steps 1–3 is the portal's fault and the
//! caller should try another one. A failure in step 4 means the content
//! itself is broken. It hashed correctly, so every honest portal will serve
//! the same broken bytes.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::LAYOUT_SIZE;
use crate::link::{LinkError, LinkVersion, Skylink};
use crate::merkle::{verify_range_proof, MerkleError};
use crate::resolver::{resolve_with_header, ResolverError};
use crate::skyfile::{SkyfileError, SkyfileLayout};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("requested link is invalid: {0}")]
    InvalidLink(LinkError),

    #[error("portal did not send a resolver proof for a V2 link")]
    MissingProof,

    #[error("portal sent an invalid resolver proof: {0}")]
    Resolver(ResolverError),

    #[error("response body is {got} bytes, link needs at least {expected}")]
    BodyTooShort { expected: u64, got: usize },

    /// The source is kept for callers that want it but is not part of the
    /// message, so a portal learns nothing from our error text.
    #[error("portal data does not match the link")]
    Merkle(#[source] MerkleError),

    #[error("skyfile layout is unreadable: {0}")]
    Layout(SkyfileError),

    #[error("skyfile claims {needed} bytes of content but only {available} were verified")]
    ContentInconsistent { needed: u64, available: u64 },
}

impl DownloadError {
    /// Whether a different portal might succeed where this one failed.
    pub fn is_portal_fault(&self) -> bool {
        match self {
            Self::MissingProof | Self::BodyTooShort { .. } | Self::Merkle(_) => true,
            Self::Resolver(ResolverError::UnsupportedEntryType { .. }) => false,
            Self::Resolver(_) => true,
            Self::InvalidLink(_) | Self::Layout(_) | Self::ContentInconsistent { .. } => false,
        }
    }
}

/// A download that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedDownload {
    /// The V1 link the data was verified against. Equal to the requested
    /// link unless that was a V2 link.
    pub resolved_link: Skylink,
    pub layout: SkyfileLayout,
    /// Raw metadata bytes, covered by the Merkle proof like everything else.
    pub metadata: Vec<u8>,
    pub file_data: Vec<u8>,
}

impl VerifiedDownload {
    /// The metadata as JSON, if it parses.
    pub fn metadata_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.metadata).ok()
    }

    /// `Filename` from the metadata, if present.
    pub fn filename(&self) -> Option<String> {
        self.metadata_json()?
            .get("Filename")?
            .as_str()
            .map(str::to_string)
    }
}

/// Verify a trustless base sector response for `requested_link`.
pub fn decode_and_verify(
    raw_body: &[u8],
    requested_link: &Skylink,
    proof_header: Option<&str>,
) -> Result<VerifiedDownload, DownloadError> {
    let mut link = *requested_link;
    let mut bitfield = link.bitfield().map_err(DownloadError::InvalidLink)?;

    if bitfield.version == LinkVersion::V2 {
        let header = proof_header.ok_or(DownloadError::MissingProof)?;
        link = resolve_with_header(&link, header).map_err(DownloadError::Resolver)?;
        bitfield = link
            .bitfield()
            .map_err(|source| DownloadError::Resolver(ResolverError::InvalidLink { hop: 0, source }))?;
        debug!(requested = %requested_link, resolved = %link, "resolved V2 link");
    }

    let fetch_size = bitfield.fetch_size;
    if (raw_body.len() as u64) < fetch_size {
        return Err(DownloadError::BodyTooShort {
            expected: fetch_size,
            got: raw_body.len(),
        });
    }
    // fetch_size <= SECTOR_SIZE, so it fits in a usize on every target we build for.
    let (data, proof) = raw_body.split_at(fetch_size as usize);

    verify_range_proof(&link.root(), bitfield.offset, fetch_size, data, proof)
        .map_err(DownloadError::Merkle)?;

    let layout = SkyfileLayout::decode(data).map_err(DownloadError::Layout)?;
    let available = data.len() as u64;
    let file_offset = layout.file_offset();
    let file_end = file_offset.and_then(|offset| offset.checked_add(layout.file_size));
    let (file_offset, file_end) = match (file_offset, file_end) {
        (Some(start), Some(end)) if end <= available => (start as usize, end as usize),
        _ => {
            return Err(DownloadError::ContentInconsistent {
                needed: file_end.unwrap_or(u64::MAX),
                available,
            })
        }
    };

    // layout ∥ fanout ∥ metadata ∥ file. The bounds check above covers all of it.
    let metadata_start = LAYOUT_SIZE + layout.fanout_size as usize;
    let metadata_end = metadata_start + layout.metadata_size as usize;
    Ok(VerifiedDownload {
        resolved_link: link,
        metadata: data[metadata_start..metadata_end].to_vec(),
        file_data: data[file_offset..file_end].to_vec(),
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SkyKeypair;
    use crate::merkle::build_range_proof;
    use crate::registry::resolver_link;
    use crate::resolver::{encode_resolver_proofs, ResolverProof};
    use crate::skyfile::{build_base_sector, SkyfileMetadata};

    /// A base sector for `file` and the body a portal would send for it.
    fn served(file: &[u8]) -> (Skylink, Vec<u8>) {
        let base = build_base_sector(file, &SkyfileMetadata::new("f.txt", file.len() as u64)).unwrap();
        let bf = base.link.bitfield().unwrap();
        let start = bf.offset as usize;
        let mut body = base.sector[start..start + bf.fetch_size as usize].to_vec();
        body.extend(build_range_proof(&base.sector, bf.offset, bf.fetch_size).unwrap());
        (base.link, body)
    }

    #[test]
    fn test_v1_download() {
        let (link, body) = served(b"some file contents");
        let verified = decode_and_verify(&body, &link, None).unwrap();
        assert_eq!(verified.file_data, b"some file contents");
        assert_eq!(verified.resolved_link, link);
        assert_eq!(verified.filename().as_deref(), Some("f.txt"));
        assert_eq!(verified.layout.file_size, 18);
    }

    #[test]
    fn test_v2_download_through_proof_header() {
        let (target, body) = served(b"behind a resolver");
        let kp = SkyKeypair::from_seed(&[9; 32]);
        let dk = [4u8; 32];
        let v2 = resolver_link(&kp.public_key(), &dk);
        let header = encode_resolver_proofs(&[ResolverProof::new_signed(&kp, &dk, &target, 3).unwrap()]);

        let verified = decode_and_verify(&body, &v2, Some(&header)).unwrap();
        assert_eq!(verified.resolved_link, target);
        assert_eq!(verified.file_data, b"behind a resolver");
    }

    #[test]
    fn test_v2_without_header_blames_portal() {
        let (_, body) = served(b"x");
        let kp = SkyKeypair::from_seed(&[9; 32]);
        let v2 = resolver_link(&kp.public_key(), &[4u8; 32]);
        let err = decode_and_verify(&body, &v2, None).unwrap_err();
        assert_eq!(err, DownloadError::MissingProof);
        assert!(err.is_portal_fault());
    }

    #[test]
    fn test_flipped_bit_blames_portal() {
        let (link, mut body) = served(b"tamper with me");
        body[LAYOUT_SIZE + 3] ^= 0x01;
        let err = decode_and_verify(&body, &link, None).unwrap_err();
        assert!(matches!(err, DownloadError::Merkle(MerkleError::RootMismatch)));
        assert!(err.is_portal_fault());
        assert_eq!(err.to_string(), "portal data does not match the link");
    }

    #[test]
    fn test_tampered_proof_blames_portal() {
        let (link, mut body) = served(b"tamper with the proof");
        let last = body.len() - 1;
        body[last] ^= 0x80;
        assert!(decode_and_verify(&body, &link, None).unwrap_err().is_portal_fault());
    }

    #[test]
    fn test_short_body_blames_portal() {
        let (link, body) = served(b"short");
        let err = decode_and_verify(&body[..100], &link, None).unwrap_err();
        assert!(matches!(err, DownloadError::BodyTooShort { .. }));
        assert!(err.is_portal_fault());
    }

    #[test]
    fn test_inconsistent_layout_is_not_portal_fault() {
        // A correctly hashed sector whose layout claims more file than exists.
        let mut sector = vec![0u8; crate::config::SECTOR_SIZE as usize];
        sector[..LAYOUT_SIZE].copy_from_slice(&SkyfileLayout::plaintext(10_000, 0).encode());
        let root = crate::merkle::merkle_root(&sector).unwrap();
        let link = Skylink::new_v1(4096, &root).unwrap();
        let mut body = sector[..4096].to_vec();
        body.extend(build_range_proof(&sector, 0, 4096).unwrap());

        let err = decode_and_verify(&body, &link, None).unwrap_err();
        assert!(matches!(err, DownloadError::ContentInconsistent { .. }));
        assert!(!err.is_portal_fault());
    }

    #[test]
    fn metadata_is_read_after_the_fanout() {
        let metadata = br#"{"Filename":"hello.txt","Length":5}"#;
        let mut layout = SkyfileLayout::plaintext(5, metadata.len() as u64);
        layout.fanout_size = 64;

        let mut sector = vec![0u8; crate::config::SECTOR_SIZE as usize];
        let mut at = 0;
        for part in [&layout.encode()[..], &[0xaa; 64][..], &metadata[..], &b"hello"[..]] {
            sector[at..at + part.len()].copy_from_slice(part);
            at += part.len();
        }
        let root = crate::merkle::merkle_root(&sector).unwrap();
        let link = Skylink::new_v1(at as u64, &root).unwrap();
        let bf = link.bitfield().unwrap();
        let mut body = sector[..bf.fetch_size as usize].to_vec();
        body.extend(build_range_proof(&sector, 0, bf.fetch_size).unwrap());

        let verified = decode_and_verify(&body, &link, None).unwrap();
        assert_eq!(verified.metadata, metadata);
        assert_eq!(verified.filename().as_deref(), Some("hello.txt"));
        assert_eq!(verified.file_data, b"hello");
        assert_eq!(verified.layout.fanout_size, 64);
    }

    #[test]
    fn test_invalid_requested_link() {
        let mut bytes = [0u8; 34];
        bytes[0] = 0xff;
        let err = decode_and_verify(&[], &Skylink::from_bytes(bytes), None).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidLink(_)));
        assert!(!err.is_portal_fault());
    }
}
