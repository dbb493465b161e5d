//! # Protocol Configuration & Constants
//!
//! Every magic number the verification core depends on lives here. Most of
//! them are fixed by the Skynet wire format and cannot be changed without
//! breaking compatibility with every portal on the network, so treat this
//! file as read-only unless you are tracking a protocol change upstream.
//!
//! The one piece of runtime configuration is [`ClientConfig`], which carries
//! the caller's portal list and fetch policy.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Sector & Link Geometry
// ---------------------------------------------------------------------------

/// Size of a sector in bytes (4 MiB). Every V1 link addresses a range
/// inside exactly one sector.
pub const SECTOR_SIZE: u64 = 1 << 22;

/// Length of a V1 or V2 link in raw bytes: 2 bytes of bitfield followed by a
/// 32-byte Merkle root or registry entry ID.
pub const LINK_LENGTH: usize = 34;

/// Length of the bitfield prefix of a link.
pub const BITFIELD_LENGTH: usize = 2;

/// Size of a Merkle leaf in bytes. Sector data is hashed in 64-byte chunks.
pub const LEAF_SIZE: u64 = 64;

/// Number of leaves in a full sector.
pub const LEAVES_PER_SECTOR: u64 = SECTOR_SIZE / LEAF_SIZE;

/// Output length of every hash used by the core (BLAKE2b-256, BLAKE3,
/// truncated SHA-512).
pub const HASH_SIZE: usize = 32;

/// Upper bound on the ideal subtree height search. Without a cap, a start
/// index of zero would keep doubling forever.
pub const MAX_SUBTREE_HEIGHT: u32 = 53;

// ---------------------------------------------------------------------------
// Skyfile Layout
// ---------------------------------------------------------------------------

/// The layout prefix at the start of every base sector is exactly 99 bytes.
pub const LAYOUT_SIZE: usize = 99;

/// Layout version written by this client.
pub const LAYOUT_VERSION: u8 = 1;

/// Cipher type for unencrypted skyfiles ("plaintext" in skyd terms).
pub const CIPHER_TYPE_PLAINTEXT: u8 = 1;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maximum amount of data a single registry entry can carry.
pub const MAX_REGISTRY_DATA_SIZE: usize = 86;

/// Specifier prepended to the public key when deriving an entry ID. Sia
/// specifiers are 16 bytes, zero padded.
pub const ED25519_SPECIFIER: [u8; 16] = *b"ed25519\0\0\0\0\0\0\0\0\0";

/// Algorithm name used in JSON payloads.
pub const ED25519_ALGORITHM: &str = "ed25519";

/// The only registry entry type this client knows how to verify.
pub const REGISTRY_TYPE_WITHOUT_PUBKEY: u64 = 1;

/// Registry entries that embed the public key in the data. Not supported.
pub const REGISTRY_TYPE_WITH_PUBKEY: u64 = 2;

/// Size of a root seed handed to the core by the identity layer.
pub const SEED_BYTES: usize = 16;

/// Keypair tags are length-prefixed with a single byte.
pub const MAX_KEYPAIR_TAG_LENGTH: usize = 255;

// ---------------------------------------------------------------------------
// Portal API
// ---------------------------------------------------------------------------

/// Endpoint for reading and writing registry entries.
pub const REGISTRY_ENDPOINT: &str = "/skynet/registry";

/// Endpoint prefix for trustless base sector downloads.
pub const TRUSTLESS_BASESECTOR_ENDPOINT: &str = "/skynet/trustless/basesector/";

/// Endpoint used to upload a locally built base sector.
pub const RESTORE_ENDPOINT: &str = "/skynet/restore";

/// Header carrying the resolver proof chain for V2 downloads.
pub const SKYNET_PROOF_HEADER: &str = "skynet-proof";

/// Portals tried when the caller doesn't supply its own list.
pub const DEFAULT_PORTALS: &[&str] = &["siasky.net", "eu-ger-12.siasky.net", "skynetfree.net"];

/// How many portals must independently answer 404 before a missing entry
/// is believed.
pub const DEFAULT_NOT_FOUND_QUORUM: usize = 2;

/// Default per-request timeout for the bundled HTTP transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent by the bundled HTTP transport.
pub const DEFAULT_USER_AGENT: &str = concat!("skytrust/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Caller-supplied settings for talking to portals.
///
/// Portal order matters: the first portal is always tried first, so put the
/// fastest and most reliable one at the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Portals in the order they should be tried.
    pub portals: Vec<String>,
    /// Minimum number of 404 responses needed to report "does not exist".
    /// Clamped to the number of portals actually configured.
    pub not_found_quorum: usize,
    /// Timeout applied by the HTTP transport to each individual request.
    pub request_timeout: Duration,
    /// User agent for the HTTP transport.
    pub user_agent: String,
}

impl ClientConfig {
    /// Build a config for an explicit portal list, everything else default.
    pub fn with_portals<I, S>(portals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            portals: portals.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The number of 404s that must be observed, given how many portals
    /// are configured. A single-portal setup can only ever see one.
    pub fn effective_not_found_quorum(&self) -> usize {
        self.not_found_quorum.clamp(1, self.portals.len().max(1))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            portals: DEFAULT_PORTALS.iter().map(|p| p.to_string()).collect(),
            not_found_quorum: DEFAULT_NOT_FOUND_QUORUM,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_geometry() {
        assert_eq!(SECTOR_SIZE, 4_194_304);
        assert_eq!(LEAVES_PER_SECTOR, 65_536);
        assert_eq!(LINK_LENGTH, BITFIELD_LENGTH + HASH_SIZE);
    }

    #[test]
    fn test_specifier_is_zero_padded() {
        assert_eq!(&ED25519_SPECIFIER[..7], b"ed25519");
        assert!(ED25519_SPECIFIER[7..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_default_config_has_portals() {
        let config = ClientConfig::default();
        assert_eq!(config.portals.len(), DEFAULT_PORTALS.len());
        assert_eq!(config.not_found_quorum, DEFAULT_NOT_FOUND_QUORUM);
    }

    #[test]
    fn quorum_is_clamped_to_portal_count() {
        let single = ClientConfig::with_portals(["one.example"]);
        assert_eq!(single.effective_not_found_quorum(), 1);

        let mut many = ClientConfig::with_portals(["a", "b", "c"]);
        many.not_found_quorum = 2;
        assert_eq!(many.effective_not_found_quorum(), 2);

        many.not_found_quorum = 0;
        assert_eq!(many.effective_not_found_quorum(), 1);
    }
}
