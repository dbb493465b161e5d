//! Tagged key derivation from the user's root seed.
//!
//! One seed yields an unbounded number of unlinkable registry identities:
//!
//! ```text
//!   keypair seed = SHA-512(seed ∥ keypairTag)[..32]
//!   data key     = SHA-512(seed ∥ u8(len(keypairTag)) ∥ keypairTag ∥ dataKeyTag)[..32]
//! ```
//!
//! The keypair tag feeds both derivations, so two entries under different
//! keypair tags never share a public key *or* a data key. The length byte
//! keeps `("12", "3456")` and `("123", "456")` from colliding.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

use super::RegistryError;
use crate::config::{HASH_SIZE, MAX_KEYPAIR_TAG_LENGTH, SEED_BYTES};
use crate::crypto::{sha512_multi, SkyKeypair, SkyPublicKey};

/// A root seed, as handed over by the identity layer.
#[derive(Clone, PartialEq, Eq)]
pub struct RootSeed([u8; SEED_BYTES]);

impl RootSeed {
    pub fn from_bytes(bytes: [u8; SEED_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(slice: &[u8]) -> Result<Self, RegistryError> {
        let bytes: [u8; SEED_BYTES] = slice
            .try_into()
            .map_err(|_| RegistryError::SeedLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Fresh seed from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SEED_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_BYTES] {
        &self.0
    }
}

impl fmt::Debug for RootSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootSeed(<redacted>)")
    }
}

/// A registry keypair plus the data key selecting one entry under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryKeys {
    pub keypair: SkyKeypair,
    pub data_key: [u8; HASH_SIZE],
}

impl EntryKeys {
    pub fn public_key(&self) -> SkyPublicKey {
        self.keypair.public_key()
    }
}

/// Derive the keypair and data key for `(keypair_tag, data_key_tag)`.
pub fn derive_entry_keys(
    seed: &[u8],
    keypair_tag: &str,
    data_key_tag: &str,
) -> Result<EntryKeys, RegistryError> {
    if seed.len() != SEED_BYTES {
        return Err(RegistryError::SeedLength(seed.len()));
    }
    let keypair_tag = keypair_tag.as_bytes();
    if keypair_tag.len() > MAX_KEYPAIR_TAG_LENGTH {
        return Err(RegistryError::KeypairTagTooLong(keypair_tag.len()));
    }

    let keypair_entropy = sha512_multi(&[seed, keypair_tag]);
    let mut keypair_seed = [0u8; 32];
    keypair_seed.copy_from_slice(&keypair_entropy[..32]);

    let tag_len = [keypair_tag.len() as u8];
    let data_key_entropy = sha512_multi(&[seed, &tag_len, keypair_tag, data_key_tag.as_bytes()]);
    let mut data_key = [0u8; HASH_SIZE];
    data_key.copy_from_slice(&data_key_entropy[..HASH_SIZE]);

    Ok(EntryKeys {
        keypair: SkyKeypair::from_seed(&keypair_seed),
        data_key,
    })
}
