//! Entry IDs and registry signatures.

use super::RegistryError;
use crate::config::{ED25519_SPECIFIER, HASH_SIZE, MAX_REGISTRY_DATA_SIZE};
use crate::crypto::{blake2b_hash_multi, SkyKeypair, SkyPublicKey, SkySignature};
use crate::encoding::{encode_prefixed_bytes, encode_u64};
use crate::link::Skylink;

/// A signed registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub data: Vec<u8>,
    pub revision: u64,
    pub signature: SkySignature,
}

impl RegistryEntry {
    /// Check the signature against the owner's key and the entry's data key.
    pub fn verify(&self, public_key: &SkyPublicKey, data_key: &[u8; HASH_SIZE]) -> bool {
        verify_entry(public_key, data_key, &self.data, self.revision, &self.signature)
    }
}

/// `BLAKE2b("ed25519"·pad16 ∥ u64LE(32) ∥ pubkey ∥ dataKey)`
pub fn entry_id(public_key: &SkyPublicKey, data_key: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
    blake2b_hash_multi(&[
        &ED25519_SPECIFIER,
        &encode_u64(32),
        public_key.as_bytes(),
        data_key,
    ])
}

/// The V2 link that resolves through this entry.
pub fn resolver_link(public_key: &SkyPublicKey, data_key: &[u8; HASH_SIZE]) -> Skylink {
    Skylink::resolver(&entry_id(public_key, data_key))
}

fn signature_hash(data_key: &[u8; HASH_SIZE], data: &[u8], revision: u64) -> [u8; HASH_SIZE] {
    blake2b_hash_multi(&[data_key, &encode_prefixed_bytes(data), &encode_u64(revision)])
}

/// Sign a registry value. Picking the revision is the caller's job.
pub fn sign_entry(
    keypair: &SkyKeypair,
    data_key: &[u8; HASH_SIZE],
    data: &[u8],
    revision: u64,
) -> Result<RegistryEntry, RegistryError> {
    if data.len() > MAX_REGISTRY_DATA_SIZE {
        return Err(RegistryError::DataTooLarge(data.len()));
    }
    let signature = keypair.sign(&signature_hash(data_key, data, revision));
    Ok(RegistryEntry {
        data: data.to_vec(),
        revision,
        signature,
    })
}

/// Verify a registry signature. A plain boolean, on purpose.
pub fn verify_entry(
    public_key: &SkyPublicKey,
    data_key: &[u8; HASH_SIZE],
    data: &[u8],
    revision: u64,
    signature: &SkySignature,
) -> bool {
    public_key.verify(&signature_hash(data_key, data, revision), signature)
}
