//! # Resolver Chain Verification
//!
//! A V2 link names a registry entry, and that entry's data is another link.
//! When a portal serves a V2 link it attaches the chain of registry entries
//! it followed (the `skynet-proof` header). We re-walk that chain ourselves:
//! every hop has to hash to the link that pointed at it and carry a valid
//! owner signature, and the chain must end on an immutable V1 link.
//!
//! Errors carry the index of the hop that failed, so a tampered entry at
//! hop *k* is reported at hop *k*.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::{
    ED25519_ALGORITHM, HASH_SIZE, REGISTRY_TYPE_WITHOUT_PUBKEY, REGISTRY_TYPE_WITH_PUBKEY,
};
use crate::crypto::{SkyKeypair, SkyPublicKey, SkySignature};
use crate::encoding::{b64_to_bytes, bytes_to_b64url, bytes_to_hex, hex_to_array, hex_to_bytes};
use crate::link::{LinkError, LinkVersion, Skylink};
use crate::registry::{entry_id, sign_entry, verify_entry, RegistryError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("resolver proof is not valid json: {0}")]
    InvalidJson(String),

    #[error("resolver proof is not an array")]
    NotAnArray,

    #[error("resolver proof array is empty")]
    EmptyChain,

    #[error("resolver proof {hop} is malformed: {reason}")]
    MalformedProof { hop: usize, reason: String },

    #[error("resolver proof {hop} has unsupported entry type {entry_type}")]
    UnsupportedEntryType { hop: usize, entry_type: u64 },

    #[error("resolver proof {hop} does not contain a valid link: {source}")]
    InvalidLink { hop: usize, source: LinkError },

    #[error("resolver proof {hop} does not match the link it resolves")]
    EntryIdMismatch { hop: usize },

    #[error("resolver proof {hop} has an invalid signature")]
    BadSignature { hop: usize },

    #[error("resolver chain does not end on an immutable link")]
    FinalLinkNotImmutable,
}

/// One validated hop of a resolver chain.
///
/// Only the shape has been checked at this point. The signature and the
/// link to the previous hop are checked by [`verify_resolver_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverProof {
    pub data: Vec<u8>,
    pub data_key: [u8; HASH_SIZE],
    pub public_key: SkyPublicKey,
    pub signature: SkySignature,
    pub revision: u64,
}

impl ResolverProof {
    /// Build a signed hop pointing at `target`. Mostly useful for portals
    /// and tests; clients only ever verify.
    pub fn new_signed(
        keypair: &SkyKeypair,
        data_key: &[u8; HASH_SIZE],
        target: &Skylink,
        revision: u64,
    ) -> Result<Self, RegistryError> {
        let entry = sign_entry(keypair, data_key, target.as_bytes(), revision)?;
        Ok(Self {
            data: entry.data,
            data_key: *data_key,
            public_key: keypair.public_key(),
            signature: entry.signature,
            revision,
        })
    }

    /// Validate a single untrusted JSON object.
    pub fn from_value(value: &Value, hop: usize) -> Result<Self, ResolverError> {
        let malformed = |reason: &str| ResolverError::MalformedProof {
            hop,
            reason: reason.to_string(),
        };

        if !value.is_object() {
            return Err(malformed("proof is not an object"));
        }

        let entry_type = value
            .get("type")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed("type must be an unsigned integer"))?;
        match entry_type {
            REGISTRY_TYPE_WITHOUT_PUBKEY => {}
            REGISTRY_TYPE_WITH_PUBKEY => {
                return Err(ResolverError::UnsupportedEntryType { hop, entry_type })
            }
            _ => return Err(malformed(&format!("unrecognized entry type {}", entry_type))),
        }

        let revision = value
            .get("revision")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed("revision must be an unsigned integer"))?;

        let public_key = value
            .get("publickey")
            .filter(|pk| pk.is_object())
            .ok_or_else(|| malformed("publickey must be an object"))?;
        let algorithm = public_key
            .get("algorithm")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("publickey.algorithm must be a string"))?;
        if algorithm != ED25519_ALGORITHM {
            return Err(malformed(&format!(
                "unrecognized public key algorithm {}",
                algorithm
            )));
        }
        let key_text = public_key
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("publickey.key must be a string"))?;
        let public_key = b64_to_bytes(key_text)
            .ok()
            .and_then(|bytes| SkyPublicKey::try_from_slice(&bytes).ok())
            .ok_or_else(|| malformed("publickey.key is not a valid ed25519 key"))?;

        let data = hex_to_bytes(string_field(value, "data", hop)?)
            .map_err(|_| malformed("data is invalid hex"))?;
        let data_key = hex_to_array::<HASH_SIZE>(string_field(value, "datakey", hop)?)
            .map_err(|_| malformed("datakey is not a 32-byte hex string"))?;
        let signature = hex_to_bytes(string_field(value, "signature", hop)?)
            .ok()
            .and_then(|bytes| SkySignature::try_from_slice(&bytes).ok())
            .ok_or_else(|| malformed("signature is not a 64-byte hex string"))?;

        Ok(Self {
            data,
            data_key,
            public_key,
            signature,
            revision,
        })
    }

    /// The wire form, as a portal would send it.
    pub fn to_value(&self) -> Value {
        json!({
            "data": bytes_to_hex(&self.data),
            "datakey": bytes_to_hex(&self.data_key),
            "publickey": {
                "algorithm": ED25519_ALGORITHM,
                "key": bytes_to_b64url(self.public_key.as_bytes()),
            },
            "signature": self.signature.to_hex(),
            "type": REGISTRY_TYPE_WITHOUT_PUBKEY,
            "revision": self.revision,
        })
    }
}

fn string_field<'a>(value: &'a Value, name: &str, hop: usize) -> Result<&'a str, ResolverError> {
    value
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ResolverError::MalformedProof {
            hop,
            reason: format!("{} must be a string", name),
        })
}

/// Parse the textual proof header into typed hops.
pub fn parse_resolver_proofs(json: &str) -> Result<Vec<ResolverProof>, ResolverError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ResolverError::InvalidJson(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ResolverError::NotAnArray);
    };
    if items.is_empty() {
        return Err(ResolverError::EmptyChain);
    }
    items
        .iter()
        .enumerate()
        .map(|(hop, item)| ResolverProof::from_value(item, hop))
        .collect()
}

/// Serialize a chain into header form.
pub fn encode_resolver_proofs(proofs: &[ResolverProof]) -> String {
    Value::Array(proofs.iter().map(ResolverProof::to_value).collect()).to_string()
}

/// Walk `proofs` starting at `link` and return the immutable link at the end.
pub fn verify_resolver_chain(
    link: &Skylink,
    proofs: &[ResolverProof],
) -> Result<Skylink, ResolverError> {
    if proofs.is_empty() {
        return Err(ResolverError::EmptyChain);
    }

    let mut current = *link;
    for (hop, proof) in proofs.iter().enumerate() {
        let next = Skylink::try_from_slice(&proof.data)
            .and_then(|next| next.bitfield().map(|_| next))
            .map_err(|source| ResolverError::InvalidLink { hop, source })?;

        if entry_id(&proof.public_key, &proof.data_key) != current.root() {
            return Err(ResolverError::EntryIdMismatch { hop });
        }
        if !verify_entry(
            &proof.public_key,
            &proof.data_key,
            &proof.data,
            proof.revision,
            &proof.signature,
        ) {
            return Err(ResolverError::BadSignature { hop });
        }

        debug!(hop, from = %current, to = %next, "resolver hop verified");
        current = next;
    }

    match current.version() {
        Ok(LinkVersion::V1) => Ok(current),
        _ => Err(ResolverError::FinalLinkNotImmutable),
    }
}

/// Parse and verify a proof header in one step.
pub fn resolve_with_header(link: &Skylink, header: &str) -> Result<Skylink, ResolverError> {
    let proofs = parse_resolver_proofs(header)?;
    verify_resolver_chain(link, &proofs)
}
