//! JSON shapes for talking to a portal's registry endpoint.
//!
//! Responses are parsed into a loose `serde_json::Value` first and checked
//! field by field before any typed value is built. A portal that sends the
//! wrong shape gets a precise error; one that sends a bad signature does not.

use serde::Serialize;
use serde_json::Value;

use super::{RegistryEntry, RegistryError};
use crate::config::{
    ED25519_ALGORITHM, HASH_SIZE, REGISTRY_ENDPOINT, REGISTRY_TYPE_WITHOUT_PUBKEY,
    REGISTRY_TYPE_WITH_PUBKEY,
};
use crate::crypto::{SkyPublicKey, SkySignature};
use crate::encoding::{bytes_to_hex, hex_to_bytes};

/// Query path for reading the entry at `(public_key, data_key)`.
pub fn read_endpoint(public_key: &SkyPublicKey, data_key: &[u8; HASH_SIZE]) -> String {
    format!(
        "{}?publickey={}%3A{}&datakey={}",
        REGISTRY_ENDPOINT,
        ED25519_ALGORITHM,
        public_key.to_hex(),
        bytes_to_hex(data_key)
    )
}

/// Check the `type` field shared by read responses and resolver proofs.
/// Missing means type 1.
pub(crate) fn check_entry_type(value: Option<&Value>) -> Result<(), RegistryError> {
    let Some(value) = value else {
        return Ok(());
    };
    match value.as_u64() {
        Some(REGISTRY_TYPE_WITHOUT_PUBKEY) => Ok(()),
        Some(REGISTRY_TYPE_WITH_PUBKEY) => Err(RegistryError::UnsupportedEntryType(
            REGISTRY_TYPE_WITH_PUBKEY,
        )),
        _ => Err(RegistryError::MalformedResponse(format!(
            "unrecognized entry type {}",
            value
        ))),
    }
}

fn str_field<'a>(obj: &'a Value, name: &str) -> Result<&'a str, RegistryError> {
    obj.get(name)
        .ok_or_else(|| RegistryError::MalformedResponse(format!("missing {} field", name)))?
        .as_str()
        .ok_or_else(|| RegistryError::MalformedResponse(format!("{} field is not a string", name)))
}

/// Parse a registry GET body. Does not check the signature.
pub fn parse_read_response(body: &[u8]) -> Result<RegistryEntry, RegistryError> {
    let obj: Value = serde_json::from_slice(body)
        .map_err(|e| RegistryError::MalformedResponse(format!("invalid json: {}", e)))?;
    if !obj.is_object() {
        return Err(RegistryError::MalformedResponse(
            "response is not an object".to_string(),
        ));
    }

    check_entry_type(obj.get("type"))?;

    let data = hex_to_bytes(str_field(&obj, "data")?)
        .map_err(|_| RegistryError::MalformedResponse("data is invalid hex".to_string()))?;
    let revision = obj
        .get("revision")
        .and_then(Value::as_u64)
        .ok_or_else(|| RegistryError::MalformedResponse("revision is not a u64".to_string()))?;
    let signature = hex_to_bytes(str_field(&obj, "signature")?)
        .ok()
        .and_then(|bytes| SkySignature::try_from_slice(&bytes).ok())
        .ok_or_else(|| RegistryError::MalformedResponse("signature is invalid".to_string()))?;

    Ok(RegistryEntry {
        data,
        revision,
        signature,
    })
}

#[derive(Debug, Clone, Serialize)]
struct WirePublicKey {
    algorithm: &'static str,
    key: Vec<u8>,
}

/// Body of a registry POST. Byte fields go over the wire as arrays of
/// numbers, the data key as hex.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryWriteRequest {
    publickey: WirePublicKey,
    datakey: String,
    revision: u64,
    data: Vec<u8>,
    signature: Vec<u8>,
}

impl RegistryWriteRequest {
    pub fn new(public_key: &SkyPublicKey, data_key: &[u8; HASH_SIZE], entry: &RegistryEntry) -> Self {
        Self {
            publickey: WirePublicKey {
                algorithm: ED25519_ALGORITHM,
                key: public_key.as_bytes().to_vec(),
            },
            datakey: bytes_to_hex(data_key),
            revision: entry.revision,
            data: entry.data.clone(),
            signature: entry.signature.as_bytes().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, RegistryError> {
        serde_json::to_vec(self).map_err(|e| RegistryError::Encoding(e.to_string()))
    }
}
