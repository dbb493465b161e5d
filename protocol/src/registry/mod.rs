//! # Registry
//!
//! The registry is the network's only mutable state: a map from
//! `(public key, data key)` to a small signed value with a revision number.
//! Portals store entries; they cannot forge them.
//!
//! - [`keys`] derives per-entry keypairs and data keys from a root seed.
//! - [`entry`] computes entry IDs and signs/verifies values.
//! - [`wire`] speaks the portal's JSON.
//!
//! Revision discipline (`previous + 1`, or 0 for a new entry) belongs to the
//! caller. This module only signs what it is asked to sign.

pub mod entry;
pub mod keys;
pub mod wire;

use thiserror::Error;

pub use entry::{entry_id, resolver_link, sign_entry, verify_entry, RegistryEntry};
pub use keys::{derive_entry_keys, EntryKeys, RootSeed};
pub use wire::{parse_read_response, read_endpoint, RegistryWriteRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("seed has the wrong length: expected 16 bytes, got {0}")]
    SeedLength(usize),

    #[error("keypair tag is {0} bytes, must be at most 255")]
    KeypairTagTooLong(usize),

    #[error("registry data is {0} bytes, must be at most 86")]
    DataTooLarge(usize),

    #[error("registry entry type {0} is not supported")]
    UnsupportedEntryType(u64),

    #[error("malformed registry response: {0}")]
    MalformedResponse(String),

    #[error("could not encode registry request: {0}")]
    Encoding(String),

    #[error("revision number is already at its maximum")]
    RevisionOverflow,
}
