//! # Cryptographic Primitives
//!
//! Everything the verification core hashes or signs goes through here.
//!
//! - **Ed25519** for registry signatures.
//! - **BLAKE2b-256** for Merkle trees, entry IDs and signature digests.
//! - **SHA-512** for deriving keys from the root seed.
//! - **BLAKE3** as an optional local Merkle hasher.
//!
//! Nothing here is hand-rolled. These are thin, typed wrappers around
//! ed25519-dalek and the RustCrypto/BLAKE3 hash crates.

pub mod hash;
pub mod keys;

pub use hash::{blake2b_hash, blake2b_hash_multi, blake3_hash_multi, sha512_multi, Blake2b256};
pub use keys::{KeyError, SkyKeypair, SkyPublicKey, SkySignature};
