// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Skytrust Protocol: Core Library
//!
//! A Skynet client that does not trust the portals it talks to. Portals
//! serve sectors and registry entries over HTTP; every byte they return is
//! checked against something the caller already holds (a link, a public
//! key) before it is handed back.
//!
//! ## Architecture
//!
//! - **config**: Wire-format constants and the portal list.
//! - **encoding**: Little-endian integers, hex, base64.
//! - **crypto**: BLAKE2b, SHA-512 and Ed25519 wrappers.
//! - **link**: 34-byte links and their bitfield.
//! - **merkle**: Sector Merkle roots and range proofs.
//! - **registry**: Key derivation, entry IDs, entry signatures.
//! - **resolver**: Following V2 links through signed registry hops.
//! - **skyfile**: Base sector layout and metadata, for uploads.
//! - **download**: Verifying a trustless download end to end.
//! - **portal**: Progressive fetch across portals, and the client.
//!
//! ## Trust Model
//!
//! 1. A portal can always refuse to answer. It can never make us accept
//!    data that does not hash or verify.
//! 2. A portal that lies is skipped and the next one is asked.
//! 3. Content that verifies but is internally broken is an error, not a
//!    retry. Every honest portal would serve the same broken bytes.

pub mod config;
pub mod crypto;
pub mod download;
pub mod encoding;
pub mod link;
pub mod merkle;
pub mod portal;
pub mod registry;
pub mod resolver;
pub mod skyfile;

pub use config::ClientConfig;
pub use download::{decode_and_verify, DownloadError, VerifiedDownload};
pub use link::Skylink;
pub use portal::{PortalError, RegistryLookup, SkynetClient};
