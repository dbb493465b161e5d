//! # Portal Access
//!
//! Portals are HTTP relays we do not trust. This module is the only place
//! that talks to them:
//!
//! - [`transport`] is the raw HTTP primitive, behind a trait.
//! - [`progressive`] walks a portal list until a response verifies.
//! - [`client`] wires downloads, registry reads and writes, and uploads to
//!   the right verifiers.

pub mod client;
pub mod progressive;
pub mod transport;

mod error;

pub use client::{RegistryLookup, Served, SkynetClient};
pub use error::PortalError;
pub use progressive::{
    progressive_fetch, FetchExhausted, FetchFailure, FetchSuccess, ProgressiveFetchResult,
    ResponseVerifier,
};
pub use transport::{
    portal_url, HttpTransport, Method, PortalRequest, PortalResponse, PortalTransport,
    TransportError,
};
