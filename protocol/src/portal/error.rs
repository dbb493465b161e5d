//! Errors surfaced by [`SkynetClient`](super::SkynetClient).

use thiserror::Error;

use super::progressive::FetchExhausted;
use super::transport::TransportError;
use crate::download::DownloadError;
use crate::registry::RegistryError;
use crate::skyfile::SkyfileError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    #[error("no portals configured")]
    NoPortals,

    /// Every portal was tried and none produced a verified answer. The
    /// failure list says why, portal by portal.
    #[error("all {} portals failed", .0.failures.len())]
    Exhausted(FetchExhausted),

    /// The content verified but is unusable. No other portal can fix this.
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Skyfile(#[from] SkyfileError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
