//! # Skynet Client
//!
//! [`SkynetClient`] ties the verifiers to progressive fetch. Each public
//! operation builds a request, pairs it with a verifier that knows what a
//! trustworthy answer looks like, and walks the portal list.
//!
//! The client owns all of its state. Request IDs come from a counter on the
//! client and only exist to correlate log lines.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, info_span, Instrument};

use super::error::PortalError;
use super::progressive::{progressive_fetch, FetchFailure, FetchSuccess, ResponseVerifier};
use super::transport::{HttpTransport, PortalRequest, PortalResponse, PortalTransport};
use crate::config::{
    ClientConfig, HASH_SIZE, REGISTRY_ENDPOINT, RESTORE_ENDPOINT, SKYNET_PROOF_HEADER,
    TRUSTLESS_BASESECTOR_ENDPOINT,
};
use crate::crypto::{SkyKeypair, SkyPublicKey};
use crate::download::{decode_and_verify, DownloadError, VerifiedDownload};
use crate::link::Skylink;
use crate::registry::{
    parse_read_response, read_endpoint, sign_entry, RegistryEntry, RegistryError,
    RegistryWriteRequest,
};
use crate::skyfile::{build_base_sector, restore_request_body, SkyfileMetadata};

/// Outcome of a registry read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLookup {
    /// A correctly signed entry.
    Found(RegistryEntry),
    /// Enough portals agreed that the entry does not exist.
    NotFound,
}

impl RegistryLookup {
    pub fn entry(&self) -> Option<&RegistryEntry> {
        match self {
            Self::Found(entry) => Some(entry),
            Self::NotFound => None,
        }
    }
}

/// Where a verified answer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served<T> {
    pub portal: String,
    pub value: T,
    /// Portals that were tried and skipped before `portal` answered.
    pub failures: Vec<FetchFailure>,
}

pub struct SkynetClient<T: PortalTransport = HttpTransport> {
    transport: T,
    config: ClientConfig,
    next_request_id: AtomicU64,
}

impl SkynetClient<HttpTransport> {
    /// Client over HTTP with `config`'s timeout and user agent.
    pub fn new(config: ClientConfig) -> Result<Self, PortalError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: PortalTransport> SkynetClient<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn fetch<V: ResponseVerifier>(
        &self,
        request: PortalRequest,
        verifier: &V,
    ) -> Result<FetchSuccess<V::Output>, PortalError> {
        if self.config.portals.is_empty() {
            return Err(PortalError::NoPortals);
        }
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("portal_request", id, method = %request.method, endpoint = %request.endpoint);
        progressive_fetch(&self.transport, &request, &self.config.portals, verifier)
            .instrument(span)
            .await
            .map_err(PortalError::Exhausted)
    }

    // -----------------------------------------------------------------------
    // Downloads
    // -----------------------------------------------------------------------

    /// Download and verify the file behind `link`.
    pub async fn download(&self, link: &Skylink) -> Result<Served<VerifiedDownload>, PortalError> {
        link.bitfield().map_err(DownloadError::InvalidLink)?;

        let request = PortalRequest::get(format!("{}{}", TRUSTLESS_BASESECTOR_ENDPOINT, link.to_text()));
        let success = self.fetch(request, &DownloadVerifier { link: *link }).await?;
        let verified = success.output?;
        info!(portal = %success.portal, link = %link, bytes = verified.file_data.len(), "download verified");
        Ok(Served {
            portal: success.portal,
            value: verified,
            failures: success.failures,
        })
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Read the entry at `(public_key, data_key)`.
    ///
    /// A missing entry is only believed once `not_found_quorum` portals
    /// (clamped to the portal count) have answered 404. A single signed
    /// entry from any portal wins over any number of 404s.
    pub async fn read_entry(
        &self,
        public_key: &SkyPublicKey,
        data_key: &[u8; HASH_SIZE],
    ) -> Result<RegistryLookup, PortalError> {
        let verifier = RegistryReadVerifier {
            public_key: *public_key,
            data_key: *data_key,
        };
        match self.fetch(PortalRequest::get(read_endpoint(public_key, data_key)), &verifier).await {
            Ok(success) => Ok(RegistryLookup::Found(success.output?)),
            Err(PortalError::Exhausted(exhausted)) => {
                let not_found = exhausted.count_status(404);
                let quorum = self.config.effective_not_found_quorum();
                if not_found >= quorum {
                    debug!(not_found, quorum, "registry entry not found");
                    Ok(RegistryLookup::NotFound)
                } else {
                    Err(PortalError::Exhausted(exhausted))
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Sign `data` at `revision` and store it. Returns the signed entry.
    pub async fn write_entry(
        &self,
        keypair: &SkyKeypair,
        data_key: &[u8; HASH_SIZE],
        data: &[u8],
        revision: u64,
    ) -> Result<Served<RegistryEntry>, PortalError> {
        let entry = sign_entry(keypair, data_key, data, revision)?;
        let body = RegistryWriteRequest::new(&keypair.public_key(), data_key, &entry).to_json()?;
        let request = PortalRequest::post(REGISTRY_ENDPOINT, body, "application/json");

        let success = self.fetch(request, &RegistryWriteVerifier).await?;
        info!(portal = %success.portal, revision, "registry entry written");
        Ok(Served {
            portal: success.portal,
            value: entry,
            failures: success.failures,
        })
    }

    /// Write `data`, picking the next revision from what the network has.
    pub async fn update_entry(
        &self,
        keypair: &SkyKeypair,
        data_key: &[u8; HASH_SIZE],
        data: &[u8],
    ) -> Result<Served<RegistryEntry>, PortalError> {
        let revision = match self.read_entry(&keypair.public_key(), data_key).await? {
            RegistryLookup::Found(current) => current
                .revision
                .checked_add(1)
                .ok_or(RegistryError::RevisionOverflow)?,
            RegistryLookup::NotFound => 0,
        };
        self.write_entry(keypair, data_key, data, revision).await
    }

    // -----------------------------------------------------------------------
    // Uploads
    // -----------------------------------------------------------------------

    /// Upload a small file. The link is computed here; a portal that
    /// reports any other link is skipped.
    pub async fn upload(&self, file: &[u8], metadata: &SkyfileMetadata) -> Result<Served<Skylink>, PortalError> {
        let base = build_base_sector(file, metadata)?;
        let request = PortalRequest::post(
            RESTORE_ENDPOINT,
            restore_request_body(&base),
            "application/octet-stream",
        );

        let success = self.fetch(request, &UploadVerifier { expected: base.link }).await?;
        info!(portal = %success.portal, link = %base.link, "upload confirmed");
        Ok(Served {
            portal: success.portal,
            value: success.output,
            failures: success.failures,
        })
    }
}

// ---------------------------------------------------------------------------
// Verifiers
// ---------------------------------------------------------------------------

struct DownloadVerifier {
    link: Skylink,
}

#[async_trait]
impl ResponseVerifier for DownloadVerifier {
    type Output = Result<VerifiedDownload, DownloadError>;

    async fn verify(&self, response: &PortalResponse) -> Result<Self::Output, String> {
        // Trustless basesector downloads answer 200 and nothing else.
        if response.status != 200 {
            return Err(format!("expected status 200, got {}", response.status));
        }
        match decode_and_verify(&response.body, &self.link, response.header(SKYNET_PROOF_HEADER)) {
            Ok(verified) => Ok(Ok(verified)),
            Err(err) if err.is_portal_fault() => Err(err.to_string()),
            Err(err) => Ok(Err(err)),
        }
    }
}

struct RegistryReadVerifier {
    public_key: SkyPublicKey,
    data_key: [u8; HASH_SIZE],
}

#[async_trait]
impl ResponseVerifier for RegistryReadVerifier {
    type Output = Result<RegistryEntry, RegistryError>;

    async fn verify(&self, response: &PortalResponse) -> Result<Self::Output, String> {
        let entry = match parse_read_response(&response.body) {
            Ok(entry) => entry,
            Err(err @ RegistryError::UnsupportedEntryType(_)) => return Ok(Err(err)),
            Err(err) => return Err(err.to_string()),
        };
        if !entry.verify(&self.public_key, &self.data_key) {
            return Err("registry entry has an invalid signature".to_string());
        }
        Ok(Ok(entry))
    }
}

struct RegistryWriteVerifier;

#[async_trait]
impl ResponseVerifier for RegistryWriteVerifier {
    type Output = ();

    async fn verify(&self, response: &PortalResponse) -> Result<(), String> {
        if response.status == 204 {
            Ok(())
        } else {
            Err(format!("expected status 204, got {}", response.status))
        }
    }
}

struct UploadVerifier {
    expected: Skylink,
}

#[async_trait]
impl ResponseVerifier for UploadVerifier {
    type Output = Skylink;

    async fn verify(&self, response: &PortalResponse) -> Result<Skylink, String> {
        let body: Value =
            serde_json::from_slice(&response.body).map_err(|e| format!("invalid json: {}", e))?;
        let returned = body
            .get("skylink")
            .and_then(Value::as_str)
            .ok_or_else(|| "response has no skylink".to_string())?;
        if returned != self.expected.to_text() {
            return Err(format!("portal returned skylink {}, expected {}", returned, self.expected));
        }
        Ok(self.expected)
    }
}
