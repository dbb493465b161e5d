//! # Progressive Fetch
//!
//! Portals are untrusted, so one bad answer is never the end of a request.
//! We ask portals one at a time, in the caller's order:
//!
//! ```text
//!   Trying(p) ──transport error / non-2xx──► record failure ─► Trying(next)
//!       │
//!       └─2xx─► verifier ──reject──► record failure ─► Trying(next)
//!                   │
//!                   └─accept─► Success(p, response, output, failures)
//!
//!   each failure keeps (portal, response if any, message)
//!
//!   no portals left ─► Exhausted(failures)
//! ```
//!
//! Every portal is asked at most once and never in parallel. The full
//! failure history is returned either way: "three portals said 404" and
//! "three portals are broken" look the same from the outside otherwise.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::transport::{PortalRequest, PortalResponse, PortalTransport};

/// Decides whether a 2xx response can be trusted.
///
/// `Err` means the portal misbehaved and the next one should be tried. A
/// verifier that finds a problem no other portal could fix should return
/// it inside `Output` instead.
#[async_trait]
pub trait ResponseVerifier: Send + Sync {
    type Output: Send;

    async fn verify(&self, response: &PortalResponse) -> Result<Self::Output, String>;
}

/// One portal that did not produce an acceptable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub portal: String,
    /// HTTP status, if the portal answered at all.
    pub status: Option<u16>,
    /// The rejected response. `None` when the request itself failed.
    pub response: Option<PortalResponse>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FetchSuccess<T> {
    pub portal: String,
    pub response: PortalResponse,
    pub output: T,
    /// Portals that failed before this one, in the order they were tried.
    pub failures: Vec<FetchFailure>,
    /// Portals that were never asked.
    pub remaining_portals: Vec<String>,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchExhausted {
    pub failures: Vec<FetchFailure>,
    pub logs: Vec<String>,
}

impl FetchExhausted {
    /// How many portals answered with `status`.
    pub fn count_status(&self, status: u16) -> usize {
        self.failures
            .iter()
            .filter(|failure| failure.status == Some(status))
            .count()
    }
}

pub type ProgressiveFetchResult<T> = Result<FetchSuccess<T>, FetchExhausted>;

/// Run `request` against `portals` until `verifier` accepts a response.
pub async fn progressive_fetch<T, V>(
    transport: &T,
    request: &PortalRequest,
    portals: &[String],
    verifier: &V,
) -> ProgressiveFetchResult<V::Output>
where
    T: PortalTransport + ?Sized,
    V: ResponseVerifier + ?Sized,
{
    let mut failures = Vec::new();
    let mut logs = Vec::new();

    for (index, portal) in portals.iter().enumerate() {
        debug!(portal = %portal, method = %request.method, endpoint = %request.endpoint, "trying portal");

        let response = match transport.fetch(portal, request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(portal = %portal, error = %err, "portal request failed");
                logs.push(format!("{}: request failed: {}", portal, err));
                failures.push(FetchFailure {
                    portal: portal.clone(),
                    status: None,
                    response: None,
                    message: err.to_string(),
                });
                continue;
            }
        };

        if !response.is_success() {
            warn!(portal = %portal, status = response.status, "portal returned an error status");
            let message = format!("unexpected status {}", response.status);
            logs.push(format!("{}: {}", portal, message));
            failures.push(FetchFailure {
                portal: portal.clone(),
                status: Some(response.status),
                response: Some(response),
                message,
            });
            continue;
        }

        match verifier.verify(&response).await {
            Ok(output) => {
                info!(portal = %portal, failed = failures.len(), "portal response verified");
                logs.push(format!("{}: response verified", portal));
                return Ok(FetchSuccess {
                    portal: portal.clone(),
                    response,
                    output,
                    failures,
                    remaining_portals: portals[index + 1..].to_vec(),
                    logs,
                });
            }
            Err(reason) => {
                warn!(portal = %portal, reason = %reason, "portal response rejected");
                logs.push(format!("{}: response rejected: {}", portal, reason));
                failures.push(FetchFailure {
                    portal: portal.clone(),
                    status: Some(response.status),
                    response: Some(response),
                    message: reason,
                });
            }
        }
    }

    info!(tried = portals.len(), "no portal produced a verified response");
    Err(FetchExhausted { failures, logs })
}
