//! The HTTP primitive the portal layer is built on.
//!
//! Everything above this trait is transport-agnostic. Tests drive the
//! client with scripted in-memory transports; production code uses
//! [`HttpTransport`].

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid portal url {0}")]
    InvalidUrl(String),

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),

    #[error("could not build http client: {0}")]
    Client(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A request relative to a portal. The same request is replayed against
/// each portal in turn, so the body is a cheaply cloneable [`Bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub method: Method,
    /// Path and query, starting with `/`.
    pub endpoint: String,
    pub body: Option<Bytes>,
    pub content_type: Option<&'static str>,
}

impl PortalRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            body: None,
            content_type: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: impl Into<Bytes>, content_type: &'static str) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            body: Some(body.into()),
            content_type: Some(content_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalResponse {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl PortalResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait PortalTransport: Send + Sync {
    /// Send `request` to `portal`. Any HTTP status is a successful fetch;
    /// only failing to get a response at all is an error.
    async fn fetch(&self, portal: &str, request: &PortalRequest) -> Result<PortalResponse, TransportError>;
}

/// Base URL for a portal. Bare hostnames are assumed to speak HTTPS.
pub fn portal_url(portal: &str, endpoint: &str) -> Result<String, TransportError> {
    let portal = portal.trim().trim_end_matches('/');
    if portal.is_empty() || portal.contains(char::is_whitespace) {
        return Err(TransportError::InvalidUrl(portal.to_string()));
    }
    if portal.contains("://") {
        Ok(format!("{}{}", portal, endpoint))
    } else {
        Ok(format!("https://{}{}", portal, endpoint))
    }
}

/// [`PortalTransport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PortalTransport for HttpTransport {
    async fn fetch(&self, portal: &str, request: &PortalRequest) -> Result<PortalResponse, TransportError> {
        let url = portal_url(portal, &request.endpoint)?;
        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
        };
        if let Some(content_type) = request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(PortalResponse { status, headers, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidUrl(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
