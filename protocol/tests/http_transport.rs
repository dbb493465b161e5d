//! `HttpTransport` and `SkynetClient` against a local mock portal.

use std::net::TcpListener;
use std::time::Duration;

use httpmock::Method::{GET, POST};
use httpmock::MockServer;

use skytrust_protocol::config::ClientConfig;
use skytrust_protocol::crypto::SkyKeypair;
use skytrust_protocol::encoding::bytes_to_hex;
use skytrust_protocol::portal::{
    HttpTransport, PortalRequest, PortalTransport, TransportError,
};
use skytrust_protocol::registry::read_endpoint;
use skytrust_protocol::{RegistryLookup, SkynetClient};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn transport() -> HttpTransport {
    HttpTransport::new(&ClientConfig::default()).unwrap()
}

#[tokio::test]
async fn get_returns_status_headers_and_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/skynet/trustless/basesector/abc");
            then.status(200)
                .header("Skynet-Proof", "[]")
                .body("sector bytes");
        })
        .await;

    let response = transport()
        .fetch(&server.base_url(), &PortalRequest::get("/skynet/trustless/basesector/abc"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("skynet-proof"), Some("[]"));
    assert_eq!(&response.body[..], b"sector bytes");
}

#[tokio::test]
async fn error_statuses_are_responses_not_errors() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/skynet/registry");
            then.status(404);
        })
        .await;

    let response = transport()
        .fetch(&server.base_url(), &PortalRequest::get("/skynet/registry?datakey=00"))
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
}

#[tokio::test]
async fn post_sends_body_and_content_type() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/skynet/restore")
                .header("content-type", "application/octet-stream")
                .body("raw sector");
            then.status(200).body(r#"{"skylink":"x"}"#);
        })
        .await;

    let request = PortalRequest::post("/skynet/restore", &b"raw sector"[..], "application/octet-stream");
    let response = transport().fetch(&server.base_url(), &request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn unreachable_portal_is_a_transport_error() {
    let config = ClientConfig {
        request_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    };
    let err = HttpTransport::new(&config)
        .unwrap()
        .fetch("http://127.0.0.1:1", &PortalRequest::get("/"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Request(_) | TransportError::Timeout));
}

#[tokio::test]
async fn client_reads_and_writes_registry_over_http() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }
    let keypair = SkyKeypair::from_seed(&[5; 32]);
    let data_key = [6u8; 32];
    let server = MockServer::start_async().await;

    let write = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/skynet/registry")
                .header("content-type", "application/json")
                .body_contains(&format!(r#""datakey":"{}""#, bytes_to_hex(&data_key)));
            then.status(204);
        })
        .await;
    let read = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/skynet/registry")
                .query_param("datakey", bytes_to_hex(&data_key));
            then.status(404);
        })
        .await;

    let client = SkynetClient::new(ClientConfig::with_portals([server.base_url()])).unwrap();

    let lookup = client.read_entry(&keypair.public_key(), &data_key).await.unwrap();
    assert_eq!(lookup, RegistryLookup::NotFound);
    read.assert_async().await;

    let written = client.update_entry(&keypair, &data_key, b"hello").await.unwrap();
    assert_eq!(written.value.revision, 0);
    assert_eq!(written.portal, server.base_url());
    write.assert_async().await;

    assert!(read_endpoint(&keypair.public_key(), &data_key).contains("publickey=ed25519%3A"));
}
