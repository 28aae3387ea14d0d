//! End-to-end tests for the store node HTTP surface

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use mesh_api::dto::{CredentialRequest, ObjectListResponse, PutResponse};
use mesh_api::routes::SECRET_HEADER;
use mesh_api::{create_router, AppState};
use mesh_core::{AccessCommitment, KeyRegistry, MeshConfig, PeerId, PeerKeypair};
use mesh_store::{CredentialIssuer, MemoryObjectStore, WriteCredential};

fn secret_header(secret: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(SECRET_HEADER),
        HeaderValue::from_str(secret).unwrap(),
    )
}

fn test_server(keypairs: &[&PeerKeypair]) -> TestServer {
    let mut registry = KeyRegistry::new();
    for keypair in keypairs {
        registry.register_keypair(keypair);
    }
    let store = Arc::new(MemoryObjectStore::new());
    let issuer = Arc::new(CredentialIssuer::new(
        Arc::new(registry),
        store.clone(),
        &MeshConfig::default(),
    ));
    let state = AppState::new(issuer, store);
    TestServer::new(create_router(state)).unwrap()
}

async fn obtain_credential(server: &TestServer, keypair: &PeerKeypair) -> WriteCredential {
    let response = server
        .post("/api/v1/credentials/write")
        .json(&CredentialRequest {
            commitment: AccessCommitment::sign(keypair, None),
        })
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_health() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_credential_then_upload_then_download() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);
    let credential = obtain_credential(&server, &keypair).await;

    let (name, value) = secret_header(&credential.secret);
    let put = server
        .put("/objects/producer-1/job-1/chunk-000000")
        .add_header(name, value)
        .bytes(b"chunk bytes".as_slice().into())
        .await;
    put.assert_status_ok();
    let ack: PutResponse = put.json();
    assert_eq!(ack.key, "job-1/chunk-000000");
    assert_eq!(ack.size, 11);

    let listing: ObjectListResponse = server.get("/objects/producer-1").await.json();
    assert_eq!(listing.objects.len(), 1);
    assert_eq!(listing.objects[0].key, "job-1/chunk-000000");

    let get = server.get("/objects/producer-1/job-1/chunk-000000").await;
    get.assert_status_ok();
    assert_eq!(get.as_bytes().as_ref(), b"chunk bytes");
}

#[tokio::test]
async fn test_credential_request_body_is_flat() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);

    let body = serde_json::to_value(CredentialRequest {
        commitment: AccessCommitment::sign(&keypair, None),
    })
    .unwrap();
    // Commitment fields sit at the top level of the body
    assert!(body.get("identity").is_some());
    assert!(body.get("timestamp").is_some());
    assert!(body.get("signature").is_some());
    assert!(body.get("commitment").is_none());

    server
        .post("/api/v1/credentials/write")
        .json(&body)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_malformed_credential_body_is_bad_request() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);

    let response = server
        .post("/api/v1/credentials/write")
        .json(&serde_json::json!({ "identity": "producer-1" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_nested_object_keys_roundtrip() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);
    let credential = obtain_credential(&server, &keypair).await;

    let (name, value) = secret_header(&credential.secret);
    let put = server
        .put("/objects/producer-1/job-1/part-a/chunk-000000")
        .add_header(name, value)
        .bytes(b"nested".as_slice().into())
        .await;
    put.assert_status_ok();
    let ack: PutResponse = put.json();
    assert_eq!(ack.key, "job-1/part-a/chunk-000000");

    let get = server
        .get("/objects/producer-1/job-1/part-a/chunk-000000")
        .await;
    get.assert_status_ok();
    assert_eq!(get.as_bytes().as_ref(), b"nested");
}

#[tokio::test]
async fn test_upload_without_secret_unauthorized() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);

    let response = server
        .put("/objects/producer-1/job-1/chunk-000000")
        .bytes(b"x".as_slice().into())
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_secret_cannot_cross_identities() {
    let producer = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&producer]);
    let credential = obtain_credential(&server, &producer).await;

    let (name, value) = secret_header(&credential.secret);
    let response = server
        .put("/objects/producer-2/job-1/chunk-000000")
        .add_header(name, value)
        .bytes(b"x".as_slice().into())
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_stale_commitment_rejected() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);

    let mut commitment = AccessCommitment::sign(&keypair, None);
    commitment.timestamp = chrono::Utc::now() - chrono::Duration::hours(1);
    let response = server
        .post("/api/v1/credentials/write")
        .json(&CredentialRequest { commitment })
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_unregistered_peer_rejected() {
    let known = PeerKeypair::generate(PeerId::new("producer-1"));
    let stranger = PeerKeypair::generate(PeerId::new("stranger"));
    let server = test_server(&[&known]);

    let response = server
        .post("/api/v1/credentials/write")
        .json(&CredentialRequest {
            commitment: AccessCommitment::sign(&stranger, None),
        })
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_missing_object_is_404() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);
    server
        .get("/objects/producer-1/job-1/chunk-000099")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_read_grant_issued_to_verifier() {
    let producer = PeerKeypair::generate(PeerId::new("producer-1"));
    let verifier = PeerKeypair::generate(PeerId::new("verifier-1"));
    let server = test_server(&[&producer, &verifier]);

    let response = server
        .post("/api/v1/credentials/read")
        .json(&CredentialRequest {
            commitment: AccessCommitment::sign(&verifier, None),
        })
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_discovery_of_empty_prefix() {
    let keypair = PeerKeypair::generate(PeerId::new("producer-1"));
    let server = test_server(&[&keypair]);
    let listing: ObjectListResponse = server.get("/objects/producer-1").await.json();
    assert!(listing.objects.is_empty());
}
