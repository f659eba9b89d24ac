use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use supplier_client::{
    errors::FetchError,
    providers::{
        InventorySource,
        supplier_rest::{
            params::{Credentials, SupplierConfig},
            provider::SupplierRestProvider,
        },
    },
};

fn provider_for(url: String) -> SupplierRestProvider {
    let cfg = SupplierConfig {
        endpoint: url,
        timeout_secs: 2,
        connect_timeout_secs: 1,
        ..Default::default()
    };
    SupplierRestProvider::new(&cfg, Credentials::new("acme", "s3cret")).expect("provider")
}

#[tokio::test]
async fn posts_credentials_and_reads_enveloped_records() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/stock")
                .json_body(json!({"username": "acme", "password": "s3cret"}));
            then.status(200).json_body(json!({
                "data": [
                    {"stock_id": "D-1", "shape": "Round", "carat": 1.02},
                    {"stock_id": "D-2", "shape": "Oval", "carat": "0.90"}
                ]
            }));
        })
        .await;

    let records = provider_for(server.url("/api/stock"))
        .fetch_inventory()
        .await
        .expect("fetch");

    mock.assert_async().await;
    let ids: Vec<_> = records.iter().filter_map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["D-1", "D-2"]);
}

#[tokio::test]
async fn bare_array_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/stock");
            then.status(200).json_body(json!([{"StockID": "A"}]));
        })
        .await;

    let records = provider_for(server.url("/stock")).fetch_inventory().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier().as_deref(), Some("A"));
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/stock");
            then.status(401).body("invalid credentials");
        })
        .await;

    let err = provider_for(server.url("/stock"))
        .fetch_inventory()
        .await
        .unwrap_err();
    match err {
        FetchError::Source { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid credentials");
        }
        other => panic!("expected Source error, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/stock");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let err = provider_for(server.url("/stock"))
        .fetch_inventory()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(ref msg) if msg.contains("maintenance")), "{err}");
}

#[tokio::test]
async fn supplier_error_message_is_surfaced_as_shape_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/stock");
            then.status(200)
                .json_body(json!({"message": "Account suspended", "code": 17}));
        })
        .await;

    let err = provider_for(server.url("/stock"))
        .fetch_inventory()
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::Shape { ref detail } if detail == "Account suspended"),
        "{err}"
    );
}

#[tokio::test]
async fn empty_inventory_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/stock");
            then.status(200).json_body(json!({"results": []}));
        })
        .await;

    let err = provider_for(server.url("/stock"))
        .fetch_inventory()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::EmptyPayload { .. }));
}

#[tokio::test]
async fn hung_supplier_times_out_as_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/stock");
            then.status(200)
                .delay(Duration::from_secs(5))
                .json_body(json!([{"stock_id": "late"}]));
        })
        .await;

    let err = provider_for(server.url("/stock"))
        .fetch_inventory()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "{err}");
}

#[tokio::test]
async fn unreachable_supplier_is_a_transport_error() {
    // Port 9 (discard) on loopback is not expected to accept connections.
    let err = provider_for("http://127.0.0.1:9/stock".to_string())
        .fetch_inventory()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "{err}");
}
