//! HTTP endpoint driven through the axum router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use payrpc_client::endpoint::{notification_router, HttpError, NotificationEndpoint};
use payrpc_client::methods::notification as methods;
use payrpc_client::{handler_fn, ApiClient, NotificationHandler};
use payrpc_core::error::PayRpcError;

use harness::{account_data, notification, offline_client};

const PATH: &str = "/notifications";
const UUID: &str = "258a2184-2842-b485-23ca-293425152415";

fn counting_ok(counter: Arc<AtomicUsize>) -> Arc<dyn NotificationHandler> {
    handler_fn(move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        args.respond_with_ok();
        Ok(())
    })
}

fn router(clients: Vec<ApiClient>) -> Router {
    notification_router(NotificationEndpoint::new(clients).unwrap(), PATH)
}

async fn post(app: Router, body: impl Into<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn ok_acknowledgement_is_written_with_200() {
    let client = offline_client();
    client.on_account(counting_ok(Arc::new(AtomicUsize::new(0))));

    let (status, headers, body) = post(
        router(vec![client]),
        notification(methods::ACCOUNT, UUID, account_data()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(headers[header::ACCEPT], "application/json");
    assert!(headers[header::USER_AGENT]
        .to_str()
        .unwrap()
        .starts_with("payrpc-client-rust/"));
    assert_eq!(body["result"]["uuid"], UUID);
    assert_eq!(body["result"]["data"]["status"], "OK");
    assert!(!body["result"]["signature"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn failed_acknowledgement_is_written_with_500() {
    let client = offline_client();
    client.on_account(handler_fn(|args| {
        args.respond_with_failed("rejected by merchant");
        Ok(())
    }));

    let (status, _, body) = post(
        router(vec![client]),
        notification(methods::ACCOUNT, UUID, account_data()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["result"]["data"]["status"], "FAILED");
    assert_eq!(body["result"]["data"]["message"], "rejected by merchant");
}

#[tokio::test]
async fn clients_without_a_listener_are_skipped() {
    let first = offline_client();
    let second = offline_client();
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));
    first.on_account(counting_ok(first_calls.clone()));
    second.on_credit(counting_ok(second_calls.clone()));

    let (status, _, body) = post(
        router(vec![first, second]),
        notification(methods::CREDIT, UUID, json!({ "amount": "1.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["method"], "credit");
    assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn first_acknowledging_client_wins() {
    let first = offline_client();
    let second = offline_client();
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));
    first.on_debit(counting_ok(first_calls.clone()));
    second.on_debit(counting_ok(second_calls.clone()));

    let (status, _, _) = post(
        router(vec![first, second]),
        notification(methods::DEBIT, UUID, json!({ "amount": "1.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn no_listener_anywhere_is_404() {
    let client = offline_client();
    client.on_account(counting_ok(Arc::new(AtomicUsize::new(0))));

    let (status, _, body) = post(
        router(vec![client]),
        notification(methods::PENDING, UUID, json!({ "amount": "1.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NO_LISTENER");
}

#[tokio::test]
async fn forged_notification_is_401_and_stops_at_the_first_client() {
    let first = offline_client();
    let second = offline_client();
    let second_calls = Arc::new(AtomicUsize::new(0));
    second.on_account(counting_ok(second_calls.clone()));

    let mut forged: Value =
        serde_json::from_str(&notification(methods::ACCOUNT, UUID, account_data())).unwrap();
    forged["params"]["uuid"] = json!("11111111-1111-4111-8111-111111111111");

    let (status, _, body) = post(router(vec![first, second]), forged.to_string()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "SIGNATURE");
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let client = offline_client();
    client.on_unknown(counting_ok(Arc::new(AtomicUsize::new(0))));
    let app = router(vec![client]);

    let (status, _, body) = post(app.clone(), "{ not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION");

    let (status, _, _) = post(app, vec![0xff_u8, 0xfe, 0x00]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unacknowledged_notification_is_500() {
    let client = offline_client();
    client.on_account(handler_fn(|_| Ok(())));

    let (status, _, body) = post(
        router(vec![client]),
        notification(methods::ACCOUNT, UUID, account_data()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "UNACKNOWLEDGED");
}

#[test]
fn endpoint_needs_at_least_one_client() {
    let err = NotificationEndpoint::new(Vec::new()).err().unwrap();
    assert!(matches!(err, PayRpcError::NoClient));
}

#[test]
fn error_status_mapping() {
    let cases = [
        (PayRpcError::SignatureMissing, StatusCode::UNAUTHORIZED),
        (PayRpcError::Validation("x".into()), StatusCode::BAD_REQUEST),
        (PayRpcError::NoListener("x".into()), StatusCode::NOT_FOUND),
        (PayRpcError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, expected) in cases {
        assert_eq!(HttpError::from(err).status(), expected);
    }
}
