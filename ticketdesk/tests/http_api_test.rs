//! HTTP API integration tests.
//!
//! Drives the full router (middleware included) with `tower::ServiceExt::oneshot`
//! over in-memory repositories, the same way the mail service would talk to it.
//!
//! Run with: `cargo test --test http_api_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::time::Duration;
use ticketdesk::{AppState, build_router};
use ticketdesk_core::{Status, TicketId};
use tower::ServiceExt;

fn router(desk: &common::TestDesk) -> Router {
    let state = AppState::new(
        desk.services.tickets.clone(),
        desk.services.outbox.clone(),
        desk.services.users.clone(),
        None,
    );
    build_router(state, Duration::from_secs(5))
}

async fn call(app: &Router, method: &str, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("valid request");

    let response = app.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    (status, bytes.to_vec())
}

async fn call_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, bytes) = call(app, method, uri, body.to_string()).await;
    let value = serde_json::from_slice(&bytes).expect("JSON response body");
    (status, value)
}

async fn receive(app: &Router, from: &str, subject: &str, message: &str) -> String {
    let (status, body) = call_json(
        app,
        "POST",
        "/api/receive",
        json!({ "from": from, "subject": subject, "message": message }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], 200);
    assert_eq!(body["message"], "OK");
    body["ticketId"].as_str().expect("ticketId").to_string()
}

#[tokio::test]
async fn test_receive_fetch_verify_round_trip() {
    let desk = common::desk().await;
    let app = router(&desk);

    let ticket_id = receive(&app, "customer@example.com", "Printer", "It is on fire").await;

    let (status, mails) = call_json(&app, "GET", "/api/fetchMails", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let mails = mails.as_object().expect("object keyed by mail id");
    assert_eq!(mails.len(), 1);

    let (mail_id, mail) = mails.iter().next().unwrap();
    assert_eq!(mail["id"], mail_id.as_str());
    assert_eq!(mail["from"], "no-reply@trivial-tickets.com");
    assert_eq!(mail["to"], "customer@example.com");
    assert_eq!(mail["subject"], "[trivial-tickets] Printer");
    assert!(mail["message"].as_str().unwrap().contains(&ticket_id));

    let (status, verified) =
        call_json(&app, "POST", "/api/verifyMail", json!({ "id": mail_id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["verified"], true);
    assert_eq!(
        verified["message"],
        format!("mail '{mail_id}' was successfully sent and deleted from server cache")
    );

    let (status, again) =
        call_json(&app, "POST", "/api/verifyMail", json!({ "id": mail_id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["verified"], false);
    assert_eq!(
        again["message"],
        format!("mail '{mail_id}' does not exist or has already been deleted")
    );

    let (_, mails) = call_json(&app, "GET", "/api/fetchMails", Value::Null).await;
    assert_eq!(mails, json!({}));
    assert!(desk.mail_repo.is_empty());
}

#[tokio::test]
async fn test_fetch_mails_empty_outbox() {
    let desk = common::desk().await;
    let (status, body) = call_json(&router(&desk), "GET", "/api/fetchMails", Value::Null).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_reply_with_marker_appends_to_ticket() {
    let desk = common::desk().await;
    let app = router(&desk);

    let ticket_id = receive(&app, "customer@example.com", "Printer", "It is on fire").await;
    let reply_subject = format!("[Ticket \"{ticket_id}\"] Printer");
    let replied = receive(&app, "customer@example.com", &reply_subject, "Still burning").await;

    assert_eq!(replied, ticket_id);
    let ticket = desk
        .services
        .tickets
        .get_ticket(&TicketId::new(&ticket_id))
        .await
        .unwrap();
    assert_eq!(ticket.entries.len(), 2);
    assert_eq!(ticket.entries[1].body, "Still burning");
    assert_eq!(desk.services.outbox.len().await, 2);
}

#[tokio::test]
async fn test_reply_reopens_closed_ticket() {
    let desk = common::desk().await;
    let app = router(&desk);

    let ticket_id = receive(&app, "customer@example.com", "Printer", "It is on fire").await;
    let id = TicketId::new(&ticket_id);
    desk.services
        .tickets
        .update_status(&id, Status::Closed, false)
        .await
        .unwrap();

    let subject = format!("Re: [Ticket \"{ticket_id}\"] Printer");
    receive(&app, "customer@example.com", &subject, "It is back").await;

    let ticket = desk.services.tickets.get_ticket(&id).await.unwrap();
    assert_eq!(ticket.status, Status::Open);
}

#[tokio::test]
async fn test_reply_to_merged_ticket_lands_on_target() {
    let desk = common::desk().await;
    let app = router(&desk);
    let tickets = &desk.services.tickets;
    let alice = desk.services.users.get("alice").await.unwrap();

    let target = TicketId::new(receive(&app, "a@example.com", "One", "first").await);
    let source = TicketId::new(receive(&app, "a@example.com", "Two", "second").await);
    tickets.assign_ticket(&target, &alice).await.unwrap();
    tickets.assign_ticket(&source, &alice).await.unwrap();
    tickets.merge_tickets(&target, &source, &alice.id).await.unwrap();

    let subject = format!("[Ticket \"{source}\"] Two");
    let replied = receive(&app, "a@example.com", &subject, "anyone?").await;

    assert_eq!(replied, target.as_str());
    let target = tickets.get_ticket(&target).await.unwrap();
    assert_eq!(target.latest_entry().unwrap().body, "anyone?");
}

#[tokio::test]
async fn test_unknown_marker_creates_new_ticket() {
    let desk = common::desk().await;
    let app = router(&desk);

    let id = receive(&app, "a@example.com", "[Ticket \"nosuchticket\"] Hi", "hello").await;

    assert_ne!(id, "nosuchticket");
    assert_eq!(desk.services.tickets.list_tickets().await.len(), 1);
}

#[tokio::test]
async fn test_receive_rejects_invalid_sender() {
    let desk = common::desk().await;
    let (status, body) = call_json(
        &router(&desk),
        "POST",
        "/api/receive",
        json!({ "from": "not-an-address", "subject": "Hi", "message": "x" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "invalid email address given: 'not-an-address'");
    assert!(desk.services.tickets.list_tickets().await.is_empty());
}

#[tokio::test]
async fn test_receive_rejects_malformed_bodies() {
    let desk = common::desk().await;
    let app = router(&desk);

    let bodies = [
        "{not json".to_string(),
        json!(["a@example.com", "Hi", "x"]).to_string(),
        json!({ "from": "a@example.com", "subject": "Hi" }).to_string(),
        json!({ "from": "a@example.com", "subject": "Hi", "message": "x", "cc": "b@example.com" })
            .to_string(),
        json!({ "from": "a@example.com", "subject": 7, "message": "x" }).to_string(),
    ];

    for body in bodies {
        let (status, bytes) = call(&app, "POST", "/api/receive", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["status"], 400);
    }
    assert!(desk.services.tickets.list_tickets().await.is_empty());
}

#[tokio::test]
async fn test_receive_non_utf8_body_is_plain_text_500() {
    let desk = common::desk().await;
    let (status, bytes) = call(&router(&desk), "POST", "/api/receive", vec![0xff, 0xfe, 0x00]).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(serde_json::from_slice::<Value>(&bytes).is_err());
}

#[tokio::test]
async fn test_verify_mail_rejects_malformed_bodies() {
    let desk = common::desk().await;
    let app = router(&desk);

    for body in [json!({}), json!({ "id": 5 }), json!({ "id": "a", "extra": true })] {
        let (status, value) = call_json(&app, "POST", "/api/verifyMail", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(value["status"], 400);
    }
}

#[tokio::test]
async fn test_wrong_methods_answer_405_json() {
    let desk = common::desk().await;
    let app = router(&desk);

    for (method, uri) in [
        ("POST", "/api/fetchMails"),
        ("GET", "/api/verifyMail"),
        ("GET", "/api/receive"),
        ("DELETE", "/api/receive"),
    ] {
        let (status, body) = call_json(&app, method, uri, Value::Null).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(body["status"], 405);
        assert_eq!(body["message"], format!("METHOD_NOT_ALLOWED ({method})"));
    }
}

#[tokio::test]
async fn test_head_on_fetch_mails_is_refused() {
    let desk = common::desk().await;
    desk.services
        .outbox
        .enqueue("c@example.com", "s", "b")
        .await
        .unwrap();

    // HEAD responses carry no body, so only the status is checked
    let (status, _) = call(&router(&desk), "HEAD", "/api/fetchMails", Body::empty()).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(desk.services.outbox.len().await, 1);
}

#[tokio::test]
async fn test_persistence_failure_answers_500() {
    let desk = common::desk().await;
    desk.ticket_repo.fail_writes(true);

    let (status, body) = call_json(
        &router(&desk),
        "POST",
        "/api/receive",
        json!({ "from": "a@example.com", "subject": "Hi", "message": "x" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
    assert!(desk.services.tickets.list_tickets().await.is_empty());
    assert!(desk.services.outbox.is_empty().await);
}

#[tokio::test]
async fn test_health_and_disabled_metrics() {
    let desk = common::desk().await;
    let app = router(&desk);

    let (status, body) = call_json(&app, "GET", "/health", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = call(&app, "GET", "/metrics", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let desk = common::desk().await;
    let request = Request::builder()
        .uri("/health")
        .header("X-Correlation-ID", "6f1c4c4e-5b5a-4f53-9f0e-5d1f3cbb4a11")
        .body(Body::empty())
        .unwrap();

    let response = router(&desk).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["X-Correlation-ID"],
        "6f1c4c4e-5b5a-4f53-9f0e-5d1f3cbb4a11"
    );
}
