use std::time::{Duration, Instant};

use field_reports::config::MessagingConfig;
use field_reports::reports::dispatch::{DispatchError, MessageDispatcher, WhatsAppDispatcher};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: String) -> MessagingConfig {
    MessagingConfig {
        base_url,
        api_key: "test-key".to_string(),
        session_id: "session-1".to_string(),
        send_delay: Duration::from_millis(0),
        request_timeout: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn sends_normalized_digits_and_returns_the_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/messages/send"))
        .and(header("x-api-key", "test-key"))
        .and(header("x-session-id", "session-1"))
        .and(body_json(json!({
            "to": "919537653927",
            "text": "hello"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "messageId": "wamid.123" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = WhatsAppDispatcher::new(config(server.uri())).expect("client builds");
    let receipt = dispatcher
        .send("+91 95376 53927", "hello")
        .await
        .expect("send succeeds");
    assert_eq!(receipt.message_id, "wamid.123");
}

#[tokio::test]
async fn gateway_rejection_surfaces_the_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/messages/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": { "message": "session disconnected" }
        })))
        .mount(&server)
        .await;

    let dispatcher = WhatsAppDispatcher::new(config(server.uri())).expect("client builds");
    let err = dispatcher
        .send("919537653927", "hello")
        .await
        .expect_err("rejection surfaces");
    assert!(matches!(err, DispatchError::Send(_)));
    assert!(err.to_string().contains("session disconnected"));
}

#[tokio::test]
async fn http_error_status_is_an_ordinary_send_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/messages/send"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "success": false,
            "error": { "message": "gateway overloaded" }
        })))
        .mount(&server)
        .await;

    let dispatcher = WhatsAppDispatcher::new(config(server.uri())).expect("client builds");
    let err = dispatcher
        .send("919537653927", "hello")
        .await
        .expect_err("failure surfaces");
    assert!(err.to_string().contains("gateway overloaded"));
}

#[tokio::test]
async fn slow_gateway_times_out_as_a_send_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/messages/send"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(2_000))
                .set_body_json(json!({
                    "success": true,
                    "data": { "messageId": "late" }
                })),
        )
        .mount(&server)
        .await;

    let dispatcher = WhatsAppDispatcher::new(config(server.uri())).expect("client builds");
    let err = dispatcher
        .send("919537653927", "hello")
        .await
        .expect_err("timeout surfaces");
    assert!(matches!(err, DispatchError::Send(_)));
}

#[tokio::test]
async fn empty_recipient_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let dispatcher = WhatsAppDispatcher::new(config(server.uri())).expect("client builds");

    let err = dispatcher
        .send(" + ", "hello")
        .await
        .expect_err("empty recipient rejected");
    assert!(matches!(err, DispatchError::EmptyRecipient));
    assert!(server
        .received_requests()
        .await
        .expect("request log available")
        .is_empty());
}

#[tokio::test]
async fn consecutive_sends_are_paced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/messages/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "messageId": "wamid.paced" }
        })))
        .mount(&server)
        .await;

    let mut paced = config(server.uri());
    paced.send_delay = Duration::from_millis(120);
    let dispatcher = WhatsAppDispatcher::new(paced).expect("client builds");

    let started = Instant::now();
    dispatcher
        .send("919537653927", "first")
        .await
        .expect("first send succeeds");
    dispatcher
        .send("919537653927", "second")
        .await
        .expect("second send succeeds");

    assert!(
        started.elapsed() >= Duration::from_millis(120),
        "second send must wait out the pacing delay"
    );
}
