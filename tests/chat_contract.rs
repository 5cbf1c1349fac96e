//! HTTP contract tests for the chat backend client.
//!
//! These verify the wire format of `POST /chat` and `GET /health` against a
//! mock research service, and how each failure kind is classified.

use account_desk::DeskError;
use account_desk::api::{ChatBackend, ChatRequest, HttpChatBackend};
use account_desk::plan::PlanSection;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        session_id: "sess_contract".into(),
        message: message.into(),
        persona: "efficient".into(),
    }
}

fn backend(server: &MockServer) -> HttpChatBackend {
    HttpChatBackend::new(&format!("{}/chat", server.uri())).expect("valid endpoint")
}

#[tokio::test]
async fn request_body_carries_session_message_and_persona() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "session_id": "sess_contract",
            "message": "Research Zeta company",
            "persona": "efficient"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "Great, I'll research Zeta.",
            "mode": "research",
            "company": "Zeta",
            "account_plan": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = backend(&server)
        .send(&request("Research Zeta company"))
        .await
        .expect("request should succeed");
    assert_eq!(response.reply, "Great, I'll research Zeta.");
    assert_eq!(response.caption(), "Mode: research | Company: Zeta");
    assert!(response.account_plan.is_none());
}

#[tokio::test]
async fn account_plan_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "Here's the plan",
            "mode": "editing",
            "company": "Zeta",
            "account_plan": {
                "next_steps": "Book a call",
                "company_overview": "Zeta makes widgets",
                "internal_notes": "ignored"
            }
        })))
        .mount(&server)
        .await;

    let response = backend(&server).send(&request("generate plan")).await.unwrap();
    let plan = response.account_plan.expect("plan present");
    assert_eq!(plan.get(PlanSection::CompanyOverview), Some("Zeta makes widgets"));
    assert_eq!(plan.get(PlanSection::NextSteps), Some("Book a call"));
    assert_eq!(plan.get(PlanSection::KeyInitiatives), None);
}

#[tokio::test]
async fn non_success_status_is_failure_regardless_of_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "reply": "looks valid",
            "mode": "discovery"
        })))
        .mount(&server)
        .await;

    let err = backend(&server).send(&request("hi")).await.unwrap_err();
    assert!(matches!(err, DeskError::Status { status: 422 }));
    assert!(err.is_backend_failure());
}

#[tokio::test]
async fn malformed_body_is_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).send(&request("hi")).await.unwrap_err();
    assert!(matches!(err, DeskError::Decode(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_failure() {
    let server = MockServer::start().await;
    let endpoint = format!("{}/chat", server.uri());
    drop(server);

    let err = HttpChatBackend::new(&endpoint)
        .unwrap()
        .send(&request("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeskError::Transport(_)));
}

#[tokio::test]
async fn health_check_hits_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let status = backend(&server).health().await.unwrap();
    assert!(status.is_ok());
}
