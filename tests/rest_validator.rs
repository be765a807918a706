//! Exercises the REST ticket validator against a throwaway local SSO
//! endpoint speaking the JSON validation protocol.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{HeaderMap, Uri};
use axum::{Json, Router, extract::Query, routing::get};
use serde_json::json;
use url::Url;

use cas_gate::services::sso::{
    CasToken, RestTicketValidator, TicketValidator, ValidationError, extract_ticket,
};

async fn validate(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    if !params.contains_key("service") {
        return Json(json!({
            "serviceResponse": {
                "authenticationFailure": { "code": "MISSING_SERVICE", "description": "" }
            }
        }));
    }

    match params.get("ticket").map(String::as_str) {
        Some("ST-OK") => Json(json!({
            "serviceResponse": {
                "authenticationSuccess": {
                    "user": "casuser",
                    "attributes": { "memberOf": ["staff"] }
                }
            }
        })),
        Some("ST-SLOW") => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }
        _ => Json(json!({
            "serviceResponse": {
                "authenticationFailure": {
                    "code": "INVALID_TICKET",
                    "description": "unknown ticket"
                }
            }
        })),
    }
}

async fn serve_mock_sso() -> SocketAddr {
    let app = Router::new().route("/cas/p3/serviceValidate", get(validate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

fn token_for(ticket: &str) -> CasToken {
    let uri: Uri = format!("/sso/callback?ticket={ticket}").parse().expect("uri");
    let ticket = extract_ticket(&uri, &HeaderMap::new()).expect("ticket");
    CasToken::new(
        ticket,
        "https://app.example.com/sso/callback".parse().expect("service"),
    )
}

fn validator_at(addr: SocketAddr, timeout: Duration) -> RestTicketValidator {
    let prefix: Url = format!("http://{addr}/cas").parse().expect("prefix");
    RestTicketValidator::new(&prefix, timeout).expect("validator")
}

#[tokio::test]
async fn valid_ticket_yields_the_asserted_principal() {
    let addr = serve_mock_sso().await;
    let validator = validator_at(addr, Duration::from_secs(2));

    let assertion = validator
        .validate(&token_for("ST-OK"))
        .await
        .expect("assertion");

    assert_eq!(assertion.principal.name(), "casuser");
    assert!(assertion.attributes.contains_key("memberOf"));
}

#[tokio::test]
async fn rejected_ticket_surfaces_the_failure_code() {
    let addr = serve_mock_sso().await;
    let validator = validator_at(addr, Duration::from_secs(2));

    match validator.validate(&token_for("ST-EXPIRED")).await {
        Err(ValidationError::Rejected { code, .. }) => assert_eq!(code, "INVALID_TICKET"),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_sso_server_times_out() {
    let addr = serve_mock_sso().await;
    let validator = validator_at(addr, Duration::from_millis(200));

    match validator.validate(&token_for("ST-SLOW")).await {
        Err(ValidationError::Timeout) => {}
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_sso_server_is_reported_as_such() {
    // Bind then drop to get a port with nothing listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let validator = validator_at(addr, Duration::from_secs(2));

    match validator.validate(&token_for("ST-OK")).await {
        Err(ValidationError::Unreachable(_)) => {}
        other => panic!("expected Unreachable, got {other:?}"),
    }
}
