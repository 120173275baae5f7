//! Router-level tests: signed Stripe webhook deliveries, check-in, and
//! order retrieval over the full Axum stack.

#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sha2::Sha256;
use tower::ServiceExt;

use boxoffice_gateway::api::build_router;
use boxoffice_gateway::app_state::AppState;
use boxoffice_gateway::config::StripeConfig;
use boxoffice_gateway::domain::{PaymentMethod, TicketType};
use boxoffice_gateway::provider::{ProviderRegistry, StripeProvider};
use boxoffice_gateway::service::{FulfillmentService, RefundService, TicketService};
use boxoffice_gateway::store::FulfillmentStore;

use common::{InMemoryStore, ScriptedProvider, store};

const WEBHOOK_SECRET: &str = "whsec_test";

fn test_app(store: &Arc<InMemoryStore>) -> Router {
    let stripe = Arc::new(StripeProvider::new(
        &StripeConfig {
            secret_key: "sk_test".to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            api_base: "https://api.stripe.invalid".to_string(),
            signature_tolerance_secs: 300,
        },
        reqwest::Client::new(),
    ));
    let providers = Arc::new(
        ProviderRegistry::new()
            .with(PaymentMethod::Card, Arc::new(ScriptedProvider::refundable())),
    );
    let store = Arc::clone(store) as Arc<dyn FulfillmentStore>;

    let state = AppState {
        fulfillment: Arc::new(FulfillmentService::new(Arc::clone(&store))),
        refunds: Arc::new(RefundService::new(Arc::clone(&store), Arc::clone(&providers))),
        tickets: Arc::new(TicketService::new(store)),
        providers,
        stripe,
    };
    build_router().with_state(state)
}

/// Signs a payload the way Stripe does: HMAC-SHA256 over `"{t}.{body}"`.
fn sign(body: &str, secret: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        panic!("hmac accepts any key length");
    };
    mac.update(format!("{timestamp}.{body}").as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

fn completed_session_event(session_id: &str, ticket_type: &TicketType, quantity: u32) -> String {
    let lines = serde_json::json!([{
        "ticket_type_id": ticket_type.id,
        "quantity": quantity,
    }]);
    serde_json::json!({
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_intent": "pi_1",
                "amount_total": 5000,
                "currency": "usd",
                "payment_status": "paid",
                "metadata": {
                    "event_id": ticket_type.event_id.to_string(),
                    "lines": lines.to_string(),
                },
            }
        }
    })
    .to_string()
}

fn webhook_request(body: String, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/stripe")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("Stripe-Signature", signature);
    }
    let Ok(request) = builder.body(Body::from(body)) else {
        panic!("request should build");
    };
    request
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body should be readable");
    };
    let Ok(value) = serde_json::from_slice(&bytes) else {
        panic!("body should be JSON");
    };
    value
}

#[tokio::test]
async fn signed_completed_session_creates_an_order() {
    let store = store();
    let ticket_type = store.seed_ticket_type(Decimal::new(2500, 2), 100, 0).await;
    let app = test_app(&store);

    let body = completed_session_event("cs_test_1", &ticket_type, 2);
    let signature = sign(&body, WEBHOOK_SECRET);

    let Ok(response) = app.oneshot(webhook_request(body, Some(signature))).await else {
        panic!("router should respond");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["received"], true);
    assert!(json["order_id"].is_string());

    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.ticket_count().await, 2);
    assert_eq!(store.quantity_sold(ticket_type.id).await, 2);
}

#[tokio::test]
async fn signed_payment_intent_success_creates_an_order() {
    let store = store();
    let ticket_type = store.seed_ticket_type(Decimal::new(2500, 2), 100, 0).await;
    let app = test_app(&store);

    let lines = serde_json::json!([{
        "ticket_type_id": ticket_type.id,
        "quantity": 2,
    }]);
    let body = serde_json::json!({
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": "pi_direct_1",
                "amount": 5000,
                "currency": "usd",
                "status": "succeeded",
                "metadata": {
                    "event_id": ticket_type.event_id.to_string(),
                    "lines": lines.to_string(),
                },
            }
        }
    })
    .to_string();
    let signature = sign(&body, WEBHOOK_SECRET);

    let Ok(response) = app.oneshot(webhook_request(body, Some(signature))).await else {
        panic!("router should respond");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["received"], true);
    assert!(json["order_id"].is_string());

    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.ticket_count().await, 2);
    assert_eq!(store.quantity_sold(ticket_type.id).await, 2);
}

#[tokio::test]
async fn tampered_signature_is_rejected_with_zero_writes() {
    let store = store();
    let ticket_type = store.seed_ticket_type(Decimal::new(2500, 2), 100, 0).await;
    let app = test_app(&store);

    let body = completed_session_event("cs_test_1", &ticket_type, 2);
    let signature = sign(&body, "whsec_wrong");

    let Ok(response) = app.oneshot(webhook_request(body, Some(signature))).await else {
        panic!("router should respond");
    };
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"]["type"], "validation_error");

    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.quantity_sold(ticket_type.id).await, 0);
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let store = store();
    let ticket_type = store.seed_ticket_type(Decimal::new(2500, 2), 100, 0).await;
    let app = test_app(&store);

    let body = completed_session_event("cs_test_1", &ticket_type, 1);
    let Ok(response) = app.oneshot(webhook_request(body, None)).await else {
        panic!("router should respond");
    };
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn unrelated_event_types_are_acknowledged_and_ignored() {
    let store = store();
    let app = test_app(&store);

    let body = serde_json::json!({
        "type": "invoice.paid",
        "data": { "object": {
            "id": "in_1",
            "payment_status": "paid",
        }}
    })
    .to_string();
    let signature = sign(&body, WEBHOOK_SECRET);

    let Ok(response) = app.oneshot(webhook_request(body, Some(signature))).await else {
        panic!("router should respond");
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn redelivered_webhook_acknowledges_with_the_same_order() {
    let store = store();
    let ticket_type = store.seed_ticket_type(Decimal::new(2500, 2), 100, 0).await;

    let body = completed_session_event("cs_test_1", &ticket_type, 2);
    let signature = sign(&body, WEBHOOK_SECRET);

    let Ok(first) = test_app(&store)
        .oneshot(webhook_request(body.clone(), Some(signature.clone())))
        .await
    else {
        panic!("router should respond");
    };
    let Ok(second) = test_app(&store)
        .oneshot(webhook_request(body, Some(signature)))
        .await
    else {
        panic!("router should respond");
    };

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    let first_json = json_body(first).await;
    let second_json = json_body(second).await;
    assert_eq!(first_json["order_id"], second_json["order_id"]);
    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.quantity_sold(ticket_type.id).await, 2);
}

#[tokio::test]
async fn checked_in_ticket_cannot_be_scanned_twice() {
    let store = store();
    let ticket_type = store.seed_ticket_type(Decimal::new(2500, 2), 100, 0).await;

    let body = completed_session_event("cs_checkin", &ticket_type, 1);
    let signature = sign(&body, WEBHOOK_SECRET);
    let Ok(response) = test_app(&store)
        .oneshot(webhook_request(body, Some(signature)))
        .await
    else {
        panic!("router should respond");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let Some(order_id) = json["order_id"].as_str() else {
        panic!("order id expected");
    };
    let Ok(order_id) = order_id.parse::<boxoffice_gateway::domain::OrderId>() else {
        panic!("order id should be a uuid");
    };
    let Ok(tickets) = store.order_tickets(order_id).await else {
        panic!("ticket load should succeed");
    };
    let [ticket] = tickets.as_slice() else {
        panic!("expected one ticket");
    };

    let check_in = |qr: String| {
        let Ok(request) = Request::builder()
            .method("POST")
            .uri("/api/v1/tickets/check-in")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "qr_payload": qr }).to_string(),
            ))
        else {
            panic!("request should build");
        };
        request
    };

    let Ok(first) = test_app(&store)
        .oneshot(check_in(ticket.qr_payload.clone()))
        .await
    else {
        panic!("router should respond");
    };
    assert_eq!(first.status(), StatusCode::OK);
    let json = json_body(first).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["status"], "used");

    let Ok(second) = test_app(&store)
        .oneshot(check_in(ticket.qr_payload.clone()))
        .await
    else {
        panic!("router should respond");
    };
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let json = json_body(second).await;
    assert_eq!(json["error"]["type"], "validation_error");
}

#[tokio::test]
async fn health_endpoint_is_live() {
    let store = store();
    let app = test_app(&store);

    let Ok(request) = Request::builder().uri("/health").body(Body::empty()) else {
        panic!("request should build");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router should respond");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "reachable");
}
