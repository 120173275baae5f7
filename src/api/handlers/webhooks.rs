//! Provider webhook endpoints (push-style reconciliation).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::PaymentMethod;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /webhooks/stripe` — Stripe event delivery.
///
/// Verifies the `Stripe-Signature` header over the raw body before any
/// parsing; an unverifiable payload is rejected with zero side effects.
/// Fulfillment is idempotent, so Stripe's redeliveries are acknowledged
/// with `200` whether or not the order already exists.
///
/// # Errors
///
/// Returns [`GatewayError::SignatureInvalid`] (401) on a bad signature
/// and [`GatewayError::Validation`] (400) on a malformed event; `5xx`
/// responses ask Stripe to redeliver.
#[utoipa::path(
    post,
    path = "/webhooks/stripe",
    tag = "Webhooks",
    summary = "Stripe webhook receiver",
    description = "Receives signed Stripe events. `checkout.session.completed`, `checkout.session.async_payment_succeeded`, and `payment_intent.succeeded` trigger fulfillment; other event types are acknowledged and ignored.",
    request_body(content = String, description = "Raw signed event payload"),
    responses(
        (status = 200, description = "Event processed or ignored"),
        (status = 401, description = "Signature rejected", body = ErrorResponse),
        (status = 400, description = "Malformed event", body = ErrorResponse),
        (status = 500, description = "Fulfillment failed; redeliver", body = ErrorResponse),
    )
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            GatewayError::SignatureInvalid("missing Stripe-Signature header".to_string())
        })?;

    let Some(charge) = state.stripe.parse_webhook(&body, signature).inspect_err(|e| {
        tracing::warn!(error = %e, "rejected stripe webhook");
    })?
    else {
        // Not a fulfillment-relevant event type.
        return Ok(StatusCode::OK.into_response());
    };

    let order = state.fulfillment.fulfill(&charge, PaymentMethod::Card).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "received": true, "order_id": order.id })),
    )
        .into_response())
}

/// Webhook routes, mounted at the root level (providers post here, not
/// under `/api/v1`).
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/stripe", post(stripe_webhook))
}
