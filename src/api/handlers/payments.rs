//! Payment confirmation endpoint (poll-style reconciliation).

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ConfirmPaymentRequest, ConfirmPaymentResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /payments/confirm` — Confirm a payment and fulfill the order.
///
/// Looks the payment up with the owning provider, normalizes its status,
/// and runs fulfillment. Safe to retry: an already-fulfilled reference
/// returns the same order id.
///
/// # Errors
///
/// Returns [`GatewayError`] when the payment has not settled, was
/// declined, or the purchase metadata is unusable.
#[utoipa::path(
    post,
    path = "/api/v1/payments/confirm",
    tag = "Payments",
    summary = "Confirm a payment and fulfill the order",
    description = "Polls the payment provider for the authoritative charge record, maps its status, and issues the order with its tickets exactly once per payment reference.",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Order fulfilled (or already fulfilled)", body = ConfirmPaymentResponse),
        (status = 400, description = "Invalid request or unusable metadata", body = ErrorResponse),
        (status = 402, description = "Payment pending or failed", body = ErrorResponse),
        (status = 409, description = "Ticket type sold out", body = ErrorResponse),
    )
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if req.provider_payment_id.trim().is_empty() {
        return Err(GatewayError::Validation(
            "provider_payment_id must not be empty".to_string(),
        ));
    }

    let provider = state.providers.for_method(req.payment_method)?;
    let mut charge = provider.lookup(&req.provider_payment_id).await?;

    // The provider record wins; client data only fills gaps it cannot
    // influence the charge through.
    if let Some(intent) = charge.intent.as_mut() {
        if intent.user_id.is_none() {
            intent.user_id = req.user_id;
        }
        if intent.guest_contact.is_none() {
            intent.guest_contact = req.guest_info;
        }
    }

    let order = state.fulfillment.fulfill(&charge, req.payment_method).await?;

    Ok(Json(ConfirmPaymentResponse {
        success: true,
        order_id: order.id,
    }))
}

/// Payment routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/payments/confirm", post(confirm_payment))
}
