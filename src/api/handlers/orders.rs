//! Order detail and refund endpoints (admin surface).

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{OrderResponse, RefundResponse};
use crate::app_state::AppState;
use crate::domain::OrderId;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /orders/{id}` — Order with its items and tickets.
///
/// # Errors
///
/// Returns [`GatewayError::OrderNotFound`] for an unknown id.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "Orders",
    summary = "Fetch an order",
    description = "Returns the order with its line items and issued tickets, suitable for receipts and the admin back office.",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let order_id = OrderId::from_uuid(id);
    let store = state.fulfillment.store();

    let order = store
        .load_order(order_id)
        .await?
        .ok_or(GatewayError::OrderNotFound(order_id))?;
    let items = store.order_items(order_id).await?;
    let tickets = store.order_tickets(order_id).await?;

    Ok(Json(OrderResponse::assemble(order, items, tickets)))
}

/// `POST /orders/{id}/refund` — Refund a paid order.
///
/// # Errors
///
/// Returns [`GatewayError`] when the order is unknown, not refundable,
/// or the provider rejects the monetary refund.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/refund",
    tag = "Orders",
    summary = "Refund an order",
    description = "Issues the provider-side refund, then marks the order refunded, cancels its tickets, and restores inventory.",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order refunded", body = RefundResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Order is not in the paid state", body = ErrorResponse),
        (status = 502, description = "Provider refund failed", body = ErrorResponse),
    )
)]
pub async fn refund_order(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let order_id = OrderId::from_uuid(id);
    let summary = state.refunds.refund(order_id).await?;

    Ok(Json(RefundResponse {
        success: true,
        order_id: summary.order_id,
        tickets_cancelled: summary.tickets_cancelled,
        message: format!(
            "order refunded; {} ticket(s) cancelled",
            summary.tickets_cancelled
        ),
    }))
}

/// Order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/refund", post(refund_order))
}
