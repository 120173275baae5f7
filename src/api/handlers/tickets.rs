//! Gate check-in endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{CheckInRequest, CheckInResponse};
use crate::app_state::AppState;
use crate::domain::TicketStatus;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /tickets/check-in` — Admit a ticket by QR payload.
///
/// # Errors
///
/// Returns [`GatewayError::TicketNotFound`] for an unknown payload and
/// [`GatewayError::Validation`] when the ticket is already used or
/// cancelled.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/check-in",
    tag = "Tickets",
    summary = "Check a ticket in",
    description = "Transitions a valid ticket to used. Concurrent scans of the same ticket admit exactly one.",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Ticket admitted", body = CheckInResponse),
        (status = 404, description = "Unknown QR payload", body = ErrorResponse),
        (status = 400, description = "Ticket already used or cancelled", body = ErrorResponse),
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    Json(req): Json<CheckInRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if req.qr_payload.trim().is_empty() {
        return Err(GatewayError::Validation(
            "qr_payload must not be empty".to_string(),
        ));
    }

    let check_in = state.tickets.check_in(&req.qr_payload).await?;

    Ok(Json(CheckInResponse {
        success: true,
        ticket_id: check_in.ticket.id,
        status: TicketStatus::Used,
        used_at: check_in.used_at,
    }))
}

/// Ticket routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/tickets/check-in", post(check_in))
}
