//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to one of the four wire-level error kinds
//! (`validation_error | payment_failed | database_error | unknown_error`),
//! a numeric code, and an HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{OrderId, OrderStatus, TicketTypeId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "type": "validation_error",
///     "message": "purchase metadata has no line items",
///     "code": 1001
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with taxonomy kind, message, and numeric code.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Error taxonomy kind.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Numeric error code (see code ranges below).
    pub code: u32,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                 |
/// |-----------|-----------------|-----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request / 401       |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict|
/// | 3000–3999 | Server/Database | 500 Internal Server Error   |
/// | 4000–4999 | Payment         | 402 Payment Required        |
/// | 5000–5999 | Provider        | 502 Bad Gateway             |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request or metadata validation failed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Webhook signature did not verify against the shared secret.
    #[error("webhook signature rejected: {0}")]
    SignatureInvalid(String),

    /// Order with the given ID was not found.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// No ticket carries the presented QR payload.
    #[error("ticket not found for presented QR payload")]
    TicketNotFound,

    /// The guarded inventory update found no remaining capacity.
    #[error("ticket type {0} is sold out")]
    SoldOut(TicketTypeId),

    /// Refund requested for an order that is not in the `paid` state.
    #[error("order {id} is {status:?} and cannot be refunded")]
    NotRefundable {
        /// Order the refund was requested for.
        id: OrderId,
        /// Its current status.
        status: OrderStatus,
    },

    /// Provider reported the payment as declined, expired, or cancelled.
    #[error("payment failed: {0}")]
    PaymentFailed(String),

    /// Provider reported the payment as still in flight.
    #[error("payment pending: {0}")]
    PaymentPending(String),

    /// Transport or protocol failure talking to a payment provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the wire-level taxonomy kind for this variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_)
            | Self::SignatureInvalid(_)
            | Self::OrderNotFound(_)
            | Self::TicketNotFound
            | Self::SoldOut(_)
            | Self::NotRefundable { .. } => "validation_error",
            Self::PaymentFailed(_) | Self::PaymentPending(_) => "payment_failed",
            Self::Database(_) => "database_error",
            Self::Provider(_) | Self::Internal(_) => "unknown_error",
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::SignatureInvalid(_) => 1002,
            Self::OrderNotFound(_) => 2001,
            Self::TicketNotFound => 2002,
            Self::SoldOut(_) => 2003,
            Self::NotRefundable { .. } => 2004,
            Self::Database(_) => 3001,
            Self::Internal(_) => 3000,
            Self::PaymentFailed(_) => 4001,
            Self::PaymentPending(_) => 4002,
            Self::Provider(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::SignatureInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::OrderNotFound(_) | Self::TicketNotFound => StatusCode::NOT_FOUND,
            Self::SoldOut(_) | Self::NotRefundable { .. } => StatusCode::CONFLICT,
            Self::PaymentFailed(_) | Self::PaymentPending(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Database detail stays in the server log, not on the wire.
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "database error");
                "a database error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                kind: self.kind(),
                message,
                code: self.error_code(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
