//! Refund DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::OrderId;

/// Response body for `POST /orders/{id}/refund`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefundResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// Refunded order.
    pub order_id: OrderId,
    /// Number of tickets cancelled by the refund.
    pub tickets_cancelled: u64,
    /// Human-readable summary for the admin operator.
    pub message: String,
}
