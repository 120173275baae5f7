//! Check-in DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{TicketId, TicketStatus};

/// Request body for `POST /tickets/check-in`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequest {
    /// QR payload scanned at the gate.
    pub qr_payload: String,
}

/// Response body for `POST /tickets/check-in`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// The admitted ticket.
    pub ticket_id: TicketId,
    /// Status after the transition (always `used`).
    pub status: TicketStatus,
    /// When the scan was recorded.
    pub used_at: DateTime<Utc>,
}
