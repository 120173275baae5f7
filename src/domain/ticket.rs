//! Ticket types (inventory) and individual admission tickets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, TicketId, TicketTypeId};

/// A priced tier of an event with its inventory counters.
///
/// Invariant: `0 <= quantity_sold <= quantity_total`. The counters are
/// only ever mutated through guarded atomic updates at the store, never
/// by application-side read-modify-write.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketType {
    /// Ticket type identifier.
    pub id: TicketTypeId,
    /// Parent event.
    pub event_id: EventId,
    /// Display name of the tier (e.g. `"Early Bird"`).
    pub name: String,
    /// Unit price.
    pub unit_price: Decimal,
    /// Capacity ceiling.
    pub quantity_total: u32,
    /// Units issued so far, net of refunds.
    pub quantity_sold: u32,
    /// Whether the tier is currently purchasable.
    pub active: bool,
    /// Start of the sale window.
    pub sales_start: Option<DateTime<Utc>>,
    /// End of the sale window.
    pub sales_end: Option<DateTime<Utc>>,
}

impl TicketType {
    /// Units still available under the capacity ceiling.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.quantity_total.saturating_sub(self.quantity_sold)
    }
}

/// Lifecycle status of an individual ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Issued and admissible.
    Valid,
    /// Scanned at the gate.
    Used,
    /// Cancelled by a refund.
    Cancelled,
}

impl TicketStatus {
    /// Returns the database/text representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Used => "used",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a stored status string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "valid" => Some(Self::Valid),
            "used" => Some(Self::Used),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// One physical admission unit.
///
/// A purchased line with quantity N fans out into N ticket rows, each
/// carrying its own globally unique QR payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Ticket {
    /// Ticket identifier.
    pub id: TicketId,
    /// Order item this ticket was issued under.
    pub order_item_id: uuid::Uuid,
    /// Ticket type for inventory attribution.
    pub ticket_type_id: TicketTypeId,
    /// Event the ticket admits to.
    pub event_id: EventId,
    /// Owning user; `None` marks a guest ticket.
    pub user_id: Option<uuid::Uuid>,
    /// QR payload encoded on the ticket; unique across the lifetime of
    /// the system.
    pub qr_payload: String,
    /// Lifecycle status.
    pub status: TicketStatus,
    /// When the ticket was scanned, if it has been.
    pub used_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Issues a fresh ticket with a newly generated QR payload.
    ///
    /// The payload is a random v4 UUID concatenated with the ticket-type
    /// id, so uniqueness holds system-wide and the encoded type survives
    /// offline scanner checks.
    #[must_use]
    pub fn issue(
        order_item_id: uuid::Uuid,
        ticket_type_id: TicketTypeId,
        event_id: EventId,
        user_id: Option<uuid::Uuid>,
    ) -> Self {
        let qr_payload = format!(
            "{}-{}",
            uuid::Uuid::new_v4().simple(),
            ticket_type_id.as_uuid().simple()
        );
        Self {
            id: TicketId::new(),
            order_item_id,
            ticket_type_id,
            event_id,
            user_id,
            qr_payload,
            status: TicketStatus::Valid,
            used_at: None,
        }
    }
}
