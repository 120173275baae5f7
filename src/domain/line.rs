//! Order items: one row per purchased ticket type within an order.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::{OrderId, TicketTypeId};

/// A purchased line within an order.
///
/// Captures a unit-price snapshot at issuance time so later price changes
/// on the ticket type never rewrite historical orders. Immutable once
/// created.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItem {
    /// Order item identifier.
    pub id: uuid::Uuid,
    /// Parent order.
    pub order_id: OrderId,
    /// Ticket type purchased.
    pub ticket_type_id: TicketTypeId,
    /// Number of admission units.
    pub quantity: u32,
    /// Unit price at issuance time.
    pub unit_price: Decimal,
    /// `unit_price * quantity`, precomputed for receipts.
    pub line_total: Decimal,
}

impl OrderItem {
    /// Builds a line for the given order, snapshotting the unit price.
    #[must_use]
    pub fn snapshot(
        order_id: OrderId,
        ticket_type_id: TicketTypeId,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            order_id,
            ticket_type_id,
            quantity,
            unit_price,
            line_total: unit_price * Decimal::from(quantity),
        }
    }
}
