//! Order detail DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    CustomerContact, EventId, Order, OrderId, OrderItem, OrderStatus, PaymentMethod, Ticket,
    TicketId, TicketStatus, TicketTypeId,
};

/// Response body for `GET /orders/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    /// Order identifier.
    pub id: OrderId,
    /// Purchasing user, `None` for guest orders.
    pub user_id: Option<uuid::Uuid>,
    /// Parent event.
    pub event_id: EventId,
    /// Total charged amount.
    pub total_amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Payment method used at checkout.
    pub payment_method: PaymentMethod,
    /// Provider payment reference.
    pub payment_reference: String,
    /// Guest contact snapshot.
    pub guest_contact: Option<CustomerContact>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Purchased lines.
    pub items: Vec<OrderItemDto>,
    /// Issued tickets.
    pub tickets: Vec<TicketDto>,
}

/// One purchased line within an order response.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDto {
    /// Item identifier.
    pub id: uuid::Uuid,
    /// Ticket type purchased.
    pub ticket_type_id: TicketTypeId,
    /// Number of admission units.
    pub quantity: u32,
    /// Unit-price snapshot.
    pub unit_price: Decimal,
    /// Line total.
    pub line_total: Decimal,
}

/// One issued ticket within an order response.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketDto {
    /// Ticket identifier.
    pub id: TicketId,
    /// Ticket type for inventory attribution.
    pub ticket_type_id: TicketTypeId,
    /// QR payload encoded on the ticket.
    pub qr_payload: String,
    /// Lifecycle status.
    pub status: TicketStatus,
    /// Scan timestamp, if scanned.
    pub used_at: Option<DateTime<Utc>>,
}

impl OrderResponse {
    /// Assembles the response from the order and its dependents.
    #[must_use]
    pub fn assemble(order: Order, items: Vec<OrderItem>, tickets: Vec<Ticket>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            event_id: order.event_id,
            total_amount: order.total_amount,
            currency: order.currency,
            status: order.status,
            payment_method: order.payment_method,
            payment_reference: order.payment_reference,
            guest_contact: order.guest_contact,
            created_at: order.created_at,
            items: items
                .into_iter()
                .map(|i| OrderItemDto {
                    id: i.id,
                    ticket_type_id: i.ticket_type_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    line_total: i.line_total,
                })
                .collect(),
            tickets: tickets
                .into_iter()
                .map(|t| TicketDto {
                    id: t.id,
                    ticket_type_id: t.ticket_type_id,
                    qr_payload: t.qr_payload,
                    status: t.status,
                    used_at: t.used_at,
                })
                .collect(),
        }
    }
}
