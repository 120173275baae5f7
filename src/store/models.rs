//! Database row shapes and their conversions into domain types.
//!
//! Statuses and payment methods are stored as text; rows carry the raw
//! strings and convert through the domain enums' `parse` functions so an
//! unexpected value surfaces as an error instead of a silent default.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    CustomerContact, Order, OrderItem, OrderStatus, PaymentMethod, Ticket, TicketStatus,
    TicketType, TicketTypeId,
};
use crate::error::GatewayError;

/// Row from the `orders` table.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    /// Order id.
    pub id: Uuid,
    /// Purchasing user, NULL for guests.
    pub user_id: Option<Uuid>,
    /// Parent event.
    pub event_id: Uuid,
    /// Total charged amount.
    pub total_amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Status text.
    pub status: String,
    /// Payment method text.
    pub payment_method: String,
    /// Unique provider payment reference.
    pub payment_reference: String,
    /// Guest contact name.
    pub guest_name: Option<String>,
    /// Guest contact email.
    pub guest_email: Option<String>,
    /// Guest contact phone.
    pub guest_phone: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl OrderRow {
    /// Converts the row into the domain order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] when a stored status or method
    /// string is not part of the domain vocabulary.
    pub fn into_order(self) -> Result<Order, GatewayError> {
        let status = OrderStatus::parse(&self.status)
            .ok_or_else(|| GatewayError::Internal(format!("bad order status: {}", self.status)))?;
        let payment_method = PaymentMethod::parse(&self.payment_method).ok_or_else(|| {
            GatewayError::Internal(format!("bad payment method: {}", self.payment_method))
        })?;

        let guest_contact = self.guest_email.map(|email| CustomerContact {
            name: self.guest_name.unwrap_or_default(),
            email,
            phone: self.guest_phone,
        });

        Ok(Order {
            id: self.id.into(),
            user_id: self.user_id,
            event_id: self.event_id.into(),
            total_amount: self.total_amount,
            currency: self.currency,
            status,
            payment_method,
            payment_reference: self.payment_reference,
            guest_contact,
            created_at: self.created_at,
        })
    }
}

/// Row from the `order_items` table.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    /// Item id.
    pub id: Uuid,
    /// Parent order.
    pub order_id: Uuid,
    /// Ticket type purchased.
    pub ticket_type_id: Uuid,
    /// Purchased quantity.
    pub quantity: i32,
    /// Unit-price snapshot.
    pub unit_price: Decimal,
    /// Line total.
    pub line_total: Decimal,
}

impl OrderItemRow {
    /// Converts the row into the domain order item.
    #[must_use]
    pub fn into_item(self) -> OrderItem {
        OrderItem {
            id: self.id,
            order_id: self.order_id.into(),
            ticket_type_id: self.ticket_type_id.into(),
            quantity: u32::try_from(self.quantity).unwrap_or(0),
            unit_price: self.unit_price,
            line_total: self.line_total,
        }
    }
}

/// Row from the `tickets` table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    /// Ticket id.
    pub id: Uuid,
    /// Parent order item.
    pub order_item_id: Uuid,
    /// Ticket type for inventory attribution.
    pub ticket_type_id: Uuid,
    /// Event the ticket admits to.
    pub event_id: Uuid,
    /// Owning user, NULL for guests.
    pub user_id: Option<Uuid>,
    /// Unique QR payload.
    pub qr_payload: String,
    /// Status text.
    pub status: String,
    /// Scan timestamp.
    pub used_at: Option<DateTime<Utc>>,
}

impl TicketRow {
    /// Converts the row into the domain ticket.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] on an unknown status string.
    pub fn into_ticket(self) -> Result<Ticket, GatewayError> {
        let status = TicketStatus::parse(&self.status)
            .ok_or_else(|| GatewayError::Internal(format!("bad ticket status: {}", self.status)))?;
        Ok(Ticket {
            id: self.id.into(),
            order_item_id: self.order_item_id,
            ticket_type_id: self.ticket_type_id.into(),
            event_id: self.event_id.into(),
            user_id: self.user_id,
            qr_payload: self.qr_payload,
            status,
            used_at: self.used_at,
        })
    }
}

/// Row from the `ticket_types` table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketTypeRow {
    /// Ticket type id.
    pub id: Uuid,
    /// Parent event.
    pub event_id: Uuid,
    /// Tier name.
    pub name: String,
    /// Unit price.
    pub unit_price: Decimal,
    /// Capacity ceiling.
    pub quantity_total: i32,
    /// Units issued, net of refunds.
    pub quantity_sold: i32,
    /// Whether the tier is purchasable.
    pub active: bool,
    /// Sale window start.
    pub sales_start: Option<DateTime<Utc>>,
    /// Sale window end.
    pub sales_end: Option<DateTime<Utc>>,
}

impl TicketTypeRow {
    /// Converts the row into the domain ticket type.
    #[must_use]
    pub fn into_ticket_type(self) -> TicketType {
        TicketType {
            id: TicketTypeId::from_uuid(self.id),
            event_id: self.event_id.into(),
            name: self.name,
            unit_price: self.unit_price,
            quantity_total: u32::try_from(self.quantity_total).unwrap_or(0),
            quantity_sold: u32::try_from(self.quantity_sold).unwrap_or(0),
            active: self.active,
            sales_start: self.sales_start,
            sales_end: self.sales_end,
        }
    }
}
