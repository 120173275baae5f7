//! Order aggregate and guest contact snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, OrderId, PaymentMethod};

/// Lifecycle status of an order.
///
/// Orders created by the fulfillment flow start directly at [`Self::Paid`]
/// since they only exist once a payment has been confirmed. The
/// `Paid → Refunded` transition is driven by the admin refund flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment not yet confirmed (reserved for checkout-intent flows).
    Pending,
    /// Payment confirmed, tickets issued.
    Paid,
    /// Order cancelled before payment.
    Cancelled,
    /// Payment refunded, tickets cancelled.
    Refunded,
}

impl OrderStatus {
    /// Returns the database/text representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Parses a stored status string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// Contact details snapshotted onto guest orders.
///
/// Guest purchases have no user row to join against, so the contact info
/// captured by the payment provider is stored on the order itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomerContact {
    /// Full name of the purchaser.
    pub name: String,
    /// Email address used for ticket delivery.
    pub email: String,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerContact {
    /// Checks the minimal contact contract: a non-empty name and a
    /// plausible email address.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
            && self.email.contains('@')
            && !self.email.trim().is_empty()
    }
}

/// A fully materialized order row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Order {
    /// Order identifier.
    pub id: OrderId,
    /// Purchasing user, `None` for guest orders.
    pub user_id: Option<uuid::Uuid>,
    /// Event the tickets belong to.
    pub event_id: EventId,
    /// Total charged amount, taken from the provider's record.
    pub total_amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Payment method used at checkout.
    pub payment_method: PaymentMethod,
    /// Provider payment reference; unique across all orders and used as
    /// the idempotency key for fulfillment.
    pub payment_reference: String,
    /// Contact snapshot for guest orders.
    pub guest_contact: Option<CustomerContact>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an order; becomes an [`Order`] with status
/// [`OrderStatus::Paid`] once the fulfillment transaction commits.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Pre-generated order identifier.
    pub id: OrderId,
    /// Purchasing user, `None` for guest orders.
    pub user_id: Option<uuid::Uuid>,
    /// Event the tickets belong to.
    pub event_id: EventId,
    /// Total charged amount from the provider's authoritative record,
    /// never from client-supplied metadata.
    pub total_amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Payment method used at checkout.
    pub payment_method: PaymentMethod,
    /// Provider payment reference (idempotency key).
    pub payment_reference: String,
    /// Contact snapshot for guest orders.
    pub guest_contact: Option<CustomerContact>,
    /// Creation timestamp, assigned by the orchestrator.
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Converts the payload into the order it will become on commit.
    #[must_use]
    pub fn into_order(self) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            event_id: self.event_id,
            total_amount: self.total_amount,
            currency: self.currency,
            status: OrderStatus::Paid,
            payment_method: self.payment_method,
            payment_reference: self.payment_reference,
            guest_contact: self.guest_contact,
            created_at: self.created_at,
        }
    }
}
