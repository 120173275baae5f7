//! Persistence layer: the fulfillment store contract and its PostgreSQL
//! implementation.
//!
//! [`FulfillmentStore`] pins down the two atomicity guarantees the
//! workflow depends on: `commit_fulfillment` writes the order, its items,
//! its tickets, and the guarded inventory increments in one transaction,
//! and `commit_refund` applies the symmetric counter-operation the same
//! way. Idempotency is enforced by the unique payment-reference index;
//! an insert conflict is surfaced as [`CommitOutcome::AlreadyFulfilled`],
//! never as an error.

pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    NewOrder, Order, OrderId, OrderItem, Ticket, TicketId, TicketType, TicketTypeId,
};
use crate::error::GatewayError;

pub use postgres::PostgresStore;

/// Result of an atomic fulfillment commit.
#[derive(Debug)]
pub enum CommitOutcome {
    /// The order and all dependent rows were written.
    Created(Order),
    /// Another delivery for the same payment reference got there first;
    /// nothing was written and the existing order is returned.
    AlreadyFulfilled(Order),
}

/// Summary of an applied refund, for logging and the admin response.
#[derive(Debug)]
pub struct RefundSummary {
    /// Refunded order.
    pub order_id: OrderId,
    /// Number of tickets transitioned to `cancelled`.
    pub tickets_cancelled: u64,
    /// Quantity restored per ticket type.
    pub restored: Vec<(TicketTypeId, u32)>,
}

/// Storage contract for the fulfillment and refund workflows.
#[async_trait]
pub trait FulfillmentStore: Send + Sync + std::fmt::Debug {
    /// Cheap connectivity check for health reporting.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] when the backing storage is
    /// unreachable.
    async fn ping(&self) -> Result<(), GatewayError>;

    /// Looks up an order by its provider payment reference.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on storage failure.
    async fn find_order_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> Result<Option<Order>, GatewayError>;

    /// Loads the ticket types with the given ids; missing ids are simply
    /// absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on storage failure.
    async fn ticket_types(
        &self,
        ids: &[TicketTypeId],
    ) -> Result<Vec<TicketType>, GatewayError>;

    /// Atomically writes an order with its items and tickets and applies
    /// the guarded inventory increments.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SoldOut`] when a guarded increment finds
    /// no remaining capacity (the whole transaction rolls back), or
    /// [`GatewayError::Database`] on storage failure.
    async fn commit_fulfillment(
        &self,
        order: &NewOrder,
        items: &[OrderItem],
        tickets: &[Ticket],
    ) -> Result<CommitOutcome, GatewayError>;

    /// Loads an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on storage failure.
    async fn load_order(&self, id: OrderId) -> Result<Option<Order>, GatewayError>;

    /// Loads the items of an order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on storage failure.
    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, GatewayError>;

    /// Loads the tickets of an order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on storage failure.
    async fn order_tickets(&self, id: OrderId) -> Result<Vec<Ticket>, GatewayError>;

    /// Atomically marks a paid order refunded, cancels its tickets, and
    /// restores `quantity_sold` on each ticket type, floored at zero.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::OrderNotFound`] for an unknown order,
    /// [`GatewayError::NotRefundable`] when the order is not `paid`, or
    /// [`GatewayError::Database`] on storage failure.
    async fn commit_refund(&self, id: OrderId) -> Result<RefundSummary, GatewayError>;

    /// Looks up a ticket by its QR payload.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on storage failure.
    async fn find_ticket_by_qr(&self, qr_payload: &str) -> Result<Option<Ticket>, GatewayError>;

    /// Transitions a ticket `valid -> used`, recording the scan time.
    /// Returns `false` when the ticket was not in the `valid` state, in
    /// which case nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on storage failure.
    async fn mark_ticket_used(
        &self,
        id: TicketId,
        at: DateTime<Utc>,
    ) -> Result<bool, GatewayError>;
}
