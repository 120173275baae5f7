//! PostgreSQL implementation of the fulfillment store.
//!
//! All multi-row writes run inside a single transaction. Inventory
//! counters are only ever touched through guarded `UPDATE` statements
//! computed by the database, never read-modify-write in application
//! memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{OrderItemRow, OrderRow, TicketRow, TicketTypeRow};
use super::{CommitOutcome, FulfillmentStore, RefundSummary};
use crate::domain::{
    NewOrder, Order, OrderId, OrderItem, Ticket, TicketId, TicketStatus, TicketType, TicketTypeId,
};
use crate::error::GatewayError;

/// PostgreSQL-backed fulfillment store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

const SELECT_ORDER: &str = "SELECT id, user_id, event_id, total_amount, currency, status, \
     payment_method, payment_reference, guest_name, guest_email, guest_phone, created_at \
     FROM orders";

const SELECT_TICKET: &str = "SELECT id, order_item_id, ticket_type_id, event_id, user_id, \
     qr_payload, status, used_at FROM tickets";

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FulfillmentStore for PostgresStore {
    async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_order_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> Result<Option<Order>, GatewayError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} WHERE payment_reference = $1"
        ))
        .bind(payment_reference)
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn ticket_types(
        &self,
        ids: &[TicketTypeId],
    ) -> Result<Vec<TicketType>, GatewayError> {
        let raw: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, TicketTypeRow>(
            "SELECT id, event_id, name, unit_price, quantity_total, quantity_sold, active, \
             sales_start, sales_end FROM ticket_types WHERE id = ANY($1)",
        )
        .bind(&raw)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TicketTypeRow::into_ticket_type).collect())
    }

    async fn commit_fulfillment(
        &self,
        order: &NewOrder,
        items: &[OrderItem],
        tickets: &[Ticket],
    ) -> Result<CommitOutcome, GatewayError> {
        let mut tx = self.pool.begin().await?;

        // Unique payment_reference index is the idempotency guard: a
        // duplicate delivery lands on the conflict arm, writes nothing.
        let inserted = sqlx::query(
            "INSERT INTO orders (id, user_id, event_id, total_amount, currency, status, \
             payment_method, payment_reference, guest_name, guest_email, guest_phone, created_at) \
             VALUES ($1, $2, $3, $4, $5, 'paid', $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (payment_reference) DO NOTHING",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id)
        .bind(order.event_id.as_uuid())
        .bind(order.total_amount)
        .bind(&order.currency)
        .bind(order.payment_method.as_str())
        .bind(&order.payment_reference)
        .bind(order.guest_contact.as_ref().map(|c| c.name.clone()))
        .bind(order.guest_contact.as_ref().map(|c| c.email.clone()))
        .bind(order.guest_contact.as_ref().and_then(|c| c.phone.clone()))
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            let existing = self
                .find_order_by_payment_reference(&order.payment_reference)
                .await?
                .ok_or_else(|| {
                    GatewayError::Internal(
                        "payment reference conflict without existing order".to_string(),
                    )
                })?;
            return Ok(CommitOutcome::AlreadyFulfilled(existing));
        }

        for item in items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, ticket_type_id, quantity, unit_price, \
                 line_total) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(item.id)
            .bind(item.order_id.as_uuid())
            .bind(item.ticket_type_id.as_uuid())
            .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
            .bind(item.unit_price)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;
        }

        for ticket in tickets {
            sqlx::query(
                "INSERT INTO tickets (id, order_item_id, ticket_type_id, event_id, user_id, \
                 qr_payload, status, used_at) VALUES ($1, $2, $3, $4, $5, $6, 'valid', NULL)",
            )
            .bind(ticket.id.as_uuid())
            .bind(ticket.order_item_id)
            .bind(ticket.ticket_type_id.as_uuid())
            .bind(ticket.event_id.as_uuid())
            .bind(ticket.user_id)
            .bind(&ticket.qr_payload)
            .execute(&mut *tx)
            .await?;
        }

        // Guarded increment: the ceiling check and the add are one
        // statement, so concurrent fulfillments can never oversell or
        // lose an update. A miss rolls the whole transaction back.
        for item in items {
            let qty = i32::try_from(item.quantity).unwrap_or(i32::MAX);
            let updated = sqlx::query(
                "UPDATE ticket_types SET quantity_sold = quantity_sold + $2 \
                 WHERE id = $1 AND quantity_sold + $2 <= quantity_total",
            )
            .bind(item.ticket_type_id.as_uuid())
            .bind(qty)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(GatewayError::SoldOut(item.ticket_type_id));
            }
        }

        tx.commit().await?;
        Ok(CommitOutcome::Created(order.clone().into_order()))
    }

    async fn load_order(&self, id: OrderId) -> Result<Option<Order>, GatewayError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, GatewayError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, ticket_type_id, quantity, unit_price, line_total \
             FROM order_items WHERE order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItemRow::into_item).collect())
    }

    async fn order_tickets(&self, id: OrderId) -> Result<Vec<Ticket>, GatewayError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "{SELECT_TICKET} WHERE order_item_id IN \
             (SELECT id FROM order_items WHERE order_id = $1)"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TicketRow::into_ticket).collect()
    }

    async fn commit_refund(&self, id: OrderId) -> Result<RefundSummary, GatewayError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE orders SET status = 'refunded' WHERE id = $1 AND status = 'paid'",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            // Distinguish missing from not-refundable for the caller.
            return match self.load_order(id).await? {
                None => Err(GatewayError::OrderNotFound(id)),
                Some(order) => Err(GatewayError::NotRefundable {
                    id,
                    status: order.status,
                }),
            };
        }

        let lines: Vec<(Uuid, i32)> = sqlx::query_as(
            "SELECT ticket_type_id, quantity FROM order_items WHERE order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await?;

        let cancelled = sqlx::query(
            "UPDATE tickets SET status = 'cancelled' WHERE order_item_id IN \
             (SELECT id FROM order_items WHERE order_id = $1) AND status <> 'cancelled'",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;

        let mut restored = Vec::with_capacity(lines.len());
        for (ticket_type_id, quantity) in lines {
            // Floored at zero so a refund can never underflow the counter.
            sqlx::query(
                "UPDATE ticket_types SET quantity_sold = GREATEST(quantity_sold - $2, 0) \
                 WHERE id = $1",
            )
            .bind(ticket_type_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
            restored.push((
                TicketTypeId::from_uuid(ticket_type_id),
                u32::try_from(quantity).unwrap_or(0),
            ));
        }

        tx.commit().await?;
        Ok(RefundSummary {
            order_id: id,
            tickets_cancelled: cancelled.rows_affected(),
            restored,
        })
    }

    async fn find_ticket_by_qr(&self, qr_payload: &str) -> Result<Option<Ticket>, GatewayError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "{SELECT_TICKET} WHERE qr_payload = $1"
        ))
        .bind(qr_payload)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TicketRow::into_ticket).transpose()
    }

    async fn mark_ticket_used(
        &self,
        id: TicketId,
        at: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        let updated = sqlx::query(
            "UPDATE tickets SET status = $2, used_at = $3 WHERE id = $1 AND status = 'valid'",
        )
        .bind(id.as_uuid())
        .bind(TicketStatus::Used.as_str())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(updated.rows_affected() > 0)
    }
}
