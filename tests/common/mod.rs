//! Shared test harness: an in-memory `FulfillmentStore` that mirrors the
//! PostgreSQL implementation's atomicity semantics, plus a scripted
//! payment provider.

#![allow(dead_code, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use boxoffice_gateway::domain::{
    EventId, NewOrder, Order, OrderId, OrderItem, OrderStatus, PaymentStatus, ProviderCharge,
    PurchaseIntent, PurchasedLine, Ticket, TicketId, TicketStatus, TicketType, TicketTypeId,
};
use boxoffice_gateway::error::GatewayError;
use boxoffice_gateway::provider::PaymentProvider;
use boxoffice_gateway::store::{CommitOutcome, FulfillmentStore, RefundSummary};

/// In-memory store with the same guard semantics as the Postgres store:
/// unique payment reference, guarded ceiling increments, all-or-nothing
/// commits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    tickets: Vec<Ticket>,
    ticket_types: HashMap<TicketTypeId, TicketType>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a ticket type and returns its id.
    pub async fn seed_ticket_type(&self, unit_price: Decimal, total: u32, sold: u32) -> TicketType {
        let ticket_type = TicketType {
            id: TicketTypeId::new(),
            event_id: EventId::new(),
            name: "General Admission".to_string(),
            unit_price,
            quantity_total: total,
            quantity_sold: sold,
            active: true,
            sales_start: None,
            sales_end: None,
        };
        self.state
            .lock()
            .await
            .ticket_types
            .insert(ticket_type.id, ticket_type.clone());
        ticket_type
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    pub async fn ticket_count(&self) -> usize {
        self.state.lock().await.tickets.len()
    }

    pub async fn quantity_sold(&self, id: TicketTypeId) -> u32 {
        let state = self.state.lock().await;
        state
            .ticket_types
            .get(&id)
            .map_or(0, |t| t.quantity_sold)
    }

    /// Forces a counter value, for exercising the refund floor.
    pub async fn set_quantity_sold(&self, id: TicketTypeId, sold: u32) {
        let mut state = self.state.lock().await;
        if let Some(t) = state.ticket_types.get_mut(&id) {
            t.quantity_sold = sold;
        }
    }
}

#[async_trait]
impl FulfillmentStore for InMemoryStore {
    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn find_order_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> Result<Option<Order>, GatewayError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.payment_reference == payment_reference)
            .cloned())
    }

    async fn ticket_types(
        &self,
        ids: &[TicketTypeId],
    ) -> Result<Vec<TicketType>, GatewayError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.ticket_types.get(id).cloned())
            .collect())
    }

    async fn commit_fulfillment(
        &self,
        order: &NewOrder,
        items: &[OrderItem],
        tickets: &[Ticket],
    ) -> Result<CommitOutcome, GatewayError> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state
            .orders
            .iter()
            .find(|o| o.payment_reference == order.payment_reference)
        {
            return Ok(CommitOutcome::AlreadyFulfilled(existing.clone()));
        }

        // All guards first, then all writes: the commit is atomic.
        for item in items {
            let Some(ticket_type) = state.ticket_types.get(&item.ticket_type_id) else {
                return Err(GatewayError::Internal("unknown ticket type".to_string()));
            };
            if ticket_type.quantity_sold + item.quantity > ticket_type.quantity_total {
                return Err(GatewayError::SoldOut(item.ticket_type_id));
            }
        }

        let created = order.clone().into_order();
        state.orders.push(created.clone());
        state.items.extend(items.iter().cloned());
        state.tickets.extend(tickets.iter().cloned());
        for item in items {
            if let Some(ticket_type) = state.ticket_types.get_mut(&item.ticket_type_id) {
                ticket_type.quantity_sold += item.quantity;
            }
        }

        Ok(CommitOutcome::Created(created))
    }

    async fn load_order(&self, id: OrderId) -> Result<Option<Order>, GatewayError> {
        let state = self.state.lock().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, GatewayError> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .iter()
            .filter(|i| i.order_id == id)
            .cloned()
            .collect())
    }

    async fn order_tickets(&self, id: OrderId) -> Result<Vec<Ticket>, GatewayError> {
        let state = self.state.lock().await;
        let item_ids: Vec<uuid::Uuid> = state
            .items
            .iter()
            .filter(|i| i.order_id == id)
            .map(|i| i.id)
            .collect();
        Ok(state
            .tickets
            .iter()
            .filter(|t| item_ids.contains(&t.order_item_id))
            .cloned()
            .collect())
    }

    async fn commit_refund(&self, id: OrderId) -> Result<RefundSummary, GatewayError> {
        let mut state = self.state.lock().await;

        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Err(GatewayError::OrderNotFound(id));
        };
        if order.status != OrderStatus::Paid {
            return Err(GatewayError::NotRefundable {
                id,
                status: order.status,
            });
        }
        order.status = OrderStatus::Refunded;

        let lines: Vec<(TicketTypeId, u32)> = state
            .items
            .iter()
            .filter(|i| i.order_id == id)
            .map(|i| (i.ticket_type_id, i.quantity))
            .collect();
        let item_ids: Vec<uuid::Uuid> = state
            .items
            .iter()
            .filter(|i| i.order_id == id)
            .map(|i| i.id)
            .collect();

        let mut cancelled = 0;
        for ticket in state
            .tickets
            .iter_mut()
            .filter(|t| item_ids.contains(&t.order_item_id))
        {
            if ticket.status != TicketStatus::Cancelled {
                ticket.status = TicketStatus::Cancelled;
                cancelled += 1;
            }
        }

        for (ticket_type_id, quantity) in &lines {
            if let Some(ticket_type) = state.ticket_types.get_mut(ticket_type_id) {
                ticket_type.quantity_sold =
                    ticket_type.quantity_sold.saturating_sub(*quantity);
            }
        }

        Ok(RefundSummary {
            order_id: id,
            tickets_cancelled: cancelled,
            restored: lines,
        })
    }

    async fn find_ticket_by_qr(&self, qr_payload: &str) -> Result<Option<Ticket>, GatewayError> {
        let state = self.state.lock().await;
        Ok(state
            .tickets
            .iter()
            .find(|t| t.qr_payload == qr_payload)
            .cloned())
    }

    async fn mark_ticket_used(
        &self,
        id: TicketId,
        at: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        let mut state = self.state.lock().await;
        let Some(ticket) = state.tickets.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        if ticket.status != TicketStatus::Valid {
            return Ok(false);
        }
        ticket.status = TicketStatus::Used;
        ticket.used_at = Some(at);
        Ok(true)
    }
}

/// Provider whose refund behavior is scripted per test.
#[derive(Debug)]
pub struct ScriptedProvider {
    pub refundable: bool,
    pub fail_refund: bool,
    pub refund_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn refundable() -> Self {
        Self {
            refundable: true,
            fail_refund: false,
            refund_calls: AtomicUsize::new(0),
        }
    }

    pub fn redirect_only() -> Self {
        Self {
            refundable: false,
            fail_refund: false,
            refund_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            refundable: true,
            fail_refund: true,
            refund_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.refund_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn supports_refund(&self) -> bool {
        self.refundable
    }

    async fn lookup(&self, _payment_reference: &str) -> Result<ProviderCharge, GatewayError> {
        Err(GatewayError::Provider("lookup not scripted".to_string()))
    }

    async fn refund(
        &self,
        _payment_reference: &str,
        _amount: Decimal,
    ) -> Result<(), GatewayError> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refund {
            return Err(GatewayError::Provider("refund rejected".to_string()));
        }
        Ok(())
    }
}

/// Builds a succeeded charge for the given reference and lines.
pub fn succeeded_charge(
    payment_reference: &str,
    event_id: EventId,
    lines: Vec<PurchasedLine>,
    amount: Decimal,
) -> ProviderCharge {
    ProviderCharge {
        payment_reference: payment_reference.to_string(),
        status: PaymentStatus::Succeeded,
        amount,
        currency: "USD".to_string(),
        intent: Some(PurchaseIntent {
            event_id,
            user_id: None,
            guest_contact: None,
            lines,
        }),
    }
}

pub fn line(ticket_type_id: TicketTypeId, quantity: u32) -> PurchasedLine {
    PurchasedLine {
        ticket_type_id,
        quantity,
    }
}

pub fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}
