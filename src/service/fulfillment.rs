//! Fulfillment orchestrator: from a normalized payment outcome to a
//! committed order with issued tickets.
//!
//! Per payment reference the flow is: status gate, metadata validation,
//! issuance planning (price snapshots, ticket fan-out), then a single
//! atomic store commit. Idempotency rests on the store's unique
//! payment-reference index; a duplicate delivery returns the existing
//! order id and writes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    NewOrder, Order, OrderId, OrderItem, PaymentMethod, PaymentStatus, ProviderCharge,
    PurchaseIntent, Ticket, TicketType, TicketTypeId,
};
use crate::error::GatewayError;
use crate::store::{CommitOutcome, FulfillmentStore};

/// Orchestrates order fulfillment after a confirmed payment.
#[derive(Debug, Clone)]
pub struct FulfillmentService {
    store: Arc<dyn FulfillmentStore>,
}

impl FulfillmentService {
    /// Creates a new service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn FulfillmentStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn FulfillmentStore> {
        &self.store
    }

    /// Fulfills a reconciled charge: creates the order, issues tickets,
    /// and updates inventory, all exactly once per payment reference.
    ///
    /// Redelivery of an already-fulfilled reference succeeds and returns
    /// the existing order without touching storage.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::PaymentPending`] / [`GatewayError::PaymentFailed`]
    ///   when the charge did not succeed; no writes occur.
    /// - [`GatewayError::Validation`] for missing or unusable purchase
    ///   metadata; no writes occur.
    /// - [`GatewayError::SoldOut`] when a guarded inventory increment
    ///   finds no remaining capacity; the transaction rolls back whole.
    /// - [`GatewayError::Database`] on storage failure.
    pub async fn fulfill(
        &self,
        charge: &ProviderCharge,
        method: PaymentMethod,
    ) -> Result<Order, GatewayError> {
        match charge.status {
            PaymentStatus::Succeeded => {}
            PaymentStatus::Pending => {
                return Err(GatewayError::PaymentPending(format!(
                    "payment {} has not settled yet",
                    charge.payment_reference
                )));
            }
            PaymentStatus::Failed => {
                return Err(GatewayError::PaymentFailed(format!(
                    "payment {} was declined or cancelled",
                    charge.payment_reference
                )));
            }
        }

        let intent = charge.intent.as_ref().ok_or_else(|| {
            GatewayError::Validation("charge carries no purchase metadata".to_string())
        })?;
        validate_intent(intent)?;

        // Fast path for provider redeliveries; the unique index still
        // covers the race between this check and the insert.
        if let Some(existing) = self
            .store
            .find_order_by_payment_reference(&charge.payment_reference)
            .await?
        {
            tracing::info!(
                order_id = %existing.id,
                payment_ref = %charge.payment_reference,
                "duplicate delivery, returning existing order"
            );
            return Ok(existing);
        }

        let type_ids: Vec<TicketTypeId> =
            intent.lines.iter().map(|l| l.ticket_type_id).collect();
        let types: HashMap<TicketTypeId, TicketType> = self
            .store
            .ticket_types(&type_ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let order_id = OrderId::new();
        let mut items = Vec::with_capacity(intent.lines.len());
        let mut tickets = Vec::new();

        for line in &intent.lines {
            // An unknown ticket type does not sink the whole order; the
            // line is dropped and flagged for reconciliation.
            let Some(ticket_type) = types.get(&line.ticket_type_id) else {
                tracing::warn!(
                    ticket_type_id = %line.ticket_type_id,
                    payment_ref = %charge.payment_reference,
                    "skipping line with unknown ticket type"
                );
                continue;
            };

            let item = OrderItem::snapshot(
                order_id,
                line.ticket_type_id,
                line.quantity,
                ticket_type.unit_price,
            );
            for _ in 0..line.quantity {
                tickets.push(Ticket::issue(
                    item.id,
                    line.ticket_type_id,
                    intent.event_id,
                    intent.user_id,
                ));
            }
            items.push(item);
        }

        if items.is_empty() {
            return Err(GatewayError::Validation(
                "no fulfillable line items".to_string(),
            ));
        }

        let order = NewOrder {
            id: order_id,
            user_id: intent.user_id,
            event_id: intent.event_id,
            // Authoritative charged amount from the provider record.
            total_amount: charge.amount,
            currency: charge.currency.clone(),
            payment_method: method,
            payment_reference: charge.payment_reference.clone(),
            guest_contact: intent.guest_contact.clone(),
            created_at: Utc::now(),
        };

        match self
            .store
            .commit_fulfillment(&order, &items, &tickets)
            .await?
        {
            CommitOutcome::Created(order) => {
                tracing::info!(
                    order_id = %order.id,
                    payment_ref = %order.payment_reference,
                    tickets = tickets.len(),
                    "order fulfilled"
                );
                Ok(order)
            }
            CommitOutcome::AlreadyFulfilled(existing) => {
                tracing::info!(
                    order_id = %existing.id,
                    payment_ref = %existing.payment_reference,
                    "concurrent delivery lost the insert race, returning existing order"
                );
                Ok(existing)
            }
        }
    }
}

/// Validates the purchase metadata before any write is attempted.
fn validate_intent(intent: &PurchaseIntent) -> Result<(), GatewayError> {
    if intent.lines.is_empty() {
        return Err(GatewayError::Validation(
            "purchase metadata has no line items".to_string(),
        ));
    }
    if intent.lines.iter().any(|l| l.quantity == 0) {
        return Err(GatewayError::Validation(
            "line item quantity must be positive".to_string(),
        ));
    }
    if let Some(contact) = &intent.guest_contact
        && !contact.is_valid()
    {
        return Err(GatewayError::Validation(
            "guest contact requires a name and a valid email".to_string(),
        ));
    }
    Ok(())
}
