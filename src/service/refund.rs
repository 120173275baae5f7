//! Refund flow: the symmetric counter-operation to fulfillment.
//!
//! Ordering contract: the provider-side monetary refund is attempted
//! first; if it fails, nothing local has changed and the operation
//! aborts cleanly. If the subsequent local commit fails, money has moved
//! but tickets are still valid — that state is logged loudly for manual
//! reconciliation before the error propagates.

use std::sync::Arc;

use crate::domain::{OrderId, OrderStatus};
use crate::error::GatewayError;
use crate::provider::ProviderRegistry;
use crate::store::{FulfillmentStore, RefundSummary};

/// Drives order refunds: provider first, then local state.
#[derive(Debug, Clone)]
pub struct RefundService {
    store: Arc<dyn FulfillmentStore>,
    providers: Arc<ProviderRegistry>,
}

impl RefundService {
    /// Creates a new service over the given store and provider registry.
    #[must_use]
    pub fn new(store: Arc<dyn FulfillmentStore>, providers: Arc<ProviderRegistry>) -> Self {
        Self { store, providers }
    }

    /// Refunds a paid order: provider refund, then atomically mark the
    /// order refunded, cancel its tickets, and restore inventory
    /// (floored at zero).
    ///
    /// # Errors
    ///
    /// - [`GatewayError::OrderNotFound`] for an unknown order.
    /// - [`GatewayError::NotRefundable`] when the order is not `paid`.
    /// - [`GatewayError::Provider`] when the provider rejects the
    ///   monetary refund; local state is untouched.
    /// - [`GatewayError::Database`] on storage failure.
    pub async fn refund(&self, order_id: OrderId) -> Result<RefundSummary, GatewayError> {
        let order = self
            .store
            .load_order(order_id)
            .await?
            .ok_or(GatewayError::OrderNotFound(order_id))?;

        if order.status != OrderStatus::Paid {
            return Err(GatewayError::NotRefundable {
                id: order_id,
                status: order.status,
            });
        }

        let provider = self.providers.for_method(order.payment_method)?;
        if provider.supports_refund() {
            provider
                .refund(&order.payment_reference, order.total_amount)
                .await?;
            tracing::info!(
                order_id = %order_id,
                provider = provider.name(),
                amount = %order.total_amount,
                "provider refund issued"
            );
        } else {
            tracing::info!(
                order_id = %order_id,
                provider = provider.name(),
                "provider settles via redirect only, skipping monetary refund"
            );
        }

        match self.store.commit_refund(order_id).await {
            Ok(summary) => {
                tracing::info!(
                    order_id = %order_id,
                    tickets_cancelled = summary.tickets_cancelled,
                    "order refunded"
                );
                Ok(summary)
            }
            Err(e) => {
                // Money has already moved; this order needs manual repair.
                tracing::error!(
                    order_id = %order_id,
                    payment_ref = %order.payment_reference,
                    error = %e,
                    "provider refund issued but local refund commit failed"
                );
                Err(e)
            }
        }
    }
}
