//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::provider::{ProviderRegistry, StripeProvider};
use crate::service::{FulfillmentService, RefundService, TicketService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fulfillment orchestrator.
    pub fulfillment: Arc<FulfillmentService>,
    /// Refund flow.
    pub refunds: Arc<RefundService>,
    /// Check-in flow.
    pub tickets: Arc<TicketService>,
    /// Provider routing for the confirmation API.
    pub providers: Arc<ProviderRegistry>,
    /// Stripe, held concretely for webhook verification.
    pub stripe: Arc<StripeProvider>,
}
