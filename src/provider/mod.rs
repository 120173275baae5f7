//! Payment provider integrations and the reconciliation contract.
//!
//! Each provider maps its own status vocabulary into the normalized
//! [`crate::domain::PaymentStatus`] tri-state and exposes its charge
//! records as [`crate::domain::ProviderCharge`]. The reconciliation path
//! is read-only; provider state is never mutated except by the refund
//! operation.

pub mod paypal;
pub mod stripe;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{PaymentMethod, ProviderCharge};
use crate::error::GatewayError;

pub use paypal::PaypalProvider;
pub use stripe::StripeProvider;

/// Contract every payment provider implements.
///
/// `lookup` is the poll-style reconciliation path: given the merchant's
/// payment reference, return the provider's authoritative record. Push
/// providers additionally verify and parse webhook deliveries on their
/// concrete type.
#[async_trait]
pub trait PaymentProvider: Send + Sync + std::fmt::Debug {
    /// Stable provider name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the provider exposes a refundable charge object.
    ///
    /// Redirect-only settlement flows return `false`; the refund flow
    /// then skips the monetary refund and only mutates local state.
    fn supports_refund(&self) -> bool {
        true
    }

    /// Fetches the provider's record for the given payment reference and
    /// normalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Provider`] on transport or protocol
    /// failures; status mapping itself never fails.
    async fn lookup(&self, payment_reference: &str) -> Result<ProviderCharge, GatewayError>;

    /// Issues a monetary refund for the given payment reference.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Provider`] if the provider rejects or the
    /// call fails; local state must not be mutated in that case.
    async fn refund(&self, payment_reference: &str, amount: Decimal)
    -> Result<(), GatewayError>;
}

/// Routes a [`PaymentMethod`] to the provider that owns its references.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<PaymentMethod, Arc<dyn PaymentProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider for a payment method, replacing any previous
    /// registration.
    #[must_use]
    pub fn with(mut self, method: PaymentMethod, provider: Arc<dyn PaymentProvider>) -> Self {
        self.providers.insert(method, provider);
        self
    }

    /// Resolves the provider for a payment method.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] when no provider is
    /// registered for the method.
    pub fn for_method(
        &self,
        method: PaymentMethod,
    ) -> Result<Arc<dyn PaymentProvider>, GatewayError> {
        self.providers
            .get(&method)
            .cloned()
            .ok_or_else(|| {
                GatewayError::Validation(format!("unsupported payment method: {method}"))
            })
    }
}
