//! Payment confirmation DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CustomerContact, OrderId, PaymentMethod};

/// Request body for `POST /payments/confirm`.
///
/// Only the payment reference and method are trusted from the client;
/// amounts and line items come from the provider's own record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmPaymentRequest {
    /// The provider's identifier for the charge/session.
    pub provider_payment_id: String,
    /// Which provider owns the reference.
    pub payment_method: PaymentMethod,
    /// Purchasing user, if logged in.
    #[serde(default)]
    pub user_id: Option<uuid::Uuid>,
    /// Guest contact fallback when the provider record carries none.
    #[serde(default)]
    pub guest_info: Option<CustomerContact>,
}

/// Response body for `POST /payments/confirm`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmPaymentResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// The fulfilled (or previously fulfilled) order.
    pub order_id: OrderId,
}
