//! Normalized payment vocabulary shared by all providers.
//!
//! Every provider-specific status string is mapped into the tri-state
//! [`PaymentStatus`] before the orchestrator sees it, and every provider
//! record is reduced to a [`ProviderCharge`] carrying the authoritative
//! charged amount plus the [`PurchaseIntent`] metadata recorded at
//! checkout time. Client-supplied data never enters this path.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::order::CustomerContact;
use super::{EventId, TicketTypeId};

/// Normalized outcome of a payment, independent of provider vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Funds captured; fulfillment may proceed.
    Succeeded,
    /// Payment still in flight; the caller should retry later.
    Pending,
    /// Payment declined, expired, or cancelled.
    Failed,
}

/// Payment method selected at checkout; selects the provider that owns
/// the payment reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment settled through Stripe.
    Card,
    /// PayPal order flow.
    Paypal,
}

impl PaymentMethod {
    /// Returns the database/text representation of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Paypal => "paypal",
        }
    }

    /// Parses a stored method string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(Self::Card),
            "paypal" => Some(Self::Paypal),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One purchased line: a ticket type and how many admissions of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PurchasedLine {
    /// Ticket type being purchased.
    pub ticket_type_id: TicketTypeId,
    /// Number of admission units; expands into that many ticket rows.
    pub quantity: u32,
}

/// Purchase metadata recorded with the provider at checkout-intent time
/// and read back from the provider's own record during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseIntent {
    /// Event the purchase belongs to.
    pub event_id: EventId,
    /// Purchasing user, `None` for guest checkouts.
    #[serde(default)]
    pub user_id: Option<uuid::Uuid>,
    /// Contact details for guest checkouts.
    #[serde(default)]
    pub guest_contact: Option<CustomerContact>,
    /// Purchased lines.
    pub lines: Vec<PurchasedLine>,
}

impl PurchaseIntent {
    /// Reconstructs an intent from a provider's string-valued metadata
    /// map (the shape Stripe stores on checkout sessions).
    ///
    /// Expected keys: `event_id` (uuid), optional `user_id` (uuid),
    /// optional `guest_name`/`guest_email`/`guest_phone`, and `lines`
    /// (JSON-encoded array of [`PurchasedLine`]).
    ///
    /// # Errors
    ///
    /// Returns a message describing the first missing or malformed key.
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self, String> {
        let event_id = metadata
            .get("event_id")
            .ok_or("metadata missing event_id")?
            .parse::<EventId>()
            .map_err(|e| format!("metadata event_id is not a uuid: {e}"))?;

        let user_id = metadata
            .get("user_id")
            .map(|v| uuid::Uuid::parse_str(v))
            .transpose()
            .map_err(|e| format!("metadata user_id is not a uuid: {e}"))?;

        let guest_contact = match metadata.get("guest_email") {
            Some(email) => Some(CustomerContact {
                name: metadata.get("guest_name").cloned().unwrap_or_default(),
                email: email.clone(),
                phone: metadata.get("guest_phone").cloned(),
            }),
            None => None,
        };

        let lines: Vec<PurchasedLine> = metadata
            .get("lines")
            .ok_or("metadata missing lines")
            .and_then(|raw| {
                serde_json::from_str(raw).map_err(|_| "metadata lines is not valid JSON")
            })
            .map_err(str::to_string)?;

        Ok(Self {
            event_id,
            user_id,
            guest_contact,
            lines,
        })
    }
}

/// A provider's record of a charge, reduced to what fulfillment needs.
#[derive(Debug, Clone)]
pub struct ProviderCharge {
    /// The provider's identifier for the charge/session; used as the
    /// idempotency key for order creation.
    pub payment_reference: String,
    /// Normalized payment outcome.
    pub status: PaymentStatus,
    /// Authoritative charged amount from the provider's record.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Purchase metadata recorded at checkout, if present.
    pub intent: Option<PurchaseIntent>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn base_metadata() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("event_id".to_string(), EventId::new().to_string());
        let line = PurchasedLine {
            ticket_type_id: TicketTypeId::new(),
            quantity: 2,
        };
        let Ok(lines) = serde_json::to_string(&vec![line]) else {
            panic!("serialize lines");
        };
        m.insert("lines".to_string(), lines);
        m
    }

    #[test]
    fn intent_from_complete_metadata() {
        let mut metadata = base_metadata();
        metadata.insert("guest_name".to_string(), "Ada".to_string());
        metadata.insert("guest_email".to_string(), "ada@example.com".to_string());

        let Ok(intent) = PurchaseIntent::from_metadata(&metadata) else {
            panic!("intent should parse");
        };
        assert_eq!(intent.lines.len(), 1);
        assert!(intent.user_id.is_none());
        let Some(contact) = intent.guest_contact else {
            panic!("guest contact expected");
        };
        assert_eq!(contact.email, "ada@example.com");
    }

    #[test]
    fn intent_rejects_missing_event_id() {
        let mut metadata = base_metadata();
        metadata.remove("event_id");
        let err = PurchaseIntent::from_metadata(&metadata);
        assert!(err.is_err());
    }

    #[test]
    fn intent_rejects_malformed_lines() {
        let mut metadata = base_metadata();
        metadata.insert("lines".to_string(), "not-json".to_string());
        assert!(PurchaseIntent::from_metadata(&metadata).is_err());
    }

    #[test]
    fn payment_method_text_round_trip() {
        for method in [PaymentMethod::Card, PaymentMethod::Paypal] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        // Every stored method must route to a registered provider.
        assert_eq!(PaymentMethod::parse("bank_redirect"), None);
        assert_eq!(PaymentMethod::parse("cash"), None);
    }
}
