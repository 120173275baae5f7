//! Stripe integration: signed webhooks plus Checkout Session polling.
//!
//! Push path: [`StripeProvider::parse_webhook`] verifies the
//! `Stripe-Signature` header (HMAC-SHA256 over `"{timestamp}.{body}"`,
//! constant-time comparison, bounded clock skew) before trusting a single
//! byte of the payload. Poll path: [`PaymentProvider::lookup`] fetches the
//! Checkout Session by id and normalizes its `payment_status`.

use std::collections::HashMap;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use sha2::Sha256;

use super::PaymentProvider;
use crate::config::StripeConfig;
use crate::domain::{PaymentStatus, ProviderCharge, PurchaseIntent};
use crate::error::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Stripe API client and webhook verifier.
#[derive(Debug)]
pub struct StripeProvider {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    api_base: String,
    signature_tolerance_secs: i64,
}

/// Wire shape of a Stripe webhook event (the subset we consume).
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    // Shape depends on the event type; decoded per type in parse_webhook.
    object: serde_json::Value,
}

/// Wire shape of a Checkout Session (the subset we consume).
#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    payment_intent: Option<String>,
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    payment_status: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Wire shape of a PaymentIntent (the subset we consume).
#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    status: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl StripeProvider {
    /// Creates a provider from configuration, sharing the given HTTP
    /// client.
    #[must_use]
    pub fn new(config: &StripeConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            signature_tolerance_secs: config.signature_tolerance_secs,
        }
    }

    /// Verifies a `Stripe-Signature` header against the raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SignatureInvalid`] on a malformed header,
    /// a timestamp outside the tolerance window, or an HMAC mismatch.
    pub fn verify_signature(&self, payload: &[u8], header: &str) -> Result<(), GatewayError> {
        self.verify_signature_at(payload, header, chrono::Utc::now().timestamp())
    }

    /// Signature verification with an injectable clock.
    ///
    /// # Errors
    ///
    /// See [`Self::verify_signature`].
    pub fn verify_signature_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<(), GatewayError> {
        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = value.parse().ok();
                }
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| GatewayError::SignatureInvalid("missing timestamp".to_string()))?;
        if candidates.is_empty() {
            return Err(GatewayError::SignatureInvalid(
                "missing v1 signature".to_string(),
            ));
        }

        if (now - timestamp).abs() > self.signature_tolerance_secs {
            return Err(GatewayError::SignatureInvalid(
                "timestamp outside tolerance".to_string(),
            ));
        }

        for candidate in candidates {
            let Ok(expected) = hex::decode(candidate) else {
                continue;
            };
            let Ok(mut mac) = HmacSha256::new_from_slice(self.webhook_secret.as_bytes()) else {
                continue;
            };
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            // verify_slice is a constant-time comparison.
            if mac.verify_slice(&expected).is_ok() {
                return Ok(());
            }
        }

        Err(GatewayError::SignatureInvalid(
            "no matching v1 signature".to_string(),
        ))
    }

    /// Verifies and parses a webhook delivery into a normalized charge.
    ///
    /// `checkout.session.completed`,
    /// `checkout.session.async_payment_succeeded`, and
    /// `payment_intent.succeeded` carry a settle-able payment; other
    /// event types are returned as `Ok(None)` and acknowledged without
    /// side effects.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SignatureInvalid`] before any parsing when
    /// the signature does not verify, and [`GatewayError::Validation`]
    /// when the payload is not a well-formed event.
    pub fn parse_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<Option<ProviderCharge>, GatewayError> {
        self.parse_webhook_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Webhook parsing with an injectable clock.
    ///
    /// # Errors
    ///
    /// See [`Self::parse_webhook`].
    pub fn parse_webhook_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<Option<ProviderCharge>, GatewayError> {
        self.verify_signature_at(payload, signature_header, now)?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::Validation(format!("malformed webhook payload: {e}")))?;

        match event.event_type.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                let session: CheckoutSession =
                    serde_json::from_value(event.data.object).map_err(|e| {
                        GatewayError::Validation(format!("malformed checkout session: {e}"))
                    })?;
                Ok(Some(Self::normalize_session(session)))
            }
            "payment_intent.succeeded" => {
                let payment_intent: PaymentIntentObject =
                    serde_json::from_value(event.data.object).map_err(|e| {
                        GatewayError::Validation(format!("malformed payment intent: {e}"))
                    })?;
                Ok(Some(Self::normalize_payment_intent(payment_intent)))
            }
            other => {
                tracing::debug!(event_type = %other, "ignoring stripe event");
                Ok(None)
            }
        }
    }

    /// Maps Stripe's `payment_status` vocabulary to the tri-state.
    #[must_use]
    pub fn map_payment_status(status: &str) -> PaymentStatus {
        match status {
            "paid" | "no_payment_required" => PaymentStatus::Succeeded,
            "unpaid" => PaymentStatus::Pending,
            _ => PaymentStatus::Failed,
        }
    }

    /// Maps a PaymentIntent `status` to the tri-state.
    #[must_use]
    pub fn map_intent_status(status: &str) -> PaymentStatus {
        match status {
            "succeeded" => PaymentStatus::Succeeded,
            "canceled" => PaymentStatus::Failed,
            // processing, requires_action, requires_capture, ...
            _ => PaymentStatus::Pending,
        }
    }

    fn normalize_session(session: CheckoutSession) -> ProviderCharge {
        let status = Self::map_payment_status(&session.payment_status);
        let intent = Self::metadata_intent(&session.id, &session.metadata);

        // Amounts arrive in minor units (cents).
        let amount = Decimal::new(session.amount_total.unwrap_or(0), 2);

        ProviderCharge {
            payment_reference: session.id,
            status,
            amount,
            currency: session
                .currency
                .unwrap_or_default()
                .to_ascii_uppercase(),
            intent,
        }
    }

    fn normalize_payment_intent(payment_intent: PaymentIntentObject) -> ProviderCharge {
        let status = Self::map_intent_status(&payment_intent.status);
        let intent = Self::metadata_intent(&payment_intent.id, &payment_intent.metadata);
        let amount = Decimal::new(payment_intent.amount.unwrap_or(0), 2);

        ProviderCharge {
            payment_reference: payment_intent.id,
            status,
            amount,
            currency: payment_intent
                .currency
                .unwrap_or_default()
                .to_ascii_uppercase(),
            intent,
        }
    }

    fn metadata_intent(
        reference: &str,
        metadata: &HashMap<String, String>,
    ) -> Option<PurchaseIntent> {
        if metadata.is_empty() {
            return None;
        }
        match PurchaseIntent::from_metadata(metadata) {
            Ok(intent) => Some(intent),
            Err(reason) => {
                tracing::warn!(payment_ref = %reference, %reason, "unusable payment metadata");
                None
            }
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn lookup(&self, payment_reference: &str) -> Result<ProviderCharge, GatewayError> {
        let url = format!("{}/v1/checkout/sessions/{payment_reference}", self.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("stripe lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "stripe lookup returned {}",
                response.status()
            )));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("stripe lookup body: {e}")))?;

        Ok(Self::normalize_session(session))
    }

    async fn refund(
        &self,
        payment_reference: &str,
        amount: Decimal,
    ) -> Result<(), GatewayError> {
        // The refundable object is the payment intent behind the session.
        let url = format!("{}/v1/checkout/sessions/{payment_reference}", self.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("stripe session fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "stripe session fetch returned {}",
                response.status()
            )));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("stripe session body: {e}")))?;

        let payment_intent = session.payment_intent.ok_or_else(|| {
            GatewayError::Provider("session has no refundable payment intent".to_string())
        })?;

        let minor_units = (amount * Decimal::from(100))
            .to_i64()
            .ok_or_else(|| GatewayError::Provider("refund amount out of range".to_string()))?;

        let mut form = vec![("payment_intent", payment_intent)];
        if minor_units > 0 {
            form.push(("amount", minor_units.to_string()));
        }

        let response = self
            .http
            .post(format!("{}/v1/refunds", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("stripe refund failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "stripe refund returned {} for {payment_reference}",
                response.status()
            )));
        }

        Ok(())
    }
}
