//! PayPal integration: poll-style order lookup and capture refunds.
//!
//! PayPal has no signed push channel in this deployment; the client
//! confirms the approved order through the confirmation API and the
//! gateway polls the Orders API for the authoritative status. Status
//! vocabulary is mapped to the tri-state in [`PaypalProvider::map_status`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::PaymentProvider;
use crate::config::PaypalConfig;
use crate::domain::{PaymentStatus, ProviderCharge, PurchaseIntent};
use crate::error::GatewayError;

/// PayPal REST API client with a cached OAuth token.
#[derive(Debug)]
pub struct PaypalProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Wire shape of a PayPal order (the subset we consume).
#[derive(Debug, Deserialize)]
struct PaypalOrder {
    id: String,
    status: String,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    amount: UnitAmount,
    #[serde(default)]
    custom_id: Option<String>,
    #[serde(default)]
    payments: Option<UnitPayments>,
}

#[derive(Debug, Deserialize)]
struct UnitAmount {
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct UnitPayments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    id: String,
}

impl PaypalProvider {
    /// Creates a provider from configuration, sharing the given HTTP
    /// client.
    #[must_use]
    pub fn new(config: &PaypalConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    /// Maps PayPal's order status vocabulary to the tri-state.
    #[must_use]
    pub fn map_status(status: &str) -> PaymentStatus {
        match status {
            "COMPLETED" => PaymentStatus::Succeeded,
            "CREATED" | "SAVED" | "APPROVED" | "PENDING" | "PAYER_ACTION_REQUIRED" => {
                PaymentStatus::Pending
            }
            // VOIDED, DECLINED, FAILED, CANCELED and anything unknown.
            _ => PaymentStatus::Failed,
        }
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        if let Some(cached) = self.token.read().await.as_ref()
            && cached.expires_at > Utc::now()
        {
            return Ok(cached.access_token.clone());
        }

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("paypal token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "paypal token request returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("paypal token body: {e}")))?;

        // Refresh one minute before the advertised expiry.
        let expires_at = Utc::now() + Duration::seconds((token.expires_in - 60).max(0));
        *self.token.write().await = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<PaypalOrder, GatewayError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}/v2/checkout/orders/{order_id}", self.api_base))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("paypal lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "paypal lookup returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("paypal order body: {e}")))
    }

    fn normalize_order(order: PaypalOrder) -> ProviderCharge {
        let status = Self::map_status(&order.status);
        let unit = order.purchase_units.first();

        let amount = unit
            .and_then(|u| u.amount.value.parse::<Decimal>().ok())
            .unwrap_or_default();
        let currency = unit
            .map(|u| u.amount.currency_code.clone())
            .unwrap_or_default();

        // Purchase metadata travels in the unit's custom_id as JSON.
        let intent = unit
            .and_then(|u| u.custom_id.as_deref())
            .and_then(|raw| match serde_json::from_str::<PurchaseIntent>(raw) {
                Ok(intent) => Some(intent),
                Err(e) => {
                    tracing::warn!(order = %order.id, error = %e, "unusable custom_id metadata");
                    None
                }
            });

        ProviderCharge {
            payment_reference: order.id,
            status,
            amount,
            currency,
            intent,
        }
    }
}

#[async_trait]
impl PaymentProvider for PaypalProvider {
    fn name(&self) -> &'static str {
        "paypal"
    }

    async fn lookup(&self, payment_reference: &str) -> Result<ProviderCharge, GatewayError> {
        let order = self.fetch_order(payment_reference).await?;
        Ok(Self::normalize_order(order))
    }

    async fn refund(
        &self,
        payment_reference: &str,
        _amount: Decimal,
    ) -> Result<(), GatewayError> {
        let order = self.fetch_order(payment_reference).await?;
        let capture_id = order
            .purchase_units
            .first()
            .and_then(|u| u.payments.as_ref())
            .and_then(|p| p.captures.first())
            .map(|c| c.id.clone())
            .ok_or_else(|| {
                GatewayError::Provider(format!(
                    "paypal order {payment_reference} has no capture to refund"
                ))
            })?;

        let token = self.access_token().await?;
        let response = self
            .http
            .post(format!(
                "{}/v2/payments/captures/{capture_id}/refund",
                self.api_base
            ))
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| GatewayError::Provider(format!("paypal refund failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "paypal refund returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
