use std::time::Duration;

use anyhow::Context;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::core::config::Settings;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub(crate) enum GatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,
    #[error("payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment gateway rejected the order (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
}

/// Razorpay Orders API client plus the signature checks used on verification
/// and webhooks.
#[derive(Debug, Clone)]
pub(crate) struct RazorpayClient {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
    webhook_secret: String,
    local_orders: bool,
}

impl RazorpayClient {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let razorpay = settings.razorpay();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(razorpay.timeout_seconds))
            .build()
            .context("Failed to build Razorpay HTTP client")?;

        Ok(Self {
            client,
            base_url: razorpay.base_url.clone(),
            key_id: razorpay.key_id.clone(),
            key_secret: razorpay.key_secret.clone(),
            webhook_secret: razorpay.webhook_secret.clone(),
            local_orders: !razorpay.is_configured()
                && !settings.runtime().environment.is_production(),
        })
    }

    pub(crate) fn key_id(&self) -> &str {
        &self.key_id
    }

    pub(crate) fn webhook_secret_configured(&self) -> bool {
        !self.webhook_secret.is_empty()
    }

    /// Creates an INR order and returns the gateway order id. Without keys
    /// outside production a local id is minted instead.
    pub(crate) async fn create_order(
        &self,
        amount_paise: i64,
        receipt: &str,
    ) -> Result<String, GatewayError> {
        if self.key_id.is_empty() || self.key_secret.is_empty() {
            if self.local_orders {
                let order_id = format!("order_local_{}", Uuid::new_v4().simple());
                tracing::warn!(order_id = %order_id, "Razorpay not configured; using local order id");
                return Ok(order_id);
            }
            return Err(GatewayError::NotConfigured);
        }

        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_paise,
                "currency": "INR",
                "receipt": receipt,
                "payment_capture": 1,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected { status: status.as_u16(), body });
        }

        let order: OrderResponse = response.json().await?;
        Ok(order.id)
    }

    /// Checkout signature: HMAC-SHA256(key_secret, "order_id|payment_id").
    pub(crate) fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        let payload = format!("{order_id}|{payment_id}");
        verify_hex_signature(&self.key_secret, payload.as_bytes(), signature)
    }

    pub(crate) fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        verify_hex_signature(&self.webhook_secret, body, signature)
    }
}

#[cfg(test)]
pub(crate) fn sign_hex(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison through `Mac::verify_slice`.
pub(crate) fn verify_hex_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_signature_roundtrip() {
        let signature = sign_hex("key_secret", b"order_abc|pay_xyz");
        assert!(verify_hex_signature("key_secret", b"order_abc|pay_xyz", &signature));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let mut signature = sign_hex("key_secret", b"order_abc|pay_xyz");
        let last = if signature.ends_with('0') { '1' } else { '0' };
        signature.pop();
        signature.push(last);

        assert!(!verify_hex_signature("key_secret", b"order_abc|pay_xyz", &signature));
        let original = sign_hex("key_secret", b"order_abc|pay_xyz");
        assert!(!verify_hex_signature("key_secret", b"order_abc|pay_other", &original));
    }

    #[test]
    fn empty_secret_or_garbage_never_verifies() {
        let signature = sign_hex("", b"payload");
        assert!(!verify_hex_signature("", b"payload", &signature));
        assert!(!verify_hex_signature("secret", b"payload", "not-hex"));
    }
}
