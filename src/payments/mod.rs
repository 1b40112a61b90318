//! Stripe integration: hosted Checkout Session creation and webhook
//! signature verification.
//!
//! The client speaks Stripe's form-encoded REST API directly rather than
//! pulling in an SDK; the two calls we make do not justify one.

use crate::errors::ServiceError;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{instrument, warn};

type HmacSha256 = Hmac<Sha256>;

/// A line item for a hosted checkout session.
#[derive(Debug, Clone)]
pub struct SessionLineItem {
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Parameters for creating a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub line_items: Vec<SessionLineItem>,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Audit metadata attached to the session: total, name, phone.
    pub metadata: Vec<(String, String)>,
}

/// The subset of Stripe's session object we consume.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("reqwest client construction cannot fail with static options"),
            secret_key,
            api_base,
        }
    }

    /// Create a hosted checkout session. Amounts are converted to cents,
    /// currency is fixed to EUR, payment mode only.
    #[instrument(skip(self, params), fields(items = params.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<CheckoutSession, ServiceError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("payment_method_types[0]".into(), "card".into()),
            ("customer_email".into(), params.customer_email),
            ("success_url".into(), params.success_url),
            ("cancel_url".into(), params.cancel_url),
        ];

        for (idx, item) in params.line_items.iter().enumerate() {
            let cents = to_cents(item.unit_price)?;
            form.push((
                format!("line_items[{idx}][price_data][currency]"),
                "eur".into(),
            ));
            form.push((
                format!("line_items[{idx}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            form.push((
                format!("line_items[{idx}][price_data][unit_amount]"),
                cents.to_string(),
            ));
            form.push((format!("line_items[{idx}][quantity]"), item.quantity.to_string()));
        }

        for (key, value) in params.metadata {
            form.push((format!("metadata[{key}]"), value));
        }

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("stripe: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("stripe returned {}", status));
            warn!(%status, "checkout session creation failed");
            return Err(ServiceError::ExternalServiceError(message));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("stripe: {}", e)))
    }
}

/// Convert a decimal EUR amount to integer cents, rejecting sub-cent
/// precision loss and amounts outside Stripe's range.
fn to_cents(amount: Decimal) -> Result<i64, ServiceError> {
    let cents = (amount * Decimal::from(100)).round();
    cents.to_i64().ok_or_else(|| {
        ServiceError::ValidationError(format!("amount {} out of range", amount))
    })
}

/// Verify a `Stripe-Signature` header (`t=<ts>,v1=<hmac>`) against the raw
/// request body. Fails closed: any missing or malformed part is a reject.
pub fn verify_webhook_signature(
    signature_header: &str,
    payload: &[u8],
    secret: &str,
    tolerance_secs: u64,
) -> bool {
    let mut ts = "";
    let mut v1 = "";
    for part in signature_header.split(',') {
        let mut it = part.trim().splitn(2, '=');
        match (it.next(), it.next()) {
            (Some("t"), Some(val)) => ts = val,
            (Some("v1"), Some(val)) => v1 = val,
            _ => {}
        }
    }
    if ts.is_empty() || v1.is_empty() {
        return false;
    }

    if let Ok(ts_i) = ts.parse::<i64>() {
        let now = chrono::Utc::now().timestamp();
        if (now - ts_i).unsigned_abs() > tolerance_secs {
            return false;
        }
    } else {
        return false;
    }

    let Ok(body) = std::str::from_utf8(payload) else {
        return false;
    };
    let signed = format!("{}.{}", ts, body);
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(signed.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, v1)
}

/// Compute a signature header the way Stripe does. Test helper, also handy
/// for local webhook replays.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signed = format!(
        "{}.{}",
        timestamp,
        std::str::from_utf8(payload).unwrap_or("")
    );
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cents_conversion_rounds() {
        assert_eq!(to_cents(dec!(1499)).unwrap(), 149_900);
        assert_eq!(to_cents(dec!(19.99)).unwrap(), 1_999);
        assert_eq!(to_cents(dec!(0.005)).unwrap(), 0);
    }

    #[test]
    fn signature_round_trip() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign_payload(payload, "whsec_test", chrono::Utc::now().timestamp());
        assert!(verify_webhook_signature(&header, payload, "whsec_test", 300));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = b"{}";
        let header = sign_payload(payload, "whsec_a", chrono::Utc::now().timestamp());
        assert!(!verify_webhook_signature(&header, payload, "whsec_b", 300));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let payload = b"{}";
        let old = chrono::Utc::now().timestamp() - 10_000;
        let header = sign_payload(payload, "whsec_test", old);
        assert!(!verify_webhook_signature(&header, payload, "whsec_test", 300));
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(!verify_webhook_signature("nonsense", b"{}", "whsec_test", 300));
        assert!(!verify_webhook_signature("t=abc,v1=", b"{}", "whsec_test", 300));
    }
}
