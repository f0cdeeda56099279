use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use staybook_core::payment::{
    GatewayStatus, InitializeTransaction, InitializedTransaction, PaymentGateway, VerifiedTransaction,
};
use staybook_core::{BookingError, BookingResult};

/// Paystack-compatible transaction API over HTTPS.
#[derive(Clone)]
pub struct PaystackClient {
    http: Client,
    base_url: String,
    secret_key: String,
}

/// Every response is wrapped as `{ status, message, data }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    reference: String,
    status: String,
    amount: Option<i64>,
}

impl PaystackClient {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> BookingResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| BookingError::upstream(format!("payment gateway client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    async fn read_body(response: reqwest::Response, action: &str) -> BookingResult<Value> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| BookingError::upstream(format!("payment gateway {}: {}", action, e)))?;

        if !status.is_success() {
            error!(%status, action, "payment gateway rejected request");
            let message = body["message"].as_str().unwrap_or("request rejected");
            return Err(BookingError::upstream(format!("payment gateway {}: {}", action, message)));
        }
        Ok(body)
    }
}

fn unwrap_envelope<T>(envelope: Envelope<T>, action: &str) -> BookingResult<T> {
    if !envelope.status {
        return Err(BookingError::upstream(format!("payment gateway {}: {}", action, envelope.message)));
    }
    envelope
        .data
        .ok_or_else(|| BookingError::upstream(format!("payment gateway {}: empty response", action)))
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(&self, request: &InitializeTransaction) -> BookingResult<InitializedTransaction> {
        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(request)
            .send()
            .await
            .map_err(|e| BookingError::upstream(format!("payment gateway initialize: {}", e)))?;

        let body = Self::read_body(response, "initialize").await?;
        let envelope: Envelope<InitializedTransaction> = serde_json::from_value(body)?;
        let data = unwrap_envelope(envelope, "initialize")?;

        info!(reference = %data.reference, "payment transaction initialized");
        Ok(data)
    }

    async fn verify(&self, reference: &str) -> BookingResult<VerifiedTransaction> {
        let response = self
            .http
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| BookingError::upstream(format!("payment gateway verify: {}", e)))?;

        let body = Self::read_body(response, "verify").await?;
        let raw = body.get("data").cloned().unwrap_or(Value::Null);
        let envelope: Envelope<VerifyData> = serde_json::from_value(body)?;
        let data = unwrap_envelope(envelope, "verify")?;

        Ok(VerifiedTransaction {
            reference: data.reference,
            status: GatewayStatus::parse(&data.status),
            amount: data.amount,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_envelope_is_upstream() {
        let envelope: Envelope<VerifyData> =
            serde_json::from_str(r#"{"status": false, "message": "Transaction reference not found"}"#).unwrap();
        let err = unwrap_envelope(envelope, "verify").unwrap_err();
        assert!(matches!(err, BookingError::Upstream(msg) if msg.contains("reference not found")));
    }

    #[test]
    fn test_verify_envelope_parses() {
        let envelope: Envelope<VerifyData> = serde_json::from_str(
            r#"{"status": true, "message": "ok", "data": {"reference": "PAY-BS-2025-AB12C", "status": "success", "amount": 8080000}}"#,
        )
        .unwrap();
        let data = unwrap_envelope(envelope, "verify").unwrap();
        assert_eq!(data.amount, Some(8_080_000));
        assert!(GatewayStatus::parse(&data.status).is_success());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = PaystackClient::new("https://api.paystack.co/", "sk").unwrap();
        assert_eq!(client.base_url, "https://api.paystack.co");
    }
}
