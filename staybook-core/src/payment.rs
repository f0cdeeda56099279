use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::BookingResult;

/// Transaction status as reported by the gateway's verify endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Success,
    Failed,
    Abandoned,
    Pending,
    Reversed,
    Other(String),
}

impl GatewayStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "success" => GatewayStatus::Success,
            "failed" => GatewayStatus::Failed,
            "abandoned" => GatewayStatus::Abandoned,
            "pending" | "ongoing" | "processing" => GatewayStatus::Pending,
            "reversed" => GatewayStatus::Reversed,
            other => GatewayStatus::Other(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        *self == GatewayStatus::Success
    }
}

impl std::fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayStatus::Success => f.write_str("success"),
            GatewayStatus::Failed => f.write_str("failed"),
            GatewayStatus::Abandoned => f.write_str("abandoned"),
            GatewayStatus::Pending => f.write_str("pending"),
            GatewayStatus::Reversed => f.write_str("reversed"),
            GatewayStatus::Other(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// Currency minor units.
    pub amount: i64,
    pub reference: String,
    pub callback_url: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub status: GatewayStatus,
    /// Amount the gateway actually charged, minor units.
    pub amount: Option<i64>,
    pub raw: serde_json::Value,
}

/// Outbound payment gateway. Calls are never retried here.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: &InitializeTransaction) -> BookingResult<InitializedTransaction>;

    /// Authoritative status for a transaction reference.
    async fn verify(&self, reference: &str) -> BookingResult<VerifiedTransaction>;
}
