use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "FAILED" => Ok(PaymentStatus::Failed),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// Local record of a gateway transaction for a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Gateway transaction reference, `PAY-<booking reference>`.
    pub reference: String,
    pub access_code: Option<String>,
    pub authorization_url: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub customer_email: Masked<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub paid_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn mark_completed(&mut self, gateway_response: serde_json::Value) {
        let now = Utc::now();
        self.status = PaymentStatus::Completed;
        self.paid_at = Some(now);
        self.gateway_response = Some(gateway_response);
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, reason: String, gateway_response: serde_json::Value) {
        let now = Utc::now();
        self.status = PaymentStatus::Failed;
        self.failed_at = Some(now);
        self.failure_reason = Some(reason);
        self.gateway_response = Some(gateway_response);
        self.updated_at = now;
    }
}
