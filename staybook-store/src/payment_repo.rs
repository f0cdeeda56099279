use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use staybook_core::repository::PaymentRepository;
use staybook_core::{BookingError, BookingResult};
use staybook_shared::{Masked, PaymentRecord, PaymentStatus};

use crate::database::{is_unique_violation, map_db_error, parse_column};

pub struct StorePaymentRepository {
    pool: PgPool,
}

impl StorePaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    reference: String,
    access_code: Option<String>,
    authorization_url: Option<String>,
    amount: i64,
    currency: String,
    status: String,
    customer_email: String,
    gateway_response: Option<Value>,
    paid_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = BookingError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            id: row.id,
            booking_id: row.booking_id,
            reference: row.reference,
            access_code: row.access_code,
            authorization_url: row.authorization_url,
            amount: row.amount,
            currency: row.currency,
            status: parse_column(&row.status)?,
            customer_email: Masked::new(row.customer_email),
            gateway_response: row.gateway_response,
            paid_at: row.paid_at,
            failed_at: row.failed_at,
            failure_reason: row.failure_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for StorePaymentRepository {
    async fn insert(&self, payment: &PaymentRecord) -> BookingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, booking_id, reference, access_code, authorization_url, amount, currency,
                status, customer_email, gateway_response, paid_at, failed_at, failure_reason,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(&payment.reference)
        .bind(&payment.access_code)
        .bind(&payment.authorization_url)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.customer_email.expose())
        .bind(&payment.gateway_response)
        .bind(payment.paid_at)
        .bind(payment.failed_at)
        .bind(&payment.failure_reason)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "payments_reference_key") {
                BookingError::conflict(format!("Payment {} already initialized", payment.reference))
            } else {
                map_db_error(e)
            }
        })?;

        Ok(())
    }

    async fn find_by_reference(&self, reference: &str) -> BookingResult<Option<PaymentRecord>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, reference, access_code, authorization_url, amount, currency,
                   status, customer_email, gateway_response, paid_at, failed_at, failure_reason,
                   created_at, updated_at
            FROM payments
            WHERE reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn update(&self, payment: &PaymentRecord, expected: PaymentStatus) -> BookingResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $3,
                gateway_response = $4,
                paid_at = $5,
                failed_at = $6,
                failure_reason = $7,
                updated_at = $8
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(payment.id)
        .bind(expected.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.gateway_response)
        .bind(payment.paid_at)
        .bind(payment.failed_at)
        .bind(&payment.failure_reason)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }
}
