use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use staybook_core::repository::BookingRepository;
use staybook_core::{BookingError, BookingResult, StayInterval};
use staybook_shared::{
    Booking, BookingFilter, BookingStatus, Cancellation, GuestContact, Masked, PricingSnapshot, StaffStamp,
};

use crate::database::{is_unique_violation, map_db_error, parse_column, to_u32};

const REFERENCE_CONSTRAINT: &str = "bookings_reference_key";

const BOOKING_COLUMNS: &str = r#"
    id, reference, guest_id, hotel_id, room_id, room_type_id,
    check_in_date, check_out_date, guest_count,
    guest_name, guest_email, guest_phone, special_requests,
    room_rate, num_nights, subtotal, service_fee, total_amount, commission_rate, commission_amount,
    status, checked_in_at, checked_in_by, checked_out_at, checked_out_by,
    cancelled_at, cancellation_reason, refund_amount, no_show_at,
    created_at, updated_at
"#;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    reference: String,
    guest_id: Uuid,
    hotel_id: Uuid,
    room_id: Uuid,
    room_type_id: Uuid,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
    guest_count: i32,
    guest_name: String,
    guest_email: String,
    guest_phone: String,
    special_requests: Option<String>,
    room_rate: i64,
    num_nights: i32,
    subtotal: i64,
    service_fee: i64,
    total_amount: i64,
    commission_rate: f64,
    commission_amount: i64,
    status: String,
    checked_in_at: Option<DateTime<Utc>>,
    checked_in_by: Option<Uuid>,
    checked_out_at: Option<DateTime<Utc>>,
    checked_out_by: Option<Uuid>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    refund_amount: Option<i64>,
    no_show_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn stamp(at: Option<DateTime<Utc>>, by: Option<Uuid>) -> Option<StaffStamp> {
    match (at, by) {
        (Some(at), Some(by)) => Some(StaffStamp { by, at }),
        _ => None,
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let cancellation = row.cancelled_at.map(|at| Cancellation {
            at,
            reason: row.cancellation_reason.clone(),
            refund_amount: row.refund_amount.unwrap_or(0),
        });

        Ok(Booking {
            id: row.id,
            reference: row.reference,
            guest_id: row.guest_id,
            hotel_id: row.hotel_id,
            room_id: row.room_id,
            room_type_id: row.room_type_id,
            check_in: row.check_in_date,
            check_out: row.check_out_date,
            guest_count: to_u32(row.guest_count, "guest_count")?,
            contact: GuestContact {
                name: row.guest_name,
                email: Masked::new(row.guest_email),
                phone: Masked::new(row.guest_phone),
            },
            special_requests: row.special_requests,
            pricing: PricingSnapshot {
                room_rate: row.room_rate,
                nights: to_u32(row.num_nights, "num_nights")?,
                subtotal: row.subtotal,
                service_fee: row.service_fee,
                total: row.total_amount,
                commission_rate: row.commission_rate,
                commission_amount: row.commission_amount,
            },
            status: parse_column(&row.status)?,
            checked_in: stamp(row.checked_in_at, row.checked_in_by),
            checked_out: stamp(row.checked_out_at, row.checked_out_by),
            cancellation,
            no_show_at: row.no_show_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn collect(rows: Vec<BookingRow>) -> BookingResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

fn as_i32(value: u32, column: &str) -> BookingResult<i32> {
    i32::try_from(value).map_err(|_| BookingError::invalid(format!("{} out of range", column)))
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn insert(&self, booking: &Booking) -> BookingResult<()> {
        let sql = format!(
            "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31)",
            BOOKING_COLUMNS
        );
        let p = &booking.pricing;

        sqlx::query(&sql)
            .bind(booking.id)
            .bind(&booking.reference)
            .bind(booking.guest_id)
            .bind(booking.hotel_id)
            .bind(booking.room_id)
            .bind(booking.room_type_id)
            .bind(booking.check_in)
            .bind(booking.check_out)
            .bind(as_i32(booking.guest_count, "guest_count")?)
            .bind(&booking.contact.name)
            .bind(booking.contact.email.expose())
            .bind(booking.contact.phone.expose())
            .bind(&booking.special_requests)
            .bind(p.room_rate)
            .bind(as_i32(p.nights, "num_nights")?)
            .bind(p.subtotal)
            .bind(p.service_fee)
            .bind(p.total)
            .bind(p.commission_rate)
            .bind(p.commission_amount)
            .bind(booking.status.as_str())
            .bind(booking.checked_in.map(|s| s.at))
            .bind(booking.checked_in.map(|s| s.by))
            .bind(booking.checked_out.map(|s| s.at))
            .bind(booking.checked_out.map(|s| s.by))
            .bind(booking.cancellation.as_ref().map(|c| c.at))
            .bind(booking.cancellation.as_ref().and_then(|c| c.reason.clone()))
            .bind(booking.cancellation.as_ref().map(|c| c.refund_amount))
            .bind(booking.no_show_at)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, REFERENCE_CONSTRAINT) {
                    warn!(reference = %booking.reference, "booking reference collision");
                    BookingError::DuplicateReference(booking.reference.clone())
                } else {
                    map_db_error(e)
                }
            })?;

        Ok(())
    }

    async fn get(&self, booking_id: Uuid) -> BookingResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_by_reference(&self, reference: &str) -> BookingResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE reference = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_by_guest(
        &self,
        guest_id: Uuid,
        filter: Option<BookingFilter>,
        today: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        let condition = match filter {
            None => "",
            Some(BookingFilter::Upcoming) => {
                " AND check_in_date >= $2 AND status IN ('CONFIRMED', 'PENDING_PAYMENT')"
            }
            Some(BookingFilter::Past) => " AND status = 'CHECKED_OUT'",
            Some(BookingFilter::Cancelled) => " AND status = 'CANCELLED'",
        };
        let sql = format!(
            "SELECT {} FROM bookings WHERE guest_id = $1{} ORDER BY created_at DESC",
            BOOKING_COLUMNS, condition
        );

        let mut query = sqlx::query_as::<_, BookingRow>(&sql).bind(guest_id);
        if filter == Some(BookingFilter::Upcoming) {
            query = query.bind(today);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(map_db_error)?;
        collect(rows)
    }

    async fn find_conflict(
        &self,
        room_id: Uuid,
        stay: &StayInterval,
        exclude: Option<Uuid>,
    ) -> BookingResult<Option<Booking>> {
        // Half-open: existing.check_in < new.check_out AND existing.check_out > new.check_in
        let sql = format!(
            r#"SELECT {} FROM bookings
            WHERE room_id = $1
              AND status IN ('CONFIRMED', 'CHECKED_IN')
              AND check_in_date < $3
              AND check_out_date > $2
              AND ($4::uuid IS NULL OR id <> $4)
            LIMIT 1"#,
            BOOKING_COLUMNS
        );

        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(room_id)
            .bind(stay.check_in())
            .bind(stay.check_out())
            .bind(exclude)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(Booking::try_from).transpose()
    }

    async fn transition(&self, booking: &Booking, expected: BookingStatus) -> BookingResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = $3,
                checked_in_at = $4, checked_in_by = $5,
                checked_out_at = $6, checked_out_by = $7,
                cancelled_at = $8, cancellation_reason = $9, refund_amount = $10,
                no_show_at = $11,
                updated_at = $12
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(booking.id)
        .bind(expected.as_str())
        .bind(booking.status.as_str())
        .bind(booking.checked_in.map(|s| s.at))
        .bind(booking.checked_in.map(|s| s.by))
        .bind(booking.checked_out.map(|s| s.at))
        .bind(booking.checked_out.map(|s| s.by))
        .bind(booking.cancellation.as_ref().map(|c| c.at))
        .bind(booking.cancellation.as_ref().and_then(|c| c.reason.clone()))
        .bind(booking.cancellation.as_ref().map(|c| c.refund_amount))
        .bind(booking.no_show_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_overdue_confirmed(&self, before: NaiveDate) -> BookingResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE status = 'CONFIRMED' AND check_in_date < $1 ORDER BY check_in_date",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(before)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        collect(rows)
    }
}
