use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pii::Masked;

/// Booking status in the lifecycle.
///
/// `PendingPayment → Confirmed → CheckedIn → CheckedOut`, with `Cancelled`
/// reachable from the two pre-occupancy states and `NoShow` from `Confirmed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    /// Statuses that make a booking a hard conflict for its room and dates.
    pub const BLOCKING: [BookingStatus; 2] = [BookingStatus::Confirmed, BookingStatus::CheckedIn];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "PENDING_PAYMENT",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::CheckedIn => "CHECKED_IN",
            BookingStatus::CheckedOut => "CHECKED_OUT",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled | BookingStatus::NoShow)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(BookingStatus::PendingPayment),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CHECKED_IN" => Ok(BookingStatus::CheckedIn),
            "CHECKED_OUT" => Ok(BookingStatus::CheckedOut),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "NO_SHOW" => Ok(BookingStatus::NoShow),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// Guest contact details captured when the booking is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestContact {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

/// Prices captured at creation time. Amounts are currency minor units.
///
/// Never recomputed after the booking is persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricingSnapshot {
    pub room_rate: i64,
    pub nights: u32,
    pub subtotal: i64,
    pub service_fee: i64,
    pub total: i64,
    /// Percentage, e.g. `10.0` for 10%.
    pub commission_rate: f64,
    pub commission_amount: i64,
}

/// Who moved a booking through a staffed transition, and when.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffStamp {
    pub by: Uuid,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cancellation {
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
    pub refund_amount: i64,
}

/// One guest's reservation of one physical room for `[check_in, check_out)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub guest_id: Uuid,
    pub hotel_id: Uuid,
    pub room_id: Uuid,
    pub room_type_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: u32,
    pub contact: GuestContact,
    pub special_requests: Option<String>,
    pub pricing: PricingSnapshot,
    pub status: BookingStatus,
    pub checked_in: Option<StaffStamp>,
    pub checked_out: Option<StaffStamp>,
    pub cancellation: Option<Cancellation>,
    pub no_show_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn belongs_to(&self, guest_id: Uuid) -> bool {
        self.guest_id == guest_id
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Filter for listing a guest's bookings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingFilter {
    /// Check-in today or later, still pending payment or confirmed.
    Upcoming,
    /// Checked out.
    Past,
    Cancelled,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking, today: NaiveDate) -> bool {
        match self {
            BookingFilter::Upcoming => {
                booking.check_in >= today
                    && matches!(booking.status, BookingStatus::Confirmed | BookingStatus::PendingPayment)
            }
            BookingFilter::Past => booking.status == BookingStatus::CheckedOut,
            BookingFilter::Cancelled => booking.status == BookingStatus::Cancelled,
        }
    }
}
