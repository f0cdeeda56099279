use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staybook_shared::{Booking, HotelSummary, RoomSummary};

/// Guest-supplied input for a new booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub hotel_id: Uuid,
    pub room_type_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guest_count")]
    pub guest_count: u32,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    #[serde(default)]
    pub special_requests: Option<String>,
}

fn default_guest_count() -> u32 {
    1
}

/// A freshly held booking with the summaries a client needs to render it.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub hotel: HotelSummary,
    pub room: RoomSummary,
    /// When the room hold lapses unless payment confirms the booking.
    pub lock_expires_at: DateTime<Utc>,
}

/// What a payment notification did.
#[derive(Debug, Clone)]
pub enum NotificationOutcome {
    Confirmed(Booking),
    /// The payment was already completed and its booking already moved on.
    AlreadyProcessed,
    /// Gateway status, or `amount_mismatch`.
    PaymentNotSuccessful(String),
    Ignored(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitialization {
    pub reference: String,
    pub access_code: Option<String>,
    pub authorization_url: Option<String>,
    pub amount: i64,
    pub currency: String,
}

/// Inbound webhook envelope `{event, data: {reference, ...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}
