use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Holder metadata stored under `room_lock:<room_id>`.
///
/// `booking_id` is `None` between acquisition and persistence of the booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomLock {
    pub booking_id: Option<Uuid>,
    pub user_id: Uuid,
    pub locked_at: DateTime<Utc>,
}

impl RoomLock {
    pub fn placeholder(user_id: Uuid) -> Self {
        Self { booking_id: None, user_id, locked_at: Utc::now() }
    }

    pub fn for_booking(booking_id: Uuid, user_id: Uuid) -> Self {
        Self { booking_id: Some(booking_id), user_id, locked_at: Utc::now() }
    }

    pub fn is_held_by(&self, booking_id: Uuid) -> bool {
        self.booking_id == Some(booking_id)
    }
}
