use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Room status, a projection of the furthest-advanced booking on the room.
/// Only the booking orchestrator writes it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Available,
    Locked,
    Booked,
    Occupied,
    Cleaning,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "AVAILABLE",
            RoomStatus::Locked => "LOCKED",
            RoomStatus::Booked => "BOOKED",
            RoomStatus::Occupied => "OCCUPIED",
            RoomStatus::Cleaning => "CLEANING",
            RoomStatus::Maintenance => "MAINTENANCE",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(RoomStatus::Available),
            "LOCKED" => Ok(RoomStatus::Locked),
            "BOOKED" => Ok(RoomStatus::Booked),
            "OCCUPIED" => Ok(RoomStatus::Occupied),
            "CLEANING" => Ok(RoomStatus::Cleaning),
            "MAINTENANCE" => Ok(RoomStatus::Maintenance),
            other => Err(format!("unknown room status: {}", other)),
        }
    }
}

/// A physical unit of a room type within a hotel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub room_type_id: Uuid,
    pub room_number: String,
    pub floor: Option<i32>,
    pub status: RoomStatus,
    pub is_active: bool,
}

/// Denormalized room summary returned alongside a new booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub room_type: String,
    pub room_number: String,
}
