use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    /// Platform commission percentage, e.g. `10.0`.
    pub commission_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<&Hotel> for HotelSummary {
    fn from(hotel: &Hotel) -> Self {
        Self { id: hotel.id, name: hotel.name.clone() }
    }
}

/// A category of rooms within a hotel sharing price and capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomType {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub name: String,
    /// Nightly rate in currency minor units.
    pub base_price: i64,
    pub max_guests: u32,
    pub is_active: bool,
}
