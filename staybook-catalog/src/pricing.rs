use serde::{Deserialize, Serialize};

use staybook_core::StayInterval;
use staybook_shared::{Hotel, PricingSnapshot, RoomType};

/// Fee policy applied to every quote. Amounts in currency minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Fraction of the subtotal charged as service fee.
    pub service_fee_rate: f64,
    /// Floor for the service fee.
    pub min_service_fee: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            service_fee_rate: 0.01,
            // 500 NGN in kobo
            min_service_fee: 50_000,
        }
    }
}

/// Derives the immutable pricing snapshot stored on a booking.
#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    config: PricingConfig,
}

impl PricingCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn quote(&self, hotel: &Hotel, room_type: &RoomType, stay: &StayInterval) -> PricingSnapshot {
        let nights = stay.nights();
        let subtotal = room_type.base_price * i64::from(nights);
        let service_fee = self.service_fee(subtotal);
        let total = subtotal + service_fee;

        PricingSnapshot {
            room_rate: room_type.base_price,
            nights,
            subtotal,
            service_fee,
            total,
            commission_rate: hotel.commission_rate,
            commission_amount: Self::commission(total, hotel.commission_rate),
        }
    }

    /// `max(subtotal * rate, min_service_fee)`
    pub fn service_fee(&self, subtotal: i64) -> i64 {
        let proportional = (subtotal as f64 * self.config.service_fee_rate).round() as i64;
        proportional.max(self.config.min_service_fee)
    }

    /// `total * rate / 100`, rate being a percentage.
    pub fn commission(total: i64, commission_rate: f64) -> i64 {
        (total as f64 * commission_rate / 100.0).round() as i64
    }
}
