use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use staybook_core::repository::{BookingRepository, RoomCatalog};
use staybook_core::{BookingResult, RoomLockManager, StayInterval};
use staybook_shared::{Room, RoomStatus};

/// Best-effort pre-check for a free room. The lock acquisition that follows is
/// the real race-breaker: a room returned here can still be lost to a
/// concurrent caller.
#[derive(Clone)]
pub struct AvailabilityChecker {
    rooms: Arc<dyn RoomCatalog>,
    bookings: Arc<dyn BookingRepository>,
    locks: RoomLockManager,
}

impl AvailabilityChecker {
    pub fn new(rooms: Arc<dyn RoomCatalog>, bookings: Arc<dyn BookingRepository>, locks: RoomLockManager) -> Self {
        Self { rooms, bookings, locks }
    }

    /// First room of the type, in catalog order, with no confirmed or
    /// checked-in overlap and no live lock.
    ///
    /// `LOCKED` rooms are candidates too: the status outlives an abandoned hold,
    /// and only the live lock says whether the hold is still in force.
    pub async fn find_available_room(
        &self,
        hotel_id: Uuid,
        room_type_id: Uuid,
        stay: &StayInterval,
    ) -> BookingResult<Option<Room>> {
        let candidates = self
            .rooms
            .list_by_type_and_status(hotel_id, room_type_id, &[RoomStatus::Available, RoomStatus::Locked])
            .await?;

        for room in candidates {
            if self.has_booking_conflict(room.id, stay).await? {
                debug!(room_id = %room.id, "room has an overlapping booking");
                continue;
            }
            if self.locks.inspect(room.id).await?.is_some() {
                debug!(room_id = %room.id, "room is held by a live lock");
                continue;
            }
            return Ok(Some(room));
        }

        Ok(None)
    }

    /// Whether a `CONFIRMED`/`CHECKED_IN` booking on the room overlaps `stay`.
    /// Pending bookings never count.
    pub async fn has_booking_conflict(&self, room_id: Uuid, stay: &StayInterval) -> BookingResult<bool> {
        Ok(self.bookings.find_conflict(room_id, stay, None).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use staybook_shared::{Booking, BookingStatus, GuestContact, Hotel, Masked, PricingSnapshot, RoomType};
    use staybook_store::memory::MemoryBackend;

    struct Fixture {
        backend: MemoryBackend,
        checker: AvailabilityChecker,
        locks: RoomLockManager,
        hotel: Hotel,
        room_type: RoomType,
        rooms: Vec<Room>,
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    async fn fixture(numbers: &[&str]) -> Fixture {
        let backend = MemoryBackend::new();
        let hotel = Hotel { id: Uuid::new_v4(), name: "Lagoon View".into(), commission_rate: 10.0 };
        let room_type = RoomType {
            id: Uuid::new_v4(),
            hotel_id: hotel.id,
            name: "Standard".into(),
            base_price: 2_000_000,
            max_guests: 2,
            is_active: true,
        };
        backend.catalog.add_hotel(hotel.clone()).await;
        backend.catalog.add_room_type(room_type.clone()).await;

        let mut rooms = Vec::new();
        for number in numbers {
            let room = Room {
                id: Uuid::new_v4(),
                hotel_id: hotel.id,
                room_type_id: room_type.id,
                room_number: number.to_string(),
                floor: Some(1),
                status: RoomStatus::Available,
                is_active: true,
            };
            backend.catalog.add_room(room.clone()).await;
            rooms.push(room);
        }

        let repos = backend.repositories();
        let locks = RoomLockManager::new(repos.locks.clone());
        let checker = AvailabilityChecker::new(repos.rooms.clone(), repos.bookings.clone(), locks.clone());
        Fixture { backend, checker, locks, hotel, room_type, rooms }
    }

    fn booking(fx: &Fixture, room: &Room, check_in: NaiveDate, check_out: NaiveDate, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            reference: format!("BS-2025-{}", &Uuid::new_v4().simple().to_string()[..5].to_uppercase()),
            guest_id: Uuid::new_v4(),
            hotel_id: fx.hotel.id,
            room_id: room.id,
            room_type_id: fx.room_type.id,
            check_in,
            check_out,
            guest_count: 1,
            contact: GuestContact {
                name: "Ada".into(),
                email: Masked::new("ada@example.com".into()),
                phone: Masked::new("+2348000000000".into()),
            },
            special_requests: None,
            pricing: PricingSnapshot {
                room_rate: 2_000_000,
                nights: 1,
                subtotal: 2_000_000,
                service_fee: 50_000,
                total: 2_050_000,
                commission_rate: 10.0,
                commission_amount: 205_000,
            },
            status,
            checked_in: None,
            checked_out: None,
            cancellation: None,
            no_show_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn insert(fx: &Fixture, booking: Booking) {
        fx.backend.bookings.insert(&booking).await.unwrap();
    }

    #[tokio::test]
    async fn test_returns_first_free_room_in_order() {
        let fx = fixture(&["101", "102"]).await;
        let stay = StayInterval::new(d(10), d(12)).unwrap();

        let room = fx.checker.find_available_room(fx.hotel.id, fx.room_type.id, &stay).await.unwrap();
        assert_eq!(room.unwrap().room_number, "101");
    }

    #[tokio::test]
    async fn test_confirmed_overlap_skips_room() {
        let fx = fixture(&["101", "102"]).await;
        insert(&fx, booking(&fx, &fx.rooms[0], d(11), d(13), BookingStatus::Confirmed)).await;

        let stay = StayInterval::new(d(10), d(12)).unwrap();
        let room = fx.checker.find_available_room(fx.hotel.id, fx.room_type.id, &stay).await.unwrap();
        assert_eq!(room.unwrap().room_number, "102");
    }

    #[tokio::test]
    async fn test_adjacent_and_pending_bookings_do_not_block() {
        let fx = fixture(&["101"]).await;
        insert(&fx, booking(&fx, &fx.rooms[0], d(8), d(10), BookingStatus::CheckedIn)).await;
        insert(&fx, booking(&fx, &fx.rooms[0], d(10), d(12), BookingStatus::PendingPayment)).await;
        insert(&fx, booking(&fx, &fx.rooms[0], d(10), d(12), BookingStatus::Cancelled)).await;

        let stay = StayInterval::new(d(10), d(12)).unwrap();
        assert!(fx.checker.find_available_room(fx.hotel.id, fx.room_type.id, &stay).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_live_lock_skips_room() {
        let fx = fixture(&["101"]).await;
        fx.locks.acquire(fx.rooms[0].id, None, Uuid::new_v4(), 900).await.unwrap();

        let stay = StayInterval::new(d(10), d(12)).unwrap();
        assert!(fx.checker.find_available_room(fx.hotel.id, fx.room_type.id, &stay).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_locked_status_without_lock_is_available() {
        let fx = fixture(&["101"]).await;
        fx.backend.catalog.set_status(fx.rooms[0].id, RoomStatus::Locked).await.unwrap();

        let stay = StayInterval::new(d(10), d(12)).unwrap();
        assert!(fx.checker.find_available_room(fx.hotel.id, fx.room_type.id, &stay).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_booked_and_maintenance_rooms_are_not_candidates() {
        let fx = fixture(&["101", "102"]).await;
        fx.backend.catalog.set_status(fx.rooms[0].id, RoomStatus::Maintenance).await.unwrap();
        fx.backend.catalog.set_status(fx.rooms[1].id, RoomStatus::Booked).await.unwrap();

        let stay = StayInterval::new(d(10), d(12)).unwrap();
        assert!(fx.checker.find_available_room(fx.hotel.id, fx.room_type.id, &stay).await.unwrap().is_none());
    }
}
