//! In-process backends for every repository trait and the lock store.
//!
//! Used by the test suites and by the binary when `STAYBOOK_BACKEND=memory`.
//! Each store keeps its state behind one mutex so conditional writes are
//! atomic, and the booking store enforces the same no-overlap rule the
//! Postgres exclusion constraint does.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use staybook_core::interval::overlaps;
use staybook_core::repository::{
    BookingRepository, HotelCatalog, PaymentRepository, Repositories, RoomCatalog, RoomTypeCatalog,
};
use staybook_core::{BookingError, BookingResult, LockStore, StayInterval};
use staybook_shared::{
    Booking, BookingFilter, BookingStatus, Hotel, PaymentRecord, PaymentStatus, Room, RoomStatus, RoomType,
};

#[derive(Default)]
pub struct MemoryCatalog {
    hotels: RwLock<HashMap<Uuid, Hotel>>,
    room_types: RwLock<HashMap<Uuid, RoomType>>,
    rooms: RwLock<HashMap<Uuid, Room>>,
}

impl MemoryCatalog {
    pub async fn add_hotel(&self, hotel: Hotel) {
        self.hotels.write().await.insert(hotel.id, hotel);
    }

    pub async fn add_room_type(&self, room_type: RoomType) {
        self.room_types.write().await.insert(room_type.id, room_type);
    }

    pub async fn add_room(&self, room: Room) {
        self.rooms.write().await.insert(room.id, room);
    }
}

#[async_trait]
impl HotelCatalog for MemoryCatalog {
    async fn get_hotel(&self, hotel_id: Uuid) -> BookingResult<Option<Hotel>> {
        Ok(self.hotels.read().await.get(&hotel_id).cloned())
    }
}

#[async_trait]
impl RoomTypeCatalog for MemoryCatalog {
    async fn get_room_type(&self, room_type_id: Uuid, hotel_id: Uuid) -> BookingResult<Option<RoomType>> {
        Ok(self
            .room_types
            .read()
            .await
            .get(&room_type_id)
            .filter(|rt| rt.hotel_id == hotel_id)
            .cloned())
    }
}

#[async_trait]
impl RoomCatalog for MemoryCatalog {
    async fn list_by_type_and_status(
        &self,
        hotel_id: Uuid,
        room_type_id: Uuid,
        statuses: &[RoomStatus],
    ) -> BookingResult<Vec<Room>> {
        let rooms = self.rooms.read().await;
        let mut matching: Vec<Room> = rooms
            .values()
            .filter(|r| {
                r.hotel_id == hotel_id
                    && r.room_type_id == room_type_id
                    && r.is_active
                    && statuses.contains(&r.status)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(matching)
    }

    async fn get_room(&self, room_id: Uuid) -> BookingResult<Option<Room>> {
        Ok(self.rooms.read().await.get(&room_id).cloned())
    }

    async fn set_status(&self, room_id: Uuid, status: RoomStatus) -> BookingResult<()> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or_else(|| BookingError::not_found("Room not found"))?;
        room.status = status;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

fn blocking_overlap<'a>(
    bookings: impl Iterator<Item = &'a Booking>,
    candidate: &Booking,
) -> Option<&'a Booking> {
    bookings.into_iter().find(|b| {
        b.id != candidate.id
            && b.room_id == candidate.room_id
            && b.status.is_blocking()
            && overlaps(b.check_in, b.check_out, candidate.check_in, candidate.check_out)
    })
}

fn overlap_conflict() -> BookingError {
    BookingError::conflict("Room is already booked for the selected dates")
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn insert(&self, booking: &Booking) -> BookingResult<()> {
        let mut bookings = self.bookings.lock().await;
        if bookings.values().any(|b| b.reference == booking.reference) {
            return Err(BookingError::DuplicateReference(booking.reference.clone()));
        }
        if booking.status.is_blocking() && blocking_overlap(bookings.values(), booking).is_some() {
            return Err(overlap_conflict());
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, booking_id: Uuid) -> BookingResult<Option<Booking>> {
        Ok(self.bookings.lock().await.get(&booking_id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> BookingResult<Option<Booking>> {
        Ok(self.bookings.lock().await.values().find(|b| b.reference == reference).cloned())
    }

    async fn list_by_guest(
        &self,
        guest_id: Uuid,
        filter: Option<BookingFilter>,
        today: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        let bookings = self.bookings.lock().await;
        let mut matching: Vec<Booking> = bookings
            .values()
            .filter(|b| b.guest_id == guest_id)
            .filter(|b| filter.map_or(true, |f| f.matches(b, today)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn find_conflict(
        &self,
        room_id: Uuid,
        stay: &StayInterval,
        exclude: Option<Uuid>,
    ) -> BookingResult<Option<Booking>> {
        Ok(self
            .bookings
            .lock()
            .await
            .values()
            .find(|b| {
                b.room_id == room_id
                    && Some(b.id) != exclude
                    && b.status.is_blocking()
                    && overlaps(b.check_in, b.check_out, stay.check_in(), stay.check_out())
            })
            .cloned())
    }

    async fn transition(&self, booking: &Booking, expected: BookingStatus) -> BookingResult<bool> {
        let mut bookings = self.bookings.lock().await;
        match bookings.get(&booking.id) {
            Some(stored) if stored.status == expected => {}
            Some(_) => return Ok(false),
            None => return Err(BookingError::not_found("Booking not found")),
        }
        if booking.status.is_blocking() && blocking_overlap(bookings.values(), booking).is_some() {
            return Err(overlap_conflict());
        }

        if let Some(stored) = bookings.get_mut(&booking.id) {
            stored.status = booking.status;
            stored.checked_in = booking.checked_in;
            stored.checked_out = booking.checked_out;
            stored.cancellation = booking.cancellation.clone();
            stored.no_show_at = booking.no_show_at;
            stored.updated_at = booking.updated_at;
        }
        Ok(true)
    }

    async fn list_overdue_confirmed(&self, before: NaiveDate) -> BookingResult<Vec<Booking>> {
        let mut overdue: Vec<Booking> = self
            .bookings
            .lock()
            .await
            .values()
            .filter(|b| b.status == BookingStatus::Confirmed && b.check_in < before)
            .cloned()
            .collect();
        overdue.sort_by_key(|b| b.check_in);
        Ok(overdue)
    }
}

#[derive(Default)]
pub struct MemoryPaymentRepository {
    payments: Mutex<HashMap<String, PaymentRecord>>,
}

#[async_trait]
impl PaymentRepository for MemoryPaymentRepository {
    async fn insert(&self, payment: &PaymentRecord) -> BookingResult<()> {
        let mut payments = self.payments.lock().await;
        if payments.contains_key(&payment.reference) {
            return Err(BookingError::conflict(format!("Payment {} already initialized", payment.reference)));
        }
        payments.insert(payment.reference.clone(), payment.clone());
        Ok(())
    }

    async fn find_by_reference(&self, reference: &str) -> BookingResult<Option<PaymentRecord>> {
        Ok(self.payments.lock().await.get(reference).cloned())
    }

    async fn update(&self, payment: &PaymentRecord, expected: PaymentStatus) -> BookingResult<bool> {
        let mut payments = self.payments.lock().await;
        match payments.get_mut(&payment.reference) {
            Some(stored) if stored.status == expected => {
                *stored = payment.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(BookingError::not_found("Payment not found")),
        }
    }
}

/// Lock store with lazy expiry on `tokio::time::Instant`, so paused-clock
/// tests can advance past a TTL.
#[derive(Default)]
pub struct MemoryLockStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryLockStore {
    fn live<'a>(entries: &'a mut HashMap<String, (String, Instant)>, key: &str) -> Option<&'a (String, Instant)> {
        if entries.get(key).is_some_and(|(_, expires)| *expires <= Instant::now()) {
            entries.remove(key);
        }
        entries.get(key)
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn acquire_if_absent(&self, key: &str, value: &str, ttl_seconds: u64) -> BookingResult<bool> {
        let mut entries = self.entries.lock().await;
        if Self::live(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + Duration::from_secs(ttl_seconds)));
        Ok(true)
    }

    async fn replace_if_equals(&self, key: &str, expected: &str, value: &str, ttl_seconds: u64) -> BookingResult<bool> {
        let mut entries = self.entries.lock().await;
        if !Self::live(&mut entries, key).is_some_and(|(current, _)| current == expected) {
            return Ok(false);
        }
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + Duration::from_secs(ttl_seconds)));
        Ok(true)
    }

    async fn release(&self, key: &str) -> BookingResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn release_if_equals(&self, key: &str, expected: &str) -> BookingResult<bool> {
        let mut entries = self.entries.lock().await;
        if !Self::live(&mut entries, key).is_some_and(|(current, _)| current == expected) {
            return Ok(false);
        }
        entries.remove(key);
        Ok(true)
    }

    async fn get(&self, key: &str) -> BookingResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        Ok(Self::live(&mut entries, key).map(|(value, _)| value.clone()))
    }

    async fn ttl(&self, key: &str) -> BookingResult<Option<u64>> {
        let mut entries = self.entries.lock().await;
        Ok(Self::live(&mut entries, key).map(|(_, expires)| {
            expires.saturating_duration_since(Instant::now()).as_secs()
        }))
    }
}

/// All in-memory stores, with concrete handles kept for seeding.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub catalog: Arc<MemoryCatalog>,
    pub bookings: Arc<MemoryBookingRepository>,
    pub payments: Arc<MemoryPaymentRepository>,
    pub locks: Arc<MemoryLockStore>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            hotels: self.catalog.clone(),
            room_types: self.catalog.clone(),
            rooms: self.catalog.clone(),
            bookings: self.bookings.clone(),
            payments: self.payments.clone(),
            locks: self.locks.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use staybook_core::RoomLockManager;
    use staybook_shared::{GuestContact, Masked, PricingSnapshot};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn booking(room_id: Uuid, reference: &str, check_in: NaiveDate, check_out: NaiveDate, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            guest_id: Uuid::new_v4(),
            hotel_id: Uuid::new_v4(),
            room_id,
            room_type_id: Uuid::new_v4(),
            check_in,
            check_out,
            guest_count: 1,
            contact: GuestContact {
                name: "Tunde".into(),
                email: Masked::new("tunde@example.com".into()),
                phone: Masked::new("+2348011111111".into()),
            },
            special_requests: None,
            pricing: PricingSnapshot {
                room_rate: 1_000_000,
                nights: 1,
                subtotal: 1_000_000,
                service_fee: 50_000,
                total: 1_050_000,
                commission_rate: 10.0,
                commission_amount: 105_000,
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

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let repo = MemoryBookingRepository::default();
        let room = Uuid::new_v4();
        repo.insert(&booking(room, "BS-2025-AAAAA", d(1), d(2), BookingStatus::PendingPayment)).await.unwrap();

        let err = repo
            .insert(&booking(Uuid::new_v4(), "BS-2025-AAAAA", d(5), d(6), BookingStatus::PendingPayment))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::DuplicateReference(r) if r == "BS-2025-AAAAA"));
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let repo = MemoryBookingRepository::default();
        let mut b = booking(Uuid::new_v4(), "BS-2025-BBBBB", d(1), d(3), BookingStatus::PendingPayment);
        repo.insert(&b).await.unwrap();

        b.status = BookingStatus::Confirmed;
        assert!(repo.transition(&b, BookingStatus::PendingPayment).await.unwrap());
        assert!(!repo.transition(&b, BookingStatus::PendingPayment).await.unwrap());
        assert_eq!(repo.get(b.id).await.unwrap().unwrap().status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_confirming_overlap_is_conflict() {
        let repo = MemoryBookingRepository::default();
        let room = Uuid::new_v4();
        repo.insert(&booking(room, "BS-2025-CCCCC", d(10), d(12), BookingStatus::Confirmed)).await.unwrap();

        let mut pending = booking(room, "BS-2025-DDDDD", d(11), d(13), BookingStatus::PendingPayment);
        repo.insert(&pending).await.unwrap();

        pending.status = BookingStatus::Confirmed;
        let err = repo.transition(&pending, BookingStatus::PendingPayment).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));

        let adjacent = booking(room, "BS-2025-EEEEE", d(12), d(14), BookingStatus::Confirmed);
        repo.insert(&adjacent).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_by_guest_newest_first_with_filter() {
        let repo = MemoryBookingRepository::default();
        let guest = Uuid::new_v4();

        let mut older = booking(Uuid::new_v4(), "BS-2025-FFFFF", d(20), d(21), BookingStatus::Confirmed);
        older.guest_id = guest;
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let mut newer = booking(Uuid::new_v4(), "BS-2025-GGGGG", d(1), d(2), BookingStatus::Cancelled);
        newer.guest_id = guest;
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();

        let all = repo.list_by_guest(guest, None, d(5)).await.unwrap();
        assert_eq!(all.iter().map(|b| b.reference.as_str()).collect::<Vec<_>>(), ["BS-2025-GGGGG", "BS-2025-FFFFF"]);

        let upcoming = repo.list_by_guest(guest, Some(BookingFilter::Upcoming), d(5)).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].reference, "BS-2025-FFFFF");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_parallel_acquire_has_one_winner() {
        let store = Arc::new(MemoryLockStore::default());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.acquire_if_absent("room_lock:r1", &format!("holder-{}", i), 900).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_expires_after_ttl() {
        let store = MemoryLockStore::default();
        assert!(store.acquire_if_absent("k", "a", 900).await.unwrap());
        assert_eq!(store.ttl("k").await.unwrap(), Some(900));

        tokio::time::advance(Duration::from_secs(899)).await;
        assert!(!store.acquire_if_absent("k", "b", 900).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("a"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.ttl("k").await.unwrap(), None);
        assert!(!store.replace_if_equals("k", "a", "c", 900).await.unwrap());
        assert!(store.acquire_if_absent("k", "b", 900).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lapsed_hold_cannot_take_over_new_holder() {
        let locks = RoomLockManager::new(Arc::new(MemoryLockStore::default()));
        let (room, guest_a, guest_b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let stale = locks.acquire(room, None, guest_a, 900).await.unwrap().unwrap();
        tokio::time::advance(Duration::from_secs(901)).await;
        let fresh = locks.acquire(room, None, guest_b, 900).await.unwrap().unwrap();

        let err = locks.rekey(room, &stale, Uuid::new_v4(), 900).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
        assert!(!locks.release_held(room, &stale).await.unwrap());

        let holder = locks.inspect(room).await.unwrap().unwrap();
        assert_eq!(holder, fresh);
        assert_eq!(holder.user_id, guest_b);
        assert_eq!(holder.booking_id, None);
    }

    #[tokio::test]
    async fn test_catalog_lists_active_rooms_in_number_order() {
        let catalog = MemoryCatalog::default();
        let (hotel, room_type) = (Uuid::new_v4(), Uuid::new_v4());
        for (number, active) in [("103", true), ("101", true), ("102", false)] {
            catalog
                .add_room(Room {
                    id: Uuid::new_v4(),
                    hotel_id: hotel,
                    room_type_id: room_type,
                    room_number: number.into(),
                    floor: None,
                    status: RoomStatus::Available,
                    is_active: active,
                })
                .await;
        }

        let rooms = catalog.list_by_type_and_status(hotel, room_type, &[RoomStatus::Available]).await.unwrap();
        assert_eq!(rooms.iter().map(|r| r.room_number.as_str()).collect::<Vec<_>>(), ["101", "103"]);
    }
}
