use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use staybook_shared::{
    Booking, BookingFilter, BookingStatus, Hotel, PaymentRecord, PaymentStatus, Room, RoomStatus,
    RoomType,
};

use crate::interval::StayInterval;
use crate::lock::LockStore;
use crate::BookingResult;

/// Read access to hotels owned by the catalog service.
#[async_trait]
pub trait HotelCatalog: Send + Sync {
    async fn get_hotel(&self, hotel_id: Uuid) -> BookingResult<Option<Hotel>>;
}

#[async_trait]
pub trait RoomTypeCatalog: Send + Sync {
    /// Room type only if it belongs to `hotel_id`.
    async fn get_room_type(&self, room_type_id: Uuid, hotel_id: Uuid) -> BookingResult<Option<RoomType>>;
}

#[async_trait]
pub trait RoomCatalog: Send + Sync {
    /// Active rooms of a type at a hotel whose status is one of `statuses`,
    /// in a stable order (room number).
    async fn list_by_type_and_status(
        &self,
        hotel_id: Uuid,
        room_type_id: Uuid,
        statuses: &[RoomStatus],
    ) -> BookingResult<Vec<Room>>;

    async fn get_room(&self, room_id: Uuid) -> BookingResult<Option<Room>>;

    async fn set_status(&self, room_id: Uuid, status: RoomStatus) -> BookingResult<()>;
}

/// System of record for bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `DuplicateReference` when the reference is taken.
    async fn insert(&self, booking: &Booking) -> BookingResult<()>;

    async fn get(&self, booking_id: Uuid) -> BookingResult<Option<Booking>>;

    async fn find_by_reference(&self, reference: &str) -> BookingResult<Option<Booking>>;

    /// Newest first.
    async fn list_by_guest(
        &self,
        guest_id: Uuid,
        filter: Option<BookingFilter>,
        today: NaiveDate,
    ) -> BookingResult<Vec<Booking>>;

    /// Any `CONFIRMED`/`CHECKED_IN` booking on the room overlapping `stay`,
    /// ignoring `exclude`.
    async fn find_conflict(
        &self,
        room_id: Uuid,
        stay: &StayInterval,
        exclude: Option<Uuid>,
    ) -> BookingResult<Option<Booking>>;

    /// Write the booking's status and audit fields only if the stored status is
    /// still `expected`. Pricing is never rewritten. `false` when another writer won.
    async fn transition(&self, booking: &Booking, expected: BookingStatus) -> BookingResult<bool>;

    /// `CONFIRMED` bookings whose check-in date is before `before`.
    async fn list_overdue_confirmed(&self, before: NaiveDate) -> BookingResult<Vec<Booking>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert(&self, payment: &PaymentRecord) -> BookingResult<()>;

    async fn find_by_reference(&self, reference: &str) -> BookingResult<Option<PaymentRecord>>;

    /// Compare-and-set on status, same contract as [`BookingRepository::transition`].
    async fn update(&self, payment: &PaymentRecord, expected: PaymentStatus) -> BookingResult<bool>;
}

/// Every backend the booking core talks to, passed explicitly at construction.
#[derive(Clone)]
pub struct Repositories {
    pub hotels: Arc<dyn HotelCatalog>,
    pub room_types: Arc<dyn RoomTypeCatalog>,
    pub rooms: Arc<dyn RoomCatalog>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub locks: Arc<dyn LockStore>,
}
