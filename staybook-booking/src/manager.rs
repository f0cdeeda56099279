use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use staybook_catalog::{AvailabilityChecker, PricingCalculator, PricingConfig};
use staybook_core::repository::{BookingRepository, HotelCatalog, RoomCatalog, RoomTypeCatalog};
use staybook_core::{BookingError, BookingResult, Repositories, RoomLockManager, StayInterval, DEFAULT_LOCK_TTL_SECONDS};
use staybook_shared::{
    Booking, BookingFilter, BookingStatus, Cancellation, GuestContact, Hotel, HotelSummary, Masked, Room,
    RoomLock, RoomStatus, RoomSummary, RoomType, StaffStamp,
};
use staybook_store::BusinessRules;

use crate::lifecycle::Transition;
use crate::models::{CreateBookingRequest, CreatedBooking};
use crate::reference::generate_reference;

const REFERENCE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub lock_ttl_seconds: u64,
    pub pricing: PricingConfig,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self { lock_ttl_seconds: DEFAULT_LOCK_TTL_SECONDS, pricing: PricingConfig::default() }
    }
}

impl From<&BusinessRules> for BookingSettings {
    fn from(rules: &BusinessRules) -> Self {
        Self {
            lock_ttl_seconds: rules.room_lock_ttl_seconds,
            pricing: PricingConfig {
                service_fee_rate: rules.service_fee_rate,
                min_service_fee: rules.min_service_fee_minor(),
            },
        }
    }
}

/// Sole writer of booking and room status.
///
/// Room exclusivity during a hold comes from the lock store; exclusivity of
/// confirmed stays comes from the booking store's overlap check.
#[derive(Clone)]
pub struct BookingOrchestrator {
    hotels: Arc<dyn HotelCatalog>,
    room_types: Arc<dyn RoomTypeCatalog>,
    rooms: Arc<dyn RoomCatalog>,
    bookings: Arc<dyn BookingRepository>,
    availability: AvailabilityChecker,
    locks: RoomLockManager,
    pricing: PricingCalculator,
    lock_ttl_seconds: u64,
}

impl BookingOrchestrator {
    pub fn new(repos: &Repositories, settings: BookingSettings) -> Self {
        let locks = RoomLockManager::new(repos.locks.clone());
        Self {
            hotels: repos.hotels.clone(),
            room_types: repos.room_types.clone(),
            rooms: repos.rooms.clone(),
            bookings: repos.bookings.clone(),
            availability: AvailabilityChecker::new(repos.rooms.clone(), repos.bookings.clone(), locks.clone()),
            locks,
            pricing: PricingCalculator::new(settings.pricing),
            lock_ttl_seconds: settings.lock_ttl_seconds,
        }
    }

    /// Hold a room of the requested type and persist a `PENDING_PAYMENT` booking.
    pub async fn create(&self, guest_id: Uuid, request: CreateBookingRequest) -> BookingResult<CreatedBooking> {
        let stay = StayInterval::new(request.check_in, request.check_out)?;

        let hotel = self
            .hotels
            .get_hotel(request.hotel_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Hotel not found"))?;
        let room_type = self
            .room_types
            .get_room_type(request.room_type_id, hotel.id)
            .await?
            .filter(|rt| rt.is_active)
            .ok_or_else(|| BookingError::not_found("Room type not found"))?;

        if request.guest_count == 0 || request.guest_count > room_type.max_guests {
            return Err(BookingError::invalid(format!(
                "Guest count must be between 1 and {}",
                room_type.max_guests
            )));
        }

        let room = self
            .availability
            .find_available_room(hotel.id, room_type.id, &stay)
            .await?
            .ok_or_else(|| BookingError::conflict("No rooms available for the selected dates"))?;

        let Some(mut held) = self.locks.acquire(room.id, None, guest_id, self.lock_ttl_seconds).await? else {
            return Err(BookingError::conflict("Room is currently being booked by another guest"));
        };

        match self.persist_hold(guest_id, request, &hotel, &room_type, &room, &stay, &mut held).await {
            Ok(created) => Ok(created),
            Err(err) => {
                // only our own hold; it may have lapsed and been taken by another guest
                if let Err(release_err) = self.locks.release_held(room.id, &held).await {
                    warn!(room_id = %room.id, error = %release_err, "failed to release room lock after create error");
                }
                Err(err)
            }
        }
    }

    async fn persist_hold(
        &self,
        guest_id: Uuid,
        request: CreateBookingRequest,
        hotel: &Hotel,
        room_type: &RoomType,
        room: &Room,
        stay: &StayInterval,
        held: &mut RoomLock,
    ) -> BookingResult<CreatedBooking> {
        let now = Utc::now();
        let mut booking = Booking {
            id: Uuid::new_v4(),
            reference: generate_reference(now),
            guest_id,
            hotel_id: hotel.id,
            room_id: room.id,
            room_type_id: room_type.id,
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            guest_count: request.guest_count,
            contact: GuestContact {
                name: request.guest_name,
                email: Masked::new(request.guest_email),
                phone: Masked::new(request.guest_phone),
            },
            special_requests: request.special_requests,
            pricing: self.pricing.quote(hotel, room_type, stay),
            status: BookingStatus::PendingPayment,
            checked_in: None,
            checked_out: None,
            cancellation: None,
            no_show_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 1;
        loop {
            match self.bookings.insert(&booking).await {
                Ok(()) => break,
                Err(BookingError::DuplicateReference(taken)) if attempt < REFERENCE_ATTEMPTS => {
                    debug!(reference = %taken, attempt, "booking reference taken, regenerating");
                    booking.reference = generate_reference(now);
                    attempt += 1;
                }
                Err(BookingError::DuplicateReference(taken)) => {
                    return Err(BookingError::upstream(format!(
                        "could not allocate a unique booking reference (last tried {})",
                        taken
                    )));
                }
                Err(err) => return Err(err),
            }
        }

        *held = self.locks.rekey(room.id, held, booking.id, self.lock_ttl_seconds).await?;
        self.rooms.set_status(room.id, RoomStatus::Locked).await?;

        let remaining = self.locks.remaining_ttl(room.id).await?;
        let lock_expires_at = Utc::now() + Duration::seconds(i64::try_from(remaining).unwrap_or(i64::from(u32::MAX)));

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            room_id = %room.id,
            total = booking.pricing.total,
            "booking held pending payment"
        );

        Ok(CreatedBooking {
            hotel: HotelSummary::from(hotel),
            room: RoomSummary {
                id: room.id,
                room_type: room_type.name.clone(),
                room_number: room.room_number.clone(),
            },
            lock_expires_at,
            booking,
        })
    }

    /// Promote a paid booking. Repeating the call on a `CONFIRMED` booking is a no-op.
    pub async fn confirm(&self, booking_id: Uuid) -> BookingResult<Booking> {
        let booking = self.load(booking_id).await?;
        if booking.status == BookingStatus::Confirmed {
            debug!(booking_id = %booking.id, "booking already confirmed");
            return Ok(booking);
        }
        Transition::Confirm.apply(booking.status)?;
        self.ensure_room_still_free(&booking).await?;

        match self.commit(booking, Transition::Confirm, |_| {}).await {
            Err(BookingError::Conflict(msg)) => {
                // a concurrent confirm for the same payment may have won
                let current = self.load(booking_id).await?;
                if current.status == BookingStatus::Confirmed {
                    return Ok(current);
                }
                Err(BookingError::Conflict(msg))
            }
            other => other,
        }
    }

    async fn ensure_room_still_free(&self, booking: &Booking) -> BookingResult<()> {
        let stay = StayInterval::new(booking.check_in, booking.check_out)?;

        if let Some(existing) = self.bookings.find_conflict(booking.room_id, &stay, Some(booking.id)).await? {
            warn!(booking_id = %booking.id, conflicting = %existing.reference, "room taken while payment was pending");
            return Err(BookingError::conflict("Room is already booked for the selected dates"));
        }

        if let Some(holder) = self.locks.inspect(booking.room_id).await?.and_then(|lock| lock.booking_id) {
            if holder != booking.id {
                if let Some(other) = self.bookings.get(holder).await? {
                    let other_stay = StayInterval::new(other.check_in, other.check_out)?;
                    if other_stay.overlaps(&stay) {
                        return Err(BookingError::conflict("Room is held by another booking"));
                    }
                }
            }
        }
        Ok(())
    }

    pub async fn cancel(&self, booking_id: Uuid, guest_id: Uuid, reason: Option<String>) -> BookingResult<Booking> {
        let booking = self.load(booking_id).await?;
        if !booking.belongs_to(guest_id) {
            return Err(BookingError::not_found("Booking not found"));
        }

        let refund_amount = booking.pricing.total;
        self.commit(booking, Transition::Cancel, |b| {
            b.cancellation = Some(Cancellation { at: Utc::now(), reason, refund_amount });
        })
        .await
    }

    pub async fn check_in(&self, booking_id: Uuid, staff_id: Uuid) -> BookingResult<Booking> {
        let booking = self.load(booking_id).await?;
        self.commit(booking, Transition::CheckIn, |b| {
            b.checked_in = Some(StaffStamp { by: staff_id, at: Utc::now() });
        })
        .await
    }

    pub async fn check_out(&self, booking_id: Uuid, staff_id: Uuid) -> BookingResult<Booking> {
        let booking = self.load(booking_id).await?;
        self.commit(booking, Transition::CheckOut, |b| {
            b.checked_out = Some(StaffStamp { by: staff_id, at: Utc::now() });
        })
        .await
    }

    /// Move every `CONFIRMED` booking whose check-in date is before `today` to
    /// `NO_SHOW`. Bookings changed concurrently are skipped.
    pub async fn mark_no_shows(&self, today: NaiveDate) -> BookingResult<Vec<Booking>> {
        let overdue = self.bookings.list_overdue_confirmed(today).await?;
        let mut marked = Vec::with_capacity(overdue.len());

        for booking in overdue {
            let booking_id = booking.id;
            match self.commit(booking, Transition::MarkNoShow, |b| b.no_show_at = Some(Utc::now())).await {
                Ok(b) => marked.push(b),
                Err(BookingError::Conflict(_)) | Err(BookingError::InvalidRequest(_)) => {
                    debug!(booking_id = %booking_id, "booking moved on before no-show sweep");
                }
                Err(err) => return Err(err),
            }
        }

        if !marked.is_empty() {
            info!(count = marked.len(), %today, "bookings marked as no-show");
        }
        Ok(marked)
    }

    pub async fn find_by_user(&self, guest_id: Uuid, filter: Option<BookingFilter>) -> BookingResult<Vec<Booking>> {
        self.bookings.list_by_guest(guest_id, filter, Utc::now().date_naive()).await
    }

    pub async fn find_by_reference(&self, reference: &str) -> BookingResult<Booking> {
        self.bookings
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| BookingError::not_found("Booking not found"))
    }

    async fn load(&self, booking_id: Uuid) -> BookingResult<Booking> {
        self.bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Booking not found"))
    }

    /// Apply `transition`, write it with a compare-and-set on the old status,
    /// then project the room and drop the hold.
    async fn commit(
        &self,
        mut booking: Booking,
        transition: Transition,
        stamp: impl FnOnce(&mut Booking),
    ) -> BookingResult<Booking> {
        let from = booking.status;
        booking.status = transition.apply(from)?;
        stamp(&mut booking);
        booking.touch();

        if !self.bookings.transition(&booking, from).await? {
            return Err(BookingError::conflict("Booking was modified concurrently"));
        }

        if transition.releases_lock() {
            self.release_own_lock(&booking).await?;
        }
        self.rooms.set_status(booking.room_id, transition.room_status()).await?;

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            from = %from,
            to = %booking.status,
            "booking transitioned"
        );
        Ok(booking)
    }

    async fn release_own_lock(&self, booking: &Booking) -> BookingResult<()> {
        self.locks.release_if_held_by(booking.room_id, booking.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use staybook_store::memory::MemoryBackend;

    struct Fixture {
        backend: MemoryBackend,
        orchestrator: BookingOrchestrator,
        hotel: Hotel,
        room_type: RoomType,
        room: Room,
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, day).unwrap()
    }

    async fn fixture() -> Fixture {
        let backend = MemoryBackend::new();
        let hotel = Hotel { id: Uuid::new_v4(), name: "Harbour House".into(), commission_rate: 10.0 };
        let room_type = RoomType {
            id: Uuid::new_v4(),
            hotel_id: hotel.id,
            name: "Deluxe".into(),
            base_price: 4_000_000,
            max_guests: 2,
            is_active: true,
        };
        let room = Room {
            id: Uuid::new_v4(),
            hotel_id: hotel.id,
            room_type_id: room_type.id,
            room_number: "R101".into(),
            floor: Some(1),
            status: RoomStatus::Available,
            is_active: true,
        };
        backend.catalog.add_hotel(hotel.clone()).await;
        backend.catalog.add_room_type(room_type.clone()).await;
        backend.catalog.add_room(room.clone()).await;

        let orchestrator = BookingOrchestrator::new(&backend.repositories(), BookingSettings::default());
        Fixture { backend, orchestrator, hotel, room_type, room }
    }

    fn request(fx: &Fixture, check_in: NaiveDate, check_out: NaiveDate) -> CreateBookingRequest {
        CreateBookingRequest {
            hotel_id: fx.hotel.id,
            room_type_id: fx.room_type.id,
            check_in,
            check_out,
            guest_count: 2,
            guest_name: "Amaka Obi".into(),
            guest_email: "amaka@example.com".into(),
            guest_phone: "+2348030000000".into(),
            special_requests: None,
        }
    }

    async fn room_status(fx: &Fixture) -> RoomStatus {
        fx.backend.catalog.get_room(fx.room.id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_create_holds_room_and_prices_stay() {
        let fx = fixture().await;
        let created = fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap();

        assert_eq!(created.booking.status, BookingStatus::PendingPayment);
        assert_eq!(created.booking.pricing.total, 8_080_000);
        assert_eq!(created.room.room_number, "R101");
        assert_eq!(created.room.room_type, "Deluxe");
        assert_eq!(created.hotel.name, "Harbour House");
        assert!(created.lock_expires_at > Utc::now());
        assert_eq!(room_status(&fx).await, RoomStatus::Locked);

        let lock = RoomLockManager::new(fx.backend.repositories().locks).inspect(fx.room.id).await.unwrap().unwrap();
        assert!(lock.is_held_by(created.booking.id));
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_dates() {
        let fx = fixture().await;
        let err = fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(12), d(12))).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_hotel_and_room_type() {
        let fx = fixture().await;

        let mut req = request(&fx, d(10), d(12));
        req.hotel_id = Uuid::new_v4();
        assert!(matches!(fx.orchestrator.create(Uuid::new_v4(), req).await, Err(BookingError::NotFound(_))));

        let mut req = request(&fx, d(10), d(12));
        req.room_type_id = Uuid::new_v4();
        assert!(matches!(fx.orchestrator.create(Uuid::new_v4(), req).await, Err(BookingError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_too_many_guests() {
        let fx = fixture().await;
        let mut req = request(&fx, d(10), d(12));
        req.guest_count = 3;
        assert!(matches!(fx.orchestrator.create(Uuid::new_v4(), req).await, Err(BookingError::InvalidRequest(_))));
    }

    /// Booking store whose writes always fail.
    struct BrokenBookings;

    #[async_trait]
    impl BookingRepository for BrokenBookings {
        async fn insert(&self, _: &Booking) -> BookingResult<()> {
            Err(BookingError::upstream("database unavailable"))
        }
        async fn get(&self, _: Uuid) -> BookingResult<Option<Booking>> {
            Ok(None)
        }
        async fn find_by_reference(&self, _: &str) -> BookingResult<Option<Booking>> {
            Ok(None)
        }
        async fn list_by_guest(&self, _: Uuid, _: Option<BookingFilter>, _: NaiveDate) -> BookingResult<Vec<Booking>> {
            Ok(Vec::new())
        }
        async fn find_conflict(&self, _: Uuid, _: &StayInterval, _: Option<Uuid>) -> BookingResult<Option<Booking>> {
            Ok(None)
        }
        async fn transition(&self, _: &Booking, _: BookingStatus) -> BookingResult<bool> {
            Ok(false)
        }
        async fn list_overdue_confirmed(&self, _: NaiveDate) -> BookingResult<Vec<Booking>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_failed_persist_releases_lock() {
        let fx = fixture().await;
        let mut repos = fx.backend.repositories();
        repos.bookings = Arc::new(BrokenBookings);
        let orchestrator = BookingOrchestrator::new(&repos, BookingSettings::default());

        let err = orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap_err();
        assert!(matches!(err, BookingError::Upstream(_)));

        let locks = RoomLockManager::new(repos.locks.clone());
        assert!(locks.inspect(fx.room.id).await.unwrap().is_none());
        assert_eq!(room_status(&fx).await, RoomStatus::Available);
    }

    /// Booking store whose insert stalls past the hold TTL, during which a
    /// rival guest takes the room lock.
    struct StalledBookings {
        inner: Arc<dyn BookingRepository>,
        locks: RoomLockManager,
        room_id: Uuid,
        rival: Uuid,
    }

    #[async_trait]
    impl BookingRepository for StalledBookings {
        async fn insert(&self, booking: &Booking) -> BookingResult<()> {
            tokio::time::advance(std::time::Duration::from_secs(DEFAULT_LOCK_TTL_SECONDS + 1)).await;
            assert!(self.locks.acquire(self.room_id, None, self.rival, 900).await?.is_some());
            self.inner.insert(booking).await
        }
        async fn get(&self, id: Uuid) -> BookingResult<Option<Booking>> {
            self.inner.get(id).await
        }
        async fn find_by_reference(&self, reference: &str) -> BookingResult<Option<Booking>> {
            self.inner.find_by_reference(reference).await
        }
        async fn list_by_guest(&self, guest: Uuid, filter: Option<BookingFilter>, today: NaiveDate) -> BookingResult<Vec<Booking>> {
            self.inner.list_by_guest(guest, filter, today).await
        }
        async fn find_conflict(&self, room: Uuid, stay: &StayInterval, exclude: Option<Uuid>) -> BookingResult<Option<Booking>> {
            self.inner.find_conflict(room, stay, exclude).await
        }
        async fn transition(&self, booking: &Booking, expected: BookingStatus) -> BookingResult<bool> {
            self.inner.transition(booking, expected).await
        }
        async fn list_overdue_confirmed(&self, today: NaiveDate) -> BookingResult<Vec<Booking>> {
            self.inner.list_overdue_confirmed(today).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_create_leaves_rival_lock_alone() {
        let fx = fixture().await;
        let rival = Uuid::new_v4();
        let mut repos = fx.backend.repositories();
        let locks = RoomLockManager::new(repos.locks.clone());
        repos.bookings = Arc::new(StalledBookings {
            inner: repos.bookings.clone(),
            locks: locks.clone(),
            room_id: fx.room.id,
            rival,
        });
        let orchestrator = BookingOrchestrator::new(&repos, BookingSettings::default());

        let err = orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));

        let holder = locks.inspect(fx.room.id).await.unwrap().unwrap();
        assert_eq!(holder.user_id, rival);
        assert_eq!(holder.booking_id, None);
        assert_eq!(room_status(&fx).await, RoomStatus::Available);
    }

    #[tokio::test]
    async fn test_held_room_is_unavailable_to_second_guest() {
        let fx = fixture().await;
        fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap();

        let err = fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent_and_releases_lock() {
        let fx = fixture().await;
        let created = fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap();

        let confirmed = fx.orchestrator.confirm(created.booking.id).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(room_status(&fx).await, RoomStatus::Booked);

        let again = fx.orchestrator.confirm(created.booking.id).await.unwrap();
        assert_eq!(again.status, BookingStatus::Confirmed);

        let locks = RoomLockManager::new(fx.backend.repositories().locks);
        assert!(locks.inspect(fx.room.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_confirm_cancelled_booking_is_invalid() {
        let fx = fixture().await;
        let created = fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap();
        fx.orchestrator.cancel(created.booking.id, created.booking.guest_id, None).await.unwrap();

        let err = fx.orchestrator.confirm(created.booking.id).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_cancel_pending_frees_room_with_full_refund() {
        let fx = fixture().await;
        let guest = Uuid::new_v4();
        let created = fx.orchestrator.create(guest, request(&fx, d(10), d(12))).await.unwrap();

        let cancelled = fx
            .orchestrator
            .cancel(created.booking.id, guest, Some("change of plans".into()))
            .await
            .unwrap();

        let cancellation = cancelled.cancellation.unwrap();
        assert_eq!(cancellation.refund_amount, 8_080_000);
        assert_eq!(cancellation.reason.as_deref(), Some("change of plans"));
        assert_eq!(room_status(&fx).await, RoomStatus::Available);

        let err = fx.orchestrator.cancel(created.booking.id, guest, None).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_cancel_by_other_guest_is_not_found() {
        let fx = fixture().await;
        let created = fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap();
        let err = fx.orchestrator.cancel(created.booking.id, Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stay_lifecycle_projects_room_status() {
        let fx = fixture().await;
        let staff = Uuid::new_v4();
        let created = fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap();
        let id = created.booking.id;

        let err = fx.orchestrator.check_in(id, staff).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));

        fx.orchestrator.confirm(id).await.unwrap();
        let checked_in = fx.orchestrator.check_in(id, staff).await.unwrap();
        assert_eq!(checked_in.checked_in.unwrap().by, staff);
        assert_eq!(room_status(&fx).await, RoomStatus::Occupied);

        let checked_out = fx.orchestrator.check_out(id, staff).await.unwrap();
        assert_eq!(checked_out.status, BookingStatus::CheckedOut);
        assert_eq!(room_status(&fx).await, RoomStatus::Cleaning);

        let err = fx.orchestrator.cancel(id, created.booking.guest_id, None).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_no_show_sweep() {
        let fx = fixture().await;
        let created = fx.orchestrator.create(Uuid::new_v4(), request(&fx, d(10), d(12))).await.unwrap();
        fx.orchestrator.confirm(created.booking.id).await.unwrap();

        assert!(fx.orchestrator.mark_no_shows(d(10)).await.unwrap().is_empty());

        let marked = fx.orchestrator.mark_no_shows(d(11)).await.unwrap();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].status, BookingStatus::NoShow);
        assert!(marked[0].no_show_at.is_some());
        assert_eq!(room_status(&fx).await, RoomStatus::Available);
    }

    #[tokio::test]
    async fn test_find_by_user_filters() {
        let fx = fixture().await;
        fx.backend
            .catalog
            .add_room(Room { id: Uuid::new_v4(), room_number: "R102".into(), ..fx.room.clone() })
            .await;
        let guest = Uuid::new_v4();
        let kept = fx.orchestrator.create(guest, request(&fx, d(10), d(12))).await.unwrap();
        let dropped = fx.orchestrator.create(guest, request(&fx, d(20), d(22))).await.unwrap();
        fx.orchestrator.cancel(dropped.booking.id, guest, None).await.unwrap();

        let all = fx.orchestrator.find_by_user(guest, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let upcoming = fx.orchestrator.find_by_user(guest, Some(BookingFilter::Upcoming)).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, kept.booking.id);

        let cancelled = fx.orchestrator.find_by_user(guest, Some(BookingFilter::Cancelled)).await.unwrap();
        assert_eq!(cancelled[0].id, dropped.booking.id);

        let found = fx.orchestrator.find_by_reference(&kept.booking.reference).await.unwrap();
        assert_eq!(found.id, kept.booking.id);
        assert!(matches!(fx.orchestrator.find_by_reference("BS-2030-ZZZZZ").await, Err(BookingError::NotFound(_))));
    }
}
