//! Room exclusivity through a TTL-bound conditional lock.
//!
//! The store's conditional insert is the only thing that stops two concurrent
//! create requests from claiming the same room, so any [`LockStore`] must make
//! `acquire_if_absent` atomic across every caller.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use staybook_shared::RoomLock;

use crate::{BookingError, BookingResult};

pub const DEFAULT_LOCK_TTL_SECONDS: u64 = 900;

/// Key-value store offering an atomic set-if-absent with expiry.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Create `key` only if absent. `true` iff this call created it.
    async fn acquire_if_absent(&self, key: &str, value: &str, ttl_seconds: u64) -> BookingResult<bool>;

    /// Overwrite `key` with `value` only while it still holds exactly `expected`,
    /// resetting its expiry. `true` iff written. Must be atomic.
    async fn replace_if_equals(&self, key: &str, expected: &str, value: &str, ttl_seconds: u64) -> BookingResult<bool>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn release(&self, key: &str) -> BookingResult<()>;

    /// Delete `key` only while it still holds exactly `expected`. `true` iff deleted.
    async fn release_if_equals(&self, key: &str, expected: &str) -> BookingResult<bool>;

    async fn get(&self, key: &str) -> BookingResult<Option<String>>;

    /// Seconds until `key` expires, `None` if absent.
    async fn ttl(&self, key: &str) -> BookingResult<Option<u64>>;
}

pub fn room_lock_key(room_id: Uuid) -> String {
    format!("room_lock:{}", room_id)
}

/// Issues and releases per-room locks on top of a [`LockStore`].
#[derive(Clone)]
pub struct RoomLockManager {
    store: Arc<dyn LockStore>,
}

impl RoomLockManager {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self { store }
    }

    /// Single-shot attempt, no retry or queueing. `None` means someone else
    /// holds the room; otherwise the exact lock written, which is what
    /// [`rekey`](Self::rekey) and [`release_held`](Self::release_held) compare against.
    pub async fn acquire(
        &self,
        room_id: Uuid,
        booking_id: Option<Uuid>,
        guest_id: Uuid,
        ttl_seconds: u64,
    ) -> BookingResult<Option<RoomLock>> {
        let lock = RoomLock { booking_id, ..RoomLock::placeholder(guest_id) };
        let value = serde_json::to_string(&lock)?;
        if self.store.acquire_if_absent(&room_lock_key(room_id), &value, ttl_seconds).await? {
            info!(%room_id, %guest_id, ttl_seconds, "room lock acquired");
            Ok(Some(lock))
        } else {
            debug!(%room_id, %guest_id, "room lock already held");
            Ok(None)
        }
    }

    /// Point `held` at the persisted booking. Fails if the lock expired or was
    /// taken by someone else in the meantime.
    pub async fn rekey(
        &self,
        room_id: Uuid,
        held: &RoomLock,
        booking_id: Uuid,
        ttl_seconds: u64,
    ) -> BookingResult<RoomLock> {
        let expected = serde_json::to_string(held)?;
        let lock = RoomLock::for_booking(booking_id, held.user_id);
        let value = serde_json::to_string(&lock)?;
        if self.store.replace_if_equals(&room_lock_key(room_id), &expected, &value, ttl_seconds).await? {
            Ok(lock)
        } else {
            warn!(%room_id, %booking_id, "room hold lost before rekey");
            Err(BookingError::conflict("Room hold expired before the booking was recorded"))
        }
    }

    /// Release only if the lock is still exactly `held`.
    pub async fn release_held(&self, room_id: Uuid, held: &RoomLock) -> BookingResult<bool> {
        let expected = serde_json::to_string(held)?;
        let released = self.store.release_if_equals(&room_lock_key(room_id), &expected).await?;
        if released {
            info!(%room_id, "room lock released");
        }
        Ok(released)
    }

    /// Release only if the lock currently points at `booking_id`.
    pub async fn release_if_held_by(&self, room_id: Uuid, booking_id: Uuid) -> BookingResult<bool> {
        let key = room_lock_key(room_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(false);
        };
        let lock: RoomLock = serde_json::from_str(&raw)?;
        if !lock.is_held_by(booking_id) {
            debug!(%room_id, %booking_id, "room lock belongs to another attempt, leaving it");
            return Ok(false);
        }
        let released = self.store.release_if_equals(&key, &raw).await?;
        if released {
            info!(%room_id, %booking_id, "room lock released");
        }
        Ok(released)
    }

    pub async fn release(&self, room_id: Uuid) -> BookingResult<()> {
        self.store.release(&room_lock_key(room_id)).await?;
        info!(%room_id, "room lock released");
        Ok(())
    }

    pub async fn inspect(&self, room_id: Uuid) -> BookingResult<Option<RoomLock>> {
        match self.store.get(&room_lock_key(room_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Remaining hold in seconds; `0` when no lock exists.
    pub async fn remaining_ttl(&self, room_id: Uuid) -> BookingResult<u64> {
        Ok(self.store.ttl(&room_lock_key(room_id)).await?.unwrap_or(0))
    }
}
