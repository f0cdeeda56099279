pub mod interval;
pub mod lock;
pub mod payment;
pub mod repository;

pub use interval::StayInterval;
pub use lock::{LockStore, RoomLockManager, DEFAULT_LOCK_TTL_SECONDS};
pub use repository::Repositories;

/// Failure kinds surfaced by the booking core. Each maps to a distinct
/// caller-visible outcome; none is swallowed.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Hotel, room type, room, booking or payment absent.
    #[error("Not found: {0}")]
    NotFound(String),
    /// No room available, lock already held, or booking already cancelled.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Bad date range, bad guest count, or an illegal state transition.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Lock store, database or payment gateway unreachable or misbehaving.
    #[error("Upstream failure: {0}")]
    Upstream(String),
    #[error("Webhook signature mismatch")]
    SignatureInvalid,
    /// Unique constraint on the booking reference was hit.
    #[error("Booking reference already exists: {0}")]
    DuplicateReference(String),
}

impl BookingError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn upstream(msg: impl std::fmt::Display) -> Self {
        Self::Upstream(msg.to_string())
    }
}

impl From<serde_json::Error> for BookingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Upstream(format!("malformed payload: {}", err))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
