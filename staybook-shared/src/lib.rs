pub mod models;
pub mod pii;

pub use models::booking::{Booking, BookingStatus, GuestContact, PricingSnapshot, StaffStamp, Cancellation, BookingFilter};
pub use models::hotel::{Hotel, HotelSummary, RoomType};
pub use models::lock::RoomLock;
pub use models::payment::{PaymentRecord, PaymentStatus};
pub use models::room::{Room, RoomStatus, RoomSummary};
pub use pii::Masked;
