pub mod booking;
pub mod hotel;
pub mod lock;
pub mod payment;
pub mod room;
