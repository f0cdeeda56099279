pub mod lifecycle;
pub mod manager;
pub mod models;
pub mod orchestrator;
pub mod reference;

pub use lifecycle::Transition;
pub use manager::{BookingOrchestrator, BookingSettings};
pub use models::{CreateBookingRequest, CreatedBooking, NotificationOutcome, PaymentInitialization};
pub use orchestrator::{
    payment_reference, webhook_signature, MockPaymentGateway, PaymentConfirmationHandler, PaymentSettings,
    PAYMENT_SUCCEEDED_EVENT,
};
pub use reference::{generate_reference, is_valid_reference};
