use std::sync::Arc;

use staybook_booking::{BookingOrchestrator, BookingSettings, PaymentConfirmationHandler, PaymentSettings};
use staybook_core::payment::PaymentGateway;
use staybook_core::Repositories;
use staybook_store::app_config::{BusinessRules, PaymentsConfig};

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingOrchestrator,
    pub payments: PaymentConfirmationHandler,
}

impl AppState {
    pub fn new(
        repos: &Repositories,
        rules: &BusinessRules,
        payments: &PaymentsConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let bookings = BookingOrchestrator::new(repos, BookingSettings::from(rules));
        let payments = PaymentConfirmationHandler::new(
            bookings.clone(),
            repos,
            gateway,
            PaymentSettings {
                webhook_secret: payments.webhook_secret.clone(),
                callback_base_url: payments.callback_base_url.clone(),
                currency: payments.currency.clone(),
            },
        );
        Self { bookings, payments }
    }
}
