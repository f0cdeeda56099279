pub mod availability;
pub mod pricing;

pub use availability::AvailabilityChecker;
pub use pricing::{PricingCalculator, PricingConfig};
