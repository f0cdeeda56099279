use chrono::Utc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use staybook_booking::BookingOrchestrator;
use staybook_core::BookingResult;

/// Periodically moves confirmed bookings whose check-in date has passed to
/// `NO_SHOW`.
pub async fn start_no_show_sweeper(bookings: BookingOrchestrator, interval_seconds: u64) {
    let interval = Duration::from_secs(interval_seconds.max(1));
    info!("No-show sweeper started, running every {}s", interval.as_secs());

    loop {
        match sweep_once(&bookings).await {
            Ok(0) => {}
            Ok(count) => info!("Marked {} bookings as no-show", count),
            Err(e) => error!("No-show sweep failed: {}", e),
        }
        sleep(interval).await;
    }
}

pub async fn sweep_once(bookings: &BookingOrchestrator) -> BookingResult<usize> {
    let marked = bookings.mark_no_shows(Utc::now().date_naive()).await?;
    Ok(marked.len())
}
