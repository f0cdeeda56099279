use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use staybook_core::BookingError;

const EXCLUSION_VIOLATION: &str = "23P01";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// The overlap exclusion constraint on `bookings` fired.
pub(crate) fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) && db.constraint() == Some(constraint)
    )
}

pub(crate) fn map_db_error(err: sqlx::Error) -> BookingError {
    if is_exclusion_violation(&err) {
        return BookingError::conflict("Room is already booked for the selected dates");
    }
    BookingError::upstream(format!("database: {}", err))
}

/// Text column that should hold one of our enum names.
pub(crate) fn parse_column<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T, BookingError> {
    raw.parse::<T>().map_err(BookingError::Upstream)
}

pub(crate) fn to_u32(value: i32, column: &str) -> Result<u32, BookingError> {
    u32::try_from(value).map_err(|_| BookingError::upstream(format!("negative {}: {}", column, value)))
}
