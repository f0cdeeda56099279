pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod gateway;
pub mod memory;
pub mod payment_repo;
pub mod redis_repo;

pub use app_config::{Backend, BusinessRules, Config};
pub use booking_repo::StoreBookingRepository;
pub use catalog_repo::StoreCatalogRepository;
pub use database::DbClient;
pub use gateway::PaystackClient;
pub use memory::MemoryBackend;
pub use payment_repo::StorePaymentRepository;
pub use redis_repo::RedisClient;

use std::sync::Arc;

use staybook_core::Repositories;

/// Wire the Postgres repositories and the Redis lock store together.
pub fn postgres_repositories(db: &DbClient, redis: RedisClient) -> Repositories {
    let catalog = Arc::new(StoreCatalogRepository::new(db.pool.clone()));
    Repositories {
        hotels: catalog.clone(),
        room_types: catalog.clone(),
        rooms: catalog,
        bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
        payments: Arc::new(StorePaymentRepository::new(db.pool.clone())),
        locks: Arc::new(redis),
    }
}
