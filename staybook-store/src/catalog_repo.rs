use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use staybook_core::repository::{HotelCatalog, RoomCatalog, RoomTypeCatalog};
use staybook_core::{BookingError, BookingResult};
use staybook_shared::{Hotel, Room, RoomStatus, RoomType};

use crate::database::{map_db_error, parse_column, to_u32};

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct HotelRow {
    id: Uuid,
    name: String,
    commission_rate: f64,
}

#[derive(sqlx::FromRow)]
struct RoomTypeRow {
    id: Uuid,
    hotel_id: Uuid,
    name: String,
    base_price: i64,
    max_guests: i32,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    hotel_id: Uuid,
    room_type_id: Uuid,
    room_number: String,
    floor: Option<i32>,
    status: String,
    is_active: bool,
}

impl TryFrom<RoomRow> for Room {
    type Error = BookingError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Room {
            id: row.id,
            hotel_id: row.hotel_id,
            room_type_id: row.room_type_id,
            room_number: row.room_number,
            floor: row.floor,
            status: parse_column(&row.status)?,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl HotelCatalog for StoreCatalogRepository {
    async fn get_hotel(&self, hotel_id: Uuid) -> BookingResult<Option<Hotel>> {
        let row = sqlx::query_as::<_, HotelRow>("SELECT id, name, commission_rate FROM hotels WHERE id = $1")
            .bind(hotel_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(row.map(|r| Hotel { id: r.id, name: r.name, commission_rate: r.commission_rate }))
    }
}

#[async_trait]
impl RoomTypeCatalog for StoreCatalogRepository {
    async fn get_room_type(&self, room_type_id: Uuid, hotel_id: Uuid) -> BookingResult<Option<RoomType>> {
        let row = sqlx::query_as::<_, RoomTypeRow>(
            r#"
            SELECT id, hotel_id, name, base_price, max_guests, is_active
            FROM room_types
            WHERE id = $1 AND hotel_id = $2
            "#,
        )
        .bind(room_type_id)
        .bind(hotel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(|r| {
            Ok(RoomType {
                id: r.id,
                hotel_id: r.hotel_id,
                name: r.name,
                base_price: r.base_price,
                max_guests: to_u32(r.max_guests, "max_guests")?,
                is_active: r.is_active,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl RoomCatalog for StoreCatalogRepository {
    async fn list_by_type_and_status(
        &self,
        hotel_id: Uuid,
        room_type_id: Uuid,
        statuses: &[RoomStatus],
    ) -> BookingResult<Vec<Room>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, hotel_id, room_type_id, room_number, floor, status, is_active
            FROM rooms
            WHERE hotel_id = $1 AND room_type_id = $2 AND is_active AND status = ANY($3)
            ORDER BY room_number
            "#,
        )
        .bind(hotel_id)
        .bind(room_type_id)
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(Room::try_from).collect()
    }

    async fn get_room(&self, room_id: Uuid) -> BookingResult<Option<Room>> {
        let row = sqlx::query_as::<_, RoomRow>(
            "SELECT id, hotel_id, room_type_id, room_number, floor, status, is_active FROM rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(Room::try_from).transpose()
    }

    async fn set_status(&self, room_id: Uuid, status: RoomStatus) -> BookingResult<()> {
        let result = sqlx::query("UPDATE rooms SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(room_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::not_found("Room not found"));
        }
        Ok(())
    }
}
