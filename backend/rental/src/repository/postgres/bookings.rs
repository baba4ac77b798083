use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::booking::{Booking, BookingStatus},
    repository::errors::RepositoryError,
    usecase::contracts::BookingRepository,
};

const BOOKING_COLUMNS: &str = r#"
    id, user_id, car_id, start_date, end_date, total_price, status, payment_status, payment_method,
    pickup_location, dropoff_location, additional_drivers, insurance, notes, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BookingRepository for PostgresBookingRepository {
    #[tracing::instrument(skip(self, booking), fields(booking_id = %booking.id, car_id = %booking.car_id))]
    async fn create(&self, booking: &Booking) -> Result<(), RepositoryError> {
        tracing::debug!("creating booking");

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, car_id, start_date, end_date, total_price, status, payment_status,
                payment_method, pickup_location, dropoff_location, additional_drivers, insurance,
                notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.car_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.total_price)
        .bind(booking.status)
        .bind(booking.payment_status)
        .bind(booking.payment_method)
        .bind(&booking.pickup_location)
        .bind(&booking.dropoff_location)
        .bind(booking.additional_drivers)
        .bind(booking.insurance)
        .bind(&booking.notes)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(booking_id = %booking.id, "booking created successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(booking_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, RepositoryError> {
        tracing::debug!("finding booking by id");

        let booking = sqlx::query_as::<_, Booking>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(booking)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Booking>, RepositoryError> {
        tracing::debug!("finding bookings by user_id");

        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(user_id = %user_id, count = bookings.len(), "found bookings");
        Ok(bookings)
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Booking>, RepositoryError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = bookings.len(), "found bookings");
        Ok(bookings)
    }

    #[tracing::instrument(skip(self), fields(car_id = %car_id))]
    async fn find_active_by_car(&self, car_id: Uuid) -> Result<Vec<Booking>, RepositoryError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE car_id = $1 AND status IN ('pending', 'confirmed')
            "#
        ))
        .bind(car_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = bookings.len(), "found active bookings");
        Ok(bookings)
    }

    #[tracing::instrument(skip(self), fields(booking_id = %id))]
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), RepositoryError> {
        tracing::debug!(%status, "updating booking status");

        let result = sqlx::query("UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
