mod bookings;
mod cars;
mod notifications;
mod users;

use sqlx::{postgres::PgPoolOptions, PgPool};

pub use bookings::PostgresBookingRepository;
pub use cars::PostgresCarRepository;
pub use notifications::PostgresNotificationRepository;
pub use users::PostgresUserRepository;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
