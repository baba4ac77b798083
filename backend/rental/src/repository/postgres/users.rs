use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::user::User, repository::errors::RepositoryError, usecase::contracts::UserRepository,
};

const USER_COLUMNS: &str = r#"
    id, name, email, password_hash, phone, address, role, license_number, license_expiry,
    bookings, wishlist, is_verified, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn array_update(&self, sql: &str, user_id: Uuid, value: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query(sql)
            .bind(user_id)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        tracing::debug!("creating user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, phone, address, role, license_number, license_expiry,
                bookings, wishlist, is_verified, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.role)
        .bind(&user.license_number)
        .bind(user.license_expiry)
        .bind(&user.bookings)
        .bind(&user.wishlist)
        .bind(user.is_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(user_id = %user.id, "user created successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(user_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        tracing::debug!("finding user by id");

        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        tracing::debug!("finding user by email");

        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(users)
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(count = users.len(), "found users");
        Ok(users)
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        tracing::debug!("updating user");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, phone = $4, address = $5, role = $6,
                license_number = $7, license_expiry = $8, is_verified = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.role)
        .bind(&user.license_number)
        .bind(user.license_expiry)
        .bind(user.is_verified)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(user_id = %user.id, "user updated successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(user_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(user_id = %id, "user deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn append_booking(&self, user_id: Uuid, booking_id: Uuid) -> Result<(), RepositoryError> {
        self.array_update(
            "UPDATE users SET bookings = array_append(bookings, $2) WHERE id = $1",
            user_id,
            booking_id,
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn add_to_wishlist(&self, user_id: Uuid, car_id: Uuid) -> Result<(), RepositoryError> {
        self.array_update(
            r#"
            UPDATE users SET wishlist = array_append(wishlist, $2)
            WHERE id = $1 AND NOT ($2 = ANY(wishlist))
            "#,
            user_id,
            car_id,
        )
        .await
        .or_else(|e| match e {
            // Already present counts as success.
            RepositoryError::NotFound => Ok(()),
            other => Err(other),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn remove_from_wishlist(&self, user_id: Uuid, car_id: Uuid) -> Result<(), RepositoryError> {
        self.array_update(
            "UPDATE users SET wishlist = array_remove(wishlist, $2) WHERE id = $1",
            user_id,
            car_id,
        )
        .await
    }
}
