use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    domain::car::{Car, CarFilter, Review},
    repository::errors::RepositoryError,
    usecase::contracts::CarRepository,
};

const CAR_COLUMNS: &str = r#"
    id, make, model, year, car_type, transmission, fuel_type, seats, price_per_day,
    images, features, available, location, mileage, rating, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PostgresCarRepository {
    pool: PgPool,
}

impl PostgresCarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fills `reviews` on each car, oldest review first.
    async fn attach_reviews(&self, cars: &mut [Car]) -> Result<(), RepositoryError> {
        if cars.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = cars.iter().map(|c| c.id).collect();
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, car_id, user_id, rating, comment, created_at
            FROM car_reviews
            WHERE car_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let mut by_car: HashMap<Uuid, Vec<Review>> = HashMap::new();
        for review in reviews {
            by_car.entry(review.car_id).or_default().push(review);
        }
        for car in cars.iter_mut() {
            car.reviews = by_car.remove(&car.id).unwrap_or_default();
        }
        Ok(())
    }
}

fn search_query(filter: &CarFilter) -> QueryBuilder<'_, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {CAR_COLUMNS} FROM cars WHERE TRUE"));

    if let Some(car_type) = filter.car_type {
        query.push(" AND car_type = ").push_bind(car_type);
    }
    if let Some(transmission) = filter.transmission {
        query.push(" AND transmission = ").push_bind(transmission);
    }
    if let Some(fuel_type) = filter.fuel_type {
        query.push(" AND fuel_type = ").push_bind(fuel_type);
    }
    if let Some(seats) = filter.seats {
        query.push(" AND seats = ").push_bind(seats);
    }
    if let Some(location) = filter.location.as_deref().filter(|l| !l.trim().is_empty()) {
        query
            .push(" AND location ILIKE ")
            .push_bind(format!("%{}%", escape_like(location.trim())));
    }
    if let Some(min_price) = filter.min_price {
        query.push(" AND price_per_day >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        query.push(" AND price_per_day <= ").push_bind(max_price);
    }
    if let Some(available) = filter.available {
        query.push(" AND available = ").push_bind(available);
    }

    query.push(" ORDER BY created_at DESC, id");
    if let Some(limit) = filter.limit {
        query.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = filter.offset {
        query.push(" OFFSET ").push_bind(offset);
    }
    query
}

fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

impl CarRepository for PostgresCarRepository {
    #[tracing::instrument(skip(self, car), fields(car_id = %car.id))]
    async fn create(&self, car: &Car) -> Result<(), RepositoryError> {
        tracing::debug!("creating car");

        sqlx::query(
            r#"
            INSERT INTO cars (
                id, make, model, year, car_type, transmission, fuel_type, seats, price_per_day,
                images, features, available, location, mileage, rating, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(car.id)
        .bind(&car.make)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.car_type)
        .bind(car.transmission)
        .bind(car.fuel_type)
        .bind(car.seats)
        .bind(car.price_per_day)
        .bind(&car.images)
        .bind(&car.features)
        .bind(car.available)
        .bind(&car.location)
        .bind(car.mileage)
        .bind(car.rating)
        .bind(car.created_at)
        .bind(car.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tracing::debug!(car_id = %car.id, "car created successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(car_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>, RepositoryError> {
        tracing::debug!("finding car by id");

        let car = sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        match car {
            Some(car) => {
                let mut cars = [car];
                self.attach_reviews(&mut cars).await?;
                let [car] = cars;
                Ok(Some(car))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Car>, RepositoryError> {
        let mut cars = sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        self.attach_reviews(&mut cars).await?;
        Ok(cars)
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, filter: &CarFilter) -> Result<Vec<Car>, RepositoryError> {
        tracing::debug!("searching cars");

        let mut cars = search_query(filter)
            .build_query_as::<Car>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        self.attach_reviews(&mut cars).await?;

        tracing::debug!(count = cars.len(), "found cars");
        Ok(cars)
    }

    #[tracing::instrument(skip(self, car), fields(car_id = %car.id))]
    async fn update(&self, car: &Car) -> Result<(), RepositoryError> {
        tracing::debug!("updating car");

        let result = sqlx::query(
            r#"
            UPDATE cars
            SET make = $2, model = $3, year = $4, car_type = $5, transmission = $6, fuel_type = $7,
                seats = $8, price_per_day = $9, images = $10, features = $11, available = $12,
                location = $13, mileage = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(car.id)
        .bind(&car.make)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.car_type)
        .bind(car.transmission)
        .bind(car.fuel_type)
        .bind(car.seats)
        .bind(car.price_per_day)
        .bind(&car.images)
        .bind(&car.features)
        .bind(car.available)
        .bind(&car.location)
        .bind(car.mileage)
        .bind(car.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(car_id = %car.id, "car updated successfully");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(car_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(car_id = %id, "car deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(car_id = %id))]
    async fn set_available(&self, id: Uuid, available: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cars SET available = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(available)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!(car_id = %id, available, "car availability set");
        Ok(())
    }

    #[tracing::instrument(skip(self, review), fields(car_id = %review.car_id))]
    async fn add_review(&self, review: &Review) -> Result<f64, RepositoryError> {
        tracing::debug!("adding review");

        let mut tx = self.pool.begin().await?;

        // Row lock serialises concurrent reviews of the same car, so the mean
        // below sees every committed review.
        sqlx::query("SELECT id FROM cars WHERE id = $1 FOR UPDATE")
            .bind(review.car_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r#"
            INSERT INTO car_reviews (id, car_id, user_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id)
        .bind(review.car_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let rating: f64 = sqlx::query_scalar(
            r#"
            UPDATE cars
            SET rating = (
                    SELECT COALESCE(AVG(rating::float8), 0.0)
                    FROM car_reviews
                    WHERE car_id = $1
                ),
                updated_at = NOW()
            WHERE id = $1
            RETURNING rating
            "#,
        )
        .bind(review.car_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tx.commit().await?;

        tracing::debug!(review_id = %review.id, rating, "review stored");
        Ok(rating)
    }
}
