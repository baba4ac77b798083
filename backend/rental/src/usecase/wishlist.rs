use uuid::Uuid;

use crate::domain::car::Car;
use crate::usecase::contracts::{CarRepository, UserRepository};
use crate::usecase::error::UsecaseError;

pub struct WishlistUseCase<U, C>
where
    U: UserRepository,
    C: CarRepository,
{
    user_repository: U,
    car_repository: C,
}

impl<U, C> WishlistUseCase<U, C>
where
    U: UserRepository,
    C: CarRepository,
{
    pub fn new(user_repository: U, car_repository: C) -> Self {
        Self {
            user_repository,
            car_repository,
        }
    }

    /// Returns `true` when the car is in the wishlist afterwards.
    #[tracing::instrument(skip(self))]
    pub async fn toggle(&self, user_id: Uuid, car_id: Uuid) -> Result<bool, UsecaseError> {
        tracing::debug!("toggling wishlist entry");

        if self.car_repository.find_by_id(car_id).await?.is_none() {
            return Err(UsecaseError::NotFound("Car".to_string()));
        }

        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("User".to_string()))?;

        let wishlisted = if user.has_in_wishlist(car_id) {
            self.user_repository.remove_from_wishlist(user_id, car_id).await?;
            false
        } else {
            self.user_repository.add_to_wishlist(user_id, car_id).await?;
            true
        };

        tracing::info!(%car_id, wishlisted, "wishlist toggled");
        Ok(wishlisted)
    }

    /// Cars in wishlist order. Entries whose car no longer exists are skipped.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Car>, UsecaseError> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("User".to_string()))?;

        if user.wishlist.is_empty() {
            return Ok(Vec::new());
        }

        let mut cars = self.car_repository.find_by_ids(&user.wishlist).await?;
        cars.sort_by_key(|car| user.wishlist.iter().position(|id| *id == car.id));

        tracing::debug!(count = cars.len(), "wishlist retrieved");
        Ok(cars)
    }
}
