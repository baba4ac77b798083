use uuid::Uuid;

use crate::domain::car::{Car, CarFilter, CarUpdate, NewCar, Review};
use crate::domain::user::Actor;
use crate::repository::errors::RepositoryError;
use crate::usecase::auth::require_admin;
use crate::usecase::contracts::CarRepository;
use crate::usecase::error::UsecaseError;

pub struct CarsUseCase<C>
where
    C: CarRepository,
{
    car_repository: C,
}

impl<C> CarsUseCase<C>
where
    C: CarRepository,
{
    pub fn new(car_repository: C) -> Self {
        Self { car_repository }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_cars(&self, filter: CarFilter) -> Result<Vec<Car>, UsecaseError> {
        tracing::debug!("listing cars");

        let cars = self.car_repository.search(&filter).await?;

        tracing::debug!(count = cars.len(), "cars listed");
        Ok(cars)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_car(&self, car_id: Uuid) -> Result<Car, UsecaseError> {
        self.car_repository
            .find_by_id(car_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Car".to_string()))
    }

    #[tracing::instrument(skip(self, new_car), fields(actor_id = %actor.id))]
    pub async fn create_car(&self, actor: &Actor, new_car: NewCar) -> Result<Car, UsecaseError> {
        require_admin(actor)?;

        let car = Car::new(new_car);
        self.car_repository.create(&car).await?;

        tracing::info!(car_id = %car.id, "car created");
        Ok(car)
    }

    #[tracing::instrument(skip(self, update), fields(actor_id = %actor.id))]
    pub async fn update_car(&self, actor: &Actor, car_id: Uuid, update: CarUpdate) -> Result<Car, UsecaseError> {
        require_admin(actor)?;

        let mut car = self.get_car(car_id).await?;
        car.update(update);
        self.car_repository.update(&car).await?;

        tracing::info!(%car_id, "car updated");
        Ok(car)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete_car(&self, actor: &Actor, car_id: Uuid) -> Result<(), UsecaseError> {
        require_admin(actor)?;

        self.car_repository.delete(car_id).await.map_err(|e| match e {
            RepositoryError::NotFound => UsecaseError::NotFound("Car".to_string()),
            other => other.into(),
        })?;

        tracing::info!(%car_id, "car deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self, comment), fields(actor_id = %actor.id))]
    pub async fn add_review(
        &self,
        actor: &Actor,
        car_id: Uuid,
        rating: i16,
        comment: Option<String>,
    ) -> Result<Car, UsecaseError> {
        tracing::debug!("adding review");

        if !(1..=5).contains(&rating) {
            return Err(UsecaseError::Validation("Rating must be between 1 and 5".to_string()));
        }

        let mut car = self.get_car(car_id).await?;
        let review = Review::new(car_id, actor.id, rating, comment);
        let stored_rating = self.car_repository.add_review(&review).await.map_err(|e| match e {
            RepositoryError::NotFound => UsecaseError::NotFound("Car".to_string()),
            other => other.into(),
        })?;
        car.add_review(review, stored_rating);

        tracing::info!(%car_id, rating = car.rating, reviews = car.reviews.len(), "review added");
        Ok(car)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::car::tests::sample_car;
    use crate::domain::user::Role;
    use crate::usecase::contracts::MockCarRepository;
    use rust_decimal::Decimal;

    fn user() -> Actor {
        Actor { id: Uuid::new_v4(), role: Role::User }
    }

    fn admin() -> Actor {
        Actor { id: Uuid::new_v4(), role: Role::Admin }
    }

    #[tokio::test]
    async fn test_get_car_not_found() {
        let mut repo = MockCarRepository::new();
        let car_id = Uuid::new_v4();
        repo.expect_find_by_id()
            .with(mockall::predicate::eq(car_id))
            .times(1)
            .returning(|_| Ok(None));

        let usecase = CarsUseCase::new(repo);
        let result = usecase.get_car(car_id).await;

        assert!(matches!(result, Err(UsecaseError::NotFound(m)) if m == "Car"));
    }

    #[tokio::test]
    async fn test_list_cars_passes_filter() {
        let mut repo = MockCarRepository::new();
        let car = sample_car(50);
        repo.expect_search()
            .withf(|f| f.available == Some(true) && f.max_price == Some(Decimal::from(80)))
            .times(1)
            .returning(move |_| Ok(vec![car.clone()]));

        let usecase = CarsUseCase::new(repo);
        let cars = usecase
            .list_cars(CarFilter {
                available: Some(true),
                max_price: Some(Decimal::from(80)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(cars.len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_require_admin() {
        let repo = MockCarRepository::new();
        let usecase = CarsUseCase::new(repo);
        let actor = user();
        let car_id = Uuid::new_v4();

        assert!(matches!(
            usecase.update_car(&actor, car_id, CarUpdate::default()).await,
            Err(UsecaseError::Forbidden(_))
        ));
        assert!(matches!(
            usecase.delete_car(&actor, car_id).await,
            Err(UsecaseError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_updates_car() {
        let mut repo = MockCarRepository::new();
        let car = sample_car(50);
        let car_id = car.id;
        repo.expect_find_by_id().times(1).returning(move |_| Ok(Some(car.clone())));
        repo.expect_update()
            .withf(|c| c.price_per_day == Decimal::from(70))
            .times(1)
            .returning(|_| Ok(()));

        let usecase = CarsUseCase::new(repo);
        let updated = usecase
            .update_car(
                &admin(),
                car_id,
                CarUpdate {
                    price_per_day: Some(Decimal::from(70)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price_per_day, Decimal::from(70));
    }

    #[tokio::test]
    async fn test_delete_missing_car() {
        let mut repo = MockCarRepository::new();
        repo.expect_delete().times(1).returning(|_| Err(RepositoryError::NotFound));

        let usecase = CarsUseCase::new(repo);
        let result = usecase.delete_car(&admin(), Uuid::new_v4()).await;

        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_review_uses_stored_average() {
        let mut repo = MockCarRepository::new();
        let mut car = sample_car(50);
        car.add_review(Review::new(car.id, Uuid::new_v4(), 5, None), 5.0);
        let car_id = car.id;

        repo.expect_find_by_id().times(1).returning(move |_| Ok(Some(car.clone())));
        // A concurrent 1-star review landed after the car was read: the
        // stored mean over [5, 1, 3] wins over the mean of what was loaded.
        repo.expect_add_review()
            .withf(move |review| review.rating == 3 && review.car_id == car_id)
            .times(1)
            .returning(|_| Ok(3.0));

        let usecase = CarsUseCase::new(repo);
        let updated = usecase
            .add_review(&user(), car_id, 3, Some("Great".to_string()))
            .await
            .unwrap();

        assert_eq!(updated.reviews.len(), 2);
        assert_eq!(updated.rating, 3.0);
    }

    #[tokio::test]
    async fn test_add_review_car_deleted_meanwhile() {
        let mut repo = MockCarRepository::new();
        let car = sample_car(50);
        let car_id = car.id;
        repo.expect_find_by_id().times(1).returning(move |_| Ok(Some(car.clone())));
        repo.expect_add_review().times(1).returning(|_| Err(RepositoryError::NotFound));

        let usecase = CarsUseCase::new(repo);
        let result = usecase.add_review(&user(), car_id, 4, None).await;

        assert!(matches!(result, Err(UsecaseError::NotFound(m)) if m == "Car"));
    }

    #[tokio::test]
    async fn test_add_review_rejects_out_of_range() {
        let repo = MockCarRepository::new();
        let usecase = CarsUseCase::new(repo);

        let result = usecase.add_review(&user(), Uuid::new_v4(), 6, None).await;

        assert!(matches!(result, Err(UsecaseError::Validation(_))));
    }
}
