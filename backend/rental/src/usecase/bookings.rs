use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::booking::{ensure_no_conflict, Booking, BookingStatus, NewBooking};
use crate::domain::car::Car;
use crate::domain::notification::NotificationType;
use crate::domain::user::{Actor, User};
use crate::usecase::auth::require_admin;
use crate::usecase::contracts::{BookingRepository, CarRepository, NotificationRepository, UserRepository};
use crate::usecase::error::UsecaseError;
use crate::usecase::notifications::NotificationsUseCase;

const MY_BOOKINGS_LINK: &str = "/my-bookings";

/// A booking with its car and owner resolved where they were requested.
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub booking: Booking,
    pub car: Option<Car>,
    pub user: Option<User>,
}

impl BookingDetails {
    fn bare(booking: Booking) -> Self {
        Self { booking, car: None, user: None }
    }
}

pub struct BookingsUseCase<B, C, U, N>
where
    B: BookingRepository,
    C: CarRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    booking_repository: B,
    car_repository: C,
    user_repository: U,
    notifications: NotificationsUseCase<N>,
}

impl<B, C, U, N> BookingsUseCase<B, C, U, N>
where
    B: BookingRepository,
    C: CarRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    pub fn new(
        booking_repository: B,
        car_repository: C,
        user_repository: U,
        notifications: NotificationsUseCase<N>,
    ) -> Self {
        Self {
            booking_repository,
            car_repository,
            user_repository,
            notifications,
        }
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id, car_id = %request.car_id))]
    pub async fn create_booking(&self, actor: &Actor, request: NewBooking) -> Result<BookingDetails, UsecaseError> {
        tracing::debug!("creating booking");

        let car = self
            .car_repository
            .find_by_id(request.car_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Car".to_string()))?;

        if !car.available {
            return Err(UsecaseError::Unavailable("Car is not available for booking".to_string()));
        }

        let booking = Booking::new(actor.id, &car, request)?;

        // Check-then-insert is not atomic; concurrent requests may both pass.
        let active = self.booking_repository.find_active_by_car(car.id).await?;
        if let Err(e) = ensure_no_conflict(&active, booking.start_date, booking.end_date) {
            metrics::counter!("rental_booking_conflicts_total").increment(1);
            return Err(e.into());
        }

        self.booking_repository.create(&booking).await?;
        self.user_repository.append_booking(actor.id, booking.id).await?;

        metrics::counter!("rental_bookings_created_total").increment(1);
        tracing::info!(booking_id = %booking.id, total_price = %booking.total_price, "booking created");

        Ok(BookingDetails {
            booking,
            car: Some(car),
            user: None,
        })
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, UsecaseError> {
        require_admin(actor)?;

        let mut booking = self.find_booking(booking_id).await?;
        let previous = booking.status;
        booking.set_status(status)?;

        self.booking_repository.update_status(booking.id, booking.status).await?;
        if let Some(available) = booking.status.car_availability() {
            self.car_repository.set_available(booking.car_id, available).await?;
        }

        metrics::counter!("rental_booking_transitions_total", "status" => booking.status.as_str()).increment(1);
        tracing::info!(%booking_id, from = %previous, to = %booking.status, "booking status updated");

        self.notifications
            .notify(
                booking.user_id,
                NotificationType::BookingStatus,
                format!("Your booking status has been updated to {}", booking.status),
                Some(MY_BOOKINGS_LINK.to_string()),
            )
            .await;

        Ok(booking)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn cancel_booking(&self, actor: &Actor, booking_id: Uuid) -> Result<Booking, UsecaseError> {
        let mut booking = self.find_booking(booking_id).await?;

        if !actor.can_access(booking.user_id) {
            return Err(UsecaseError::access_denied());
        }

        booking.cancel()?;

        self.booking_repository.update_status(booking.id, booking.status).await?;
        self.car_repository.set_available(booking.car_id, true).await?;

        metrics::counter!("rental_booking_transitions_total", "status" => booking.status.as_str()).increment(1);
        tracing::info!(%booking_id, "booking cancelled");

        if booking.user_id != actor.id {
            self.notifications
                .notify(
                    booking.user_id,
                    NotificationType::BookingStatus,
                    "Your booking has been cancelled by an administrator".to_string(),
                    Some(MY_BOOKINGS_LINK.to_string()),
                )
                .await;
        }

        Ok(booking)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn get_booking(&self, actor: &Actor, booking_id: Uuid) -> Result<BookingDetails, UsecaseError> {
        let booking = self.find_booking(booking_id).await?;

        if !actor.can_access(booking.user_id) {
            return Err(UsecaseError::access_denied());
        }

        let car = self.car_repository.find_by_id(booking.car_id).await?;
        let user = self.user_repository.find_by_id(booking.user_id).await?;

        Ok(BookingDetails { booking, car, user })
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn list_for_user(&self, actor: &Actor) -> Result<Vec<BookingDetails>, UsecaseError> {
        tracing::debug!("listing own bookings");

        let bookings = self.booking_repository.find_by_user_id(actor.id).await?;
        let mut details: Vec<BookingDetails> = bookings.into_iter().map(BookingDetails::bare).collect();
        self.attach_cars(&mut details).await?;

        tracing::debug!(count = details.len(), "bookings listed");
        Ok(details)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<BookingDetails>, UsecaseError> {
        require_admin(actor)?;

        let bookings = self.booking_repository.find_all().await?;
        let mut details: Vec<BookingDetails> = bookings.into_iter().map(BookingDetails::bare).collect();
        self.attach_cars(&mut details).await?;
        self.attach_users(&mut details).await?;

        tracing::debug!(count = details.len(), "all bookings listed");
        Ok(details)
    }

    async fn find_booking(&self, booking_id: Uuid) -> Result<Booking, UsecaseError> {
        self.booking_repository
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Booking".to_string()))
    }

    async fn attach_cars(&self, details: &mut [BookingDetails]) -> Result<(), UsecaseError> {
        if details.is_empty() {
            return Ok(());
        }

        let ids = unique_ids(details.iter().map(|d| d.booking.car_id));
        let cars: HashMap<Uuid, Car> = self
            .car_repository
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|car| (car.id, car))
            .collect();

        for detail in details.iter_mut() {
            detail.car = cars.get(&detail.booking.car_id).cloned();
        }
        Ok(())
    }

    async fn attach_users(&self, details: &mut [BookingDetails]) -> Result<(), UsecaseError> {
        if details.is_empty() {
            return Ok(());
        }

        let ids = unique_ids(details.iter().map(|d| d.booking.user_id));
        let users: HashMap<Uuid, User> = self
            .user_repository
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        for detail in details.iter_mut() {
            detail.user = users.get(&detail.booking.user_id).cloned();
        }
        Ok(())
    }
}

fn unique_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::tests::{day, request};
    use crate::domain::car::tests::sample_car;
    use crate::domain::user::tests::sample_user;
    use crate::domain::user::Role;
    use crate::repository::errors::RepositoryError;
    use crate::usecase::contracts::{
        MockBookingRepository, MockCarRepository, MockNotificationRepository, MockUserRepository,
    };
    use rust_decimal::Decimal;

    struct Mocks {
        bookings: MockBookingRepository,
        cars: MockCarRepository,
        users: MockUserRepository,
        notifications: MockNotificationRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                bookings: MockBookingRepository::new(),
                cars: MockCarRepository::new(),
                users: MockUserRepository::new(),
                notifications: MockNotificationRepository::new(),
            }
        }

        fn into_usecase(
            self,
        ) -> BookingsUseCase<MockBookingRepository, MockCarRepository, MockUserRepository, MockNotificationRepository>
        {
            BookingsUseCase::new(
                self.bookings,
                self.cars,
                self.users,
                NotificationsUseCase::new(self.notifications),
            )
        }
    }

    fn user(id: Uuid) -> Actor {
        Actor { id, role: Role::User }
    }

    fn admin() -> Actor {
        Actor { id: Uuid::new_v4(), role: Role::Admin }
    }

    fn existing_booking(car: &Car, owner: Uuid) -> Booking {
        Booking::new(owner, car, request(car.id, day(2023, 1, 1), day(2023, 1, 3))).unwrap()
    }

    #[tokio::test]
    async fn test_create_booking_prices_and_records() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let car_id = car.id;
        let actor = user(Uuid::new_v4());
        let actor_id = actor.id;

        m.cars
            .expect_find_by_id()
            .with(mockall::predicate::eq(car_id))
            .times(1)
            .returning(move |_| Ok(Some(car.clone())));
        m.bookings.expect_find_active_by_car().times(1).returning(|_| Ok(vec![]));
        m.bookings
            .expect_create()
            .withf(move |b| b.user_id == actor_id && b.status == BookingStatus::Pending)
            .times(1)
            .returning(|_| Ok(()));
        m.users
            .expect_append_booking()
            .withf(move |user_id, _| *user_id == actor_id)
            .times(1)
            .returning(|_, _| Ok(()));

        let usecase = m.into_usecase();
        let details = usecase
            .create_booking(&actor, request(car_id, day(2023, 1, 1), day(2023, 1, 3)))
            .await
            .unwrap();

        assert_eq!(details.booking.total_price, Decimal::from(100));
        assert_eq!(details.booking.status, BookingStatus::Pending);
        assert_eq!(details.car.map(|c| c.id), Some(car_id));
    }

    #[tokio::test]
    async fn test_create_booking_overlapping_dates() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let car_id = car.id;
        let existing = existing_booking(&car, Uuid::new_v4());

        m.cars.expect_find_by_id().times(1).returning(move |_| Ok(Some(car.clone())));
        m.bookings
            .expect_find_active_by_car()
            .times(1)
            .returning(move |_| Ok(vec![existing.clone()]));
        m.bookings.expect_create().never();
        m.users.expect_append_booking().never();

        let usecase = m.into_usecase();
        let result = usecase
            .create_booking(&user(Uuid::new_v4()), request(car_id, day(2023, 1, 2), day(2023, 1, 4)))
            .await;

        assert!(matches!(result, Err(UsecaseError::DateConflict)));
    }

    #[tokio::test]
    async fn test_create_booking_missing_car() {
        let mut m = Mocks::new();
        m.cars.expect_find_by_id().times(1).returning(|_| Ok(None));

        let usecase = m.into_usecase();
        let result = usecase
            .create_booking(
                &user(Uuid::new_v4()),
                request(Uuid::new_v4(), day(2023, 1, 1), day(2023, 1, 3)),
            )
            .await;

        assert!(matches!(result, Err(UsecaseError::NotFound(m)) if m == "Car"));
    }

    #[tokio::test]
    async fn test_create_booking_unavailable_car() {
        let mut m = Mocks::new();
        let mut car = sample_car(50);
        car.available = false;
        let car_id = car.id;
        m.cars.expect_find_by_id().times(1).returning(move |_| Ok(Some(car.clone())));
        m.bookings.expect_find_active_by_car().never();

        let usecase = m.into_usecase();
        let result = usecase
            .create_booking(&user(Uuid::new_v4()), request(car_id, day(2023, 1, 1), day(2023, 1, 3)))
            .await;

        assert!(matches!(result, Err(UsecaseError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_create_booking_inverted_dates() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let car_id = car.id;
        m.cars.expect_find_by_id().times(1).returning(move |_| Ok(Some(car.clone())));
        m.bookings.expect_create().never();

        let usecase = m.into_usecase();
        let result = usecase
            .create_booking(&user(Uuid::new_v4()), request(car_id, day(2023, 1, 3), day(2023, 1, 1)))
            .await;

        assert!(matches!(result, Err(UsecaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_confirm_marks_car_unavailable_and_notifies_owner() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let car_id = car.id;
        let owner = Uuid::new_v4();
        let booking = existing_booking(&car, owner);
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));
        m.bookings
            .expect_update_status()
            .with(mockall::predicate::eq(booking_id), mockall::predicate::eq(BookingStatus::Confirmed))
            .times(1)
            .returning(|_, _| Ok(()));
        m.cars
            .expect_set_available()
            .with(mockall::predicate::eq(car_id), mockall::predicate::eq(false))
            .times(1)
            .returning(|_, _| Ok(()));
        m.notifications
            .expect_create()
            .withf(move |n| n.user_id == owner && n.notification_type == NotificationType::BookingStatus)
            .times(1)
            .returning(|_| Ok(()));

        let usecase = m.into_usecase();
        let updated = usecase
            .update_status(&admin(), booking_id, BookingStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(updated.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_complete_frees_car_even_if_notification_fails() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let car_id = car.id;
        let booking = existing_booking(&car, Uuid::new_v4());
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));
        m.bookings.expect_update_status().times(1).returning(|_, _| Ok(()));
        m.cars
            .expect_set_available()
            .with(mockall::predicate::eq(car_id), mockall::predicate::eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        m.notifications
            .expect_create()
            .times(1)
            .returning(|_| Err(RepositoryError::DatabaseError("down".to_string())));

        let usecase = m.into_usecase();
        let updated = usecase
            .update_status(&admin(), booking_id, BookingStatus::Completed)
            .await
            .unwrap();

        assert_eq!(updated.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_status_requires_admin() {
        let mut m = Mocks::new();
        m.bookings.expect_find_by_id().never();

        let usecase = m.into_usecase();
        let result = usecase
            .update_status(&user(Uuid::new_v4()), Uuid::new_v4(), BookingStatus::Confirmed)
            .await;

        assert!(matches!(result, Err(UsecaseError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_status_back_to_pending() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let booking = existing_booking(&car, Uuid::new_v4());
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));
        m.bookings.expect_update_status().never();
        m.cars.expect_set_available().never();

        let usecase = m.into_usecase();
        let result = usecase.update_status(&admin(), booking_id, BookingStatus::Pending).await;

        assert!(matches!(result, Err(UsecaseError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_update_status_missing_booking() {
        let mut m = Mocks::new();
        m.bookings.expect_find_by_id().times(1).returning(|_| Ok(None));

        let usecase = m.into_usecase();
        let result = usecase
            .update_status(&admin(), Uuid::new_v4(), BookingStatus::Confirmed)
            .await;

        assert!(matches!(result, Err(UsecaseError::NotFound(m)) if m == "Booking"));
    }

    #[tokio::test]
    async fn test_owner_cancels_and_frees_car() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let car_id = car.id;
        let owner = Uuid::new_v4();
        let mut booking = existing_booking(&car, owner);
        booking.set_status(BookingStatus::Confirmed).unwrap();
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));
        m.bookings
            .expect_update_status()
            .with(mockall::predicate::eq(booking_id), mockall::predicate::eq(BookingStatus::Cancelled))
            .times(1)
            .returning(|_, _| Ok(()));
        m.cars
            .expect_set_available()
            .with(mockall::predicate::eq(car_id), mockall::predicate::eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        m.notifications.expect_create().never();

        let usecase = m.into_usecase();
        let cancelled = usecase.cancel_booking(&user(owner), booking_id).await.unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_admin_cancel_notifies_owner() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let owner = Uuid::new_v4();
        let booking = existing_booking(&car, owner);
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));
        m.bookings.expect_update_status().times(1).returning(|_, _| Ok(()));
        m.cars.expect_set_available().times(1).returning(|_, _| Ok(()));
        m.notifications
            .expect_create()
            .withf(move |n| n.user_id == owner)
            .times(1)
            .returning(|_| Ok(()));

        let usecase = m.into_usecase();
        assert!(usecase.cancel_booking(&admin(), booking_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_stranger_cannot_cancel() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let booking = existing_booking(&car, Uuid::new_v4());
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));
        m.bookings.expect_update_status().never();

        let usecase = m.into_usecase();
        let result = usecase.cancel_booking(&user(Uuid::new_v4()), booking_id).await;

        assert!(matches!(result, Err(UsecaseError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_cancel_completed_booking() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let owner = Uuid::new_v4();
        let mut booking = existing_booking(&car, owner);
        booking.set_status(BookingStatus::Completed).unwrap();
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));
        m.cars.expect_set_available().never();

        let usecase = m.into_usecase();
        let result = usecase.cancel_booking(&user(owner), booking_id).await;

        assert!(matches!(result, Err(UsecaseError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_get_booking_populates_car_and_owner() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let owner = sample_user();
        let owner_id = owner.id;
        let booking = existing_booking(&car, owner_id);
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));
        m.cars.expect_find_by_id().times(1).returning(move |_| Ok(Some(car.clone())));
        m.users.expect_find_by_id().times(1).returning(move |_| Ok(Some(owner.clone())));

        let usecase = m.into_usecase();
        let details = usecase.get_booking(&user(owner_id), booking_id).await.unwrap();

        assert!(details.car.is_some());
        assert_eq!(details.user.map(|u| u.email), Some("jane@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_get_booking_of_another_user() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let booking = existing_booking(&car, Uuid::new_v4());
        let booking_id = booking.id;

        m.bookings.expect_find_by_id().times(1).returning(move |_| Ok(Some(booking.clone())));

        let usecase = m.into_usecase();
        let result = usecase.get_booking(&user(Uuid::new_v4()), booking_id).await;

        assert!(matches!(result, Err(UsecaseError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_for_user_attaches_cars() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let owner = Uuid::new_v4();
        let first = existing_booking(&car, owner);
        let second = existing_booking(&car, owner);

        m.bookings
            .expect_find_by_user_id()
            .with(mockall::predicate::eq(owner))
            .times(1)
            .returning(move |_| Ok(vec![second.clone(), first.clone()]));
        m.cars
            .expect_find_by_ids()
            .withf(|ids| ids.len() == 1)
            .times(1)
            .returning(move |_| Ok(vec![car.clone()]));
        m.users.expect_find_by_ids().never();

        let usecase = m.into_usecase();
        let details = usecase.list_for_user(&user(owner)).await.unwrap();

        assert_eq!(details.len(), 2);
        assert!(details.iter().all(|d| d.car.is_some() && d.user.is_none()));
    }

    #[tokio::test]
    async fn test_list_all_requires_admin() {
        let mut m = Mocks::new();
        m.bookings.expect_find_all().never();

        let usecase = m.into_usecase();
        let result = usecase.list_all(&user(Uuid::new_v4())).await;

        assert!(matches!(result, Err(UsecaseError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_all_populates_owners() {
        let mut m = Mocks::new();
        let car = sample_car(50);
        let owner = sample_user();
        let booking = existing_booking(&car, owner.id);

        m.bookings.expect_find_all().times(1).returning(move || Ok(vec![booking.clone()]));
        m.cars.expect_find_by_ids().times(1).returning(move |_| Ok(vec![car.clone()]));
        m.users.expect_find_by_ids().times(1).returning(move |_| Ok(vec![owner.clone()]));

        let usecase = m.into_usecase();
        let details = usecase.list_all(&admin()).await.unwrap();

        assert_eq!(details.len(), 1);
        assert!(details[0].user.is_some());
    }
}
