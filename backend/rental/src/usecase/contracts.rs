use uuid::Uuid;

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::car::{Car, CarFilter, Review};
use crate::domain::notification::Notification;
use crate::domain::user::User;
use crate::repository::errors::RepositoryError;

#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<User>, RepositoryError>;
    async fn update(&self, user: &User) -> Result<(), RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn append_booking(&self, user_id: Uuid, booking_id: Uuid) -> Result<(), RepositoryError>;
    async fn add_to_wishlist(&self, user_id: Uuid, car_id: Uuid) -> Result<(), RepositoryError>;
    async fn remove_from_wishlist(&self, user_id: Uuid, car_id: Uuid) -> Result<(), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait CarRepository: Send + Sync {
    async fn create(&self, car: &Car) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>, RepositoryError>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Car>, RepositoryError>;
    async fn search(&self, filter: &CarFilter) -> Result<Vec<Car>, RepositoryError>;
    async fn update(&self, car: &Car) -> Result<(), RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn set_available(&self, id: Uuid, available: bool) -> Result<(), RepositoryError>;
    /// Stores the review and returns the car's recomputed mean rating.
    async fn add_review(&self, review: &Review) -> Result<f64, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, RepositoryError>;
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Booking>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Booking>, RepositoryError>;
    async fn find_active_by_car(&self, car_id: Uuid) -> Result<Vec<Booking>, RepositoryError>;
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>, RepositoryError>;
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Notification>, RepositoryError>;
    async fn mark_as_read(&self, id: Uuid) -> Result<(), RepositoryError>;
}
