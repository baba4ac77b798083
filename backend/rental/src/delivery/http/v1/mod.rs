pub mod auth;
pub mod bookings;
pub mod cars;
pub mod extract;
pub mod middleware;
pub mod notifications;
pub mod users;
