pub mod auth;
pub mod bookings;
pub mod cars;
pub mod contracts;
pub mod error;
pub mod jwt;
pub mod notifications;
pub mod password;
pub mod wishlist;
