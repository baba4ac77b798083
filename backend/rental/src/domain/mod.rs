pub mod booking;
pub mod car;
pub mod notification;
pub mod user;
