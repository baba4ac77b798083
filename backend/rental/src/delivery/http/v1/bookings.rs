use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::delivery::http::v1::cars::CarResponse;
use crate::delivery::http::v1::extract::{Path, ValidatedJson};
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::booking::{Booking, BookingStatus, NewBooking, PaymentMethod, PaymentStatus};
use crate::domain::user::User;
use crate::usecase::bookings::BookingDetails;
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub car: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 256))]
    pub pickup_location: String,
    #[validate(length(min = 1, max = 256))]
    pub dropoff_location: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 10))]
    pub additional_drivers: i32,
    #[serde(default)]
    pub insurance: bool,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Owner contact details embedded in booking responses.
#[derive(Debug, Serialize)]
pub struct UserContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<User> for UserContact {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CarRef {
    Populated(Box<CarResponse>),
    Id(Uuid),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Populated(UserContact),
    Id(Uuid),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub user: UserRef,
    pub car: CarRef,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub additional_drivers: i32,
    pub insurance: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingDetails> for BookingResponse {
    fn from(details: BookingDetails) -> Self {
        let BookingDetails { booking, car, user } = details;

        let car = match car {
            Some(car) => CarRef::Populated(Box::new(car.into())),
            None => CarRef::Id(booking.car_id),
        };
        let user = match user {
            Some(user) => UserRef::Populated(user.into()),
            None => UserRef::Id(booking.user_id),
        };

        Self {
            id: booking.id,
            user,
            car,
            start_date: booking.start_date,
            end_date: booking.end_date,
            total_price: booking.total_price,
            status: booking.status,
            payment_status: booking.payment_status,
            payment_method: booking.payment_method,
            pickup_location: booking.pickup_location,
            dropoff_location: booking.dropoff_location,
            additional_drivers: booking.additional_drivers,
            insurance: booking.insurance,
            notes: booking.notes,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        BookingDetails {
            booking,
            car: None,
            user: None,
        }
        .into()
    }
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id, car_id = %payload.car))]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(payload): ValidatedJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling create booking request");

    let request = NewBooking {
        car_id: payload.car,
        start_date: payload.start_date,
        end_date: payload.end_date,
        payment_method: payload.payment_method,
        pickup_location: payload.pickup_location,
        dropoff_location: payload.dropoff_location,
        additional_drivers: payload.additional_drivers,
        insurance: payload.insurance,
        notes: payload.notes,
    };

    let details = state.bookings_usecase.create_booking(&user.actor(), request).await?;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(details))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let bookings = state.bookings_usecase.list_for_user(&user.actor()).await?;

    let response: Vec<BookingResponse> = bookings.into_iter().map(BookingResponse::from).collect();
    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_all_bookings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let bookings = state.bookings_usecase.list_all(&user.actor()).await?;

    let response: Vec<BookingResponse> = bookings.into_iter().map(BookingResponse::from).collect();
    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, booking_id = %booking_id))]
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    let details = state.bookings_usecase.get_booking(&user.actor(), booking_id).await?;

    Ok((StatusCode::OK, Json(BookingResponse::from(details))))
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id, booking_id = %booking_id))]
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(booking_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!(status = %payload.status, "handling booking status update");

    let booking = state
        .bookings_usecase
        .update_status(&user.actor(), booking_id, payload.status)
        .await?;

    Ok((StatusCode::OK, Json(BookingResponse::from(booking))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, booking_id = %booking_id))]
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    let booking = state.bookings_usecase.cancel_booking(&user.actor(), booking_id).await?;

    Ok((StatusCode::OK, Json(BookingResponse::from(booking))))
}
