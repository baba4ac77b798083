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
use validator::{Validate, ValidationError};

use crate::delivery::http::v1::extract::{Path, Query, ValidatedJson};
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::booking::fits_money_column;
use crate::domain::car::{Car, CarFilter, CarType, CarUpdate, FuelType, NewCar, Review, Transmission};
use crate::usecase::error::UsecaseError;
use crate::AppState;

const MAX_LIST_LIMIT: i64 = 100;

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if !price.is_sign_positive() || price.is_zero() {
        return Err(ValidationError::new("price_must_be_positive"));
    }
    if !fits_money_column(*price) {
        return Err(ValidationError::new("price_out_of_range")
            .with_message("price must be below 10000000000 with at most 2 decimal places".into()));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListParams {
    #[serde(rename = "type")]
    pub car_type: Option<CarType>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub seats: Option<i32>,
    pub location: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub available: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<CarListParams> for CarFilter {
    fn from(params: CarListParams) -> Self {
        Self {
            car_type: params.car_type,
            transmission: params.transmission,
            fuel_type: params.fuel_type,
            seats: params.seats,
            location: params.location,
            min_price: params.min_price,
            max_price: params.max_price,
            available: params.available,
            limit: params.limit.map(|l| l.clamp(1, MAX_LIST_LIMIT)),
            offset: params.offset.map(|o| o.max(0)),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    #[validate(length(min = 1, max = 64))]
    pub make: String,
    #[validate(length(min = 1, max = 64))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    #[serde(rename = "type")]
    pub car_type: CarType,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    #[validate(range(min = 1, max = 20))]
    pub seats: i32,
    #[validate(custom(function = "positive_price"))]
    pub price_per_day: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[validate(length(min = 1, max = 128))]
    pub location: String,
    #[validate(range(min = 0))]
    pub mileage: i32,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarRequest {
    #[validate(length(min = 1, max = 64))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub model: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub car_type: Option<CarType>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    #[validate(range(min = 1, max = 20))]
    pub seats: Option<i32>,
    #[validate(custom(function = "positive_price"))]
    pub price_per_day: Option<Decimal>,
    pub images: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub available: Option<bool>,
    #[validate(length(min = 1, max = 128))]
    pub location: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            user: review.user_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarResponse {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub car_type: CarType,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub seats: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_day: Decimal,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub available: bool,
    pub location: String,
    pub mileage: i32,
    pub rating: f64,
    pub reviews: Vec<ReviewResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Car> for CarResponse {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            make: car.make,
            model: car.model,
            year: car.year,
            car_type: car.car_type,
            transmission: car.transmission,
            fuel_type: car.fuel_type,
            seats: car.seats,
            price_per_day: car.price_per_day,
            images: car.images,
            features: car.features,
            available: car.available,
            location: car.location,
            mileage: car.mileage,
            rating: car.rating,
            reviews: car.reviews.into_iter().map(ReviewResponse::from).collect(),
            created_at: car.created_at,
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CarListParams>,
) -> Result<impl IntoResponse, UsecaseError> {
    let cars = state.cars_usecase.list_cars(params.into()).await?;

    let response: Vec<CarResponse> = cars.into_iter().map(CarResponse::from).collect();
    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state), fields(car_id = %car_id))]
pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    let car = state.cars_usecase.get_car(car_id).await?;

    Ok((StatusCode::OK, Json(CarResponse::from(car))))
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id))]
pub async fn create_car(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(payload): ValidatedJson<CreateCarRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling create car request");

    let new_car = NewCar {
        make: payload.make,
        model: payload.model,
        year: payload.year,
        car_type: payload.car_type,
        transmission: payload.transmission,
        fuel_type: payload.fuel_type,
        seats: payload.seats,
        price_per_day: payload.price_per_day,
        images: payload.images,
        features: payload.features,
        available: payload.available,
        location: payload.location,
        mileage: payload.mileage,
    };

    let car = state.cars_usecase.create_car(&user.actor(), new_car).await?;

    Ok((StatusCode::CREATED, Json(CarResponse::from(car))))
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id, car_id = %car_id))]
pub async fn update_car(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(car_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCarRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling update car request");

    let update = CarUpdate {
        make: payload.make,
        model: payload.model,
        year: payload.year,
        car_type: payload.car_type,
        transmission: payload.transmission,
        fuel_type: payload.fuel_type,
        seats: payload.seats,
        price_per_day: payload.price_per_day,
        images: payload.images,
        features: payload.features,
        available: payload.available,
        location: payload.location,
        mileage: payload.mileage,
    };

    let car = state.cars_usecase.update_car(&user.actor(), car_id, update).await?;

    Ok((StatusCode::OK, Json(CarResponse::from(car))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, car_id = %car_id))]
pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(car_id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    state.cars_usecase.delete_car(&user.actor(), car_id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Car deleted successfully" })),
    ))
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id, car_id = %car_id))]
pub async fn add_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(car_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AddReviewRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!(rating = payload.rating, "handling add review request");

    let car = state
        .cars_usecase
        .add_review(&user.actor(), car_id, payload.rating, payload.comment)
        .await?;

    Ok((StatusCode::CREATED, Json(CarResponse::from(car))))
}
