use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "car_type")]
pub enum CarType {
    Sedan,
    #[sqlx(rename = "SUV")]
    #[serde(rename = "SUV")]
    Suv,
    Sports,
    Luxury,
    Compact,
    Van,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transmission")]
pub enum Transmission {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "fuel_type")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(car_id: Uuid, user_id: Uuid, rating: i16, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            car_id,
            user_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub car_type: CarType,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub seats: i32,
    pub price_per_day: Decimal,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub available: bool,
    pub location: String,
    pub mileage: i32,
    pub rating: f64,
    #[sqlx(skip)]
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub car_type: CarType,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub seats: i32,
    pub price_per_day: Decimal,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub available: bool,
    pub location: String,
    pub mileage: i32,
}

#[derive(Debug, Clone, Default)]
pub struct CarUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub car_type: Option<CarType>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub seats: Option<i32>,
    pub price_per_day: Option<Decimal>,
    pub images: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub available: Option<bool>,
    pub location: Option<String>,
    pub mileage: Option<i32>,
}

/// Listing filter. `None` fields do not constrain the result; without a
/// `limit` every matching car is returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarFilter {
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

impl Car {
    pub fn new(new_car: NewCar) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            make: new_car.make.trim().to_string(),
            model: new_car.model.trim().to_string(),
            year: new_car.year,
            car_type: new_car.car_type,
            transmission: new_car.transmission,
            fuel_type: new_car.fuel_type,
            seats: new_car.seats,
            price_per_day: new_car.price_per_day,
            images: new_car.images,
            features: new_car.features,
            available: new_car.available,
            location: new_car.location,
            mileage: new_car.mileage,
            rating: 0.0,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update(&mut self, update: CarUpdate) {
        if let Some(make) = update.make {
            self.make = make.trim().to_string();
        }
        if let Some(model) = update.model {
            self.model = model.trim().to_string();
        }
        if let Some(year) = update.year {
            self.year = year;
        }
        if let Some(car_type) = update.car_type {
            self.car_type = car_type;
        }
        if let Some(transmission) = update.transmission {
            self.transmission = transmission;
        }
        if let Some(fuel_type) = update.fuel_type {
            self.fuel_type = fuel_type;
        }
        if let Some(seats) = update.seats {
            self.seats = seats;
        }
        if let Some(price_per_day) = update.price_per_day {
            self.price_per_day = price_per_day;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(features) = update.features {
            self.features = features;
        }
        if let Some(available) = update.available {
            self.available = available;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(mileage) = update.mileage {
            self.mileage = mileage;
        }
        self.updated_at = Utc::now();
    }

    /// Appends a stored review. `rating` is the mean over every stored review
    /// of this car, as recomputed by the repository.
    pub fn add_review(&mut self, review: Review, rating: f64) {
        self.reviews.push(review);
        self.rating = rating;
        self.updated_at = Utc::now();
    }
}
