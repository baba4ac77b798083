use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::car::Car;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
pub const ADDITIONAL_DRIVER_DAILY_FEE: i64 = 10;
pub const INSURANCE_DAILY_FEE: i64 = 20;

/// Money columns are `NUMERIC(12, 2)`: below 10^10 with at most two decimals.
const MONEY_LIMIT: i64 = 10_000_000_000;
const MONEY_SCALE: u32 = 2;

pub fn fits_money_column(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE && amount.abs() < Decimal::from(MONEY_LIMIT)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingRuleError {
    #[error("End date must be after start date")]
    InvalidRange,
    #[error("Additional drivers cannot be negative")]
    NegativeDrivers,
    #[error("Total price exceeds the maximum bookable amount")]
    AmountTooLarge,
    #[error("Car is already booked for these dates")]
    DateConflict,
    #[error("Cannot change booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Active bookings hold the car for their date range.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Value the car's `available` flag takes after entering this status.
    pub fn car_availability(&self) -> Option<bool> {
        match self {
            BookingStatus::Confirmed => Some(false),
            BookingStatus::Cancelled | BookingStatus::Completed => Some(true),
            BookingStatus::Pending => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
}

/// Number of rental days, partial days rounded up.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, BookingRuleError> {
    if end <= start {
        return Err(BookingRuleError::InvalidRange);
    }
    let millis = (end - start).num_milliseconds();
    Ok((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY)
}

/// Total price of a rental:
/// `days * price_per_day + drivers * 10 * days + (insurance ? 20 * days : 0)`.
pub fn quote(
    price_per_day: Decimal,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    additional_drivers: i32,
    insurance: bool,
) -> Result<Decimal, BookingRuleError> {
    if additional_drivers < 0 {
        return Err(BookingRuleError::NegativeDrivers);
    }
    let days = Decimal::from(rental_days(start, end)?);

    let daily_rate = Decimal::from(additional_drivers)
        .checked_mul(Decimal::from(ADDITIONAL_DRIVER_DAILY_FEE))
        .and_then(|drivers| drivers.checked_add(price_per_day))
        .and_then(|rate| {
            if insurance {
                rate.checked_add(Decimal::from(INSURANCE_DAILY_FEE))
            } else {
                Some(rate)
            }
        });

    let total = daily_rate
        .and_then(|rate| rate.checked_mul(days))
        .filter(|total| fits_money_column(*total))
        .ok_or(BookingRuleError::AmountTooLarge)?;

    Ok(total)
}

/// Inclusive range intersection: ranges that touch at a boundary overlap.
pub fn overlaps(
    existing_start: DateTime<Utc>,
    existing_end: DateTime<Utc>,
    proposed_start: DateTime<Utc>,
    proposed_end: DateTime<Utc>,
) -> bool {
    existing_start <= proposed_end && existing_end >= proposed_start
}

/// Fails with `DateConflict` if an active booking covers any part of the proposed range.
pub fn ensure_no_conflict(
    existing: &[Booking],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), BookingRuleError> {
    let conflict = existing
        .iter()
        .filter(|b| b.status.is_active())
        .any(|b| overlaps(b.start_date, b.end_date, start, end));

    if conflict {
        return Err(BookingRuleError::DateConflict);
    }
    Ok(())
}

/// A booking request as submitted by a user.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub car_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub additional_drivers: i32,
    pub insurance: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
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

impl Booking {
    /// Builds a pending booking priced against `car`. The date range is only
    /// ever set here, so the total always matches it.
    pub fn new(user_id: Uuid, car: &Car, request: NewBooking) -> Result<Self, BookingRuleError> {
        let total_price = quote(
            car.price_per_day,
            request.start_date,
            request.end_date,
            request.additional_drivers,
            request.insurance,
        )?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            car_id: car.id,
            start_date: request.start_date,
            end_date: request.end_date,
            total_price,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: request.payment_method,
            pickup_location: request.pickup_location,
            dropoff_location: request.dropoff_location,
            additional_drivers: request.additional_drivers,
            insurance: request.insurance,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Admin status change. Any state may move to confirmed, cancelled or
    /// completed; `pending` is only ever the initial state.
    pub fn set_status(&mut self, status: BookingStatus) -> Result<(), BookingRuleError> {
        if status == BookingStatus::Pending {
            return Err(BookingRuleError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), BookingRuleError> {
        if !self.status.is_active() {
            return Err(BookingRuleError::InvalidTransition {
                from: self.status,
                to: BookingStatus::Cancelled,
            });
        }
        self.status = BookingStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::car::tests::sample_car;
    use chrono::TimeZone;

    pub(crate) fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    pub(crate) fn request(car_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> NewBooking {
        NewBooking {
            car_id,
            start_date: start,
            end_date: end,
            payment_method: PaymentMethod::CreditCard,
            pickup_location: "Lisbon Airport".to_string(),
            dropoff_location: "Lisbon Airport".to_string(),
            additional_drivers: 0,
            insurance: false,
            notes: None,
        }
    }

    #[test]
    fn test_two_day_rental_at_fifty() {
        let total = quote(Decimal::from(50), day(2023, 1, 1), day(2023, 1, 3), 0, false).unwrap();
        assert_eq!(total, Decimal::from(100));
    }

    #[test]
    fn test_quote_with_extras() {
        // 3 days * 40 + 2 drivers * 10 * 3 + 20 * 3
        let total = quote(Decimal::from(40), day(2024, 3, 1), day(2024, 3, 4), 2, true).unwrap();
        assert_eq!(total, Decimal::from(120 + 60 + 60));
    }

    #[test]
    fn test_quote_matches_formula_across_inputs() {
        let price = Decimal::new(4550, 2);
        for d in 1..=14i64 {
            for a in 0..=3i32 {
                for insurance in [false, true] {
                    let start = day(2024, 5, 1);
                    let end = start + chrono::Duration::days(d);
                    let days = Decimal::from(d);
                    let expected = days * price
                        + Decimal::from(a) * Decimal::from(10) * days
                        + if insurance { Decimal::from(20) * days } else { Decimal::ZERO };

                    assert_eq!(quote(price, start, end, a, insurance).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let start = day(2024, 1, 1);
        let end = start + chrono::Duration::hours(25);

        assert_eq!(rental_days(start, end).unwrap(), 2);
        assert_eq!(rental_days(start, start + chrono::Duration::minutes(1)).unwrap(), 1);
    }

    #[test]
    fn test_inverted_or_empty_range_is_rejected() {
        let start = day(2024, 1, 5);

        assert_eq!(rental_days(start, start), Err(BookingRuleError::InvalidRange));
        assert_eq!(
            quote(Decimal::from(50), start, day(2024, 1, 1), 0, false),
            Err(BookingRuleError::InvalidRange)
        );
    }

    #[test]
    fn test_negative_drivers_rejected() {
        assert_eq!(
            quote(Decimal::from(50), day(2024, 1, 1), day(2024, 1, 2), -1, false),
            Err(BookingRuleError::NegativeDrivers)
        );
    }

    #[test]
    fn test_total_beyond_money_column_rejected() {
        let price = Decimal::from(1_000_000_000);

        assert!(quote(price, day(2024, 1, 1), day(2024, 1, 10), 0, false).is_ok());
        assert_eq!(
            quote(price, day(2024, 1, 1), day(2024, 1, 12), 0, false),
            Err(BookingRuleError::AmountTooLarge)
        );
    }

    #[test]
    fn test_fits_money_column() {
        assert!(fits_money_column(Decimal::new(4555, 2)));
        assert!(fits_money_column(Decimal::new(45500, 3)));
        assert!(fits_money_column(Decimal::new(999_999_999_999, 2)));
        assert!(!fits_money_column(Decimal::new(45555, 3)));
        assert!(!fits_money_column(Decimal::from(MONEY_LIMIT)));
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let (s, e) = (day(2023, 1, 1), day(2023, 1, 3));

        assert!(overlaps(s, e, day(2023, 1, 2), day(2023, 1, 4)));
        assert!(overlaps(s, e, day(2023, 1, 3), day(2023, 1, 5)));
        assert!(overlaps(s, e, day(2022, 12, 30), day(2023, 1, 1)));
        assert!(overlaps(s, e, day(2022, 12, 1), day(2023, 2, 1)));
        assert!(!overlaps(s, e, day(2023, 1, 4), day(2023, 1, 6)));
        assert!(!overlaps(s, e, day(2022, 12, 1), day(2022, 12, 31)));
    }

    #[test]
    fn test_conflict_ignores_inactive_bookings() {
        let car = sample_car(50);
        let mut cancelled =
            Booking::new(Uuid::new_v4(), &car, request(car.id, day(2023, 1, 1), day(2023, 1, 3))).unwrap();
        cancelled.cancel().unwrap();
        let mut completed =
            Booking::new(Uuid::new_v4(), &car, request(car.id, day(2023, 1, 1), day(2023, 1, 3))).unwrap();
        completed.set_status(BookingStatus::Completed).unwrap();

        assert!(ensure_no_conflict(&[cancelled, completed], day(2023, 1, 2), day(2023, 1, 4)).is_ok());
    }

    #[test]
    fn test_conflict_with_active_booking() {
        let car = sample_car(50);
        let existing =
            Booking::new(Uuid::new_v4(), &car, request(car.id, day(2023, 1, 1), day(2023, 1, 3))).unwrap();

        assert_eq!(
            ensure_no_conflict(&[existing], day(2023, 1, 2), day(2023, 1, 4)),
            Err(BookingRuleError::DateConflict)
        );
    }

    #[test]
    fn test_new_booking_is_pending_and_priced() {
        let car = sample_car(50);
        let user_id = Uuid::new_v4();
        let mut req = request(car.id, day(2023, 1, 1), day(2023, 1, 3));
        req.additional_drivers = 1;

        let booking = Booking::new(user_id, &car, req).unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.user_id, user_id);
        assert_eq!(booking.car_id, car.id);
        assert_eq!(booking.total_price, Decimal::from(120));
    }

    #[test]
    fn test_cancel_transitions() {
        let car = sample_car(50);
        let mut booking =
            Booking::new(Uuid::new_v4(), &car, request(car.id, day(2023, 1, 1), day(2023, 1, 3))).unwrap();

        booking.set_status(BookingStatus::Confirmed).unwrap();
        assert!(booking.cancel().is_ok());
        assert_eq!(booking.status, BookingStatus::Cancelled);

        assert_eq!(
            booking.cancel(),
            Err(BookingRuleError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Cancelled,
            })
        );

        booking.set_status(BookingStatus::Completed).unwrap();
        assert!(matches!(booking.cancel(), Err(BookingRuleError::InvalidTransition { .. })));
    }

    #[test]
    fn test_status_cannot_return_to_pending() {
        let car = sample_car(50);
        let mut booking =
            Booking::new(Uuid::new_v4(), &car, request(car.id, day(2023, 1, 1), day(2023, 1, 3))).unwrap();

        assert!(booking.set_status(BookingStatus::Pending).is_err());
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn test_car_availability_side_effect() {
        assert_eq!(BookingStatus::Confirmed.car_availability(), Some(false));
        assert_eq!(BookingStatus::Cancelled.car_availability(), Some(true));
        assert_eq!(BookingStatus::Completed.car_availability(), Some(true));
        assert_eq!(BookingStatus::Pending.car_availability(), None);
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::CreditCard).unwrap(), "\"credit_card\"");
        let parsed: BookingStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(parsed, BookingStatus::Confirmed);
    }
}
