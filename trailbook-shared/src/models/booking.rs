/// Booking model
///
/// A paid (or comped) reservation of exactly one tour by exactly one user.
/// Bookings are recorded by the checkout-completion handler with the price
/// echoed from the checkout session; there is no compensation path, so a
/// recorded booking stays recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::store::{Resource, SqlValue, WriteColumns};

/// Booking row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub price: f64,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

impl Resource for Booking {
    const TABLE: &'static str = "bookings";
    const COLUMNS: &'static str = "id, tour_id, user_id, price, paid, created_at";
    const FILTERABLE: &'static [&'static str] = &["tour_id", "user_id", "paid", "price"];
    const SORTABLE: &'static [&'static str] = &["price", "created_at"];
    type Row = Booking;
}

/// Input for recording a booking
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBooking {
    pub tour_id: Uuid,
    pub user_id: Uuid,

    #[validate(range(min = 0.0))]
    pub price: f64,

    #[serde(default = "default_paid")]
    pub paid: bool,
}

fn default_paid() -> bool {
    true
}

impl WriteColumns for CreateBooking {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("tour_id", SqlValue::Uuid(self.tour_id)),
            ("user_id", SqlValue::Uuid(self.user_id)),
            ("price", SqlValue::Float(self.price)),
            ("paid", SqlValue::Bool(self.paid)),
        ]
    }
}

/// Partial update for a booking (admin bookkeeping)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBooking {
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,

    pub paid: Option<bool>,
}

impl WriteColumns for UpdateBooking {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        if let Some(price) = self.price {
            cols.push(("price", SqlValue::Float(price)));
        }
        if let Some(paid) = self.paid {
            cols.push(("paid", SqlValue::Bool(paid)));
        }
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_defaults_true() {
        let booking: CreateBooking = serde_json::from_value(serde_json::json!({
            "tour_id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "price": 497.0
        }))
        .unwrap();
        assert!(booking.paid);
    }

    #[test]
    fn test_negative_price_rejected() {
        let booking = CreateBooking {
            tour_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            price: -1.0,
            paid: true,
        };
        assert!(booking.validate().is_err());
    }

    #[test]
    fn test_create_columns() {
        let booking = CreateBooking {
            tour_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            price: 497.0,
            paid: true,
        };
        let cols = booking.columns();
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0].0, "tour_id");
        assert_eq!(cols[2].1, SqlValue::Float(497.0));
    }
}
