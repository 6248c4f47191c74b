/// Tour model
///
/// The catalog resource. The slug is derived from the name as an explicit
/// pre-processing step inside the create input, and the rating aggregate
/// (`ratings_average`, `ratings_quantity`) is owned by the review model's
/// post-write hook; tours never recompute it themselves.
///
/// Secret tours exist for invite-only itineraries: `secret = TRUE` rows are
/// excluded from every default read via the resource scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::store::{Resource, SqlValue, WriteColumns};

/// Tour difficulty rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tour_difficulty", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

/// Tour row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tour {
    pub id: Uuid,
    pub name: String,

    /// URL-safe form of the name, derived at create/rename time
    pub slug: String,

    pub duration_days: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub images: Vec<String>,
    pub start_dates: Vec<DateTime<Utc>>,

    /// Derived from reviews, rounded to one decimal
    pub ratings_average: f64,
    pub ratings_quantity: i32,

    #[serde(skip_serializing)]
    pub secret: bool,

    pub created_at: DateTime<Utc>,
}

impl Resource for Tour {
    const TABLE: &'static str = "tours";
    const COLUMNS: &'static str = "id, name, slug, duration_days, max_group_size, difficulty, \
         price, discount_price, summary, description, image_cover, images, start_dates, \
         ratings_average, ratings_quantity, secret, created_at";
    const DEFAULT_FILTER: Option<&'static str> = Some("NOT secret");
    const FILTERABLE: &'static [&'static str] = &[
        "name",
        "duration_days",
        "max_group_size",
        "difficulty",
        "price",
        "ratings_average",
        "ratings_quantity",
    ];
    const SORTABLE: &'static [&'static str] = &[
        "name",
        "duration_days",
        "price",
        "ratings_average",
        "ratings_quantity",
        "created_at",
    ];
    const ENUM_COLUMNS: &'static [(&'static str, &'static str)] =
        &[("difficulty", "tour_difficulty")];
    type Row = Tour;
}

/// Derives a URL-safe slug from a tour name
///
/// Lowercases, maps every non-alphanumeric run to a single dash, and trims
/// leading/trailing dashes: "The Forest Hiker" -> "the-forest-hiker".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Input for creating a tour
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_discount_price"))]
pub struct CreateTour {
    #[validate(length(min = 10, max = 40))]
    pub name: String,

    #[validate(range(min = 1))]
    pub duration_days: i32,

    #[validate(range(min = 1))]
    pub max_group_size: i32,

    pub difficulty: Difficulty,

    #[validate(range(min = 0.0))]
    pub price: f64,

    pub discount_price: Option<f64>,

    #[validate(length(min = 1))]
    pub summary: String,

    pub description: Option<String>,

    #[validate(length(min = 1))]
    pub image_cover: String,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,

    #[serde(default)]
    pub secret: bool,
}

/// A discounted price must stay below the regular price
fn validate_discount_price(tour: &CreateTour) -> Result<(), ValidationError> {
    if let Some(discount) = tour.discount_price {
        if discount >= tour.price {
            return Err(ValidationError::new(
                "discount_price must be below the regular price",
            ));
        }
    }
    Ok(())
}

impl WriteColumns for CreateTour {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = vec![
            ("name", SqlValue::Text(self.name.clone())),
            ("slug", SqlValue::Text(slugify(&self.name))),
            ("duration_days", SqlValue::Int(i64::from(self.duration_days))),
            (
                "max_group_size",
                SqlValue::Int(i64::from(self.max_group_size)),
            ),
            (
                "difficulty",
                SqlValue::Enum("tour_difficulty", self.difficulty.as_str().to_string()),
            ),
            ("price", SqlValue::Float(self.price)),
            ("summary", SqlValue::Text(self.summary.clone())),
            ("image_cover", SqlValue::Text(self.image_cover.clone())),
            ("images", SqlValue::TextArray(self.images.clone())),
            (
                "start_dates",
                SqlValue::TimestampArray(self.start_dates.clone()),
            ),
            ("secret", SqlValue::Bool(self.secret)),
        ];
        if let Some(discount) = self.discount_price {
            cols.push(("discount_price", SqlValue::Float(discount)));
        }
        if let Some(description) = &self.description {
            cols.push(("description", SqlValue::Text(description.clone())));
        }
        cols
    }
}

/// Partial update for a tour; a renamed tour gets a fresh slug
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTour {
    #[validate(length(min = 10, max = 40))]
    pub name: Option<String>,

    #[validate(range(min = 1))]
    pub duration_days: Option<i32>,

    #[validate(range(min = 1))]
    pub max_group_size: Option<i32>,

    pub difficulty: Option<Difficulty>,

    #[validate(range(min = 0.0))]
    pub price: Option<f64>,

    pub discount_price: Option<f64>,

    #[validate(length(min = 1))]
    pub summary: Option<String>,

    pub description: Option<String>,

    #[validate(length(min = 1))]
    pub image_cover: Option<String>,

    pub images: Option<Vec<String>>,

    pub start_dates: Option<Vec<DateTime<Utc>>>,

    pub secret: Option<bool>,
}

impl WriteColumns for UpdateTour {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        if let Some(name) = &self.name {
            cols.push(("name", SqlValue::Text(name.clone())));
            cols.push(("slug", SqlValue::Text(slugify(name))));
        }
        if let Some(v) = self.duration_days {
            cols.push(("duration_days", SqlValue::Int(i64::from(v))));
        }
        if let Some(v) = self.max_group_size {
            cols.push(("max_group_size", SqlValue::Int(i64::from(v))));
        }
        if let Some(v) = self.difficulty {
            cols.push((
                "difficulty",
                SqlValue::Enum("tour_difficulty", v.as_str().to_string()),
            ));
        }
        if let Some(v) = self.price {
            cols.push(("price", SqlValue::Float(v)));
        }
        if let Some(v) = self.discount_price {
            cols.push(("discount_price", SqlValue::Float(v)));
        }
        if let Some(v) = &self.summary {
            cols.push(("summary", SqlValue::Text(v.clone())));
        }
        if let Some(v) = &self.description {
            cols.push(("description", SqlValue::Text(v.clone())));
        }
        if let Some(v) = &self.image_cover {
            cols.push(("image_cover", SqlValue::Text(v.clone())));
        }
        if let Some(v) = &self.images {
            cols.push(("images", SqlValue::TextArray(v.clone())));
        }
        if let Some(v) = &self.start_dates {
            cols.push(("start_dates", SqlValue::TimestampArray(v.clone())));
        }
        if let Some(v) = self.secret {
            cols.push(("secret", SqlValue::Bool(v)));
        }
        cols
    }
}
