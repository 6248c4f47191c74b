/// Review model
///
/// One review per (tour, user) pair, enforced by a database unique
/// constraint and surfaced to clients as a conflict. Every write or delete
/// recomputes the owning tour's rating aggregate through the store's
/// post-persistence hooks, synchronously, before the response is produced.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::store::{Resource, SqlValue, StoreError, WriteColumns};

/// Review row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub body: String,
    pub rating: f64,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Review row with the author's public fields joined in
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewDetail {
    pub id: Uuid,
    pub body: String,
    pub rating: f64,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub author_photo: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
impl Resource for Review {
    const TABLE: &'static str = "reviews";
    const COLUMNS: &'static str = "id, body, rating, tour_id, user_id, created_at";
    const FILTERABLE: &'static [&'static str] = &["rating", "tour_id", "user_id"];
    const SORTABLE: &'static [&'static str] = &["rating", "created_at"];
    type Row = Review;

    async fn after_write(pool: &PgPool, row: &Review) -> Result<(), StoreError> {
        recalc_tour_ratings(pool, row.tour_id).await
    }

    async fn after_delete(pool: &PgPool, row: &Review) -> Result<(), StoreError> {
        recalc_tour_ratings(pool, row.tour_id).await
    }
}

/// Recomputes a tour's rating aggregate from its reviews
///
/// The average is rounded to one decimal; a tour with no reviews goes back
/// to quantity 0, average 0.
pub async fn recalc_tour_ratings(pool: &PgPool, tour_id: Uuid) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        UPDATE tours
        SET ratings_quantity = stats.qty,
            ratings_average = stats.avg
        FROM (
            SELECT COUNT(*)::int AS qty,
                   COALESCE(ROUND(AVG(rating)::numeric, 1)::double precision, 0) AS avg
            FROM reviews
            WHERE tour_id = $1
        ) AS stats
        WHERE tours.id = $1
        "#,
    )
    .bind(tour_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Input for creating a review
///
/// `tour_id` and `user_id` may be omitted in the request body; the route
/// layer fills them from the nested path and the authenticated principal
/// before the store sees the input.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReview {
    #[validate(length(min = 1))]
    pub body: String,

    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,

    pub tour_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl WriteColumns for CreateReview {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = vec![
            ("body", SqlValue::Text(self.body.clone())),
            ("rating", SqlValue::Float(self.rating)),
        ];
        if let Some(tour_id) = self.tour_id {
            cols.push(("tour_id", SqlValue::Uuid(tour_id)));
        }
        if let Some(user_id) = self.user_id {
            cols.push(("user_id", SqlValue::Uuid(user_id)));
        }
        cols
    }
}

/// Partial update for a review; ownership fields are immutable
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReview {
    #[validate(length(min = 1))]
    pub body: Option<String>,

    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
}

impl WriteColumns for UpdateReview {
    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        if let Some(body) = &self.body {
            cols.push(("body", SqlValue::Text(body.clone())));
        }
        if let Some(rating) = self.rating {
            cols.push(("rating", SqlValue::Float(rating)));
        }
        cols
    }
}

impl Review {
    /// Fetches one review with its author expanded
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<ReviewDetail>, sqlx::Error> {
        sqlx::query_as::<_, ReviewDetail>(
            r#"
            SELECT r.id, r.body, r.rating, r.tour_id, r.user_id,
                   u.name AS author_name, u.photo AS author_photo,
                   r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a tour's reviews with authors expanded, newest first
    pub async fn list_for_tour(
        pool: &PgPool,
        tour_id: Uuid,
    ) -> Result<Vec<ReviewDetail>, sqlx::Error> {
        sqlx::query_as::<_, ReviewDetail>(
            r#"
            SELECT r.id, r.body, r.rating, r.tour_id, r.user_id,
                   u.name AS author_name, u.photo AS author_photo,
                   r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.tour_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(tour_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let mut review = CreateReview {
            body: "Loved it".to_string(),
            rating: 4.5,
            tour_id: None,
            user_id: None,
        };
        assert!(review.validate().is_ok());

        review.rating = 5.5;
        assert!(review.validate().is_err());

        review.rating = -0.5;
        assert!(review.validate().is_err());

        review.rating = 0.0;
        assert!(review.validate().is_ok());
    }

    #[test]
    fn test_empty_body_rejected() {
        let review = CreateReview {
            body: String::new(),
            rating: 4.0,
            tour_id: None,
            user_id: None,
        };
        assert!(review.validate().is_err());
    }

    #[test]
    fn test_create_columns_include_ownership_when_set() {
        let tour_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let review = CreateReview {
            body: "Great guide".to_string(),
            rating: 5.0,
            tour_id: Some(tour_id),
            user_id: Some(user_id),
        };
        let cols = review.columns();
        assert!(cols
            .iter()
            .any(|(name, v)| *name == "tour_id" && *v == SqlValue::Uuid(tour_id)));
        assert!(cols
            .iter()
            .any(|(name, v)| *name == "user_id" && *v == SqlValue::Uuid(user_id)));
    }

    #[test]
    fn test_update_cannot_move_review() {
        let patch = UpdateReview {
            body: Some("Edited".to_string()),
            rating: Some(3.0),
        };
        let cols = patch.columns();
        assert_eq!(cols.len(), 2);
        assert!(!cols.iter().any(|(name, _)| *name == "tour_id"));
        assert!(!cols.iter().any(|(name, _)| *name == "user_id"));
    }
}
