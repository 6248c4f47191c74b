/// Payment provider client
///
/// The checkout provider is consumed as a black box over HTTPS: one
/// form-encoded POST creates a hosted checkout session, and the session JSON
/// is passed straight through to the client. No webhook handling; the
/// success URL routes back through `/checkout-complete`, which records the
/// booking.

use uuid::Uuid;

use crate::config::PaymentsConfig;
use crate::error::ApiError;
use trailbook_shared::models::tour::Tour;

/// Client for the provider's checkout-session API
pub struct CheckoutClient {
    client: reqwest::Client,
    config: PaymentsConfig,
}

impl CheckoutClient {
    pub fn new(config: PaymentsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Creates a hosted checkout session for one tour booking
    ///
    /// Returns the provider's session object verbatim; the client follows
    /// its redirect URL to pay.
    pub async fn create_session(
        &self,
        tour: &Tour,
        user_id: Uuid,
        user_email: &str,
        public_url: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let params = build_session_params(tour, user_id, user_email, public_url);

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.config.api_url))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| ApiError::ExternalService(format!("checkout session request: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::ExternalService(format!(
                "checkout provider returned {}",
                response.status()
            )));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::ExternalService(format!("checkout session decode: {}", e)))
    }
}

/// Builds the form fields for a checkout session
///
/// The success URL carries tour/user/price so `/checkout-complete` can
/// record the booking without provider callbacks; the cancel URL goes back
/// to the tour page. Unit amount is in cents.
fn build_session_params(
    tour: &Tour,
    user_id: Uuid,
    user_email: &str,
    public_url: &str,
) -> Vec<(String, String)> {
    let unit_amount = (tour.price * 100.0).round() as i64;
    let success_url = format!(
        "{}/api/v1/bookings/checkout-complete?tour={}&user={}&price={}",
        public_url, tour.id, user_id, tour.price
    );
    let cancel_url = format!("{}/tour/{}", public_url, tour.slug);

    vec![
        ("mode".to_string(), "payment".to_string()),
        ("client_reference_id".to_string(), tour.id.to_string()),
        ("customer_email".to_string(), user_email.to_string()),
        ("success_url".to_string(), success_url),
        ("cancel_url".to_string(), cancel_url),
        (
            "line_items[0][price_data][currency]".to_string(),
            "usd".to_string(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            unit_amount.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            format!("{} Tour", tour.name),
        ),
        (
            "line_items[0][price_data][product_data][description]".to_string(),
            tour.summary.clone(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trailbook_shared::models::tour::Difficulty;

    fn sample_tour() -> Tour {
        Tour {
            id: Uuid::new_v4(),
            name: "The Forest Hiker".to_string(),
            slug: "the-forest-hiker".to_string(),
            duration_days: 5,
            max_group_size: 25,
            difficulty: Difficulty::Easy,
            price: 397.0,
            discount_price: None,
            summary: "Breathtaking hike".to_string(),
            description: None,
            image_cover: "cover.jpg".to_string(),
            images: vec![],
            start_dates: vec![],
            ratings_average: 4.7,
            ratings_quantity: 12,
            secret: false,
            created_at: Utc::now(),
        }
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> &'a str {
        &params.iter().find(|(k, _)| k == key).unwrap().1
    }

    #[test]
    fn test_unit_amount_is_cents() {
        let tour = sample_tour();
        let params =
            build_session_params(&tour, Uuid::new_v4(), "a@b.com", "https://trailbook.dev");
        assert_eq!(
            param(&params, "line_items[0][price_data][unit_amount]"),
            "39700"
        );
        assert_eq!(param(&params, "line_items[0][price_data][currency]"), "usd");
        assert_eq!(param(&params, "line_items[0][quantity]"), "1");
    }

    #[test]
    fn test_success_url_carries_booking_fields() {
        let tour = sample_tour();
        let user_id = Uuid::new_v4();
        let params = build_session_params(&tour, user_id, "a@b.com", "https://trailbook.dev");

        let success = param(&params, "success_url");
        assert!(success.starts_with("https://trailbook.dev/api/v1/bookings/checkout-complete?"));
        assert!(success.contains(&format!("tour={}", tour.id)));
        assert!(success.contains(&format!("user={}", user_id)));
        assert!(success.contains("price=397"));
    }

    #[test]
    fn test_cancel_url_points_at_the_tour_page() {
        let tour = sample_tour();
        let params =
            build_session_params(&tour, Uuid::new_v4(), "a@b.com", "https://trailbook.dev");
        assert_eq!(
            param(&params, "cancel_url"),
            "https://trailbook.dev/tour/the-forest-hiker"
        );
    }
}
