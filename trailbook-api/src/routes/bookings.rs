/// Booking routes
///
/// All booking routes require authentication. The checkout pair implements
/// the payment flow: `/checkout-session/:id` creates a hosted checkout
/// session at the provider, whose success URL routes back through
/// `/checkout-complete` with tour/user/price in the query; that handler
/// records the booking and redirects to the URL stripped of its query.
/// Bookkeeping CRUD is for admins and lead guides.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::{authenticate, require_role, CurrentUser},
    routes::{doc_response, list_response},
};
use trailbook_shared::models::booking::{Booking, CreateBooking, UpdateBooking};
use trailbook_shared::models::tour::Tour;
use trailbook_shared::models::user::Role;
use trailbook_shared::store::{factory, query::QuerySpec};

const STAFF: &[Role] = &[Role::Admin, Role::LeadGuide];

pub fn router(state: AppState) -> Router<AppState> {
    let checkout = Router::new()
        .route("/checkout-session/:id", get(checkout_session))
        .route("/checkout-complete", get(checkout_complete));

    let admin = Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route(
            "/:id",
            get(get_booking).patch(update_booking).delete(delete_booking),
        )
        .route_layer(from_fn(require_role(STAFF)));

    checkout
        .merge(admin)
        .route_layer(from_fn_with_state(state, authenticate))
}

/// Creates a checkout session at the payment provider for one tour
async fn checkout_session(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Value>> {
    let tour = factory::get_one::<Tour>(&state.db, tour_id).await?;
    let session = state
        .payments
        .create_session(
            &tour,
            current.0.id,
            &current.0.email,
            &state.config.api.public_url,
        )
        .await?;

    Ok(Json(json!({
        "status": "success",
        "session": session
    })))
}

/// Query carried back from the provider's success URL
#[derive(Debug, Deserialize)]
struct CheckoutCompleteParams {
    tour: Option<Uuid>,
    user: Option<Uuid>,
    price: Option<f64>,
}

/// Records the booking after a successful checkout
///
/// At-least-once semantics with no compensation: if the parameters are
/// present the booking is written, then the client is redirected to the
/// same location without the query.
async fn checkout_complete(
    State(state): State<AppState>,
    Query(params): Query<CheckoutCompleteParams>,
) -> ApiResult<Redirect> {
    if let (Some(tour_id), Some(user_id), Some(price)) = (params.tour, params.user, params.price) {
        let input = CreateBooking {
            tour_id,
            user_id,
            price,
            paid: true,
        };
        factory::create_one::<Booking, _>(&state.db, &input).await?;
    }

    Ok(Redirect::to("/"))
}

/// Lists bookings (admin | lead-guide)
async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let spec = QuerySpec::from_params(&params);
    let page = factory::get_all::<Booking>(&state.db, &spec).await?;
    list_response(&page, &spec)
}

/// Fetches one booking (admin | lead-guide)
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let booking = factory::get_one::<Booking>(&state.db, id).await?;
    doc_response(&booking)
}

/// Records a booking manually (admin | lead-guide)
async fn create_booking(
    State(state): State<AppState>,
    Json(input): Json<CreateBooking>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let booking = factory::create_one::<Booking, _>(&state.db, &input).await?;
    Ok((StatusCode::CREATED, doc_response(&booking)?))
}

/// Updates a booking's price or paid flag (admin | lead-guide)
async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateBooking>,
) -> ApiResult<Json<Value>> {
    let booking = factory::update_one::<Booking, _>(&state.db, id, &patch).await?;
    doc_response(&booking)
}

/// Deletes a booking (admin | lead-guide)
async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    factory::delete_one::<Booking>(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
