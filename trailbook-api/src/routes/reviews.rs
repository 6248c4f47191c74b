/// Review routes
///
/// All review routes require authentication. Creation is reserved for the
/// `user` role (staff rate their own tours otherwise); edits and deletes
/// for the author role and admins. Ownership fields default from context:
/// the author is always the logged-in user, and under the nested
/// `/tours/:id/reviews` mount the tour comes from the path.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::{authenticate, require_role, CurrentUser},
    routes::{doc_response, list_response},
};
use trailbook_shared::models::review::{CreateReview, Review, UpdateReview};
use trailbook_shared::models::user::Role;
use trailbook_shared::store::{factory, query::QuerySpec};

pub fn router(state: AppState) -> Router<AppState> {
    let reads = Router::new()
        .route("/", get(list_reviews))
        .route("/:id", get(get_review));

    let create = Router::new()
        .route("/", post(create_review))
        .route_layer(from_fn(require_role(&[Role::User])));

    let edit = Router::new()
        .route("/:id", patch(update_review).delete(delete_review))
        .route_layer(from_fn(require_role(&[Role::User, Role::Admin])));

    reads
        .merge(create)
        .merge(edit)
        .route_layer(from_fn_with_state(state, authenticate))
}

/// Review routes mounted under `/tours/:id/reviews`
pub fn nested_router(state: AppState) -> Router<AppState> {
    let reads = Router::new().route("/", get(list_tour_reviews));

    let create = Router::new()
        .route("/", post(create_tour_review))
        .route_layer(from_fn(require_role(&[Role::User])));

    reads
        .merge(create)
        .route_layer(from_fn_with_state(state, authenticate))
}

/// Lists reviews across all tours
async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let spec = QuerySpec::from_params(&params);
    let page = factory::get_all::<Review>(&state.db, &spec).await?;
    list_response(&page, &spec)
}

/// Fetches one review with its author expanded
async fn get_review(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let review = Review::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No document found with that ID".to_string()))?;
    doc_response(&review)
}

/// Creates a review; the author is always the logged-in user
///
/// A second review for the same tour by the same user trips the unique
/// constraint and comes back as a 409.
async fn create_review(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(mut input): Json<CreateReview>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if input.tour_id.is_none() {
        return Err(ApiError::BadRequest("Missing tour id".to_string()));
    }
    input.user_id = Some(current.0.id);

    let review = factory::create_one::<Review, _>(&state.db, &input).await?;
    Ok((StatusCode::CREATED, doc_response(&review)?))
}

/// Lists one tour's reviews with authors expanded (nested mount)
async fn list_tour_reviews(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let reviews = Review::list_for_tour(&state.db, tour_id).await?;
    doc_response(&reviews)
}

/// Creates a review for the tour in the path (nested mount)
async fn create_tour_review(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
    Json(mut input): Json<CreateReview>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    input.tour_id.get_or_insert(tour_id);
    input.user_id = Some(current.0.id);

    let review = factory::create_one::<Review, _>(&state.db, &input).await?;
    Ok((StatusCode::CREATED, doc_response(&review)?))
}

/// Updates a review's body or rating (user | admin)
async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateReview>,
) -> ApiResult<Json<Value>> {
    let review = factory::update_one::<Review, _>(&state.db, id, &patch).await?;
    doc_response(&review)
}

/// Deletes a review (user | admin); the tour's rating aggregate follows
async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    factory::delete_one::<Review>(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
