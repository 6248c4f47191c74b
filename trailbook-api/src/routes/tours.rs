/// Tour catalog routes
///
/// Reads are public; writes require the admin or lead-guide role. The
/// single-tour read expands the tour's reviews through a joined detail
/// query. Review routes are also mounted under `/:id/reviews`.

use axum::{
    extract::{Path, Query, State},
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
    middleware::auth::{authenticate, require_role},
    routes::{doc_response, list_response, reviews},
};
use trailbook_shared::models::review::Review;
use trailbook_shared::models::tour::{CreateTour, Tour, UpdateTour};
use trailbook_shared::models::user::Role;
use trailbook_shared::store::{factory, query::QuerySpec};

const STAFF: &[Role] = &[Role::Admin, Role::LeadGuide];

pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_tours))
        .route("/:id", get(get_tour));

    let staff = Router::new()
        .route("/", post(create_tour))
        .route("/:id", patch(update_tour).delete(delete_tour))
        .route_layer(from_fn(require_role(STAFF)))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    public
        .merge(staff)
        .nest("/:id/reviews", reviews::nested_router(state))
}

/// Lists tours (public); secret tours never appear
async fn list_tours(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let spec = QuerySpec::from_params(&params);
    let page = factory::get_all::<Tour>(&state.db, &spec).await?;
    list_response(&page, &spec)
}

/// Fetches one tour with its reviews expanded (public)
async fn get_tour(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let tour = factory::get_one::<Tour>(&state.db, id).await?;
    let reviews = Review::list_for_tour(&state.db, tour.id).await?;

    let mut doc = serde_json::to_value(&tour)
        .map_err(|e| ApiError::Internal(format!("response serialization: {}", e)))?;
    doc["reviews"] = serde_json::to_value(&reviews)
        .map_err(|e| ApiError::Internal(format!("response serialization: {}", e)))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "data": doc }
    })))
}

/// Creates a tour (admin | lead-guide)
async fn create_tour(
    State(state): State<AppState>,
    Json(input): Json<CreateTour>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let tour = factory::create_one::<Tour, _>(&state.db, &input).await?;
    Ok((StatusCode::CREATED, doc_response(&tour)?))
}

/// Updates a tour (admin | lead-guide)
async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateTour>,
) -> ApiResult<Json<Value>> {
    let tour = factory::update_one::<Tour, _>(&state.db, id, &patch).await?;
    doc_response(&tour)
}

/// Deletes a tour (admin | lead-guide)
async fn delete_tour(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    factory::delete_one::<Tour>(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
