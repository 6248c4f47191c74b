/// User account routes
///
/// Three groups under `/api/v1/users`:
///
/// - public auth flows (signup/login/logout/forgot/reset), handlers in
///   [`super::auth`];
/// - the authenticated self-service group (`/me`, `/update-me`,
///   `/delete-me`, `/update-password`);
/// - the admin-only CRUD group over all accounts.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::{authenticate, require_role, CurrentUser},
    routes::{auth, doc_response, list_response},
};
use trailbook_shared::models::user::{Role, UpdateUser, User};
use trailbook_shared::store::{factory, query::QuerySpec};

pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/:token", patch(auth::reset_password));

    let me = Router::new()
        .route("/update-password", patch(auth::update_password))
        .route("/me", get(get_me))
        .route("/update-me", patch(update_me))
        .route("/delete-me", delete(delete_me))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let admin = Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route_layer(from_fn(require_role(&[Role::Admin])))
        .route_layer(from_fn_with_state(state, authenticate));

    public.merge(me).merge(admin)
}

/// Returns the logged-in user
async fn get_me(Extension(current): Extension<CurrentUser>) -> ApiResult<Json<Value>> {
    doc_response(&current.0)
}

/// Updates the logged-in user's profile (name/email/photo only)
///
/// Password fields are rejected outright so nobody sneaks a credential
/// change past the current-password check on `/update-password`.
async fn update_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    if body.get("password").is_some() || body.get("password_confirm").is_some() {
        return Err(ApiError::BadRequest(
            "This route is not for password updates. Please use /update-password.".to_string(),
        ));
    }

    let mut patch: UpdateUser = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e)))?;
    // role changes only through the admin routes
    patch.role = None;

    let user = factory::update_one::<User, _>(&state.db, current.0.id, &patch).await?;
    doc_response(&user)
}

/// Soft-deletes the logged-in user's account
async fn delete_me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<StatusCode> {
    User::deactivate(&state.db, current.0.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists accounts (admin)
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let spec = QuerySpec::from_params(&params);
    let page = factory::get_all::<User>(&state.db, &spec).await?;
    list_response(&page, &spec)
}

/// Fetches one account (admin)
async fn get_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let user = factory::get_one::<User>(&state.db, id).await?;
    doc_response(&user)
}

/// Accounts are only created through signup
async fn create_user() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "error",
            "message": "This route is not defined! Please use /signup instead"
        })),
    )
}

/// Updates one account, including its role (admin)
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateUser>,
) -> ApiResult<Json<Value>> {
    let user = factory::update_one::<User, _>(&state.db, id, &patch).await?;
    doc_response(&user)
}

/// Hard-deletes one account (admin)
async fn delete_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    factory::delete_one::<User>(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
