/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST  /api/v1/users/signup` - create an account, log it in
/// - `POST  /api/v1/users/login` - email + password login
/// - `GET   /api/v1/users/logout` - overwrite the session cookie
/// - `POST  /api/v1/users/forgot-password` - email a reset token
/// - `PATCH /api/v1/users/reset-password/:token` - redeem a reset token
/// - `PATCH /api/v1/users/update-password` - change password while logged in
///
/// Every handler that establishes a session responds with the token in the
/// body and in an HttpOnly `jwt` cookie. Unknown email and wrong password
/// produce the identical 401, so login cannot be used as an account oracle.

use axum::{
    extract::{Extension, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    app::AppState,
    config::Config,
    error::{ApiError, ApiResult},
    mail,
    middleware::auth::CurrentUser,
};
use trailbook_shared::auth::{jwt, password, reset_token};
use trailbook_shared::models::user::User;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "please provide a password"))]
    pub password: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "please provide a valid email"))]
    pub email: String,
}

/// Reset-password request (token comes from the path)
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

/// Update-password request (authenticated)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "current password is required"))]
    pub password_current: String,

    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

/// Creates an account and logs it straight in
///
/// The welcome email goes out on a spawned task; a mail failure is logged
/// and never fails the signup.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;
    let user = User::create(&state.db, &req.name, &req.email, &password_hash)
        .await
        .map_err(ApiError::from)?;

    let mailer = state.mailer.clone();
    let (to, name) = (user.email.clone(), user.name.clone());
    tokio::spawn(async move {
        if let Err(e) = mail::send_welcome(mailer.as_ref(), &to, &name).await {
            tracing::warn!("welcome email failed: {}", e);
        }
    });

    session_response(&user, StatusCode::CREATED, &state.config)
}

/// Logs a user in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    // one message for both failure modes
    let rejected = || ApiError::Unauthorized("Incorrect email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(rejected)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(rejected());
    }

    session_response(&user, StatusCode::OK, &state.config)
}

/// Logs out by overwriting the session cookie with a short-lived sentinel
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, logout_cookie())],
        Json(json!({ "status": "success" })),
    )
}

/// Emails a password-reset token to an existing account
///
/// Only the token's SHA-256 hash is stored. If the email cannot be sent the
/// stored token is cleared again so the flow can be retried cleanly.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("There is no user with that email address.".to_string())
        })?;

    let (raw_token, token_hash) = reset_token::generate_reset_token();
    let expires = Utc::now() + reset_token::reset_token_lifetime();
    User::set_reset_token(&state.db, user.id, &token_hash, expires).await?;

    let reset_url = format!(
        "{}/api/v1/users/reset-password/{}",
        state.config.api.public_url, raw_token
    );

    if let Err(e) = mail::send_password_reset(state.mailer.as_ref(), &user.email, &reset_url).await
    {
        tracing::error!("password reset email failed: {}", e);
        User::clear_reset_token(&state.db, user.id).await?;
        return Err(ApiError::ExternalService(
            "There was an error sending the email. Try again later!".to_string(),
        ));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Token sent to email!"
    })))
}

/// Redeems a reset token and sets a new password
///
/// The presented token is hashed and matched against the stored hash with
/// an unexpired expiry; a used or expired token is a 400. Success clears the
/// reset fields, bumps `password_changed_at`, and issues a fresh session.
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let token_hash = reset_token::hash_reset_token(&token);
    let user = User::find_by_reset_token(&state.db, &token_hash)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Token is invalid or has expired".to_string()))?;

    let password_hash = password::hash_password(&req.password)?;
    let user = User::update_password(&state.db, user.id, &password_hash).await?;

    session_response(&user, StatusCode::OK, &state.config)
}

/// Changes the password of the logged-in user
///
/// Requires the current password; success invalidates every session issued
/// before the change and returns a fresh one.
pub async fn update_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdatePasswordRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    if !password::verify_password(&req.password_current, &current.0.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Your current password is wrong.".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = User::update_password(&state.db, current.0.id, &password_hash).await?;

    session_response(&user, StatusCode::OK, &state.config)
}

/// Issues a session token and responds with it in body and cookie
fn session_response(user: &User, status: StatusCode, config: &Config) -> ApiResult<Response> {
    let claims = jwt::Claims::new(user.id, Duration::days(config.jwt.expires_in_days));
    let token = jwt::create_token(&claims, &config.jwt.secret)?;
    let cookie = session_cookie(&token, config);

    let body = json!({
        "status": "success",
        "token": token,
        "data": { "user": user }
    });

    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Formats the session cookie
fn session_cookie(token: &str, config: &Config) -> String {
    let max_age = config.jwt.cookie_expires_days * 24 * 60 * 60;
    let mut cookie = format!("jwt={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if config.api.production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Formats the logout sentinel cookie (expires in 10 seconds)
fn logout_cookie() -> String {
    "jwt=loggedout; Path=/; Max-Age=10; HttpOnly; SameSite=Lax".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApiConfig, DatabaseConfig, JwtConfig, MailConfig, PaymentsConfig,
    };

    fn config(production: bool) -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                public_url: "http://127.0.0.1:8080".to_string(),
                production,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expires_in_days: 90,
                cookie_expires_days: 90,
            },
            mail: MailConfig {
                api_url: "https://mail.example.com/v1/send".to_string(),
                api_key: String::new(),
                from: "Trailbook <hello@trailbook.dev>".to_string(),
            },
            payments: PaymentsConfig {
                api_url: "https://api.stripe.com".to_string(),
                secret_key: String::new(),
            },
        }
    }

    #[test]
    fn test_signup_validation() {
        let ok = SignupRequest {
            name: "Jonas".to_string(),
            email: "jonas@example.com".to_string(),
            password: "pass12345".to_string(),
            password_confirm: "pass12345".to_string(),
        };
        assert!(ok.validate().is_ok());

        let mismatch = SignupRequest {
            password_confirm: "different1".to_string(),
            ..ok
        };
        assert!(mismatch.validate().is_err());
    }

    #[test]
    fn test_short_password_rejected() {
        let req = SignupRequest {
            name: "Jonas".to_string(),
            email: "jonas@example.com".to_string(),
            password: "short".to_string(),
            password_confirm: "short".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie("tok.en", &config(false));
        assert!(cookie.starts_with("jwt=tok.en; "));
        assert!(cookie.contains("Max-Age=7776000")); // 90 days
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_session_cookie_secure_in_production() {
        let cookie = session_cookie("tok.en", &config(true));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_logout_cookie_sentinel() {
        let cookie = logout_cookie();
        assert!(cookie.starts_with("jwt=loggedout; "));
        assert!(cookie.contains("Max-Age=10"));
    }
}
