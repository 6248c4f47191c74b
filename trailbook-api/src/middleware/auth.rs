/// Session authentication and role-based authorization
///
/// The `authenticate` middleware runs a fixed pipeline, short-circuiting at
/// the first failure:
///
/// 1. extract the token (Authorization Bearer, else the `jwt` cookie);
/// 2. verify signature and expiry;
/// 3. load the principal (active accounts only);
/// 4. reject sessions established before the last password change;
/// 5. attach [`CurrentUser`] to request extensions.
///
/// `require_role` layers after the authenticator; handlers read the
/// principal out of extensions and never mutate it.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::future::Future;
use std::pin::Pin;

use crate::{app::AppState, error::ApiError};
use trailbook_shared::auth::jwt;
use trailbook_shared::models::user::{Role, User};

/// The authenticated principal, attached to request extensions
///
/// Immutable once attached; handlers clone data out of it.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "jwt";

/// Authentication middleware
///
/// On success the request proceeds with [`CurrentUser`] attached; any
/// failure is a 401 with a message saying which step refused.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("You are not logged in! Please log in to get access.".to_string())
    })?;

    let claims = jwt::validate_token(&token, &state.config.jwt.secret)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "The user belonging to this token does no longer exist.".to_string(),
            )
        })?;

    if let Some(changed_at) = user.password_changed_at {
        if claims.issued_before(changed_at) {
            return Err(ApiError::Unauthorized(
                "User recently changed password! Please log in again.".to_string(),
            ));
        }
    }

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Builds a role-gate middleware for `axum::middleware::from_fn`
///
/// Must be layered inside (after) `authenticate`; a request that reaches it
/// without a principal is a wiring bug and is rejected as unauthorized.
pub fn require_role(
    allowed: &'static [Role],
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>
       + Clone
       + Send
       + 'static {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let current = req.extensions().get::<CurrentUser>().ok_or_else(|| {
                ApiError::Unauthorized(
                    "You are not logged in! Please log in to get access.".to_string(),
                )
            })?;

            if !role_allowed(allowed, current.0.role) {
                return Err(ApiError::Forbidden(
                    "You do not have permission to perform this action".to_string(),
                ));
            }

            Ok(next.run(req).await)
        })
    }
}

fn role_allowed(allowed: &[Role], role: Role) -> bool {
    allowed.contains(&role)
}

/// Pulls the session token out of the request
///
/// The Authorization header wins over the cookie when both are present.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    cookie_value(headers, SESSION_COOKIE).filter(|v| !v.is_empty() && v != "loggedout")
}

/// Reads one cookie's value from the Cookie header(s)
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header_value in headers.get_all(header::COOKIE) {
        let raw = header_value.to_str().ok()?;
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(name) {
                return parts.next().map(str::to_string);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(
                axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_bearer_token_extraction() {
        let h = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&h).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_token_extraction() {
        let h = headers(&[("cookie", "theme=dark; jwt=abc.def.ghi; lang=en")]);
        assert_eq!(extract_token(&h).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let h = headers(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "jwt=from-cookie"),
        ]);
        assert_eq!(extract_token(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_logout_sentinel_is_not_a_token() {
        let h = headers(&[("cookie", "jwt=loggedout")]);
        assert_eq!(extract_token(&h), None);
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(extract_token(&HeaderMap::new()), None);

        // malformed scheme
        let h = headers(&[("authorization", "Basic abc")]);
        assert_eq!(extract_token(&h), None);
    }

    #[test]
    fn test_role_allow_list() {
        let staff: &[Role] = &[Role::Admin, Role::LeadGuide];
        assert!(role_allowed(staff, Role::Admin));
        assert!(role_allowed(staff, Role::LeadGuide));
        assert!(!role_allowed(staff, Role::Guide));
        assert!(!role_allowed(staff, Role::User));
    }
}
