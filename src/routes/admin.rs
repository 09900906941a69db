/// Admin console login.
///
/// The console trades an already-valid admin JWT for a short-lived
/// http-only cookie, which the access gate accepts as a bearer fallback.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::verify_access_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::store::Role;

const ADMIN_COOKIE_MINUTES: i64 = 30;

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub token: Option<String>,
}

/// POST /admin/login
///
/// # Errors
/// - 400: missing token field
/// - 401: token does not verify
/// - 403: token verifies but the role is not admin
pub async fn admin_login(
    form: web::Json<AdminLoginRequest>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let token = form
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation(ValidationError::EmptyField("token".to_string())))?;

    let claims = verify_access_token(token, jwt_config.get_ref())?;

    if claims.role()? != Role::Admin {
        return Err(AppError::Auth(AuthError::Forbidden));
    }

    let cookie = Cookie::build("admin_token", token.to_string())
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::minutes(ADMIN_COOKIE_MINUTES))
        .path("/")
        .finish();

    tracing::info!(account_id = %claims.sub, "admin cookie issued");

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({ "message": "admin cookie set" })))
}
