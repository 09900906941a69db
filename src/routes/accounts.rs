/// Account profile routes.
///
/// The update path is the canonical consumer of the ownership rule: an
/// account may edit itself, admins may edit anyone, and every applied
/// update lands in the audit log.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::Claims;
use crate::error::{AppError, DatabaseError};
use crate::middleware::ensure_owner_or_admin;
use crate::routes::auth::AccountSummary;
use crate::store;
use crate::validators::is_valid_name;

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub region: Option<String>,
}

/// GET /accounts/{id}
pub async fn get_account(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let account_id = path.into_inner();

    let account = store::find_by_id(pool.get_ref(), account_id)
        .await?
        .ok_or_else(|| {
            AppError::Database(DatabaseError::NotFound("account not found".to_string()))
        })?;

    Ok(HttpResponse::Ok().json(AccountSummary {
        account_id: account.account_id,
        email: account.email,
        name: account.name,
        role: account.role,
    }))
}

/// PUT /accounts/{id}
///
/// Update profile fields. Gated (any authenticated role), then restricted
/// to the owner or an admin. The mutation is audited best-effort.
///
/// # Errors
/// - 403: authenticated but neither owner nor admin
/// - 404: no such account
pub async fn update_account(
    path: web::Path<i64>,
    form: web::Json<UpdateProfileRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let account_id = path.into_inner();

    ensure_owner_or_admin(&claims, account_id)?;

    let name = match form.name.as_deref() {
        Some(name) => Some(is_valid_name(name)?),
        None => None,
    };

    store::update_profile(
        pool.get_ref(),
        account_id,
        name.as_deref(),
        form.bio.as_deref(),
        form.region.as_deref(),
    )
    .await?;

    let actor_id = claims.account_id().ok();
    let detail = format!(
        "name={:?} bio={:?} region={:?}",
        form.name, form.bio, form.region
    );
    store::record_audit(
        pool.get_ref(),
        actor_id,
        "update_account",
        &account_id.to_string(),
        &detail,
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "updated" })))
}
