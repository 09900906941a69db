/// Access control gate.
///
/// `RequireRoles` wraps a scope of protected routes with a required-role
/// set. Per request it:
///   1. extracts a bearer token from the Authorization header (falling
///      back to the admin console's `admin_token` cookie),
///   2. verifies the token signature, expiry, and issuer,
///   3. checks the claimed role against the permitted set (admin bypass
///      first),
///   4. rechecks the embedded token version against the account's current
///      stored version, so a password reset cuts off outstanding access
///      tokens immediately,
///   5. injects the verified claims into request extensions for handlers.
///
/// Failures map to the generic Unauthorized outcome except an explicit
/// role/ownership miss, which is Forbidden.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::{verify_access_token, Claims};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::{self, Role};

pub struct RequireRoles {
    jwt_config: JwtSettings,
    roles: Rc<Vec<Role>>,
}

impl RequireRoles {
    pub fn new(jwt_config: JwtSettings, roles: Vec<Role>) -> Self {
        Self {
            jwt_config,
            roles: Rc::new(roles),
        }
    }

    /// Gate open to every authenticated role.
    pub fn any_authenticated(jwt_config: JwtSettings) -> Self {
        Self::new(jwt_config, vec![Role::Student, Role::Mentor, Role::Admin])
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRoles
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRolesService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireRolesService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            roles: self.roles.clone(),
        }))
    }
}

pub struct RequireRolesService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    roles: Rc<Vec<Role>>,
}

impl<S, B> Service<ServiceRequest> for RequireRolesService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_config = self.jwt_config.clone();
        let roles = self.roles.clone();

        Box::pin(async move {
            let token = match extract_token(&req) {
                Some(token) => token,
                None => {
                    tracing::warn!("missing or malformed authorization header");
                    return Err(AppError::Auth(AuthError::MissingToken).into());
                }
            };

            let claims = verify_access_token(&token, &jwt_config).map_err(Error::from)?;
            let role = claims.role().map_err(Error::from)?;

            if !role_permitted(&roles, role) {
                tracing::warn!(role = %role, "role not in permitted set");
                return Err(AppError::Auth(AuthError::Forbidden).into());
            }

            // token-version recheck against the store: a bumped version
            // (password reset) kills this token even before its expiry
            let account_id = claims.account_id().map_err(Error::from)?;
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| {
                    Error::from(AppError::Internal("database pool not configured".to_string()))
                })?;

            match store::current_token_version(pool.get_ref(), account_id)
                .await
                .map_err(Error::from)?
            {
                None => {
                    tracing::warn!(account_id, "token subject no longer exists");
                    return Err(AppError::Auth(AuthError::TokenInvalid).into());
                }
                Some((_, false)) => {
                    return Err(AppError::Auth(AuthError::AccountInactive).into());
                }
                Some((current_version, true)) => {
                    if claims.tv != current_version {
                        tracing::warn!(
                            account_id,
                            claimed = claims.tv,
                            current = current_version,
                            "stale token version"
                        );
                        return Err(AppError::Auth(AuthError::StaleToken).into());
                    }
                }
            }

            req.extensions_mut().insert(claims.clone());

            tracing::debug!(account_id, role = %role, "access granted");

            service.call(req).await
        })
    }
}

/// Bearer token from the Authorization header, or the admin console's
/// `admin_token` cookie when no header is present.
fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(header) = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        return header.strip_prefix("Bearer ").map(str::to_string);
    }

    req.request()
        .cookie("admin_token")
        .map(|c| c.value().to_string())
}

/// Role-set decision: admin bypass first, then plain membership.
pub fn role_permitted(required: &[Role], claimed: Role) -> bool {
    if claimed == Role::Admin && required.contains(&Role::Admin) {
        return true;
    }
    required.contains(&claimed)
}

/// Ownership rule for profile-style operations: the subject may act on its
/// own resources; anyone else needs the admin role.
pub fn ensure_owner_or_admin(claims: &Claims, owner_id: i64) -> Result<(), AppError> {
    if claims.account_id()? == owner_id {
        return Ok(());
    }
    if claims.role()? == Role::Admin {
        return Ok(());
    }
    Err(AppError::Auth(AuthError::Forbidden))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_decides_access() {
        let required = vec![Role::Mentor, Role::Admin];
        assert!(role_permitted(&required, Role::Mentor));
        assert!(role_permitted(&required, Role::Admin));
        assert!(!role_permitted(&required, Role::Student));
    }

    #[test]
    fn admin_is_not_exempt_from_the_set() {
        // admin bypass only applies when admin is in the permitted set
        let students_only = vec![Role::Student];
        assert!(!role_permitted(&students_only, Role::Admin));
    }

    #[test]
    fn owner_may_act_on_own_resource() {
        let claims = Claims::new(10, Role::Student, 0, 900, "test".to_string());
        assert!(ensure_owner_or_admin(&claims, 10).is_ok());
    }

    #[test]
    fn non_owner_without_admin_is_forbidden() {
        let claims = Claims::new(10, Role::Student, 0, 900, "test".to_string());
        let err = ensure_owner_or_admin(&claims, 11).unwrap_err();
        match err {
            AppError::Auth(AuthError::Forbidden) => (),
            other => panic!("expected forbidden, got {:?}", other),
        }
    }

    #[test]
    fn admin_may_act_on_any_resource() {
        let claims = Claims::new(10, Role::Admin, 0, 900, "test".to_string());
        assert!(ensure_owner_or_admin(&claims, 11).is_ok());
    }
}
