/// Append-only audit trail for privileged mutations.
///
/// Recording is best-effort: a failed insert is logged and swallowed so it
/// can never roll back or block the operation it accompanies.

use chrono::Utc;
use sqlx::PgPool;

/// Append one audit entry. `actor_id` is None for anonymous or
/// self-service actions.
pub async fn record_audit(
    pool: &PgPool,
    actor_id: Option<i64>,
    action: &str,
    target: &str,
    detail: &str,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_log (actor_id, action, target, detail, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(actor_id)
    .bind(action)
    .bind(target)
    .bind(detail)
    .bind(Utc::now())
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::error!(
            action = action,
            target = target,
            error = %e,
            "failed to record audit entry"
        );
    }
}
