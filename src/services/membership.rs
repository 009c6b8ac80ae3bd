use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    models::membership::{MembershipPlan, PurchaseResponse},
};

pub struct MembershipService;

impl MembershipService {
    pub async fn list_plans(pool: &PgPool) -> ApiResult<Vec<MembershipPlan>> {
        let plans = sqlx::query_as::<_, MembershipPlan>(
            "SELECT id, name, duration_days, price_cents, created_at
             FROM membership_plans ORDER BY duration_days",
        )
        .fetch_all(pool)
        .await?;
        Ok(plans)
    }

    /// Purchase or renew a membership. Checkout is simulated — no payment
    /// provider. Renewal extends from the current expiry when it is still in
    /// the future, otherwise from now.
    pub async fn purchase(
        pool: &PgPool,
        now: DateTime<Utc>,
        user_id: Uuid,
        plan_name: &str,
    ) -> ApiResult<PurchaseResponse> {
        let plan = sqlx::query_as::<_, MembershipPlan>(
            "SELECT id, name, duration_days, price_cents, created_at
             FROM membership_plans WHERE name = $1",
        )
        .bind(plan_name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Membership plan '{plan_name}' not found")))?;

        let current_expiry: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT membership_expires_at FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .flatten();

        let base = match current_expiry {
            Some(expiry) if expiry > now => expiry,
            _ => now,
        };
        let expires_at = base + Duration::days(plan.duration_days as i64);

        sqlx::query(
            "UPDATE users
             SET membership_type = $2, membership_expires_at = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(&plan.name)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(PurchaseResponse {
            message: format!("Membership '{}' active until {}", plan.name, expires_at.date_naive()),
            membership_type: plan.name,
            membership_expires_at: expires_at,
        })
    }
}
