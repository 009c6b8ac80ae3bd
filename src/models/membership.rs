use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog row. Prices are stored in cents; checkout is simulated, no
/// payment provider is involved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MembershipPlan {
    pub id: Uuid,
    pub name: String,
    pub duration_days: i32,
    pub price_cents: i32,
    pub created_at: DateTime<Utc>,
}

/// Body for POST /memberships/purchase (also used for renewal).
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub plan_name: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub message: String,
    pub membership_type: String,
    pub membership_expires_at: DateTime<Utc>,
}
