use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    errors::ApiResult,
    models::{
        auth::AuthenticatedUser,
        membership::{MembershipPlan, PurchaseRequest, PurchaseResponse},
    },
    services::membership::MembershipService,
    AppState,
};

/// GET /memberships/plans
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<MembershipPlan>>> {
    let plans = MembershipService::list_plans(&state.db).await?;
    Ok(Json(plans))
}

/// POST /memberships/purchase — simulated checkout; also renews.
pub async fn purchase(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<PurchaseRequest>,
) -> ApiResult<Json<PurchaseResponse>> {
    let response =
        MembershipService::purchase(&state.db, Utc::now(), user.user_id, &body.plan_name).await?;
    Ok(Json(response))
}
