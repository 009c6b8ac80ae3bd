use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        auth::AuthenticatedUser,
        nutrition::{MarkConsumedRequest, MarkConsumedResponse, SaveDayPlanRequest, TodayNutritionResponse},
    },
    services::{nutrition::NutritionService, trainer::TrainerService},
    AppState,
};

/// POST /nutrition/plan — trainer saves one day of a client's week.
pub async fn save_day_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<SaveDayPlanRequest>,
) -> ApiResult<Json<Value>> {
    TrainerService::assert_schedule_access(&state.db, &user, body.client_id).await?;
    if body.protein_goal < 0.0 || body.calorie_goal < 0.0 {
        return Err(ApiError::validation("Goals cannot be negative"));
    }

    NutritionService::save_day_plan(
        &state.db,
        Utc::now(),
        state.tz_offset(),
        body.client_id,
        &body.day,
        body.protein_goal,
        body.calorie_goal,
        &body.foods,
    )
    .await?;
    Ok(Json(json!({
        "message": "Nutrition plan saved",
        "redirect": "/trainer/clients",
    })))
}

/// GET /nutrition/today — the caller's foods and macros for today.
pub async fn get_today(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<TodayNutritionResponse>> {
    let response =
        NutritionService::get_today(&state.db, Utc::now(), state.tz_offset(), user.user_id).await?;
    Ok(Json(response))
}

/// POST /nutrition/consume — mark a food consumed for the given day.
pub async fn mark_consumed(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<MarkConsumedRequest>,
) -> ApiResult<Json<MarkConsumedResponse>> {
    if body.food_name.trim().is_empty() {
        return Err(ApiError::validation("Food name is required"));
    }

    let response = NutritionService::mark_consumed(
        &state.db,
        Utc::now(),
        state.tz_offset(),
        user.user_id,
        body.food_name.trim(),
        &body.day,
    )
    .await?;
    Ok(Json(response))
}
