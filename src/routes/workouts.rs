use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        auth::AuthenticatedUser,
        workout::{MarkCompletedRequest, MarkCompletedResponse, SavePlanRequest, TodayWorkoutResponse},
    },
    services::{trainer::TrainerService, workout::WorkoutService},
    AppState,
};

/// POST /workouts/plan — trainer saves a client's full week.
pub async fn save_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<SavePlanRequest>,
) -> ApiResult<Json<Value>> {
    TrainerService::assert_schedule_access(&state.db, &user, body.client_id).await?;

    WorkoutService::save_plan(
        &state.db,
        Utc::now(),
        state.tz_offset(),
        body.client_id,
        &body.current_week,
        body.notes,
    )
    .await?;
    Ok(Json(json!({
        "message": "Workout plan saved",
        "redirect": "/trainer/clients",
    })))
}

/// GET /workouts/week/{client_id} — the full 7-day schedule for the current
/// week. Readable by the client themself, their trainer, or an admin.
pub async fn get_week(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    if user.user_id != client_id {
        TrainerService::assert_schedule_access(&state.db, &user, client_id).await?;
    }

    let schedule =
        WorkoutService::get_week(&state.db, Utc::now(), state.tz_offset(), client_id).await?;
    Ok(Json(json!({
        "weeklySchedule": schedule,
        "success": true,
    })))
}

/// GET /workouts/today — the caller's workout for today.
pub async fn get_today(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<TodayWorkoutResponse>> {
    let response =
        WorkoutService::get_today(&state.db, Utc::now(), state.tz_offset(), user.user_id).await?;
    Ok(Json(response))
}

/// POST /workouts/complete — mark one of today's exercises done.
pub async fn mark_completed(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<MarkCompletedRequest>,
) -> ApiResult<Json<MarkCompletedResponse>> {
    if body.exercise_name.trim().is_empty() {
        return Err(ApiError::validation("Exercise name is required"));
    }

    let response = WorkoutService::mark_exercise_completed(
        &state.db,
        Utc::now(),
        state.tz_offset(),
        user.user_id,
        body.workout_plan_id,
        body.exercise_name.trim(),
    )
    .await?;
    Ok(Json(response))
}
