use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        auth::AuthenticatedUser,
        user::{AssignTrainerRequest, FitnessGoals, UpdateGoalsRequest, User, UserProfile, UserRole, USER_COLUMNS},
    },
    services::trainer::TrainerService,
    AppState,
};

/// PUT /users/me/goals — member updates their own fitness targets.
pub async fn update_goals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateGoalsRequest>,
) -> ApiResult<Json<Value>> {
    if body.calorie_goal < 0.0 || body.protein_goal < 0.0 || body.weight_goal < 0.0 {
        return Err(ApiError::validation("Goals cannot be negative"));
    }

    let goals = FitnessGoals {
        calorie_goal: body.calorie_goal,
        protein_goal: body.protein_goal,
        weight_goal: body.weight_goal,
    };
    sqlx::query("UPDATE users SET fitness_goals = $2, updated_at = NOW() WHERE id = $1")
        .bind(user.user_id)
        .bind(SqlJson(goals))
        .execute(&state.db)
        .await?;
    Ok(Json(json!({ "message": "Goals updated", "fitness_goals": goals })))
}

/// GET /users/clients — clients assigned to the calling trainer.
pub async fn list_clients(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<UserProfile>>> {
    if user.role != UserRole::Trainer && user.role != UserRole::Admin {
        return Err(ApiError::not_authorized("Trainer access required"));
    }

    let clients = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE assigned_trainer_id = $1 AND is_active = TRUE
         ORDER BY last_name, first_name"
    ))
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(clients.into_iter().map(UserProfile::from).collect()))
}

/// POST /users/{id}/assign-trainer — admin only.
pub async fn assign_trainer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(client_id): Path<Uuid>,
    Json(body): Json<AssignTrainerRequest>,
) -> ApiResult<Json<Value>> {
    if user.role != UserRole::Admin {
        return Err(ApiError::not_authorized("Admin access required"));
    }

    TrainerService::assign_trainer(&state.db, client_id, body.trainer_id).await?;
    Ok(Json(json!({ "message": "Trainer assigned" })))
}
