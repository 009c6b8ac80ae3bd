use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        auth::AuthenticatedUser,
        trainer::{ApplyRequest, ReviewRequest, TrainerApplication},
        user::UserRole,
    },
    services::trainer::TrainerService,
    AppState,
};

/// POST /trainers/apply — a member applies to become a verified trainer.
pub async fn apply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<ApplyRequest>,
) -> ApiResult<Json<Value>> {
    if user.role == UserRole::Trainer {
        return Err(ApiError::validation("Account is already a trainer"));
    }

    let application = TrainerService::apply(&state.db, user.user_id, &body).await?;
    Ok(Json(json!({
        "message": "Application submitted",
        "application": application,
    })))
}

/// GET /trainers/applications — admin: pending applications.
pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<TrainerApplication>>> {
    if user.role != UserRole::Admin {
        return Err(ApiError::not_authorized("Admin access required"));
    }
    let applications = TrainerService::list_pending(&state.db).await?;
    Ok(Json(applications))
}

/// POST /trainers/applications/{id}/review — admin approves or rejects.
pub async fn review_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(application_id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> ApiResult<Json<Value>> {
    if user.role != UserRole::Admin {
        return Err(ApiError::not_authorized("Admin access required"));
    }

    let application =
        TrainerService::review(&state.db, application_id, user.user_id, &body.decision).await?;
    Ok(Json(json!({
        "message": format!("Application {}", application.status),
        "application": application,
    })))
}
