use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    errors::ApiResult,
    models::auth::{AuthenticatedUser, LoginRequest, LoginResponse, SignupRequest},
    models::user::UserProfile,
    services::auth::AuthService,
    AppState,
};

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<Json<Value>> {
    let user = AuthService::signup(&state.db, &body).await?;
    let profile = UserProfile::from(user);
    Ok(Json(json!({
        "message": "Account created",
        "user": profile,
    })))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let response = AuthService::login(
        &state.db,
        &body.email,
        &body.password,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )
    .await?;
    Ok(Json(response))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserProfile>> {
    let record = AuthService::find_by_id(&state.db, user.user_id).await?;
    Ok(Json(record.into()))
}
