use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        auth::{Claims, LoginResponse, SignupRequest},
        user::{User, UserRole, USER_COLUMNS},
    },
};

pub struct AuthService;

impl AuthService {
    /// Create a member account. Email uniqueness is enforced by the DB; the
    /// duplicate-key failure is surfaced as a validation error.
    pub async fn signup(pool: &PgPool, req: &SignupRequest) -> ApiResult<User> {
        if req.email.trim().is_empty() || !req.email.contains('@') {
            return Err(ApiError::validation("A valid email address is required"));
        }
        if req.password.len() < 8 {
            return Err(ApiError::validation(
                "Password must be at least 8 characters",
            ));
        }
        if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
            return Err(ApiError::validation("First and last name are required"));
        }

        let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(req.email.trim())
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            return Err(ApiError::validation("An account with this email already exists"));
        }

        let hash = bcrypt::hash(&req.password, 10)
            .map_err(|_| ApiError::validation("Password could not be hashed"))?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, role)
             VALUES ($1, $2, $3, $4, 'member')
             RETURNING {USER_COLUMNS}"
        ))
        .bind(req.email.trim())
        .bind(hash)
        .bind(req.first_name.trim())
        .bind(req.last_name.trim())
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    /// Validate credentials and issue an access token.
    pub async fn login(
        pool: &PgPool,
        email: &str,
        password: &str,
        jwt_secret: &str,
        access_ttl: u64,
    ) -> ApiResult<LoginResponse> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = TRUE"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_authorized("Invalid credentials"))?;

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|_| ApiError::not_authorized("Invalid credentials"))?;
        if !valid {
            return Err(ApiError::not_authorized("Invalid credentials"));
        }

        let role: UserRole = user.role.parse().unwrap_or(UserRole::Member);
        let access_token = Self::generate_access_token(user.id, role, jwt_secret, access_ttl)?;

        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }

    pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> ApiResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
    }

    fn generate_access_token(
        user_id: Uuid,
        role: UserRole,
        jwt_secret: &str,
        access_ttl: u64,
    ) -> ApiResult<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: now + access_ttl as usize,
            iat: now,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "failed to sign access token");
            ApiError::NotAuthorized("Could not issue access token".into())
        })
    }
}
