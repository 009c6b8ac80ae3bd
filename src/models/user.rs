use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Member,
    Trainer,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserRole::Member => "member",
            UserRole::Trainer => "trainer",
            UserRole::Admin => "admin",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(UserRole::Member),
            "trainer" => Ok(UserRole::Trainer),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Unknown role: {s}")),
        }
    }
}

/// Per-member targets, snapshotted into nutrition documents at save time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessGoals {
    #[serde(default)]
    pub calorie_goal: f64,
    #[serde(default)]
    pub protein_goal: f64,
    #[serde(default)]
    pub weight_goal: f64,
}

/// DB row struct. The two current-plan columns are single-element history:
/// each save repoints them at the latest weekly document, older ids are not
/// retained.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub membership_type: Option<String>,
    pub membership_expires_at: Option<DateTime<Utc>>,
    pub fitness_goals: Json<FitnessGoals>,
    pub assigned_trainer_id: Option<Uuid>,
    pub current_workout_plan_id: Option<Uuid>,
    pub current_nutrition_plan_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, role, membership_type,
     membership_expires_at, fitness_goals, assigned_trainer_id,
     current_workout_plan_id, current_nutrition_plan_id, is_active,
     created_at, updated_at";

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub membership_type: Option<String>,
    pub membership_expires_at: Option<DateTime<Utc>>,
    pub fitness_goals: FitnessGoals,
    pub assigned_trainer_id: Option<Uuid>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role.parse().unwrap_or(UserRole::Member),
            membership_type: u.membership_type,
            membership_expires_at: u.membership_expires_at,
            fitness_goals: u.fitness_goals.0,
            assigned_trainer_id: u.assigned_trainer_id,
        }
    }
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct UpdateGoalsRequest {
    pub calorie_goal: f64,
    pub protein_goal: f64,
    pub weight_goal: f64,
}

#[derive(Debug, Deserialize)]
pub struct AssignTrainerRequest {
    pub trainer_id: Uuid,
}
