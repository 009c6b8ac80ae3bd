use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::week::DayOfWeek;

/// One scheduled exercise within a weekly plan. Numeric fields are nullable:
/// a trainer may leave sets/reps/weight/duration unspecified and the document
/// stores null, not zero (the nutrition side is the opposite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub day: DayOfWeek,
    pub name: String,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub duration: Option<i32>,
    #[serde(default)]
    pub completed: bool,
}

/// DB row for one user's workout document covering a single week.
/// `progress` and `completed` are derived by the services, never authored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyWorkoutPlan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub week_start: NaiveDate,
    pub exercises: Json<Vec<ExerciseEntry>>,
    pub progress: i32,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One exercise as submitted by a trainer (no completion state).
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseInput {
    pub name: String,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub duration: Option<i32>,
}

/// Body for POST /workouts/plan — a full week keyed by weekday label.
/// Missing days are treated as empty; unknown day labels are rejected.
#[derive(Debug, Deserialize)]
pub struct SavePlanRequest {
    pub client_id: Uuid,
    pub notes: Option<String>,
    pub current_week: HashMap<String, Vec<ExerciseInput>>,
}

/// Body for POST /workouts/complete.
#[derive(Debug, Deserialize)]
pub struct MarkCompletedRequest {
    pub workout_plan_id: Uuid,
    pub exercise_name: String,
}

#[derive(Debug, Serialize)]
pub struct MarkCompletedResponse {
    pub success: bool,
    pub progress: i32,
    #[serde(rename = "completedExercises")]
    pub completed_exercises: usize,
    #[serde(rename = "totalExercises")]
    pub total_exercises: usize,
}

/// Response for GET /workouts/today.
#[derive(Debug, Serialize)]
pub struct TodayWorkoutResponse {
    pub name: String,
    pub exercises: Vec<ExerciseEntry>,
    pub progress: i32,
    pub completed: bool,
    #[serde(rename = "completedExercises")]
    pub completed_exercises: usize,
    #[serde(rename = "totalExercises")]
    pub total_exercises: usize,
    pub duration: i32,
    #[serde(rename = "workoutPlanId")]
    pub workout_plan_id: Option<Uuid>,
}

impl TodayWorkoutResponse {
    /// The rest-day shape returned when no document has entries for today.
    pub fn empty(today: DayOfWeek) -> Self {
        Self {
            name: format!("{today} Workout"),
            exercises: Vec::new(),
            progress: 0,
            completed: false,
            completed_exercises: 0,
            total_exercises: 0,
            duration: 0,
            workout_plan_id: None,
        }
    }
}
