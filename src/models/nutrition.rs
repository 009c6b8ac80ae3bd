use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::week::DayOfWeek;

/// Macro totals. Zero-defaulted everywhere — unlike the workout document,
/// the nutrition document never stores nulls for numeric data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
}

/// One food item in a day's plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub name: String,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub consumed: bool,
    pub consumed_at: Option<DateTime<Utc>>,
}

/// The sub-document for one weekday. All seven days exist in every document,
/// defaulted to zero data, so downstream reads never hit a missing day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayNutrition {
    #[serde(default)]
    pub calories_consumed: f64,
    #[serde(default)]
    pub protein_consumed: f64,
    #[serde(default)]
    pub foods: Vec<FoodEntry>,
    #[serde(default)]
    pub macros: Macros,
}

/// Per-document goal snapshot, taken at save time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionGoals {
    #[serde(default)]
    pub protein_goal: f64,
    #[serde(default)]
    pub calorie_goal: f64,
}

pub type DailyNutrition = BTreeMap<DayOfWeek, DayNutrition>;

/// All seven weekday keys with zeroed data.
pub fn default_week() -> DailyNutrition {
    DayOfWeek::ALL
        .iter()
        .map(|d| (*d, DayNutrition::default()))
        .collect()
}

/// DB row for one user's nutrition document covering a single week.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyNutritionPlan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub week_start: NaiveDate,
    pub goals: Json<NutritionGoals>,
    pub daily_nutrition: Json<DailyNutrition>,
    pub weekly_macros: Json<Macros>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One food as submitted by a trainer (no consumption state).
#[derive(Debug, Clone, Deserialize)]
pub struct FoodInput {
    pub name: String,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
}

/// Body for POST /nutrition/plan — one day's plan for one client.
#[derive(Debug, Deserialize)]
pub struct SaveDayPlanRequest {
    pub client_id: Uuid,
    pub day: String,
    pub protein_goal: f64,
    pub calorie_goal: f64,
    pub foods: Vec<FoodInput>,
}

/// Body for POST /nutrition/consume.
#[derive(Debug, Deserialize)]
pub struct MarkConsumedRequest {
    pub food_name: String,
    pub day: String,
}

#[derive(Debug, Serialize)]
pub struct MarkConsumedResponse {
    pub success: bool,
    pub calories_consumed: f64,
    pub protein_consumed: f64,
    pub macros: Macros,
}

/// Response for GET /nutrition/today.
#[derive(Debug, Serialize)]
pub struct TodayNutritionResponse {
    pub protein_goal: f64,
    pub calorie_goal: f64,
    pub foods: Vec<FoodEntry>,
    pub macros: Macros,
    pub calories_consumed: f64,
    pub protein_consumed: f64,
}

impl TodayNutritionResponse {
    pub fn empty() -> Self {
        Self {
            protein_goal: 0.0,
            calorie_goal: 0.0,
            foods: Vec::new(),
            macros: Macros::default(),
            calories_consumed: 0.0,
            protein_consumed: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_week_has_all_seven_days() {
        let week = default_week();
        assert_eq!(week.len(), 7);
        for day in DayOfWeek::ALL {
            let entry = week.get(&day).expect("day present");
            assert!(entry.foods.is_empty());
            assert_eq!(entry.calories_consumed, 0.0);
        }
    }

    #[test]
    fn day_keys_serialize_as_labels() {
        let week = default_week();
        let json = serde_json::to_value(&week).unwrap();
        assert!(json.get("Monday").is_some());
        assert!(json.get("Sunday").is_some());
    }
}
