use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        week::DayOfWeek,
        workout::{
            ExerciseEntry, ExerciseInput, MarkCompletedResponse, TodayWorkoutResponse,
            WeeklyWorkoutPlan,
        },
    },
    services::{calendar::resolve_week, plan_store::PlanStore},
};

pub struct WorkoutService;

impl WorkoutService {
    /// Save a trainer-authored week for one client. Ordered pipeline, no
    /// transaction: resolve week, find-or-create the document, replace the
    /// whole exercises array, persist, repair duplicates, repoint the
    /// owner's current-plan reference. A fresh save always resets completion.
    pub async fn save_plan(
        pool: &PgPool,
        now: DateTime<Utc>,
        offset: FixedOffset,
        client_id: Uuid,
        by_day: &HashMap<String, Vec<ExerciseInput>>,
        notes: Option<String>,
    ) -> ApiResult<WeeklyWorkoutPlan> {
        let exercises = flatten_week(by_day)?;
        let window = resolve_week(now, offset);

        let (mut plan, created) = PlanStore::find_or_create_workout(pool, client_id, &window).await?;
        if created {
            tracing::info!(%client_id, week_start = %window.start, "created workout document");
        }

        apply_week(&mut plan, exercises, notes);

        let plan = PlanStore::update_workout(pool, &plan).await?;
        PlanStore::delete_duplicate_workouts(pool, client_id, &window, plan.id).await?;
        PlanStore::set_current_workout(pool, client_id, plan.id).await?;
        Ok(plan)
    }

    /// The client's current week as a full 7-day schedule, every day present
    /// and possibly empty.
    pub async fn get_week(
        pool: &PgPool,
        now: DateTime<Utc>,
        offset: FixedOffset,
        client_id: Uuid,
    ) -> ApiResult<BTreeMap<DayOfWeek, Vec<ExerciseEntry>>> {
        let window = resolve_week(now, offset);
        let mut schedule: BTreeMap<DayOfWeek, Vec<ExerciseEntry>> =
            DayOfWeek::ALL.iter().map(|d| (*d, Vec::new())).collect();

        if let Some(plan) = PlanStore::find_workout(pool, client_id, &window).await? {
            for entry in plan.exercises.0 {
                schedule.entry(entry.day).or_default().push(entry);
            }
        }
        Ok(schedule)
    }

    /// Today's workout. Primary source is the current week's document; when
    /// it has nothing for today the search falls back to scanning all of the
    /// user's documents, newest first — plans whose day tagging drifted from
    /// the calendar are still surfaced that way.
    pub async fn get_today(
        pool: &PgPool,
        now: DateTime<Utc>,
        offset: FixedOffset,
        user_id: Uuid,
    ) -> ApiResult<TodayWorkoutResponse> {
        let window = resolve_week(now, offset);
        let today = window.today;

        if let Some(plan) = PlanStore::find_workout(pool, user_id, &window).await? {
            if plan.exercises.0.iter().any(|e| e.day == today) {
                return Ok(build_today_response(&plan, today));
            }
        }

        for plan in PlanStore::list_workouts(pool, user_id).await? {
            if plan.exercises.0.iter().any(|e| e.day == today) {
                tracing::warn!(%user_id, plan_id = %plan.id, "today-workout served from out-of-week document");
                return Ok(build_today_response(&plan, today));
            }
        }

        Ok(TodayWorkoutResponse::empty(today))
    }

    /// Mark one exercise done for today and recompute today-scoped progress.
    pub async fn mark_exercise_completed(
        pool: &PgPool,
        now: DateTime<Utc>,
        offset: FixedOffset,
        user_id: Uuid,
        plan_id: Uuid,
        exercise_name: &str,
    ) -> ApiResult<MarkCompletedResponse> {
        let window = resolve_week(now, offset);
        let mut plan = PlanStore::find_workout_by_id(pool, user_id, plan_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Workout plan not found"))?;

        let idx = match locate_exercise(&plan.exercises.0, exercise_name, window.today)? {
            ExerciseMatch::Today(i) => i,
            ExerciseMatch::OtherDay(i) => {
                tracing::warn!(
                    %plan_id,
                    exercise = exercise_name,
                    "completing exercise whose day tag does not match today"
                );
                i
            }
        };
        plan.exercises.0[idx].completed = true;

        let (done, total, pct) = day_progress(&plan.exercises.0, window.today);
        plan.progress = pct;
        if pct == 100 {
            plan.completed = true;
        }
        PlanStore::update_workout(pool, &plan).await?;

        Ok(MarkCompletedResponse {
            success: true,
            progress: pct,
            completed_exercises: done,
            total_exercises: total,
        })
    }
}

#[derive(Debug)]
enum ExerciseMatch {
    /// Entry tagged with today's label.
    Today(usize),
    /// Name matched an incomplete entry on another day (drifted day tag).
    OtherDay(usize),
}

/// Primary rule: name and day both match. Fallback rule: name matches an
/// incomplete entry regardless of day. An already-done primary match is an
/// idempotency violation, not a miss.
fn locate_exercise(
    exercises: &[ExerciseEntry],
    name: &str,
    today: DayOfWeek,
) -> ApiResult<ExerciseMatch> {
    if let Some(i) = exercises
        .iter()
        .position(|e| e.day == today && e.name == name)
    {
        if exercises[i].completed {
            return Err(ApiError::AlreadyCompleted(format!(
                "Exercise '{name}' is already completed"
            )));
        }
        return Ok(ExerciseMatch::Today(i));
    }
    if let Some(i) = exercises
        .iter()
        .position(|e| e.name == name && !e.completed)
    {
        return Ok(ExerciseMatch::OtherDay(i));
    }
    Err(ApiError::not_found(format!(
        "Exercise '{name}' not found in this plan"
    )))
}

/// Progress over today's entries only: round(100 * done / total), 100 when
/// the day has no entries.
fn day_progress(exercises: &[ExerciseEntry], today: DayOfWeek) -> (usize, usize, i32) {
    let todays: Vec<&ExerciseEntry> = exercises.iter().filter(|e| e.day == today).collect();
    let total = todays.len();
    let done = todays.iter().filter(|e| e.completed).count();
    let pct = if total == 0 {
        100
    } else {
        ((100.0 * done as f64) / total as f64).round() as i32
    };
    (done, total, pct)
}

/// Overwrite the document's entries with a fresh trainer submission. Every
/// save replaces the whole week and resets the derived state — entries from
/// earlier saves never survive.
fn apply_week(plan: &mut WeeklyWorkoutPlan, exercises: Vec<ExerciseEntry>, notes: Option<String>) {
    plan.exercises = Json(exercises);
    plan.progress = 0;
    plan.completed = false;
    plan.notes = notes;
}

/// Validate and flatten a day-keyed submission into the stored entry list.
/// Blank names are dropped after trimming; unknown day labels are rejected;
/// completion is reset on every entry.
fn flatten_week(by_day: &HashMap<String, Vec<ExerciseInput>>) -> ApiResult<Vec<ExerciseEntry>> {
    for key in by_day.keys() {
        key.parse::<DayOfWeek>()
            .map_err(|_| ApiError::validation(format!("Unknown weekday: {key}")))?;
    }

    let mut entries = Vec::new();
    for day in DayOfWeek::ALL {
        let Some(inputs) = by_day.get(day.as_str()) else {
            continue;
        };
        for input in inputs {
            let name = input.name.trim();
            if name.is_empty() {
                continue;
            }
            entries.push(ExerciseEntry {
                day,
                name: name.to_string(),
                sets: input.sets,
                reps: input.reps,
                weight: input.weight,
                duration: input.duration,
                completed: false,
            });
        }
    }
    Ok(entries)
}

fn build_today_response(plan: &WeeklyWorkoutPlan, today: DayOfWeek) -> TodayWorkoutResponse {
    let exercises: Vec<ExerciseEntry> = plan
        .exercises
        .0
        .iter()
        .filter(|e| e.day == today)
        .cloned()
        .collect();
    let (done, total, pct) = day_progress(&plan.exercises.0, today);
    let duration: i32 = exercises.iter().filter_map(|e| e.duration).sum();
    let name = match plan.notes.as_deref() {
        Some(n) if !n.trim().is_empty() => n.to_string(),
        _ => format!("{today} Workout"),
    };

    TodayWorkoutResponse {
        name,
        exercises,
        progress: pct,
        completed: done == total && total > 0,
        completed_exercises: done,
        total_exercises: total,
        duration,
        workout_plan_id: Some(plan.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: DayOfWeek, name: &str, completed: bool) -> ExerciseEntry {
        ExerciseEntry {
            day,
            name: name.to_string(),
            sets: Some(3),
            reps: Some(10),
            weight: None,
            duration: Some(20),
            completed,
        }
    }

    fn input(name: &str) -> ExerciseInput {
        ExerciseInput {
            name: name.to_string(),
            sets: Some(3),
            reps: Some(10),
            weight: None,
            duration: None,
        }
    }

    #[test]
    fn flatten_drops_blank_names_and_resets_completion() {
        let mut by_day = HashMap::new();
        by_day.insert(
            "Monday".to_string(),
            vec![input("Bench"), input("   "), input("Squat")],
        );
        by_day.insert("Tuesday".to_string(), Vec::new());

        let entries = flatten_week(&by_day).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.completed));
        assert!(entries.iter().all(|e| e.day == DayOfWeek::Monday));
        assert_eq!(entries[0].name, "Bench");
        assert_eq!(entries[1].name, "Squat");
    }

    #[test]
    fn flatten_rejects_unknown_day_labels() {
        let mut by_day = HashMap::new();
        by_day.insert("Funday".to_string(), vec![input("Bench")]);
        let err = flatten_week(&by_day).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn flatten_orders_entries_monday_first() {
        let mut by_day = HashMap::new();
        by_day.insert("Friday".to_string(), vec![input("Deadlift")]);
        by_day.insert("Monday".to_string(), vec![input("Bench")]);
        let entries = flatten_week(&by_day).unwrap();
        assert_eq!(entries[0].day, DayOfWeek::Monday);
        assert_eq!(entries[1].day, DayOfWeek::Friday);
    }

    #[test]
    fn progress_is_scoped_to_today() {
        let exercises = vec![
            entry(DayOfWeek::Monday, "Bench", true),
            entry(DayOfWeek::Monday, "Squat", true),
            entry(DayOfWeek::Friday, "Deadlift", false),
        ];
        let (done, total, pct) = day_progress(&exercises, DayOfWeek::Monday);
        assert_eq!((done, total, pct), (2, 2, 100));

        let (done, total, pct) = day_progress(&exercises, DayOfWeek::Friday);
        assert_eq!((done, total, pct), (0, 1, 0));
    }

    #[test]
    fn progress_rounds_and_defaults_to_100_on_rest_days() {
        let exercises = vec![
            entry(DayOfWeek::Monday, "Bench", true),
            entry(DayOfWeek::Monday, "Squat", false),
            entry(DayOfWeek::Monday, "Row", false),
        ];
        let (_, _, pct) = day_progress(&exercises, DayOfWeek::Monday);
        assert_eq!(pct, 33);

        let (done, total, pct) = day_progress(&exercises, DayOfWeek::Sunday);
        assert_eq!((done, total, pct), (0, 0, 100));
    }

    #[test]
    fn locate_prefers_todays_entry() {
        let exercises = vec![
            entry(DayOfWeek::Tuesday, "Bench", false),
            entry(DayOfWeek::Monday, "Bench", false),
        ];
        match locate_exercise(&exercises, "Bench", DayOfWeek::Monday).unwrap() {
            ExerciseMatch::Today(i) => assert_eq!(i, 1),
            ExerciseMatch::OtherDay(_) => panic!("expected today match"),
        }
    }

    #[test]
    fn locate_falls_back_to_incomplete_entry_on_another_day() {
        let exercises = vec![entry(DayOfWeek::Tuesday, "Bench", false)];
        match locate_exercise(&exercises, "Bench", DayOfWeek::Monday).unwrap() {
            ExerciseMatch::OtherDay(i) => assert_eq!(i, 0),
            ExerciseMatch::Today(_) => panic!("expected fallback match"),
        }
    }

    #[test]
    fn locate_rejects_already_completed_todays_entry() {
        let exercises = vec![entry(DayOfWeek::Monday, "Bench", true)];
        let err = locate_exercise(&exercises, "Bench", DayOfWeek::Monday).unwrap_err();
        assert!(matches!(err, ApiError::AlreadyCompleted(_)));
    }

    #[test]
    fn locate_reports_missing_exercise() {
        let exercises = vec![entry(DayOfWeek::Monday, "Bench", false)];
        let err = locate_exercise(&exercises, "Curl", DayOfWeek::Monday).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn completed_entry_on_another_day_is_not_a_fallback_target() {
        let exercises = vec![entry(DayOfWeek::Tuesday, "Bench", true)];
        let err = locate_exercise(&exercises, "Bench", DayOfWeek::Monday).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    fn blank_plan() -> WeeklyWorkoutPlan {
        WeeklyWorkoutPlan {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            week_start: chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            exercises: sqlx::types::Json(Vec::new()),
            progress: 0,
            completed: false,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn second_save_replaces_entries_instead_of_accumulating() {
        let mut plan = blank_plan();

        let mut first = HashMap::new();
        first.insert(
            "Monday".to_string(),
            vec![input("Bench"), input("Squat")],
        );
        apply_week(&mut plan, flatten_week(&first).unwrap(), Some("week 1".into()));
        assert_eq!(plan.exercises.0.len(), 2);

        // Progress made on the first plan must not leak into the next save.
        plan.exercises.0[0].completed = true;
        plan.progress = 50;
        plan.completed = true;

        let mut second = HashMap::new();
        second.insert("Friday".to_string(), vec![input("Deadlift")]);
        apply_week(&mut plan, flatten_week(&second).unwrap(), Some("week 2".into()));

        assert_eq!(plan.exercises.0, flatten_week(&second).unwrap());
        assert!(plan.exercises.0.iter().all(|e| e.name != "Bench"));
        assert!(plan.exercises.0.iter().all(|e| !e.completed));
        assert_eq!(plan.progress, 0);
        assert!(!plan.completed);
        assert_eq!(plan.notes.as_deref(), Some("week 2"));
    }

    #[test]
    fn today_response_sums_duration_and_derives_name() {
        let plan = WeeklyWorkoutPlan {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            week_start: chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            exercises: sqlx::types::Json(vec![
                entry(DayOfWeek::Monday, "Bench", true),
                entry(DayOfWeek::Monday, "Squat", false),
                entry(DayOfWeek::Friday, "Deadlift", false),
            ]),
            progress: 0,
            completed: false,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let resp = build_today_response(&plan, DayOfWeek::Monday);
        assert_eq!(resp.name, "Monday Workout");
        assert_eq!(resp.exercises.len(), 2);
        assert_eq!(resp.duration, 40);
        assert_eq!(resp.progress, 50);
        assert!(!resp.completed);
        assert_eq!(resp.workout_plan_id, Some(plan.id));
    }
}
