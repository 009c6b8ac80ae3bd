use chrono::{DateTime, FixedOffset, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        nutrition::{
            DailyNutrition, DayNutrition, FoodEntry, FoodInput, Macros, MarkConsumedResponse,
            NutritionGoals, TodayNutritionResponse, WeeklyNutritionPlan,
        },
        week::DayOfWeek,
    },
    services::{calendar::resolve_week, plan_store::PlanStore},
};

pub struct NutritionService;

impl NutritionService {
    /// Save a trainer-authored plan for one day of one client's week. Only
    /// the targeted day's sub-document is replaced — the other six days keep
    /// their foods and consumption state. Ordered pipeline, no transaction.
    pub async fn save_day_plan(
        pool: &PgPool,
        now: DateTime<Utc>,
        offset: FixedOffset,
        client_id: Uuid,
        day: &str,
        protein_goal: f64,
        calorie_goal: f64,
        foods: &[FoodInput],
    ) -> ApiResult<WeeklyNutritionPlan> {
        let day: DayOfWeek = day
            .parse()
            .map_err(|_| ApiError::validation(format!("Unknown weekday: {day}")))?;
        let day_entry = build_day_entry(foods);
        let window = resolve_week(now, offset);

        let (mut plan, created) =
            PlanStore::find_or_create_nutrition(pool, client_id, &window).await?;
        if created {
            tracing::info!(%client_id, week_start = %window.start, "created nutrition document");
        }

        ensure_all_days(&mut plan.daily_nutrition.0);
        plan.daily_nutrition.0.insert(day, day_entry);
        plan.goals.0 = NutritionGoals {
            protein_goal,
            calorie_goal,
        };
        plan.weekly_macros.0 = weekly_macros(&plan.daily_nutrition.0);

        let plan = PlanStore::update_nutrition(pool, &plan).await?;
        PlanStore::delete_duplicate_nutrition(pool, client_id, &window, plan.id).await?;
        PlanStore::set_current_nutrition(pool, client_id, plan.id).await?;

        // Goal snapshot also flows back onto the member profile.
        sqlx::query(
            "UPDATE users
             SET fitness_goals = jsonb_set(
                     jsonb_set(fitness_goals, '{protein_goal}', to_jsonb($2::float8)),
                     '{calorie_goal}', to_jsonb($3::float8)),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(client_id)
        .bind(protein_goal)
        .bind(calorie_goal)
        .execute(pool)
        .await?;

        Ok(plan)
    }

    /// Today's foods, macros and goals, or zeroed defaults when the user has
    /// no document for the current week.
    pub async fn get_today(
        pool: &PgPool,
        now: DateTime<Utc>,
        offset: FixedOffset,
        user_id: Uuid,
    ) -> ApiResult<TodayNutritionResponse> {
        let window = resolve_week(now, offset);
        let Some(plan) = PlanStore::find_nutrition(pool, user_id, &window).await? else {
            return Ok(TodayNutritionResponse::empty());
        };

        let entry = plan
            .daily_nutrition
            .0
            .get(&window.today)
            .cloned()
            .unwrap_or_default();
        Ok(TodayNutritionResponse {
            protein_goal: plan.goals.0.protein_goal,
            calorie_goal: plan.goals.0.calorie_goal,
            foods: entry.foods,
            macros: entry.macros,
            calories_consumed: entry.calories_consumed,
            protein_consumed: entry.protein_consumed,
        })
    }

    /// Flag one food as consumed and recompute the day's consumed totals as
    /// sums over consumed foods only. Setting an already-consumed food again
    /// is a no-op success — the flag is one-way.
    pub async fn mark_consumed(
        pool: &PgPool,
        now: DateTime<Utc>,
        offset: FixedOffset,
        user_id: Uuid,
        food_name: &str,
        day: &str,
    ) -> ApiResult<MarkConsumedResponse> {
        let day: DayOfWeek = day
            .parse()
            .map_err(|_| ApiError::validation(format!("Unknown weekday: {day}")))?;
        let window = resolve_week(now, offset);

        let mut plan = PlanStore::find_nutrition(pool, user_id, &window)
            .await?
            .ok_or_else(|| ApiError::not_found("No nutrition plan for the current week"))?;

        let (calories_consumed, protein_consumed, macros) =
            mark_food_consumed(&mut plan.daily_nutrition.0, day, food_name, now)?;

        PlanStore::update_nutrition(pool, &plan).await?;

        Ok(MarkConsumedResponse {
            success: true,
            calories_consumed,
            protein_consumed,
            macros,
        })
    }
}

/// Build a fresh day sub-document from trainer input: macro totals are sums
/// over the submitted foods, every food starts unconsumed, consumed totals
/// start at zero.
fn build_day_entry(foods: &[FoodInput]) -> DayNutrition {
    let entries: Vec<FoodEntry> = foods
        .iter()
        .filter(|f| !f.name.trim().is_empty())
        .map(|f| FoodEntry {
            name: f.name.trim().to_string(),
            protein: f.protein,
            calories: f.calories,
            carbs: f.carbs,
            fats: f.fats,
            consumed: false,
            consumed_at: None,
        })
        .collect();

    let macros = Macros {
        protein: entries.iter().map(|f| f.protein).sum(),
        carbs: entries.iter().map(|f| f.carbs).sum(),
        fats: entries.iter().map(|f| f.fats).sum(),
    };

    DayNutrition {
        calories_consumed: 0.0,
        protein_consumed: 0.0,
        foods: entries,
        macros,
    }
}

/// Average macros over days that have at least one food; zeroed when no day
/// qualifies.
fn weekly_macros(daily: &DailyNutrition) -> Macros {
    let planned: Vec<&DayNutrition> = daily.values().filter(|d| !d.foods.is_empty()).collect();
    if planned.is_empty() {
        return Macros::default();
    }
    let n = planned.len() as f64;
    Macros {
        protein: planned.iter().map(|d| d.macros.protein).sum::<f64>() / n,
        carbs: planned.iter().map(|d| d.macros.carbs).sum::<f64>() / n,
        fats: planned.iter().map(|d| d.macros.fats).sum::<f64>() / n,
    }
}

/// Flag one food on the given day and recompute that day's consumed totals.
/// Missing day keys are healed to zeroed data first, so the only failure
/// left is a food that is not on the day's list.
fn mark_food_consumed(
    daily: &mut DailyNutrition,
    day: DayOfWeek,
    food_name: &str,
    now: DateTime<Utc>,
) -> ApiResult<(f64, f64, Macros)> {
    ensure_all_days(daily);
    let entry = daily.entry(day).or_default();

    let food = entry
        .foods
        .iter_mut()
        .find(|f| f.name == food_name)
        .ok_or_else(|| ApiError::not_found(format!("Food '{food_name}' not found for {day}")))?;
    food.consumed = true;
    food.consumed_at = Some(now);

    recompute_consumed_totals(entry);
    Ok((entry.calories_consumed, entry.protein_consumed, entry.macros))
}

/// Consumed totals are sums over foods with `consumed == true` only.
fn recompute_consumed_totals(entry: &mut DayNutrition) {
    entry.calories_consumed = entry
        .foods
        .iter()
        .filter(|f| f.consumed)
        .map(|f| f.calories)
        .sum();
    entry.protein_consumed = entry
        .foods
        .iter()
        .filter(|f| f.consumed)
        .map(|f| f.protein)
        .sum();
}

/// Older documents can miss day keys; reads and writes both defend by
/// filling every absent day with zeroed data.
fn ensure_all_days(daily: &mut DailyNutrition) {
    for day in DayOfWeek::ALL {
        daily.entry(day).or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::nutrition::default_week;

    fn food(name: &str, calories: f64, protein: f64, carbs: f64, fats: f64) -> FoodInput {
        FoodInput {
            name: name.to_string(),
            protein,
            calories,
            carbs,
            fats,
        }
    }

    #[test]
    fn day_entry_sums_macros_and_starts_unconsumed() {
        let entry = build_day_entry(&[
            food("Rice", 200.0, 4.0, 44.0, 0.0),
            food("Chicken", 300.0, 40.0, 0.0, 8.0),
        ]);
        assert_eq!(entry.macros.protein, 44.0);
        assert_eq!(entry.macros.carbs, 44.0);
        assert_eq!(entry.macros.fats, 8.0);
        assert_eq!(entry.calories_consumed, 0.0);
        assert!(entry.foods.iter().all(|f| !f.consumed && f.consumed_at.is_none()));
    }

    #[test]
    fn day_entry_drops_blank_food_names() {
        let entry = build_day_entry(&[food("  ", 100.0, 1.0, 1.0, 1.0), food("Oats", 150.0, 5.0, 27.0, 3.0)]);
        assert_eq!(entry.foods.len(), 1);
        assert_eq!(entry.foods[0].name, "Oats");
    }

    #[test]
    fn replacing_one_day_leaves_other_days_untouched() {
        let mut week = default_week();
        week.insert(
            DayOfWeek::Monday,
            build_day_entry(&[food("Eggs", 160.0, 12.0, 1.0, 11.0)]),
        );
        let monday_before = week.get(&DayOfWeek::Monday).unwrap().clone();

        week.insert(
            DayOfWeek::Tuesday,
            build_day_entry(&[food("Rice", 200.0, 4.0, 44.0, 0.0)]),
        );

        assert_eq!(week.get(&DayOfWeek::Monday).unwrap(), &monday_before);
        assert_eq!(week.get(&DayOfWeek::Tuesday).unwrap().foods.len(), 1);
    }

    #[test]
    fn weekly_macros_average_only_planned_days() {
        let mut week = default_week();
        week.insert(
            DayOfWeek::Monday,
            build_day_entry(&[food("A", 0.0, 10.0, 20.0, 2.0)]),
        );
        week.insert(
            DayOfWeek::Wednesday,
            build_day_entry(&[food("B", 0.0, 30.0, 40.0, 6.0)]),
        );

        let avg = weekly_macros(&week);
        assert_eq!(avg.protein, 20.0);
        assert_eq!(avg.carbs, 30.0);
        assert_eq!(avg.fats, 4.0);
    }

    #[test]
    fn weekly_macros_zero_when_no_day_planned() {
        assert_eq!(weekly_macros(&default_week()), Macros::default());
    }

    #[test]
    fn consumed_totals_sum_consumed_foods_only() {
        let mut entry = build_day_entry(&[
            food("Rice", 200.0, 4.0, 44.0, 0.0),
            food("Chicken", 300.0, 40.0, 0.0, 8.0),
            food("Broccoli", 50.0, 4.0, 10.0, 0.0),
        ]);
        entry.foods[0].consumed = true;
        entry.foods[1].consumed = true;

        recompute_consumed_totals(&mut entry);
        assert_eq!(entry.calories_consumed, 500.0);
        assert_eq!(entry.protein_consumed, 44.0);
    }

    #[test]
    fn marking_food_flags_it_and_sums_consumed_totals() {
        let mut week = default_week();
        week.insert(
            DayOfWeek::Wednesday,
            build_day_entry(&[
                food("Rice", 200.0, 4.0, 44.0, 0.0),
                food("Chicken", 300.0, 40.0, 0.0, 8.0),
            ]),
        );
        let now = chrono::Utc::now();

        let (calories, protein, _) =
            mark_food_consumed(&mut week, DayOfWeek::Wednesday, "Rice", now).unwrap();
        assert_eq!((calories, protein), (200.0, 4.0));

        let (calories, protein, _) =
            mark_food_consumed(&mut week, DayOfWeek::Wednesday, "Chicken", now).unwrap();
        assert_eq!((calories, protein), (500.0, 44.0));

        let rice = &week.get(&DayOfWeek::Wednesday).unwrap().foods[0];
        assert!(rice.consumed);
        assert!(rice.consumed_at.is_some());
    }

    #[test]
    fn remarking_a_consumed_food_keeps_totals_stable() {
        let mut week = default_week();
        week.insert(
            DayOfWeek::Monday,
            build_day_entry(&[food("Oats", 150.0, 5.0, 27.0, 3.0)]),
        );
        let now = chrono::Utc::now();

        mark_food_consumed(&mut week, DayOfWeek::Monday, "Oats", now).unwrap();
        let (calories, protein, _) =
            mark_food_consumed(&mut week, DayOfWeek::Monday, "Oats", now).unwrap();
        assert_eq!((calories, protein), (150.0, 5.0));
    }

    #[test]
    fn marking_unknown_food_is_not_found() {
        let mut week = default_week();
        week.insert(
            DayOfWeek::Monday,
            build_day_entry(&[food("Oats", 150.0, 5.0, 27.0, 3.0)]),
        );
        let err =
            mark_food_consumed(&mut week, DayOfWeek::Monday, "Rice", chrono::Utc::now())
                .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn marking_on_a_missing_day_key_heals_the_week_and_reports_the_food() {
        let mut week = DailyNutrition::new();
        let err =
            mark_food_consumed(&mut week, DayOfWeek::Thursday, "Rice", chrono::Utc::now())
                .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(week.len(), 7);
    }

    #[test]
    fn ensure_all_days_restores_missing_keys() {
        let mut week = DailyNutrition::new();
        week.insert(
            DayOfWeek::Friday,
            build_day_entry(&[food("Fish", 250.0, 30.0, 0.0, 12.0)]),
        );
        ensure_all_days(&mut week);
        assert_eq!(week.len(), 7);
        assert_eq!(week.get(&DayOfWeek::Friday).unwrap().foods.len(), 1);
        assert!(week.get(&DayOfWeek::Monday).unwrap().foods.is_empty());
    }
}
