use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::ApiResult,
    models::{
        nutrition::{default_week, WeeklyNutritionPlan},
        workout::WeeklyWorkoutPlan,
    },
    services::calendar::WeekWindow,
};

const WORKOUT_COLUMNS: &str =
    "id, owner_id, week_start, exercises, progress, completed, notes, created_at, updated_at";

const NUTRITION_COLUMNS: &str =
    "id, owner_id, week_start, goals, daily_nutrition, weekly_macros, created_at, updated_at";

/// Persistence layer for the two per-user weekly documents. Lookups match by
/// week *range* rather than exact week_start so a document saved with minor
/// clock skew is still found; the scheduling services repair any duplicates
/// this tolerance lets through.
pub struct PlanStore;

impl PlanStore {
    pub async fn find_workout(
        pool: &PgPool,
        owner_id: Uuid,
        window: &WeekWindow,
    ) -> ApiResult<Option<WeeklyWorkoutPlan>> {
        let plan = sqlx::query_as::<_, WeeklyWorkoutPlan>(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM weekly_workout_plans
             WHERE owner_id = $1 AND week_start >= $2 AND week_start < $3
             ORDER BY week_start LIMIT 1"
        ))
        .bind(owner_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_optional(pool)
        .await?;
        Ok(plan)
    }

    /// Returns the week's workout document, creating an empty one when none
    /// exists. The bool is true when a fresh document was inserted.
    pub async fn find_or_create_workout(
        pool: &PgPool,
        owner_id: Uuid,
        window: &WeekWindow,
    ) -> ApiResult<(WeeklyWorkoutPlan, bool)> {
        if let Some(plan) = Self::find_workout(pool, owner_id, window).await? {
            return Ok((plan, false));
        }
        let plan = sqlx::query_as::<_, WeeklyWorkoutPlan>(&format!(
            "INSERT INTO weekly_workout_plans (owner_id, week_start)
             VALUES ($1, $2)
             RETURNING {WORKOUT_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(window.start)
        .fetch_one(pool)
        .await?;
        Ok((plan, true))
    }

    pub async fn find_workout_by_id(
        pool: &PgPool,
        owner_id: Uuid,
        plan_id: Uuid,
    ) -> ApiResult<Option<WeeklyWorkoutPlan>> {
        let plan = sqlx::query_as::<_, WeeklyWorkoutPlan>(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM weekly_workout_plans
             WHERE id = $1 AND owner_id = $2"
        ))
        .bind(plan_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;
        Ok(plan)
    }

    /// All of one user's workout documents, newest week first. Used by the
    /// today-workout fallback scan.
    pub async fn list_workouts(pool: &PgPool, owner_id: Uuid) -> ApiResult<Vec<WeeklyWorkoutPlan>> {
        let plans = sqlx::query_as::<_, WeeklyWorkoutPlan>(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM weekly_workout_plans
             WHERE owner_id = $1 ORDER BY week_start DESC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
        Ok(plans)
    }

    /// Full-document write of the mutable workout fields.
    pub async fn update_workout(
        pool: &PgPool,
        plan: &WeeklyWorkoutPlan,
    ) -> ApiResult<WeeklyWorkoutPlan> {
        let updated = sqlx::query_as::<_, WeeklyWorkoutPlan>(&format!(
            "UPDATE weekly_workout_plans
             SET exercises = $2, progress = $3, completed = $4, notes = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING {WORKOUT_COLUMNS}"
        ))
        .bind(plan.id)
        .bind(&plan.exercises)
        .bind(plan.progress)
        .bind(plan.completed)
        .bind(&plan.notes)
        .fetch_one(pool)
        .await?;
        Ok(updated)
    }

    /// Remove every other workout document for the same (owner, week) range.
    /// Best-effort repair for races between concurrent saves; there is no
    /// lock making this a hard guarantee.
    pub async fn delete_duplicate_workouts(
        pool: &PgPool,
        owner_id: Uuid,
        window: &WeekWindow,
        keep_id: Uuid,
    ) -> ApiResult<u64> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM weekly_workout_plans
             WHERE owner_id = $1 AND week_start >= $2 AND week_start < $3",
        )
        .bind(owner_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(pool)
        .await?;

        let stale = duplicate_ids(&ids, keep_id);
        if stale.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM weekly_workout_plans WHERE id = ANY($1)")
            .bind(&stale)
            .execute(pool)
            .await?;
        let removed = result.rows_affected();
        tracing::warn!(%owner_id, week_start = %window.start, removed, "removed duplicate workout documents");
        Ok(removed)
    }

    pub async fn find_nutrition(
        pool: &PgPool,
        owner_id: Uuid,
        window: &WeekWindow,
    ) -> ApiResult<Option<WeeklyNutritionPlan>> {
        let plan = sqlx::query_as::<_, WeeklyNutritionPlan>(&format!(
            "SELECT {NUTRITION_COLUMNS} FROM weekly_nutrition_plans
             WHERE owner_id = $1 AND week_start >= $2 AND week_start < $3
             ORDER BY week_start LIMIT 1"
        ))
        .bind(owner_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_optional(pool)
        .await?;
        Ok(plan)
    }

    /// Returns the week's nutrition document, creating one with all seven
    /// days defaulted when none exists.
    pub async fn find_or_create_nutrition(
        pool: &PgPool,
        owner_id: Uuid,
        window: &WeekWindow,
    ) -> ApiResult<(WeeklyNutritionPlan, bool)> {
        if let Some(plan) = Self::find_nutrition(pool, owner_id, window).await? {
            return Ok((plan, false));
        }
        let plan = sqlx::query_as::<_, WeeklyNutritionPlan>(&format!(
            "INSERT INTO weekly_nutrition_plans (owner_id, week_start, daily_nutrition)
             VALUES ($1, $2, $3)
             RETURNING {NUTRITION_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(window.start)
        .bind(Json(default_week()))
        .fetch_one(pool)
        .await?;
        Ok((plan, true))
    }

    /// Full-document write of the mutable nutrition fields.
    pub async fn update_nutrition(
        pool: &PgPool,
        plan: &WeeklyNutritionPlan,
    ) -> ApiResult<WeeklyNutritionPlan> {
        let updated = sqlx::query_as::<_, WeeklyNutritionPlan>(&format!(
            "UPDATE weekly_nutrition_plans
             SET goals = $2, daily_nutrition = $3, weekly_macros = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {NUTRITION_COLUMNS}"
        ))
        .bind(plan.id)
        .bind(&plan.goals)
        .bind(&plan.daily_nutrition)
        .bind(&plan.weekly_macros)
        .fetch_one(pool)
        .await?;
        Ok(updated)
    }

    pub async fn delete_duplicate_nutrition(
        pool: &PgPool,
        owner_id: Uuid,
        window: &WeekWindow,
        keep_id: Uuid,
    ) -> ApiResult<u64> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM weekly_nutrition_plans
             WHERE owner_id = $1 AND week_start >= $2 AND week_start < $3",
        )
        .bind(owner_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(pool)
        .await?;

        let stale = duplicate_ids(&ids, keep_id);
        if stale.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM weekly_nutrition_plans WHERE id = ANY($1)")
            .bind(&stale)
            .execute(pool)
            .await?;
        let removed = result.rows_affected();
        tracing::warn!(%owner_id, week_start = %window.start, removed, "removed duplicate nutrition documents");
        Ok(removed)
    }

    /// Repoint the owner's single-element current-plan reference. Called only
    /// after the document write has succeeded, so the reference never names a
    /// partially written document.
    pub async fn set_current_workout(
        pool: &PgPool,
        owner_id: Uuid,
        plan_id: Uuid,
    ) -> ApiResult<()> {
        sqlx::query(
            "UPDATE users SET current_workout_plan_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(owner_id)
        .bind(plan_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_current_nutrition(
        pool: &PgPool,
        owner_id: Uuid,
        plan_id: Uuid,
    ) -> ApiResult<()> {
        sqlx::query(
            "UPDATE users SET current_nutrition_plan_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(owner_id)
        .bind(plan_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Ids of every document in the (owner, week) range except the one just
/// written. Exactly one document survives the repair.
fn duplicate_ids(ids: &[Uuid], keep_id: Uuid) -> Vec<Uuid> {
    ids.iter().copied().filter(|id| *id != keep_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_repair_keeps_only_the_written_document() {
        let keep = Uuid::new_v4();
        let racing_a = Uuid::new_v4();
        let racing_b = Uuid::new_v4();

        let stale = duplicate_ids(&[racing_a, keep, racing_b], keep);
        assert_eq!(stale, vec![racing_a, racing_b]);
        assert!(!stale.contains(&keep));
    }

    #[test]
    fn single_document_week_has_nothing_to_repair() {
        let keep = Uuid::new_v4();
        assert!(duplicate_ids(&[keep], keep).is_empty());
        assert!(duplicate_ids(&[], keep).is_empty());
    }
}
