use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        auth::AuthenticatedUser,
        trainer::{ApplicationStatus, ApplyRequest, TrainerApplication},
        user::UserRole,
    },
};

const APPLICATION_COLUMNS: &str =
    "id, user_id, specialty, experience_years, certification, status, reviewed_by, reviewed_at, created_at";

pub struct TrainerService;

impl TrainerService {
    /// Returns true if `trainer_id` is the assigned trainer for `client_id`.
    /// Scheduling routes check this before touching a client's plans.
    pub async fn is_assigned_to(
        pool: &PgPool,
        trainer_id: Uuid,
        client_id: Uuid,
    ) -> ApiResult<bool> {
        let assigned: bool = sqlx::query_scalar(
            "SELECT EXISTS(
               SELECT 1 FROM users
               WHERE id = $1 AND assigned_trainer_id = $2 AND is_active = TRUE
             )",
        )
        .bind(client_id)
        .bind(trainer_id)
        .fetch_one(pool)
        .await?;
        Ok(assigned)
    }

    /// May `user` edit or read the schedule of `client_id`? Admins may touch
    /// anyone's; trainers only their assigned clients'. The scheduling routes
    /// call this before touching a client's plans.
    pub async fn assert_schedule_access(
        pool: &PgPool,
        user: &AuthenticatedUser,
        client_id: Uuid,
    ) -> ApiResult<()> {
        let is_assigned = if user.role == UserRole::Trainer {
            Self::is_assigned_to(pool, user.user_id, client_id).await?
        } else {
            false
        };
        schedule_access(user.role, is_assigned)
    }

    /// Submit a trainer application. One pending application per user.
    pub async fn apply(
        pool: &PgPool,
        user_id: Uuid,
        req: &ApplyRequest,
    ) -> ApiResult<TrainerApplication> {
        if req.specialty.trim().is_empty() {
            return Err(ApiError::validation("Specialty is required"));
        }
        if req.experience_years < 0 {
            return Err(ApiError::validation("Experience years cannot be negative"));
        }

        let pending: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM trainer_applications WHERE user_id = $1 AND status = 'pending'",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        if pending.is_some() {
            return Err(ApiError::validation(
                "An application is already pending for this account",
            ));
        }

        let application = sqlx::query_as::<_, TrainerApplication>(&format!(
            "INSERT INTO trainer_applications (user_id, specialty, experience_years, certification)
             VALUES ($1, $2, $3, $4)
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(req.specialty.trim())
        .bind(req.experience_years)
        .bind(&req.certification)
        .fetch_one(pool)
        .await?;
        Ok(application)
    }

    pub async fn list_pending(pool: &PgPool) -> ApiResult<Vec<TrainerApplication>> {
        let applications = sqlx::query_as::<_, TrainerApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM trainer_applications
             WHERE status = 'pending' ORDER BY created_at"
        ))
        .fetch_all(pool)
        .await?;
        Ok(applications)
    }

    /// Approve or reject a pending application. Approval promotes the
    /// applicant to the trainer role.
    pub async fn review(
        pool: &PgPool,
        application_id: Uuid,
        reviewer_id: Uuid,
        decision: &str,
    ) -> ApiResult<TrainerApplication> {
        let decision: ApplicationStatus = decision
            .parse()
            .map_err(|_| ApiError::validation(format!("Unknown decision: {decision}")))?;
        if decision == ApplicationStatus::Pending {
            return Err(ApiError::validation(
                "Decision must be 'approved' or 'rejected'",
            ));
        }

        let application = sqlx::query_as::<_, TrainerApplication>(&format!(
            "UPDATE trainer_applications
             SET status = $2, reviewed_by = $3, reviewed_at = $4
             WHERE id = $1 AND status = 'pending'
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(application_id)
        .bind(decision.to_string())
        .bind(reviewer_id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Pending application not found"))?;

        if decision == ApplicationStatus::Approved {
            sqlx::query("UPDATE users SET role = 'trainer', updated_at = NOW() WHERE id = $1")
                .bind(application.user_id)
                .execute(pool)
                .await?;
        }
        Ok(application)
    }

    /// Assign a verified trainer to a member.
    pub async fn assign_trainer(
        pool: &PgPool,
        client_id: Uuid,
        trainer_id: Uuid,
    ) -> ApiResult<()> {
        let is_trainer: bool = sqlx::query_scalar(
            "SELECT EXISTS(
               SELECT 1 FROM users WHERE id = $1 AND role = 'trainer' AND is_active = TRUE
             )",
        )
        .bind(trainer_id)
        .fetch_one(pool)
        .await?;
        if !is_trainer {
            return Err(ApiError::validation("Assignee is not a verified trainer"));
        }

        let updated = sqlx::query(
            "UPDATE users SET assigned_trainer_id = $2, updated_at = NOW()
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(client_id)
        .bind(trainer_id)
        .execute(pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(ApiError::not_found("Client not found"));
        }
        Ok(())
    }
}

fn schedule_access(role: UserRole, is_assigned: bool) -> ApiResult<()> {
    match role {
        UserRole::Admin => Ok(()),
        UserRole::Trainer if is_assigned => Ok(()),
        UserRole::Trainer => Err(ApiError::not_authorized(
            "Client is not assigned to this trainer",
        )),
        UserRole::Member => Err(ApiError::not_authorized("Trainer access required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_reach_any_schedule() {
        assert!(schedule_access(UserRole::Admin, false).is_ok());
    }

    #[test]
    fn trainers_reach_only_assigned_clients() {
        assert!(schedule_access(UserRole::Trainer, true).is_ok());
        let err = schedule_access(UserRole::Trainer, false).unwrap_err();
        assert!(matches!(err, ApiError::NotAuthorized(_)));
    }

    #[test]
    fn members_never_reach_other_schedules() {
        let err = schedule_access(UserRole::Member, true).unwrap_err();
        assert!(matches!(err, ApiError::NotAuthorized(_)));
    }
}
