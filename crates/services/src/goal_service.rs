use std::sync::Arc;

use sheet_core::model::{Goal, GoalDraft, GoalId, GoalPatch, UserId};
use storage::repository::{GoalRepository, NewGoalRecord};
use tracing::info;

use crate::Clock;
use crate::error::GoalServiceError;

/// Orchestrates goal creation, edits and removal.
#[derive(Clone)]
pub struct GoalService {
    clock: Clock,
    user_id: UserId,
    goals: Arc<dyn GoalRepository>,
}

impl GoalService {
    #[must_use]
    pub fn new(clock: Clock, user_id: UserId, goals: Arc<dyn GoalRepository>) -> Self {
        Self {
            clock,
            user_id,
            goals,
        }
    }

    /// Validate and persist a new goal. Its window starts now.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::Goal` for validation failures.
    /// Returns `GoalServiceError::Storage` if persistence fails.
    pub async fn create_goal(&self, draft: GoalDraft) -> Result<Goal, GoalServiceError> {
        let draft = draft.validate()?;
        let goal = self
            .goals
            .insert_new_goal(NewGoalRecord {
                user_id: self.user_id,
                draft,
                created_at: self.clock.now(),
            })
            .await?;
        info!(goal_id = %goal.id(), period = goal.period().as_str(), "goal created");
        Ok(goal)
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if repository access fails.
    pub async fn list_goals(&self) -> Result<Vec<Goal>, GoalServiceError> {
        Ok(self.goals.list_goals(self.user_id).await?)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `GoalServiceError::EmptyPatch` if the patch changes nothing.
    /// Returns `GoalServiceError::Storage` if the goal is missing or the
    /// merged goal is invalid.
    pub async fn update_goal(&self, id: GoalId, patch: GoalPatch) -> Result<Goal, GoalServiceError> {
        if patch.is_empty() {
            return Err(GoalServiceError::EmptyPatch);
        }
        let goal = self.goals.update_goal(self.user_id, id, patch).await?;
        info!(goal_id = %id, "goal updated");
        Ok(goal)
    }

    /// # Errors
    ///
    /// Returns `GoalServiceError::Storage` if the goal is missing or removal fails.
    pub async fn delete_goal(&self, id: GoalId) -> Result<(), GoalServiceError> {
        self.goals.delete_goal(self.user_id, id).await?;
        info!(goal_id = %id, "goal deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use sheet_core::model::{GoalPeriod, GoalUnit};
    use sheet_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn draft(target_value: f64) -> GoalDraft {
        GoalDraft {
            title: "Monthly volume".into(),
            description: None,
            period: GoalPeriod::Monthly,
            unit: GoalUnit::QuestionCount,
            target_value,
            notebook_id: None,
            deadline: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    fn service(repo: &InMemoryRepository) -> GoalService {
        GoalService::new(
            Clock::fixed(fixed_now()),
            UserId::local(),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn create_stamps_clock_time() {
        let repo = InMemoryRepository::new();
        let goal = service(&repo).create_goal(draft(200.0)).await.unwrap();
        assert_eq!(goal.created_at(), fixed_now());
        assert_eq!(goal.reward_points(), 200);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_storage() {
        let repo = InMemoryRepository::new();
        let err = service(&repo).create_goal(draft(-5.0)).await.unwrap_err();
        assert!(matches!(err, GoalServiceError::Goal(_)));
        assert!(service(&repo).list_goals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_patch_and_missing_goal() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let goal = svc.create_goal(draft(50.0)).await.unwrap();

        let err = svc
            .update_goal(goal.id(), GoalPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GoalServiceError::EmptyPatch));

        let err = svc.delete_goal(GoalId::new(999)).await.unwrap_err();
        assert!(matches!(
            err,
            GoalServiceError::Storage(StorageError::NotFound)
        ));
    }
}
