use std::sync::Arc;

use chrono::{DateTime, Utc};
use sheet_core::model::{AttemptId, NotebookId, QuizAttempt, UserId};
use storage::repository::{AttemptRepository, NewAttemptRecord};
use tracing::info;

use crate::Clock;
use crate::error::AttemptServiceError;

/// Records finished quizzes into the append-only attempt feed.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    user_id: UserId,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    #[must_use]
    pub fn new(clock: Clock, user_id: UserId, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self {
            clock,
            user_id,
            attempts,
        }
    }

    /// Record a finished quiz. The percentage is derived from the counts and
    /// `completed_at` defaults to the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Attempt` if the counts are inconsistent.
    /// Returns `AttemptServiceError::Storage` if persistence fails.
    pub async fn record_attempt(
        &self,
        total_questions: u32,
        correct_answers: u32,
        notebook_id: Option<NotebookId>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<QuizAttempt, AttemptServiceError> {
        let completed_at = completed_at.unwrap_or_else(|| self.clock.now());
        // Validated up front so a bad attempt never reaches the store.
        let draft = QuizAttempt::from_counts(
            AttemptId::new(0),
            completed_at,
            total_questions,
            correct_answers,
            notebook_id,
        )?;

        let attempt = self
            .attempts
            .append_attempt(NewAttemptRecord {
                user_id: self.user_id,
                completed_at: draft.completed_at(),
                total_questions: draft.total_questions(),
                correct_answers: draft.correct_answers(),
                percentage: draft.percentage(),
                notebook_id: draft.notebook_id(),
            })
            .await?;
        info!(
            attempt_id = %attempt.id(),
            total = attempt.total_questions(),
            correct = attempt.correct_answers(),
            "attempt recorded"
        );
        Ok(attempt)
    }

    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if repository access fails.
    pub async fn list_attempts(&self) -> Result<Vec<QuizAttempt>, AttemptServiceError> {
        Ok(self.attempts.list_attempts(self.user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use sheet_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn service(repo: &InMemoryRepository) -> AttemptService {
        AttemptService::new(
            Clock::fixed(fixed_now()),
            UserId::local(),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn derives_percentage_and_defaults_time() {
        let repo = InMemoryRepository::new();
        let attempt = service(&repo)
            .record_attempt(8, 6, None, None)
            .await
            .unwrap();
        assert_eq!(attempt.percentage(), 75.0);
        assert_eq!(attempt.completed_at(), fixed_now());

        let earlier = fixed_now() - Duration::hours(3);
        let backdated = service(&repo)
            .record_attempt(4, 1, None, Some(earlier))
            .await
            .unwrap();
        assert_eq!(backdated.completed_at(), earlier);

        let listed = service(&repo).list_attempts().await.unwrap();
        assert_eq!(listed, vec![backdated, attempt]);
    }

    #[tokio::test]
    async fn rejects_inconsistent_counts() {
        let repo = InMemoryRepository::new();
        let err = service(&repo)
            .record_attempt(3, 5, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptServiceError::Attempt(_)));
        assert!(service(&repo).list_attempts().await.unwrap().is_empty());
    }
}
