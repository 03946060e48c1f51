use chrono::{DateTime, NaiveDate, Utc};
use sheet_core::model::{
    Challenge, ChallengeDraft, ChallengeId, ChallengePatch, Goal, GoalDraft, GoalId, GoalPatch,
    Notebook, NotebookId, QuizAttempt,
};
use sheet_core::{ProgressReport, StudyStats};
use tracing::{debug, warn};

use crate::app_services::AppServices;
use crate::error::TrackerError;

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Session-owned view of one user's study records and their derived progress.
///
/// Every mutation goes to the store first. Resident lists change only after
/// the store confirms, and exactly one `recompute` follows. A failed mutation
/// leaves the tracker as it was and hands the error back to the caller.
pub struct ProgressTracker {
    services: AppServices,
    notebooks: Vec<Notebook>,
    attempts: Vec<QuizAttempt>,
    goals: Vec<Goal>,
    challenges: Vec<Challenge>,
    report: ProgressReport,
}

impl ProgressTracker {
    /// Fetch all records for the services' user and compute the first report.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError` if any record kind cannot be loaded.
    pub async fn load(services: AppServices) -> Result<Self, TrackerError> {
        let notebooks = services.notebooks().list_notebooks().await?;
        let attempts = services.attempts().list_attempts().await?;
        let goals = services.goals().list_goals().await?;
        let challenges = services.challenges().list_challenges().await?;

        let mut tracker = Self {
            services,
            notebooks,
            attempts,
            goals,
            challenges,
            report: ProgressReport::empty(),
        };
        tracker.recompute();
        Ok(tracker)
    }

    /// Rebuild the progress report from the resident records.
    pub fn recompute(&mut self) -> &ProgressReport {
        let now = self.services.clock().now();
        self.report = self.services.calculator().recompute(
            &self.goals,
            &self.challenges,
            &self.attempts,
            now,
        );
        debug!(
            goals = self.report.goals.len(),
            completed_goals = self.report.completed_goals(),
            challenges = self.report.challenges.len(),
            completed_challenges = self.report.completed_challenges(),
            total_points = self.report.user.total_points,
            level = self.report.user.level.number(),
            "progress recomputed"
        );
        &self.report
    }

    #[must_use]
    pub fn report(&self) -> &ProgressReport {
        &self.report
    }

    /// Dashboard totals over the resident attempts.
    #[must_use]
    pub fn stats(&self) -> StudyStats {
        StudyStats::from_attempts(&self.attempts)
    }

    /// Today's date in the calculator's offset, for overdue labels.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.services
            .clock()
            .now()
            .with_timezone(&self.services.calculator().offset())
            .date_naive()
    }

    #[must_use]
    pub fn notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    #[must_use]
    pub fn attempts(&self) -> &[QuizAttempt] {
        &self.attempts
    }

    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    #[must_use]
    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `TrackerError::Notebook` if the name is blank or the store fails.
    pub async fn add_notebook(&mut self, name: String) -> Result<Notebook, TrackerError> {
        let notebook = self
            .services
            .notebooks()
            .create_notebook(name)
            .await
            .inspect_err(|e| warn!(error = %e, "notebook not created"))?;
        self.notebooks.push(notebook.clone());
        self.recompute();
        Ok(notebook)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Attempt` if the attempt is rejected.
    pub async fn record_attempt(
        &mut self,
        total_questions: u32,
        correct_answers: u32,
        notebook_id: Option<NotebookId>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<QuizAttempt, TrackerError> {
        let attempt = self
            .services
            .attempts()
            .record_attempt(total_questions, correct_answers, notebook_id, completed_at)
            .await
            .inspect_err(|e| warn!(error = %e, "attempt not recorded"))?;
        let at = self
            .attempts
            .partition_point(|a| (a.completed_at(), a.id()) <= (attempt.completed_at(), attempt.id()));
        self.attempts.insert(at, attempt.clone());
        self.recompute();
        Ok(attempt)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Goal` if the goal is rejected.
    pub async fn create_goal(&mut self, draft: GoalDraft) -> Result<Goal, TrackerError> {
        let goal = self
            .services
            .goals()
            .create_goal(draft)
            .await
            .inspect_err(|e| warn!(error = %e, "goal not created"))?;
        self.goals.push(goal.clone());
        self.recompute();
        Ok(goal)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Goal` if the goal is missing or the patch is rejected.
    pub async fn update_goal(&mut self, id: GoalId, patch: GoalPatch) -> Result<Goal, TrackerError> {
        let goal = self
            .services
            .goals()
            .update_goal(id, patch)
            .await
            .inspect_err(|e| warn!(goal_id = %id, error = %e, "goal not updated"))?;
        match self.goals.iter_mut().find(|g| g.id() == id) {
            Some(slot) => *slot = goal.clone(),
            None => self.goals.push(goal.clone()),
        }
        self.recompute();
        Ok(goal)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Goal` if the goal is missing or removal fails.
    pub async fn delete_goal(&mut self, id: GoalId) -> Result<(), TrackerError> {
        self.services
            .goals()
            .delete_goal(id)
            .await
            .inspect_err(|e| warn!(goal_id = %id, error = %e, "goal not deleted"))?;
        self.goals.retain(|g| g.id() != id);
        self.recompute();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Challenge` if the challenge is rejected.
    pub async fn create_challenge(
        &mut self,
        draft: ChallengeDraft,
    ) -> Result<Challenge, TrackerError> {
        let challenge = self
            .services
            .challenges()
            .create_challenge(draft)
            .await
            .inspect_err(|e| warn!(error = %e, "challenge not created"))?;
        self.challenges.push(challenge.clone());
        self.recompute();
        Ok(challenge)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Challenge` if the challenge is missing or the
    /// patch is rejected.
    pub async fn update_challenge(
        &mut self,
        id: ChallengeId,
        patch: ChallengePatch,
    ) -> Result<Challenge, TrackerError> {
        let challenge = self
            .services
            .challenges()
            .update_challenge(id, patch)
            .await
            .inspect_err(|e| warn!(challenge_id = %id, error = %e, "challenge not updated"))?;
        match self.challenges.iter_mut().find(|c| c.id() == id) {
            Some(slot) => *slot = challenge.clone(),
            None => self.challenges.push(challenge.clone()),
        }
        self.recompute();
        Ok(challenge)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Challenge` if the challenge is missing or removal fails.
    pub async fn delete_challenge(&mut self, id: ChallengeId) -> Result<(), TrackerError> {
        self.services
            .challenges()
            .delete_challenge(id)
            .await
            .inspect_err(|e| warn!(challenge_id = %id, error = %e, "challenge not deleted"))?;
        self.challenges.retain(|c| c.id() != id);
        self.recompute();
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::Duration;
    use sheet_core::Level;
    use sheet_core::model::{GoalPeriod, GoalUnit, UserId};
    use sheet_core::time::{fixed_clock, fixed_now, utc_offset};
    use storage::repository::{
        ChallengeRepository, InMemoryRepository, NewChallengeRecord, Storage, StorageError,
    };

    use crate::Clock;
    use crate::error::{ChallengeServiceError, GoalServiceError};

    fn services() -> AppServices {
        AppServices::from_storage(
            &Storage::in_memory(),
            Clock::fixed(fixed_now()),
            UserId::local(),
            utc_offset(),
        )
    }

    fn daily_questions(target_value: f64) -> GoalDraft {
        GoalDraft {
            title: "Twenty a day".into(),
            description: None,
            period: GoalPeriod::Daily,
            unit: GoalUnit::QuestionCount,
            target_value,
            notebook_id: None,
            deadline: fixed_now().date_naive(),
        }
    }

    #[tokio::test]
    async fn attempt_after_goal_completes_it_and_awards_points() {
        let mut tracker = services().tracker().await.unwrap();
        tracker.create_goal(daily_questions(20.0)).await.unwrap();
        assert_eq!(tracker.report().completed_goals(), 0);

        tracker.record_attempt(12, 9, None, None).await.unwrap();
        tracker.record_attempt(10, 10, None, None).await.unwrap();

        let report = tracker.report();
        assert_eq!(report.goals[0].current_value(), 22.0);
        assert!(report.goals[0].completed());
        assert_eq!(report.user.total_points, 10);
        assert_eq!(report.user.level, Level::Beginner);
    }

    #[tokio::test]
    async fn rejected_mutation_leaves_state_untouched() {
        let mut tracker = services().tracker().await.unwrap();
        let goal = tracker.create_goal(daily_questions(5.0)).await.unwrap();
        tracker.record_attempt(5, 5, None, None).await.unwrap();
        let before = tracker.report().clone();

        let err = tracker
            .update_goal(
                goal.id(),
                GoalPatch {
                    title: Some("  ".into()),
                    ..GoalPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Goal(GoalServiceError::Storage(_))));
        assert!(tracker.record_attempt(1, 2, None, None).await.is_err());
        assert!(tracker.delete_goal(GoalId::new(404)).await.is_err());

        assert_eq!(tracker.goals(), &[goal]);
        assert_eq!(tracker.attempts().len(), 1);
        assert_eq!(tracker.report(), &before);
    }

    #[tokio::test]
    async fn reload_matches_live_session() {
        let storage = Storage::in_memory();
        let services = AppServices::from_storage(
            &storage,
            Clock::fixed(fixed_now()),
            UserId::local(),
            utc_offset(),
        );
        let mut tracker = services.tracker().await.unwrap();

        let notebook = tracker.add_notebook("Pharmacology".into()).await.unwrap();
        tracker
            .create_challenge(ChallengeDraft {
                title: "Pharma mastery".into(),
                description: None,
                target_percentage: 80.0,
                notebook_id: notebook.id(),
                deadline: fixed_now().date_naive(),
            })
            .await
            .unwrap();
        tracker
            .record_attempt(10, 9, Some(notebook.id()), Some(fixed_now() - Duration::days(3)))
            .await
            .unwrap();
        tracker.record_attempt(10, 3, None, None).await.unwrap();

        let reloaded = services.tracker().await.unwrap();
        assert_eq!(reloaded.report(), tracker.report());
        assert_eq!(reloaded.attempts(), tracker.attempts());
        assert_eq!(tracker.report().user.total_points, 300);
        assert_eq!(tracker.report().user.level, Level::Applied);
    }

    #[tokio::test]
    async fn deleting_a_completed_goal_withdraws_its_points() {
        let mut tracker = services().tracker().await.unwrap();
        let goal = tracker.create_goal(daily_questions(1.0)).await.unwrap();
        tracker.record_attempt(3, 3, None, None).await.unwrap();
        assert_eq!(tracker.report().user.total_points, 10);

        tracker.delete_goal(goal.id()).await.unwrap();
        assert!(tracker.goals().is_empty());
        assert_eq!(tracker.report().user.total_points, 0);
        assert_eq!(tracker.stats().quizzes, 1);
    }

    #[tokio::test]
    async fn weekly_goal_ignores_attempts_after_its_window() {
        let storage = Storage::in_memory();
        let mut clock = fixed_clock();
        let services = AppServices::from_storage(&storage, clock, UserId::local(), utc_offset());
        let mut tracker = services.tracker().await.unwrap();
        tracker
            .create_goal(GoalDraft {
                period: GoalPeriod::Weekly,
                unit: GoalUnit::QuizCount,
                ..daily_questions(1.0)
            })
            .await
            .unwrap();

        clock.advance(Duration::days(8));
        let later = AppServices::from_storage(&storage, clock, UserId::local(), utc_offset());
        let mut tracker = later.tracker().await.unwrap();
        tracker.record_attempt(5, 5, None, None).await.unwrap();

        let status = &tracker.report().goals[0];
        assert_eq!(status.current_value(), 0.0);
        assert!(!status.completed());
        assert!(status.is_overdue(tracker.today()));
    }

    /// Challenge store whose writes fail with a connection error while offline.
    struct SwitchableChallenges {
        inner: InMemoryRepository,
        offline: Arc<AtomicBool>,
    }

    impl SwitchableChallenges {
        fn check(&self) -> Result<(), StorageError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl ChallengeRepository for SwitchableChallenges {
        async fn insert_new_challenge(
            &self,
            record: NewChallengeRecord,
        ) -> Result<Challenge, StorageError> {
            self.check()?;
            self.inner.insert_new_challenge(record).await
        }

        async fn list_challenges(&self, user_id: UserId) -> Result<Vec<Challenge>, StorageError> {
            self.inner.list_challenges(user_id).await
        }

        async fn update_challenge(
            &self,
            user_id: UserId,
            id: ChallengeId,
            patch: ChallengePatch,
        ) -> Result<Challenge, StorageError> {
            self.check()?;
            self.inner.update_challenge(user_id, id, patch).await
        }

        async fn delete_challenge(
            &self,
            user_id: UserId,
            id: ChallengeId,
        ) -> Result<(), StorageError> {
            self.check()?;
            self.inner.delete_challenge(user_id, id).await
        }
    }

    fn mastery(notebook_id: NotebookId) -> ChallengeDraft {
        ChallengeDraft {
            title: "Anatomy mastery".into(),
            description: None,
            target_percentage: 80.0,
            notebook_id,
            deadline: fixed_now().date_naive(),
        }
    }

    #[tokio::test]
    async fn store_outage_leaves_challenges_and_points_untouched() {
        let repo = InMemoryRepository::new();
        let offline = Arc::new(AtomicBool::new(false));
        let storage = Storage {
            notebooks: Arc::new(repo.clone()),
            attempts: Arc::new(repo.clone()),
            goals: Arc::new(repo.clone()),
            challenges: Arc::new(SwitchableChallenges {
                inner: repo,
                offline: Arc::clone(&offline),
            }),
        };
        let services = AppServices::from_storage(
            &storage,
            Clock::fixed(fixed_now()),
            UserId::local(),
            utc_offset(),
        );
        let mut tracker = services.tracker().await.unwrap();
        let notebook = tracker.add_notebook("Anatomy".into()).await.unwrap();
        let challenge = tracker.create_challenge(mastery(notebook.id())).await.unwrap();
        tracker
            .record_attempt(10, 9, Some(notebook.id()), None)
            .await
            .unwrap();
        assert_eq!(tracker.report().user.total_points, 300);
        let before = tracker.report().clone();

        offline.store(true, Ordering::SeqCst);
        let err = tracker
            .update_challenge(
                challenge.id(),
                ChallengePatch {
                    target_percentage: Some(95.0),
                    ..ChallengePatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Challenge(ChallengeServiceError::Storage(StorageError::Connection(_)))
        ));
        let err = tracker.delete_challenge(challenge.id()).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Challenge(ChallengeServiceError::Storage(StorageError::Connection(_)))
        ));
        assert_eq!(tracker.challenges(), &[challenge.clone()]);
        assert_eq!(tracker.report(), &before);

        offline.store(false, Ordering::SeqCst);
        tracker.delete_challenge(challenge.id()).await.unwrap();
        assert!(tracker.challenges().is_empty());
        assert_eq!(tracker.report().user.total_points, 0);
        assert_eq!(tracker.report().user.level, Level::Beginner);
    }

    #[tokio::test]
    async fn raising_a_challenge_target_can_uncomplete_it() {
        let mut tracker = services().tracker().await.unwrap();
        let notebook = tracker.add_notebook("Anatomy".into()).await.unwrap();
        let challenge = tracker.create_challenge(mastery(notebook.id())).await.unwrap();
        tracker
            .record_attempt(10, 9, Some(notebook.id()), None)
            .await
            .unwrap();
        assert_eq!(tracker.report().completed_challenges(), 1);

        let updated = tracker
            .update_challenge(
                challenge.id(),
                ChallengePatch {
                    target_percentage: Some(95.0),
                    ..ChallengePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.target_percentage(), 95.0);
        assert_eq!(tracker.challenges(), &[updated]);
        assert_eq!(tracker.report().completed_challenges(), 0);
        assert_eq!(tracker.report().user.total_points, 0);
    }

    #[tokio::test]
    async fn update_of_a_challenge_created_elsewhere_is_appended() {
        let storage = Storage::in_memory();
        let services = AppServices::from_storage(
            &storage,
            Clock::fixed(fixed_now()),
            UserId::local(),
            utc_offset(),
        );
        let mut stale = services.tracker().await.unwrap();
        let mut other = services.tracker().await.unwrap();
        let notebook = other.add_notebook("Anatomy".into()).await.unwrap();
        let challenge = other.create_challenge(mastery(notebook.id())).await.unwrap();
        assert!(stale.challenges().is_empty());

        let updated = stale
            .update_challenge(
                challenge.id(),
                ChallengePatch {
                    title: Some("Anatomy finals".into()),
                    ..ChallengePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(stale.challenges(), &[updated]);
        assert_eq!(stale.report().challenges.len(), 1);
    }
}
