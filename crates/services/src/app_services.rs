use std::sync::Arc;

use chrono::FixedOffset;
use sheet_core::ProgressCalculator;
use sheet_core::model::UserId;
use storage::repository::Storage;

use crate::Clock;
use crate::attempt_service::AttemptService;
use crate::challenge_service::ChallengeService;
use crate::error::{AppServicesError, TrackerError};
use crate::goal_service::GoalService;
use crate::notebook_service::NotebookService;
use crate::tracker::ProgressTracker;

/// Assembles app-facing services for one user.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    user_id: UserId,
    calculator: ProgressCalculator,
    notebooks: Arc<NotebookService>,
    attempts: Arc<AttemptService>,
    goals: Arc<GoalService>,
    challenges: Arc<ChallengeService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        user_id: UserId,
        offset: FixedOffset,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, user_id, offset))
    }

    /// Build services over an already assembled `Storage`.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        user_id: UserId,
        offset: FixedOffset,
    ) -> Self {
        Self {
            clock,
            user_id,
            calculator: ProgressCalculator::new(offset),
            notebooks: Arc::new(NotebookService::new(
                clock,
                user_id,
                Arc::clone(&storage.notebooks),
            )),
            attempts: Arc::new(AttemptService::new(
                clock,
                user_id,
                Arc::clone(&storage.attempts),
            )),
            goals: Arc::new(GoalService::new(clock, user_id, Arc::clone(&storage.goals))),
            challenges: Arc::new(ChallengeService::new(
                clock,
                user_id,
                Arc::clone(&storage.challenges),
            )),
        }
    }

    /// Load the user's records into a fresh tracker session.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError` if any record kind cannot be loaded.
    pub async fn tracker(&self) -> Result<ProgressTracker, TrackerError> {
        ProgressTracker::load(self.clone()).await
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn calculator(&self) -> ProgressCalculator {
        self.calculator
    }

    #[must_use]
    pub fn notebooks(&self) -> Arc<NotebookService> {
        Arc::clone(&self.notebooks)
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }

    #[must_use]
    pub fn goals(&self) -> Arc<GoalService> {
        Arc::clone(&self.goals)
    }

    #[must_use]
    pub fn challenges(&self) -> Arc<ChallengeService> {
        Arc::clone(&self.challenges)
    }
}
