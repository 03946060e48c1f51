use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sheet_core::model::{
    AttemptId, Challenge, ChallengeDraft, ChallengeId, ChallengePatch, Goal, GoalDraft, GoalId,
    GoalPatch, Notebook, NotebookId, QuizAttempt, UserId,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("rejected: {0}")]
    Validation(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Insert payload for a notebook; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewNotebookRecord {
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a finished quiz attempt.
#[derive(Debug, Clone)]
pub struct NewAttemptRecord {
    pub user_id: UserId,
    pub completed_at: DateTime<Utc>,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub percentage: f64,
    pub notebook_id: Option<NotebookId>,
}

impl NewAttemptRecord {
    /// Build the record the attempt will be stored as, once the id is known.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if the attempt is internally inconsistent.
    pub fn into_attempt(self, id: AttemptId) -> Result<QuizAttempt, StorageError> {
        QuizAttempt::new(
            id,
            self.completed_at,
            self.total_questions,
            self.correct_answers,
            self.percentage,
            self.notebook_id,
        )
        .map_err(|e| StorageError::Validation(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct NewGoalRecord {
    pub user_id: UserId,
    pub draft: GoalDraft,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChallengeRecord {
    pub user_id: UserId,
    pub draft: ChallengeDraft,
    pub created_at: DateTime<Utc>,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Notebook directory. Used to label and scope goals and challenges.
#[async_trait]
pub trait NotebookRepository: Send + Sync {
    /// Persist a new notebook and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` for a blank name, or other storage errors.
    async fn insert_new_notebook(&self, record: NewNotebookRecord)
    -> Result<Notebook, StorageError>;

    /// List a user's notebooks ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the notebooks cannot be read.
    async fn list_notebooks(&self, user_id: UserId) -> Result<Vec<Notebook>, StorageError>;
}

/// Append-only feed of completed quiz attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Record an attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if the attempt is inconsistent or
    /// references an unknown notebook.
    async fn append_attempt(&self, record: NewAttemptRecord) -> Result<QuizAttempt, StorageError>;

    /// List a user's attempts ordered by completion time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempts cannot be read.
    async fn list_attempts(&self, user_id: UserId) -> Result<Vec<QuizAttempt>, StorageError>;
}

#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Persist a goal; the store assigns the id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if the draft is invalid or references
    /// an unknown notebook.
    async fn insert_new_goal(&self, record: NewGoalRecord) -> Result<Goal, StorageError>;

    /// List a user's goals in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the goals cannot be read.
    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>, StorageError>;

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user owns no such goal, or
    /// `StorageError::Validation` if the merged goal is invalid.
    async fn update_goal(
        &self,
        user_id: UserId,
        id: GoalId,
        patch: GoalPatch,
    ) -> Result<Goal, StorageError>;

    /// Delete a goal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user owns no such goal.
    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// Persist a challenge; the store assigns the id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if the draft is invalid or references
    /// an unknown notebook.
    async fn insert_new_challenge(
        &self,
        record: NewChallengeRecord,
    ) -> Result<Challenge, StorageError>;

    /// List a user's challenges in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the challenges cannot be read.
    async fn list_challenges(&self, user_id: UserId) -> Result<Vec<Challenge>, StorageError>;

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user owns no such challenge, or
    /// `StorageError::Validation` if the merged challenge is invalid.
    async fn update_challenge(
        &self,
        user_id: UserId,
        id: ChallengeId,
        patch: ChallengePatch,
    ) -> Result<Challenge, StorageError>;

    /// Delete a challenge.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user owns no such challenge.
    async fn delete_challenge(&self, user_id: UserId, id: ChallengeId)
    -> Result<(), StorageError>;
}

pub(crate) fn invalid<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Validation(e.to_string())
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

type Owned<T> = (UserId, T);

fn lock_err<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    notebooks: Arc<Mutex<BTreeMap<NotebookId, Owned<Notebook>>>>,
    attempts: Arc<Mutex<BTreeMap<AttemptId, Owned<QuizAttempt>>>>,
    goals: Arc<Mutex<BTreeMap<GoalId, Owned<Goal>>>>,
    challenges: Arc<Mutex<BTreeMap<ChallengeId, Owned<Challenge>>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn ensure_notebook(
        &self,
        user_id: UserId,
        notebook_id: Option<NotebookId>,
    ) -> Result<(), StorageError> {
        let Some(notebook_id) = notebook_id else {
            return Ok(());
        };
        let guard = self.notebooks.lock().map_err(lock_err)?;
        match guard.get(&notebook_id) {
            Some((owner, _)) if *owner == user_id => Ok(()),
            _ => Err(StorageError::Validation(format!(
                "unknown notebook {notebook_id}"
            ))),
        }
    }
}

fn owned_by<T: Clone>(
    map: &BTreeMap<impl Ord, Owned<T>>,
    user_id: UserId,
) -> impl Iterator<Item = T> + '_ {
    map.values()
        .filter(move |(owner, _)| *owner == user_id)
        .map(|(_, value)| value.clone())
}

#[async_trait]
impl NotebookRepository for InMemoryRepository {
    async fn insert_new_notebook(
        &self,
        record: NewNotebookRecord,
    ) -> Result<Notebook, StorageError> {
        let id = NotebookId::new(self.allocate_id());
        let notebook = Notebook::new(id, record.name, record.created_at).map_err(invalid)?;
        let mut guard = self.notebooks.lock().map_err(lock_err)?;
        guard.insert(id, (record.user_id, notebook.clone()));
        Ok(notebook)
    }

    async fn list_notebooks(&self, user_id: UserId) -> Result<Vec<Notebook>, StorageError> {
        let guard = self.notebooks.lock().map_err(lock_err)?;
        Ok(owned_by(&guard, user_id).collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, record: NewAttemptRecord) -> Result<QuizAttempt, StorageError> {
        self.ensure_notebook(record.user_id, record.notebook_id)?;
        let user_id = record.user_id;
        let attempt = record.into_attempt(AttemptId::new(self.allocate_id()))?;
        let mut guard = self.attempts.lock().map_err(lock_err)?;
        guard.insert(attempt.id(), (user_id, attempt.clone()));
        Ok(attempt)
    }

    async fn list_attempts(&self, user_id: UserId) -> Result<Vec<QuizAttempt>, StorageError> {
        let guard = self.attempts.lock().map_err(lock_err)?;
        let mut attempts: Vec<_> = owned_by(&guard, user_id).collect();
        attempts.sort_by_key(|a| (a.completed_at(), a.id()));
        Ok(attempts)
    }
}

#[async_trait]
impl GoalRepository for InMemoryRepository {
    async fn insert_new_goal(&self, record: NewGoalRecord) -> Result<Goal, StorageError> {
        self.ensure_notebook(record.user_id, record.draft.notebook_id)?;
        let id = GoalId::new(self.allocate_id());
        let goal = Goal::from_draft(id, record.draft, record.created_at).map_err(invalid)?;
        let mut guard = self.goals.lock().map_err(lock_err)?;
        guard.insert(id, (record.user_id, goal.clone()));
        Ok(goal)
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>, StorageError> {
        let guard = self.goals.lock().map_err(lock_err)?;
        Ok(owned_by(&guard, user_id).collect())
    }

    async fn update_goal(
        &self,
        user_id: UserId,
        id: GoalId,
        patch: GoalPatch,
    ) -> Result<Goal, StorageError> {
        let current = {
            let guard = self.goals.lock().map_err(lock_err)?;
            guard
                .get(&id)
                .filter(|(owner, _)| *owner == user_id)
                .map(|(_, goal)| goal.clone())
                .ok_or(StorageError::NotFound)?
        };
        let updated = current.apply_patch(patch).map_err(invalid)?;
        self.ensure_notebook(user_id, updated.notebook_id())?;
        let mut guard = self.goals.lock().map_err(lock_err)?;
        guard.insert(id, (user_id, updated.clone()));
        Ok(updated)
    }

    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<(), StorageError> {
        let mut guard = self.goals.lock().map_err(lock_err)?;
        match guard.get(&id) {
            Some((owner, _)) if *owner == user_id => {
                guard.remove(&id);
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }
}

#[async_trait]
impl ChallengeRepository for InMemoryRepository {
    async fn insert_new_challenge(
        &self,
        record: NewChallengeRecord,
    ) -> Result<Challenge, StorageError> {
        self.ensure_notebook(record.user_id, Some(record.draft.notebook_id))?;
        let id = ChallengeId::new(self.allocate_id());
        let challenge =
            Challenge::from_draft(id, record.draft, record.created_at).map_err(invalid)?;
        let mut guard = self.challenges.lock().map_err(lock_err)?;
        guard.insert(id, (record.user_id, challenge.clone()));
        Ok(challenge)
    }

    async fn list_challenges(&self, user_id: UserId) -> Result<Vec<Challenge>, StorageError> {
        let guard = self.challenges.lock().map_err(lock_err)?;
        Ok(owned_by(&guard, user_id).collect())
    }

    async fn update_challenge(
        &self,
        user_id: UserId,
        id: ChallengeId,
        patch: ChallengePatch,
    ) -> Result<Challenge, StorageError> {
        let current = {
            let guard = self.challenges.lock().map_err(lock_err)?;
            guard
                .get(&id)
                .filter(|(owner, _)| *owner == user_id)
                .map(|(_, challenge)| challenge.clone())
                .ok_or(StorageError::NotFound)?
        };
        let updated = current.apply_patch(patch).map_err(invalid)?;
        self.ensure_notebook(user_id, Some(updated.notebook_id()))?;
        let mut guard = self.challenges.lock().map_err(lock_err)?;
        guard.insert(id, (user_id, updated.clone()));
        Ok(updated)
    }

    async fn delete_challenge(
        &self,
        user_id: UserId,
        id: ChallengeId,
    ) -> Result<(), StorageError> {
        let mut guard = self.challenges.lock().map_err(lock_err)?;
        match guard.get(&id) {
            Some((owner, _)) if *owner == user_id => {
                guard.remove(&id);
                Ok(())
            }
            _ => Err(StorageError::NotFound),
        }
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub notebooks: Arc<dyn NotebookRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub challenges: Arc<dyn ChallengeRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            notebooks: Arc::new(repo.clone()),
            attempts: Arc::new(repo.clone()),
            goals: Arc::new(repo.clone()),
            challenges: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use sheet_core::model::{GoalPeriod, GoalUnit};
    use sheet_core::time::fixed_now;

    fn goal_draft(notebook_id: Option<NotebookId>) -> GoalDraft {
        GoalDraft {
            title: "Daily grind".into(),
            description: None,
            period: GoalPeriod::Daily,
            unit: GoalUnit::QuestionCount,
            target_value: 20.0,
            notebook_id,
            deadline: NaiveDate::from_ymd_opt(2023, 11, 15).unwrap(),
        }
    }

    async fn notebook(repo: &InMemoryRepository, user: UserId, name: &str) -> Notebook {
        repo.insert_new_notebook(NewNotebookRecord {
            user_id: user,
            name: name.into(),
            created_at: fixed_now(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn goal_crud_reads_its_own_writes() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();

        let goal = repo
            .insert_new_goal(NewGoalRecord {
                user_id: user,
                draft: goal_draft(None),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        assert_eq!(repo.list_goals(user).await.unwrap(), vec![goal.clone()]);

        let updated = repo
            .update_goal(
                user,
                goal.id(),
                GoalPatch {
                    target_value: Some(40.0),
                    ..GoalPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.target_value(), 40.0);
        assert_eq!(repo.list_goals(user).await.unwrap()[0].target_value(), 40.0);

        repo.delete_goal(user, goal.id()).await.unwrap();
        assert!(repo.list_goals(user).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_goal(user, goal.id()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn records_are_scoped_to_their_owner() {
        let repo = InMemoryRepository::new();
        let alice = UserId::random();
        let bob = UserId::random();

        let goal = repo
            .insert_new_goal(NewGoalRecord {
                user_id: alice,
                draft: goal_draft(None),
                created_at: fixed_now(),
            })
            .await
            .unwrap();

        assert!(repo.list_goals(bob).await.unwrap().is_empty());
        assert!(matches!(
            repo.update_goal(bob, goal.id(), GoalPatch::default()).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.delete_goal(bob, goal.id()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn missing_record_wins_over_unknown_notebook() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let unknown = NotebookId::new(999);

        let err = repo
            .update_goal(
                user,
                GoalId::new(404),
                GoalPatch {
                    notebook_id: Some(Some(unknown)),
                    ..GoalPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));

        let err = repo
            .update_challenge(
                user,
                ChallengeId::new(404),
                ChallengePatch {
                    notebook_id: Some(unknown),
                    ..ChallengePatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));

        let goal = repo
            .insert_new_goal(NewGoalRecord {
                user_id: user,
                draft: goal_draft(None),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let err = repo
            .update_goal(
                user,
                goal.id(),
                GoalPatch {
                    notebook_id: Some(Some(unknown)),
                    ..GoalPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert_eq!(repo.list_goals(user).await.unwrap(), vec![goal]);
    }

    #[tokio::test]
    async fn rejects_foreign_or_unknown_notebooks() {
        let repo = InMemoryRepository::new();
        let alice = UserId::random();
        let bob = UserId::random();
        let bobs = notebook(&repo, bob, "Bob's").await;

        let err = repo
            .insert_new_goal(NewGoalRecord {
                user_id: alice,
                draft: goal_draft(Some(bobs.id())),
                created_at: fixed_now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let err = repo
            .append_attempt(NewAttemptRecord {
                user_id: alice,
                completed_at: fixed_now(),
                total_questions: 10,
                correct_answers: 5,
                percentage: 50.0,
                notebook_id: Some(NotebookId::new(999)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn attempts_list_in_completion_order() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let nb = notebook(&repo, user, "Math").await;

        for minutes in [30, 10, 20] {
            repo.append_attempt(NewAttemptRecord {
                user_id: user,
                completed_at: fixed_now() + Duration::minutes(minutes),
                total_questions: 10,
                correct_answers: 8,
                percentage: 80.0,
                notebook_id: Some(nb.id()),
            })
            .await
            .unwrap();
        }

        let times: Vec<_> = repo
            .list_attempts(user)
            .await
            .unwrap()
            .iter()
            .map(QuizAttempt::completed_at)
            .collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[tokio::test]
    async fn invalid_patch_leaves_challenge_untouched() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let nb = notebook(&repo, user, "History").await;
        let challenge = repo
            .insert_new_challenge(NewChallengeRecord {
                user_id: user,
                draft: ChallengeDraft {
                    title: "Ace history".into(),
                    description: None,
                    target_percentage: 80.0,
                    notebook_id: nb.id(),
                    deadline: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
                },
                created_at: fixed_now(),
            })
            .await
            .unwrap();

        let err = repo
            .update_challenge(
                user,
                challenge.id(),
                ChallengePatch {
                    target_percentage: Some(150.0),
                    ..ChallengePatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert_eq!(repo.list_challenges(user).await.unwrap(), vec![challenge]);
    }
}
