use std::sync::Arc;

use sheet_core::model::{Challenge, ChallengeDraft, ChallengeId, ChallengePatch, UserId};
use storage::repository::{ChallengeRepository, NewChallengeRecord};
use tracing::info;

use crate::Clock;
use crate::error::ChallengeServiceError;

/// Orchestrates notebook mastery challenges.
#[derive(Clone)]
pub struct ChallengeService {
    clock: Clock,
    user_id: UserId,
    challenges: Arc<dyn ChallengeRepository>,
}

impl ChallengeService {
    #[must_use]
    pub fn new(clock: Clock, user_id: UserId, challenges: Arc<dyn ChallengeRepository>) -> Self {
        Self {
            clock,
            user_id,
            challenges,
        }
    }

    /// Validate and persist a new challenge.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeServiceError::Challenge` for validation failures.
    /// Returns `ChallengeServiceError::Storage` if persistence fails or the
    /// notebook is unknown.
    pub async fn create_challenge(
        &self,
        draft: ChallengeDraft,
    ) -> Result<Challenge, ChallengeServiceError> {
        let draft = draft.validate()?;
        let challenge = self
            .challenges
            .insert_new_challenge(NewChallengeRecord {
                user_id: self.user_id,
                draft,
                created_at: self.clock.now(),
            })
            .await?;
        info!(
            challenge_id = %challenge.id(),
            notebook_id = %challenge.notebook_id(),
            "challenge created"
        );
        Ok(challenge)
    }

    /// # Errors
    ///
    /// Returns `ChallengeServiceError::Storage` if repository access fails.
    pub async fn list_challenges(&self) -> Result<Vec<Challenge>, ChallengeServiceError> {
        Ok(self.challenges.list_challenges(self.user_id).await?)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeServiceError::EmptyPatch` if the patch changes nothing.
    /// Returns `ChallengeServiceError::Storage` if the challenge is missing or
    /// the merged challenge is invalid.
    pub async fn update_challenge(
        &self,
        id: ChallengeId,
        patch: ChallengePatch,
    ) -> Result<Challenge, ChallengeServiceError> {
        if patch.is_empty() {
            return Err(ChallengeServiceError::EmptyPatch);
        }
        let challenge = self
            .challenges
            .update_challenge(self.user_id, id, patch)
            .await?;
        info!(challenge_id = %id, "challenge updated");
        Ok(challenge)
    }

    /// # Errors
    ///
    /// Returns `ChallengeServiceError::Storage` if the challenge is missing or
    /// removal fails.
    pub async fn delete_challenge(&self, id: ChallengeId) -> Result<(), ChallengeServiceError> {
        self.challenges.delete_challenge(self.user_id, id).await?;
        info!(challenge_id = %id, "challenge deleted");
        Ok(())
    }
}
