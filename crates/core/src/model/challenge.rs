use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::goal::normalize_description;
use crate::model::ids::{ChallengeId, NotebookId};

/// Points granted for completing any challenge.
pub const CHALLENGE_REWARD_POINTS: u32 = 300;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ChallengeError {
    #[error("challenge title cannot be empty")]
    EmptyTitle,

    #[error("challenge target must be within 0..=100, got {0}")]
    InvalidTargetPercentage(f64),
}

/// User-entered challenge fields before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDraft {
    pub title: String,
    pub description: Option<String>,
    pub target_percentage: f64,
    pub notebook_id: NotebookId,
    pub deadline: NaiveDate,
}

impl ChallengeDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeError` for a blank title or a target outside `0..=100`.
    pub fn validate(self) -> Result<Self, ChallengeError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(ChallengeError::EmptyTitle);
        }
        if !self.target_percentage.is_finite() || !(0.0..=100.0).contains(&self.target_percentage)
        {
            return Err(ChallengeError::InvalidTargetPercentage(
                self.target_percentage,
            ));
        }
        Ok(Self {
            title,
            description: normalize_description(self.description),
            ..self
        })
    }
}

/// Partial update for an existing challenge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub target_percentage: Option<f64>,
    pub notebook_id: Option<NotebookId>,
    pub deadline: Option<NaiveDate>,
}

impl ChallengePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A mastery target for one notebook: keep the mean score at or above a
/// percentage. The deadline is a label only; it never gates the calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    id: ChallengeId,
    title: String,
    description: Option<String>,
    target_percentage: f64,
    notebook_id: NotebookId,
    deadline: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Challenge {
    /// Build a challenge from a draft plus store-assigned identity.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeError` if the draft does not validate.
    pub fn from_draft(
        id: ChallengeId,
        draft: ChallengeDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ChallengeError> {
        let draft = draft.validate()?;
        Ok(Self {
            id,
            title: draft.title,
            description: draft.description,
            target_percentage: draft.target_percentage,
            notebook_id: draft.notebook_id,
            deadline: draft.deadline,
            created_at,
        })
    }

    /// Apply a partial update, keeping id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeError` if the merged challenge is invalid.
    pub fn apply_patch(&self, patch: ChallengePatch) -> Result<Self, ChallengeError> {
        let mut draft = self.to_draft();
        if let Some(title) = patch.title {
            draft.title = title;
        }
        if let Some(description) = patch.description {
            draft.description = description;
        }
        if let Some(target) = patch.target_percentage {
            draft.target_percentage = target;
        }
        if let Some(notebook_id) = patch.notebook_id {
            draft.notebook_id = notebook_id;
        }
        if let Some(deadline) = patch.deadline {
            draft.deadline = deadline;
        }
        Self::from_draft(self.id, draft, self.created_at)
    }

    #[must_use]
    pub fn to_draft(&self) -> ChallengeDraft {
        ChallengeDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            target_percentage: self.target_percentage,
            notebook_id: self.notebook_id,
            deadline: self.deadline,
        }
    }

    #[must_use]
    pub fn id(&self) -> ChallengeId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn target_percentage(&self) -> f64 {
        self.target_percentage
    }

    #[must_use]
    pub fn notebook_id(&self) -> NotebookId {
        self.notebook_id
    }

    #[must_use]
    pub fn deadline(&self) -> NaiveDate {
        self.deadline
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn reward_points(&self) -> u32 {
        CHALLENGE_REWARD_POINTS
    }
}
