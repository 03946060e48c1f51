use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{AttemptId, NotebookId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("percentage must be within 0..=100, got {0}")]
    InvalidPercentage(f64),
}

//
// ─── QUIZ ATTEMPT ──────────────────────────────────────────────────────────────
//

/// One completed quiz-taking session with aggregate correctness stats.
///
/// Attempts are produced by the quiz flow and are immutable once recorded;
/// the progress engine only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    id: AttemptId,
    completed_at: DateTime<Utc>,
    total_questions: u32,
    correct_answers: u32,
    percentage: f64,
    notebook_id: Option<NotebookId>,
}

impl QuizAttempt {
    /// Rehydrate an attempt with an explicit percentage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::CorrectExceedsTotal` if the counts are inconsistent,
    /// or `AttemptError::InvalidPercentage` if the percentage is outside `0..=100`.
    pub fn new(
        id: AttemptId,
        completed_at: DateTime<Utc>,
        total_questions: u32,
        correct_answers: u32,
        percentage: f64,
        notebook_id: Option<NotebookId>,
    ) -> Result<Self, AttemptError> {
        check_counts(total_questions, correct_answers)?;
        check_percentage(percentage)?;

        Ok(Self {
            id,
            completed_at,
            total_questions,
            correct_answers,
            percentage,
            notebook_id,
        })
    }

    /// Build an attempt deriving the percentage from the answer counts.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::CorrectExceedsTotal` if `correct_answers > total_questions`.
    pub fn from_counts(
        id: AttemptId,
        completed_at: DateTime<Utc>,
        total_questions: u32,
        correct_answers: u32,
        notebook_id: Option<NotebookId>,
    ) -> Result<Self, AttemptError> {
        check_counts(total_questions, correct_answers)?;
        let percentage = percentage_of(correct_answers, total_questions);
        Self::new(
            id,
            completed_at,
            total_questions,
            correct_answers,
            percentage,
            notebook_id,
        )
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Share of correct answers, 0–100.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn notebook_id(&self) -> Option<NotebookId> {
        self.notebook_id
    }
}

/// Share of correct answers as 0–100, or 0 when nothing was answered.
#[must_use]
pub fn percentage_of(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct) * 100.0 / f64::from(total)
}

fn check_counts(total: u32, correct: u32) -> Result<(), AttemptError> {
    if correct > total {
        return Err(AttemptError::CorrectExceedsTotal { correct, total });
    }
    Ok(())
}

fn check_percentage(percentage: f64) -> Result<(), AttemptError> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(AttemptError::InvalidPercentage(percentage));
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
