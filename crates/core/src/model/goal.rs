use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{GoalId, NotebookId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GoalError {
    #[error("goal title cannot be empty")]
    EmptyTitle,

    #[error("goal target must be a finite, non-negative number, got {0}")]
    InvalidTarget(f64),

    #[error("percentage goals cannot target more than 100, got {0}")]
    PercentageAboveHundred(f64),

    #[error("unknown goal period: {0}")]
    UnknownPeriod(String),

    #[error("unknown goal unit: {0}")]
    UnknownUnit(String),
}

//
// ─── PERIOD & UNIT ─────────────────────────────────────────────────────────────
//

/// Length of the evaluation window a goal is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl GoalPeriod {
    /// Points granted once a goal of this period is completed.
    #[must_use]
    pub fn reward_points(self) -> u32 {
        match self {
            GoalPeriod::Daily => 10,
            GoalPeriod::Weekly => 50,
            GoalPeriod::Monthly => 200,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GoalPeriod::Daily => "daily",
            GoalPeriod::Weekly => "weekly",
            GoalPeriod::Monthly => "monthly",
        }
    }
}

impl fmt::Display for GoalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalPeriod {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(GoalError::UnknownPeriod(other.to_owned())),
        }
    }
}

/// What a goal counts within its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalUnit {
    /// Sum of questions answered.
    QuestionCount,
    /// Number of quizzes completed.
    QuizCount,
    /// Rounded mean score, 0–100.
    Percentage,
}

impl GoalUnit {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GoalUnit::QuestionCount => "question_count",
            GoalUnit::QuizCount => "quiz_count",
            GoalUnit::Percentage => "percentage",
        }
    }
}

impl fmt::Display for GoalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalUnit {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "question_count" | "questions" => Ok(Self::QuestionCount),
            "quiz_count" | "quizzes" => Ok(Self::QuizCount),
            "percentage" | "percent" => Ok(Self::Percentage),
            other => Err(GoalError::UnknownUnit(other.to_owned())),
        }
    }
}

//
// ─── DRAFT & PATCH ─────────────────────────────────────────────────────────────
//

/// User-entered goal fields before the store assigns an id and creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub period: GoalPeriod,
    pub unit: GoalUnit,
    pub target_value: f64,
    pub notebook_id: Option<NotebookId>,
    pub deadline: NaiveDate,
}

impl GoalDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` if the title is blank or the target is out of range.
    pub fn validate(self) -> Result<Self, GoalError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(GoalError::EmptyTitle);
        }
        if !self.target_value.is_finite() || self.target_value < 0.0 {
            return Err(GoalError::InvalidTarget(self.target_value));
        }
        if self.unit == GoalUnit::Percentage && self.target_value > 100.0 {
            return Err(GoalError::PercentageAboveHundred(self.target_value));
        }

        Ok(Self {
            title,
            description: normalize_description(self.description),
            ..self
        })
    }
}

/// Partial update for an existing goal. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub period: Option<GoalPeriod>,
    pub unit: Option<GoalUnit>,
    pub target_value: Option<f64>,
    pub notebook_id: Option<Option<NotebookId>>,
    pub deadline: Option<NaiveDate>,
}

impl GoalPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

//
// ─── GOAL ──────────────────────────────────────────────────────────────────────
//

/// A user-defined throughput target tied to a daily, weekly or monthly window.
///
/// Only the definition is stored. Current value and completion are always
/// derived from attempt history, see `progress::GoalStatus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    id: GoalId,
    title: String,
    description: Option<String>,
    period: GoalPeriod,
    unit: GoalUnit,
    target_value: f64,
    notebook_id: Option<NotebookId>,
    deadline: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Goal {
    /// Build a goal from a draft plus store-assigned identity.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` if the draft does not validate.
    pub fn from_draft(
        id: GoalId,
        draft: GoalDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GoalError> {
        let draft = draft.validate()?;
        Ok(Self {
            id,
            title: draft.title,
            description: draft.description,
            period: draft.period,
            unit: draft.unit,
            target_value: draft.target_value,
            notebook_id: draft.notebook_id,
            deadline: draft.deadline,
            created_at,
        })
    }

    /// Apply a partial update, keeping id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` if the merged goal is no longer valid.
    pub fn apply_patch(&self, patch: GoalPatch) -> Result<Self, GoalError> {
        let mut draft = self.to_draft();
        if let Some(title) = patch.title {
            draft.title = title;
        }
        if let Some(description) = patch.description {
            draft.description = description;
        }
        if let Some(period) = patch.period {
            draft.period = period;
        }
        if let Some(unit) = patch.unit {
            draft.unit = unit;
        }
        if let Some(target) = patch.target_value {
            draft.target_value = target;
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
    pub fn to_draft(&self) -> GoalDraft {
        GoalDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            period: self.period,
            unit: self.unit,
            target_value: self.target_value,
            notebook_id: self.notebook_id,
            deadline: self.deadline,
        }
    }

    #[must_use]
    pub fn id(&self) -> GoalId {
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
    pub fn period(&self) -> GoalPeriod {
        self.period
    }

    #[must_use]
    pub fn unit(&self) -> GoalUnit {
        self.unit
    }

    #[must_use]
    pub fn target_value(&self) -> f64 {
        self.target_value
    }

    /// Notebook scope; `None` means attempts from every notebook count.
    #[must_use]
    pub fn notebook_id(&self) -> Option<NotebookId> {
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
        self.period.reward_points()
    }
}

pub(crate) fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft() -> GoalDraft {
        GoalDraft {
            title: "  Answer 50 questions ".into(),
            description: Some("   ".into()),
            period: GoalPeriod::Weekly,
            unit: GoalUnit::QuestionCount,
            target_value: 50.0,
            notebook_id: None,
            deadline: NaiveDate::from_ymd_opt(2023, 11, 21).unwrap(),
        }
    }

    #[test]
    fn reward_points_follow_period() {
        assert_eq!(GoalPeriod::Daily.reward_points(), 10);
        assert_eq!(GoalPeriod::Weekly.reward_points(), 50);
        assert_eq!(GoalPeriod::Monthly.reward_points(), 200);
    }

    #[test]
    fn from_draft_normalizes_text() {
        let goal = Goal::from_draft(GoalId::new(1), draft(), fixed_now()).unwrap();
        assert_eq!(goal.title(), "Answer 50 questions");
        assert_eq!(goal.description(), None);
        assert_eq!(goal.reward_points(), 50);
    }

    #[test]
    fn rejects_blank_title_and_bad_targets() {
        let mut d = draft();
        d.title = " ".into();
        assert_eq!(d.validate().unwrap_err(), GoalError::EmptyTitle);

        let mut d = draft();
        d.target_value = -1.0;
        assert_eq!(d.validate().unwrap_err(), GoalError::InvalidTarget(-1.0));

        let mut d = draft();
        d.unit = GoalUnit::Percentage;
        d.target_value = 120.0;
        assert_eq!(
            d.validate().unwrap_err(),
            GoalError::PercentageAboveHundred(120.0)
        );
    }

    #[test]
    fn zero_target_is_allowed() {
        let mut d = draft();
        d.target_value = 0.0;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn apply_patch_keeps_identity() {
        let goal = Goal::from_draft(GoalId::new(9), draft(), fixed_now()).unwrap();
        let patched = goal
            .apply_patch(GoalPatch {
                target_value: Some(80.0),
                description: Some(Some("more".into())),
                ..GoalPatch::default()
            })
            .unwrap();

        assert_eq!(patched.id(), GoalId::new(9));
        assert_eq!(patched.created_at(), goal.created_at());
        assert_eq!(patched.target_value(), 80.0);
        assert_eq!(patched.description(), Some("more"));
        assert_eq!(patched.title(), goal.title());
    }

    #[test]
    fn apply_patch_revalidates() {
        let goal = Goal::from_draft(GoalId::new(9), draft(), fixed_now()).unwrap();
        let err = goal
            .apply_patch(GoalPatch {
                unit: Some(GoalUnit::Percentage),
                target_value: Some(150.0),
                ..GoalPatch::default()
            })
            .unwrap_err();
        assert_eq!(err, GoalError::PercentageAboveHundred(150.0));

        let err = goal
            .apply_patch(GoalPatch {
                title: Some("  ".into()),
                ..GoalPatch::default()
            })
            .unwrap_err();
        assert_eq!(err, GoalError::EmptyTitle);
    }

    #[test]
    fn parses_period_and_unit() {
        assert_eq!("Monthly".parse::<GoalPeriod>().unwrap(), GoalPeriod::Monthly);
        assert_eq!("questions".parse::<GoalUnit>().unwrap(), GoalUnit::QuestionCount);
        assert_eq!(
            "quiz_count".parse::<GoalUnit>().unwrap(),
            GoalUnit::QuizCount
        );
        assert!(matches!(
            "yearly".parse::<GoalPeriod>(),
            Err(GoalError::UnknownPeriod(_))
        ));
    }
}
