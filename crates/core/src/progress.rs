//! Goal and challenge progress calculation.
//!
//! Every function here is pure and total: empty attempt lists, zero targets
//! and unknown notebooks all produce well-defined 0-valued results. Callers
//! trigger a full recompute after any change to attempts, goals or
//! challenges; nothing is cached between calls.

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::leveling::UserProgress;
use crate::model::{Challenge, Goal, GoalPeriod, GoalUnit, QuizAttempt};
use crate::time::{end_of_local_day, utc_offset};

//
// ─── WINDOW ────────────────────────────────────────────────────────────────────
//

/// Inclusive time range a goal counts attempts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl GoalWindow {
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// A goal together with its derived progress.
///
/// `completed` is fixed at construction from `current_value >= target`, so the
/// two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalStatus {
    goal: Goal,
    current_value: f64,
    completed: bool,
}

impl GoalStatus {
    #[must_use]
    pub fn new(goal: Goal, current_value: f64) -> Self {
        let completed = current_value >= goal.target_value();
        Self {
            goal,
            current_value,
            completed,
        }
    }

    #[must_use]
    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    #[must_use]
    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Reward points this goal contributes right now.
    #[must_use]
    pub fn earned_points(&self) -> u32 {
        if self.completed {
            self.goal.reward_points()
        } else {
            0
        }
    }

    /// Deadline has passed without completion. Display only.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && today > self.goal.deadline()
    }
}

/// A challenge together with its derived mean percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeStatus {
    challenge: Challenge,
    current_percentage: f64,
    completed: bool,
}

impl ChallengeStatus {
    #[must_use]
    pub fn new(challenge: Challenge, current_percentage: f64) -> Self {
        let completed = current_percentage >= challenge.target_percentage();
        Self {
            challenge,
            current_percentage,
            completed,
        }
    }

    #[must_use]
    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    #[must_use]
    pub fn current_percentage(&self) -> f64 {
        self.current_percentage
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn earned_points(&self) -> u32 {
        if self.completed {
            self.challenge.reward_points()
        } else {
            0
        }
    }

    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && today > self.challenge.deadline()
    }
}

/// Result of one recompute-all pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub goals: Vec<GoalStatus>,
    pub challenges: Vec<ChallengeStatus>,
    pub user: UserProgress,
}

impl ProgressReport {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            goals: Vec::new(),
            challenges: Vec::new(),
            user: UserProgress::from_points(0),
        }
    }

    #[must_use]
    pub fn completed_goals(&self) -> usize {
        self.goals.iter().filter(|g| g.completed()).count()
    }

    #[must_use]
    pub fn completed_challenges(&self) -> usize {
        self.challenges.iter().filter(|c| c.completed()).count()
    }
}

/// Sum of reward points over completed goals and challenges.
#[must_use]
pub fn total_points(goals: &[GoalStatus], challenges: &[ChallengeStatus]) -> u32 {
    let goal_points = goals
        .iter()
        .fold(0_u32, |acc, g| acc.saturating_add(g.earned_points()));
    challenges
        .iter()
        .fold(goal_points, |acc, c| acc.saturating_add(c.earned_points()))
}

//
// ─── CALCULATOR ────────────────────────────────────────────────────────────────
//

/// Computes goal and challenge progress from attempt history.
///
/// The only configuration is the UTC offset that defines "end of today" for
/// daily goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCalculator {
    offset: FixedOffset,
}

impl Default for ProgressCalculator {
    fn default() -> Self {
        Self::new(utc_offset())
    }
}

impl ProgressCalculator {
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Evaluation window for a goal.
    ///
    /// All windows start at `created_at`. Daily goals run to the end of the
    /// current local day; weekly and monthly goals run a fixed 7 days or one
    /// calendar month and are never extended.
    #[must_use]
    pub fn goal_window(&self, goal: &Goal, now: DateTime<Utc>) -> GoalWindow {
        let start = goal.created_at();
        let end = match goal.period() {
            GoalPeriod::Daily => end_of_local_day(now, self.offset),
            GoalPeriod::Weekly => start
                .checked_add_signed(Duration::days(7))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            GoalPeriod::Monthly => start
                .checked_add_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        GoalWindow { start, end }
    }

    /// Current progress value for a goal, in the goal's unit.
    #[must_use]
    pub fn goal_progress(&self, goal: &Goal, attempts: &[QuizAttempt], now: DateTime<Utc>) -> f64 {
        let window = self.goal_window(goal, now);
        let matching = attempts.iter().filter(|attempt| {
            window.contains(attempt.completed_at())
                && goal
                    .notebook_id()
                    .is_none_or(|scope| attempt.notebook_id() == Some(scope))
        });

        match goal.unit() {
            GoalUnit::QuestionCount => matching.map(|a| f64::from(a.total_questions())).sum(),
            GoalUnit::QuizCount => count_as_f64(matching.count()),
            GoalUnit::Percentage => rounded_mean(matching.map(QuizAttempt::percentage)),
        }
    }

    /// Mean percentage over every attempt in the challenge's notebook.
    ///
    /// No time window applies and the deadline is ignored.
    #[must_use]
    pub fn challenge_progress(&self, challenge: &Challenge, attempts: &[QuizAttempt]) -> f64 {
        rounded_mean(
            attempts
                .iter()
                .filter(|a| a.notebook_id() == Some(challenge.notebook_id()))
                .map(QuizAttempt::percentage),
        )
    }

    #[must_use]
    pub fn goal_status(&self, goal: &Goal, attempts: &[QuizAttempt], now: DateTime<Utc>) -> GoalStatus {
        GoalStatus::new(goal.clone(), self.goal_progress(goal, attempts, now))
    }

    #[must_use]
    pub fn challenge_status(&self, challenge: &Challenge, attempts: &[QuizAttempt]) -> ChallengeStatus {
        ChallengeStatus::new(
            challenge.clone(),
            self.challenge_progress(challenge, attempts),
        )
    }

    /// Recompute every goal and challenge plus the derived level.
    #[must_use]
    pub fn recompute(
        &self,
        goals: &[Goal],
        challenges: &[Challenge],
        attempts: &[QuizAttempt],
        now: DateTime<Utc>,
    ) -> ProgressReport {
        let goals: Vec<GoalStatus> = goals
            .iter()
            .map(|goal| self.goal_status(goal, attempts, now))
            .collect();
        let challenges: Vec<ChallengeStatus> = challenges
            .iter()
            .map(|challenge| self.challenge_status(challenge, attempts))
            .collect();
        let user = UserProgress::from_points(total_points(&goals, &challenges));

        ProgressReport {
            goals,
            challenges,
            user,
        }
    }
}

/// Arithmetic mean rounded to the nearest integer, 0 for an empty input.
pub(crate) fn rounded_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }
    (sum / count_as_f64(count)).round()
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn count_as_f64(count: usize) -> f64 {
    count as f64
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
