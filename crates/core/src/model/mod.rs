mod attempt;
mod challenge;
mod goal;
mod ids;
mod notebook;

pub use ids::{AttemptId, ChallengeId, GoalId, NotebookId, ParseIdError, UserId};

pub use attempt::{AttemptError, QuizAttempt, percentage_of};
pub use challenge::{
    CHALLENGE_REWARD_POINTS, Challenge, ChallengeDraft, ChallengeError, ChallengePatch,
};
pub use goal::{Goal, GoalDraft, GoalError, GoalPatch, GoalPeriod, GoalUnit};
pub use notebook::{Notebook, NotebookError, validate_name as validate_notebook_name};
