#![forbid(unsafe_code)]

pub mod leveling;
pub mod model;
pub mod progress;
pub mod stats;
pub mod time;

pub use leveling::{Level, UserProgress, compute_level, next_threshold};
pub use progress::{ChallengeStatus, GoalStatus, GoalWindow, ProgressCalculator, ProgressReport};
pub use stats::{NotebookStats, StudyStats};
pub use time::Clock;
