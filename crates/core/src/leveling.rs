use serde::{Deserialize, Serialize};

/// Point totals at which each level above the first begins.
pub const LEVEL_THRESHOLDS: [u32; 4] = [100, 300, 600, 1000];

/// User-facing rank derived from accumulated reward points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Beginner,
    Student,
    Applied,
    Dedicated,
    /// Terminal level; no further thresholds.
    Master,
}

impl Level {
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Level::Beginner => 1,
            Level::Student => 2,
            Level::Applied => 3,
            Level::Dedicated => 4,
            Level::Master => 5,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Student => "Student",
            Level::Applied => "Applied",
            Level::Dedicated => "Dedicated",
            Level::Master => "Master",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Level::Beginner => "🌱",
            Level::Student => "📚",
            Level::Applied => "✏️",
            Level::Dedicated => "🔥",
            Level::Master => "🏆",
        }
    }
}

/// Map accumulated points to a level.
#[must_use]
pub fn compute_level(total_points: u32) -> Level {
    match total_points {
        0..100 => Level::Beginner,
        100..300 => Level::Student,
        300..600 => Level::Applied,
        600..1000 => Level::Dedicated,
        _ => Level::Master,
    }
}

/// Smallest threshold strictly above `total_points`; `None` once the terminal level is reached.
#[must_use]
pub fn next_threshold(total_points: u32) -> Option<u32> {
    LEVEL_THRESHOLDS
        .iter()
        .copied()
        .find(|threshold| *threshold > total_points)
}

/// Derived level state for one user. Never stored; rebuilt from completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub total_points: u32,
    pub level: Level,
    /// `None` means there is no next level.
    pub next_threshold: Option<u32>,
    pub points_remaining: Option<u32>,
}

impl UserProgress {
    #[must_use]
    pub fn from_points(total_points: u32) -> Self {
        let next_threshold = next_threshold(total_points);
        Self {
            total_points,
            level: compute_level(total_points),
            next_threshold,
            points_remaining: next_threshold.map(|t| t - total_points),
        }
    }
}
