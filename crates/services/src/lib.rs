#![forbid(unsafe_code)]

pub mod app_services;
pub mod attempt_service;
pub mod challenge_service;
pub mod error;
pub mod goal_service;
pub mod notebook_service;
pub mod tracker;

pub use sheet_core::Clock;

pub use app_services::AppServices;
pub use attempt_service::AttemptService;
pub use challenge_service::ChallengeService;
pub use error::{
    AppServicesError, AttemptServiceError, ChallengeServiceError, GoalServiceError,
    NotebookServiceError, TrackerError,
};
pub use goal_service::GoalService;
pub use notebook_service::NotebookService;
pub use tracker::ProgressTracker;
