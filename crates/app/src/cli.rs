use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use sheet_core::model::{ChallengeId, GoalId, GoalPeriod, GoalUnit, NotebookId, UserId};

pub const DEFAULT_DB_URL: &str = "sqlite://answer-sheet.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "answer-sheet")]
#[command(about = "Track quiz attempts, study goals and notebook challenges")]
pub struct Cli {
    /// SQLite database URL or file path
    #[arg(long = "db", env = "SHEET_DB_URL", default_value = DEFAULT_DB_URL, global = true)]
    pub db_url: String,

    /// Owner of the records (defaults to the local user)
    #[arg(long = "user", env = "SHEET_USER_ID", global = true)]
    pub user_id: Option<UserId>,

    /// Offset from UTC that defines the end of the day for daily goals
    #[arg(
        long,
        env = "SHEET_UTC_OFFSET_MINUTES",
        default_value_t = 0,
        allow_negative_numbers = true,
        global = true
    )]
    pub utc_offset_minutes: i32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage notebooks
    #[command(subcommand)]
    Notebook(NotebookCommand),
    /// Record and list quiz attempts
    #[command(subcommand)]
    Attempt(AttemptCommand),
    /// Manage periodic goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Manage notebook challenges
    #[command(subcommand)]
    Challenge(ChallengeCommand),
    /// Show goal and challenge progress with the current level
    Progress {
        #[arg(long)]
        json: bool,
    },
    /// Show totals over all recorded attempts
    Stats {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum NotebookCommand {
    Add { name: String },
    List,
}

#[derive(Debug, Subcommand)]
pub enum AttemptCommand {
    Record {
        #[arg(long)]
        total: u32,
        #[arg(long)]
        correct: u32,
        #[arg(long)]
        notebook: Option<NotebookId>,
        /// Completion time as RFC3339 (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    List,
}

#[derive(Debug, Subcommand)]
pub enum GoalCommand {
    Add(GoalAddArgs),
    List,
    Update(GoalUpdateArgs),
    Delete { id: GoalId },
}

#[derive(Debug, Args)]
pub struct GoalAddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// daily, weekly or monthly
    #[arg(long)]
    pub period: GoalPeriod,
    /// questions, quizzes or percentage
    #[arg(long)]
    pub unit: GoalUnit,
    #[arg(long)]
    pub target: f64,
    /// YYYY-MM-DD
    #[arg(long)]
    pub deadline: NaiveDate,
    /// Count only attempts from this notebook
    #[arg(long)]
    pub notebook: Option<NotebookId>,
}

#[derive(Debug, Args)]
pub struct GoalUpdateArgs {
    pub id: GoalId,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub target: Option<f64>,
    #[arg(long)]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Subcommand)]
pub enum ChallengeCommand {
    Add(ChallengeAddArgs),
    List,
    Update(ChallengeUpdateArgs),
    Delete { id: ChallengeId },
}

#[derive(Debug, Args)]
pub struct ChallengeAddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub notebook: NotebookId,
    /// Target mean percentage, 0-100
    #[arg(long)]
    pub target: f64,
    /// YYYY-MM-DD
    #[arg(long)]
    pub deadline: NaiveDate,
}

#[derive(Debug, Args)]
pub struct ChallengeUpdateArgs {
    pub id: ChallengeId,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub target: Option<f64>,
    #[arg(long)]
    pub deadline: Option<NaiveDate>,
}
