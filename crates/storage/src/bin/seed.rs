use std::fmt;

use chrono::{DateTime, Duration, Utc};
use sheet_core::model::{ChallengeDraft, GoalDraft, GoalPeriod, GoalUnit, UserId};
use storage::repository::{
    NewAttemptRecord, NewChallengeRecord, NewGoalRecord, NewNotebookRecord, Storage,
};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    notebook_name: String,
    attempts: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUser { raw: String },
    InvalidAttempts { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidAttempts { raw } => write!(f, "invalid --attempts value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("SHEET_DB_URL")
            .unwrap_or_else(|_| "sqlite://answer-sheet.sqlite3?mode=rwc".into());
        let mut user_id = match std::env::var("SHEET_USER_ID") {
            Ok(raw) => raw.parse().map_err(|_| ArgsError::InvalidUser { raw })?,
            Err(_) => UserId::local(),
        };
        let mut notebook_name =
            std::env::var("SHEET_NOTEBOOK_NAME").unwrap_or_else(|_| "Biology".into());
        let mut attempts = std::env::var("SHEET_ATTEMPTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(5);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUser { raw: value.clone() })?;
                }
                "--notebook-name" => {
                    notebook_name = require_value(&mut args, "--notebook-name")?;
                }
                "--attempts" => {
                    let value = require_value(&mut args, "--attempts")?;
                    attempts = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAttempts { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            notebook_name,
            attempts,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://answer-sheet.sqlite3?mode=rwc)");
    eprintln!("  --user <uuid>             Owner of the seeded records (default: nil uuid)");
    eprintln!("  --notebook-name <name>    Notebook to create (default: Biology)");
    eprintln!("  --attempts <n>            Number of quiz attempts to append (default: 5)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  SHEET_DB_URL, SHEET_USER_ID, SHEET_NOTEBOOK_NAME, SHEET_ATTEMPTS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let notebook = storage
        .notebooks
        .insert_new_notebook(NewNotebookRecord {
            user_id: args.user_id,
            name: args.notebook_name.clone(),
            created_at: now,
        })
        .await?;

    let scores = [(10, 7), (20, 18), (5, 5), (12, 9), (8, 4)];
    for i in 0..args.attempts {
        let (total, correct) = scores[(i as usize) % scores.len()];
        let completed_at = now - Duration::hours(i64::from(i) * 5);
        storage
            .attempts
            .append_attempt(NewAttemptRecord {
                user_id: args.user_id,
                completed_at,
                total_questions: total,
                correct_answers: correct,
                percentage: sheet_core::model::percentage_of(correct, total),
                notebook_id: Some(notebook.id()),
            })
            .await?;
    }

    let deadline = (now + Duration::days(30)).date_naive();
    storage
        .goals
        .insert_new_goal(NewGoalRecord {
            user_id: args.user_id,
            draft: GoalDraft {
                title: "Answer 50 questions this week".into(),
                description: None,
                period: GoalPeriod::Weekly,
                unit: GoalUnit::QuestionCount,
                target_value: 50.0,
                notebook_id: None,
                deadline,
            },
            created_at: now,
        })
        .await?;
    storage
        .challenges
        .insert_new_challenge(NewChallengeRecord {
            user_id: args.user_id,
            draft: ChallengeDraft {
                title: format!("Average 80% in {}", notebook.name()),
                description: None,
                target_percentage: 80.0,
                notebook_id: notebook.id(),
                deadline,
            },
            created_at: now,
        })
        .await?;

    println!(
        "Seeded notebook {} with {} attempts, one goal and one challenge into {}",
        notebook.id(),
        args.attempts,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
