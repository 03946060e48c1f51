use anyhow::Context;
use clap::Parser;
use sheet_core::model::{ChallengeDraft, ChallengePatch, GoalDraft, GoalPatch, UserId};
use sheet_core::time::offset_from_minutes;
use services::{AppServices, Clock, ProgressTracker};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod db;
mod render;

use cli::{AttemptCommand, ChallengeCommand, Cli, Command, GoalCommand, NotebookCommand};

const DEFAULT_LOG_FILTER: &str = "answer_sheet=info,services=info";

fn init_tracing() {
    // Logs go to stderr so `--json` output stays machine readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_url = db::normalize_sqlite_url(&cli.db_url);
    db::prepare_sqlite_file(&db_url)?;

    let user_id = cli.user_id.unwrap_or_else(UserId::local);
    let offset = offset_from_minutes(cli.utc_offset_minutes);
    info!(%db_url, %user_id, offset = %offset, "opening answer sheet");

    let services = AppServices::new_sqlite(&db_url, Clock::default_clock(), user_id, offset)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    let mut tracker = services.tracker().await.context("loading records")?;

    match cli.command {
        Command::Notebook(cmd) => notebook(&mut tracker, cmd).await,
        Command::Attempt(cmd) => attempt(&mut tracker, cmd).await,
        Command::Goal(cmd) => goal(&mut tracker, cmd).await,
        Command::Challenge(cmd) => challenge(&mut tracker, cmd).await,
        Command::Progress { json } => {
            if json {
                print_json(tracker.report())
            } else {
                print!(
                    "{}",
                    render::report(tracker.report(), tracker.notebooks(), tracker.today())
                );
                Ok(())
            }
        }
        Command::Stats { json } => {
            let stats = tracker.stats();
            if json {
                print_json(&stats)
            } else {
                print!("{}", render::stats(&stats, tracker.notebooks()));
                Ok(())
            }
        }
    }
}

async fn notebook(tracker: &mut ProgressTracker, cmd: NotebookCommand) -> anyhow::Result<()> {
    match cmd {
        NotebookCommand::Add { name } => {
            let notebook = tracker.add_notebook(name).await?;
            println!("created notebook #{}", notebook.id());
        }
        NotebookCommand::List => print!("{}", render::notebooks(tracker.notebooks())),
    }
    Ok(())
}

async fn attempt(tracker: &mut ProgressTracker, cmd: AttemptCommand) -> anyhow::Result<()> {
    match cmd {
        AttemptCommand::Record {
            total,
            correct,
            notebook,
            at,
        } => {
            let before = tracker.report().user.level;
            let attempt = tracker.record_attempt(total, correct, notebook, at).await?;
            println!(
                "recorded attempt #{} ({}%)",
                attempt.id(),
                attempt.percentage()
            );
            let user = tracker.report().user;
            if user.level > before {
                println!(
                    "{} level up: {} {}",
                    user.level.icon(),
                    user.level.number(),
                    user.level.title()
                );
            }
        }
        AttemptCommand::List => print!(
            "{}",
            render::attempts(tracker.attempts(), tracker.notebooks())
        ),
    }
    Ok(())
}

async fn goal(tracker: &mut ProgressTracker, cmd: GoalCommand) -> anyhow::Result<()> {
    match cmd {
        GoalCommand::Add(args) => {
            let goal = tracker
                .create_goal(GoalDraft {
                    title: args.title,
                    description: args.description,
                    period: args.period,
                    unit: args.unit,
                    target_value: args.target,
                    notebook_id: args.notebook,
                    deadline: args.deadline,
                })
                .await?;
            println!("created goal #{}", goal.id());
        }
        GoalCommand::List => {
            for goal in tracker.goals() {
                println!("{}", render::goal_line(goal, tracker.notebooks()));
            }
        }
        GoalCommand::Update(args) => {
            let goal = tracker
                .update_goal(
                    args.id,
                    GoalPatch {
                        title: args.title,
                        target_value: args.target,
                        deadline: args.deadline,
                        ..GoalPatch::default()
                    },
                )
                .await?;
            println!("{}", render::goal_line(&goal, tracker.notebooks()));
        }
        GoalCommand::Delete { id } => {
            tracker.delete_goal(id).await?;
            println!("deleted goal #{id}");
        }
    }
    Ok(())
}

async fn challenge(tracker: &mut ProgressTracker, cmd: ChallengeCommand) -> anyhow::Result<()> {
    match cmd {
        ChallengeCommand::Add(args) => {
            let challenge = tracker
                .create_challenge(ChallengeDraft {
                    title: args.title,
                    description: args.description,
                    target_percentage: args.target,
                    notebook_id: args.notebook,
                    deadline: args.deadline,
                })
                .await?;
            println!("created challenge #{}", challenge.id());
        }
        ChallengeCommand::List => {
            for challenge in tracker.challenges() {
                println!("{}", render::challenge_line(challenge, tracker.notebooks()));
            }
        }
        ChallengeCommand::Update(args) => {
            let challenge = tracker
                .update_challenge(
                    args.id,
                    ChallengePatch {
                        title: args.title,
                        target_percentage: args.target,
                        deadline: args.deadline,
                        ..ChallengePatch::default()
                    },
                )
                .await?;
            println!("{}", render::challenge_line(&challenge, tracker.notebooks()));
        }
        ChallengeCommand::Delete { id } => {
            tracker.delete_challenge(id).await?;
            println!("deleted challenge #{id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli).await
}
