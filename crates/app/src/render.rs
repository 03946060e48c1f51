use chrono::NaiveDate;
use sheet_core::model::{Challenge, Goal, Notebook, NotebookId, QuizAttempt};
use sheet_core::{ProgressReport, StudyStats};

fn notebook_label(notebooks: &[Notebook], id: Option<NotebookId>) -> String {
    match id {
        None => "all notebooks".into(),
        Some(id) => notebooks
            .iter()
            .find(|n| n.id() == id)
            .map_or_else(|| format!("notebook {id}"), |n| n.name().to_owned()),
    }
}

pub fn notebooks(notebooks: &[Notebook]) -> String {
    notebooks
        .iter()
        .map(|notebook| format!("#{:<4} {}\n", notebook.id(), notebook.name()))
        .collect()
}

pub fn attempts(attempts: &[QuizAttempt], notebooks: &[Notebook]) -> String {
    attempts
        .iter()
        .map(|attempt| {
            format!(
                "#{:<4} {}  {:>3}/{:<3} {:>5.1}%  {}\n",
                attempt.id(),
                attempt.completed_at().format("%Y-%m-%d %H:%M"),
                attempt.correct_answers(),
                attempt.total_questions(),
                attempt.percentage(),
                notebook_label(notebooks, attempt.notebook_id()),
            )
        })
        .collect()
}

pub fn goal_line(goal: &Goal, notebooks: &[Notebook]) -> String {
    format!(
        "#{:<4} {} ({} {} {}, {}, due {})",
        goal.id(),
        goal.title(),
        goal.period().as_str(),
        goal.target_value(),
        goal.unit().as_str(),
        notebook_label(notebooks, goal.notebook_id()),
        goal.deadline(),
    )
}

pub fn challenge_line(challenge: &Challenge, notebooks: &[Notebook]) -> String {
    format!(
        "#{:<4} {} ({}% in {}, due {})",
        challenge.id(),
        challenge.title(),
        challenge.target_percentage(),
        notebook_label(notebooks, Some(challenge.notebook_id())),
        challenge.deadline(),
    )
}

fn mark(completed: bool) -> &'static str {
    if completed { "[x]" } else { "[ ]" }
}

pub fn report(report: &ProgressReport, notebooks: &[Notebook], today: NaiveDate) -> String {
    let user = &report.user;
    let next = match (user.next_threshold, user.points_remaining) {
        (Some(next), Some(remaining)) => format!("{remaining} to go for {next}"),
        _ => "max level".to_owned(),
    };
    let mut out = format!(
        "{} Level {} {}: {} points ({next})\n",
        user.level.icon(),
        user.level.number(),
        user.level.title(),
        user.total_points,
    );

    out.push_str(&format!(
        "\nGoals: {}/{} completed\n",
        report.completed_goals(),
        report.goals.len()
    ));
    for status in &report.goals {
        let goal = status.goal();
        let overdue = if status.is_overdue(today) { " overdue" } else { "" };
        out.push_str(&format!(
            "  {} {}  {}/{}{overdue}\n",
            mark(status.completed()),
            goal_line(goal, notebooks),
            status.current_value(),
            goal.target_value(),
        ));
    }

    out.push_str(&format!(
        "\nChallenges: {}/{} completed\n",
        report.completed_challenges(),
        report.challenges.len()
    ));
    for status in &report.challenges {
        let overdue = if status.is_overdue(today) { " overdue" } else { "" };
        out.push_str(&format!(
            "  {} {}  {}%{overdue}\n",
            mark(status.completed()),
            challenge_line(status.challenge(), notebooks),
            status.current_percentage(),
        ));
    }
    out
}

pub fn stats(stats: &StudyStats, notebooks: &[Notebook]) -> String {
    let mut out = format!(
        "{} quizzes, {}/{} correct ({}% accuracy, {}% average)\n",
        stats.quizzes, stats.correct, stats.questions, stats.accuracy, stats.average_percentage,
    );
    for group in &stats.by_notebook {
        let label = match group.notebook_id {
            None => "no notebook".to_owned(),
            id => notebook_label(notebooks, id),
        };
        out.push_str(&format!(
            "  {label}: {} quizzes, {}/{} correct, {}% average\n",
            group.quizzes, group.correct, group.questions, group.average_percentage,
        ));
    }
    out
}
