use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{NotebookId, QuizAttempt};
use crate::progress::rounded_mean;

/// Aggregates for one notebook (or for attempts without a notebook).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookStats {
    pub notebook_id: Option<NotebookId>,
    pub quizzes: usize,
    pub questions: u64,
    pub correct: u64,
    pub average_percentage: f64,
}

/// Dashboard totals over a user's attempt history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyStats {
    pub quizzes: usize,
    pub questions: u64,
    pub correct: u64,
    /// Correct over answered, as a percentage with one decimal.
    pub accuracy: f64,
    /// Rounded mean of per-attempt percentages.
    pub average_percentage: f64,
    /// Ordered by notebook id, attempts without a notebook first.
    pub by_notebook: Vec<NotebookStats>,
}

impl StudyStats {
    #[must_use]
    pub fn from_attempts(attempts: &[QuizAttempt]) -> Self {
        let mut groups: BTreeMap<Option<NotebookId>, Vec<&QuizAttempt>> = BTreeMap::new();
        for attempt in attempts {
            groups.entry(attempt.notebook_id()).or_default().push(attempt);
        }

        let by_notebook = groups
            .into_iter()
            .map(|(notebook_id, group)| {
                let (questions, correct) = totals(group.iter().copied());
                NotebookStats {
                    notebook_id,
                    quizzes: group.len(),
                    questions,
                    correct,
                    average_percentage: rounded_mean(group.iter().map(|a| a.percentage())),
                }
            })
            .collect();

        let (questions, correct) = totals(attempts.iter());
        Self {
            quizzes: attempts.len(),
            questions,
            correct,
            accuracy: accuracy(correct, questions),
            average_percentage: rounded_mean(attempts.iter().map(QuizAttempt::percentage)),
            by_notebook,
        }
    }

    #[must_use]
    pub fn notebook(&self, id: NotebookId) -> Option<&NotebookStats> {
        self.by_notebook.iter().find(|s| s.notebook_id == Some(id))
    }
}

fn totals<'a>(attempts: impl Iterator<Item = &'a QuizAttempt>) -> (u64, u64) {
    attempts.fold((0, 0), |(questions, correct), a| {
        (
            questions + u64::from(a.total_questions()),
            correct + u64::from(a.correct_answers()),
        )
    })
}

#[allow(clippy::cast_precision_loss)]
fn accuracy(correct: u64, questions: u64) -> f64 {
    if questions == 0 {
        return 0.0;
    }
    let pct = correct as f64 / questions as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}
