use sheet_core::model::{
    AttemptId, Challenge, ChallengeDraft, ChallengeId, Goal, GoalDraft, GoalId, GoalPeriod,
    GoalUnit, Notebook, NotebookId, QuizAttempt,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn notebook_id_from_i64(v: i64) -> Result<NotebookId, StorageError> {
    Ok(NotebookId::new(i64_to_u64("notebook_id", v)?))
}

pub(crate) fn optional_notebook_i64(
    id: Option<NotebookId>,
) -> Result<Option<i64>, StorageError> {
    id.map(|n| id_i64("notebook_id", n.value())).transpose()
}

fn optional_notebook_id(row: &SqliteRow) -> Result<Option<NotebookId>, StorageError> {
    row.try_get::<Option<i64>, _>("notebook_id")
        .map_err(ser)?
        .map(notebook_id_from_i64)
        .transpose()
}

pub(crate) fn parse_period(s: &str) -> Result<GoalPeriod, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn parse_unit(s: &str) -> Result<GoalUnit, StorageError> {
    s.parse().map_err(ser)
}

pub(crate) fn map_notebook_row(row: &SqliteRow) -> Result<Notebook, StorageError> {
    Notebook::new(
        notebook_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<QuizAttempt, StorageError> {
    QuizAttempt::new(
        AttemptId::new(i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?),
        row.try_get("completed_at").map_err(ser)?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        u32_from_i64(
            "correct_answers",
            row.try_get::<i64, _>("correct_answers").map_err(ser)?,
        )?,
        row.try_get::<f64, _>("percentage").map_err(ser)?,
        optional_notebook_id(row)?,
    )
    .map_err(ser)
}

pub(crate) fn map_goal_row(row: &SqliteRow) -> Result<Goal, StorageError> {
    let period: String = row.try_get("period").map_err(ser)?;
    let unit: String = row.try_get("unit").map_err(ser)?;

    let draft = GoalDraft {
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        period: parse_period(&period)?,
        unit: parse_unit(&unit)?,
        target_value: row.try_get("target_value").map_err(ser)?,
        notebook_id: optional_notebook_id(row)?,
        deadline: row.try_get("deadline").map_err(ser)?,
    };

    Goal::from_draft(
        GoalId::new(i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?),
        draft,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_challenge_row(row: &SqliteRow) -> Result<Challenge, StorageError> {
    let draft = ChallengeDraft {
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        target_percentage: row.try_get("target_percentage").map_err(ser)?,
        notebook_id: notebook_id_from_i64(row.try_get::<i64, _>("notebook_id").map_err(ser)?)?,
        deadline: row.try_get("deadline").map_err(ser)?,
    };

    Challenge::from_draft(
        ChallengeId::new(i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?),
        draft,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_period_and_unit_names_parse() {
        for period in [GoalPeriod::Daily, GoalPeriod::Weekly, GoalPeriod::Monthly] {
            assert_eq!(parse_period(period.as_str()).unwrap(), period);
        }
        for unit in [GoalUnit::QuestionCount, GoalUnit::QuizCount, GoalUnit::Percentage] {
            assert_eq!(parse_unit(unit.as_str()).unwrap(), unit);
        }
        assert!(matches!(
            parse_period("fortnightly"),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(notebook_id_from_i64(-1).is_err());
        assert_eq!(optional_notebook_i64(None).unwrap(), None);
        assert_eq!(
            optional_notebook_i64(Some(NotebookId::new(5))).unwrap(),
            Some(5)
        );
    }
}
