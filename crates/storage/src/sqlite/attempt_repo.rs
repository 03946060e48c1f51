use sheet_core::model::{AttemptId, QuizAttempt, UserId};

use super::mapping::{map_attempt_row, optional_notebook_i64};
use super::{SqliteRepository, conn_err, ensure_notebook};
use crate::repository::{AttemptRepository, NewAttemptRecord, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, record: NewAttemptRecord) -> Result<QuizAttempt, StorageError> {
        // Validate before touching the database; the id is a placeholder.
        record.clone().into_attempt(AttemptId::new(0))?;

        let mut tx = self.pool.begin().await.map_err(conn_err)?;
        ensure_notebook(&mut tx, record.user_id, record.notebook_id).await?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    user_id, notebook_id, completed_at,
                    total_questions, correct_answers, percentage
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(record.user_id.as_uuid())
        .bind(optional_notebook_i64(record.notebook_id)?)
        .bind(record.completed_at)
        .bind(i64::from(record.total_questions))
        .bind(i64::from(record.correct_answers))
        .bind(record.percentage)
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        tx.commit().await.map_err(conn_err)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("attempt id sign overflow".into()))?;
        record.into_attempt(AttemptId::new(id))
    }

    async fn list_attempts(&self, user_id: UserId) -> Result<Vec<QuizAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, notebook_id, completed_at,
                    total_questions, correct_answers, percentage
                FROM quiz_attempts
                WHERE user_id = ?1
                ORDER BY completed_at ASC, id ASC
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}
