use sheet_core::model::{Goal, GoalId, GoalPatch, UserId};
use sqlx::SqliteConnection;

use super::mapping::{id_i64, map_goal_row, optional_notebook_i64};
use super::{SqliteRepository, conn_err, ensure_notebook};
use crate::repository::{GoalRepository, NewGoalRecord, StorageError, invalid};

const GOAL_COLUMNS: &str = r"
    id, title, description, period, unit, target_value,
    notebook_id, deadline, created_at
";

async fn fetch_goal(
    conn: &mut SqliteConnection,
    user_id: UserId,
    id: GoalId,
) -> Result<Goal, StorageError> {
    let row = sqlx::query(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1 AND user_id = ?2"
    ))
    .bind(id_i64("goal_id", id.value())?)
    .bind(user_id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(conn_err)?
    .ok_or(StorageError::NotFound)?;
    map_goal_row(&row)
}

#[async_trait::async_trait]
impl GoalRepository for SqliteRepository {
    async fn insert_new_goal(&self, record: NewGoalRecord) -> Result<Goal, StorageError> {
        let draft = record.draft.validate().map_err(invalid)?;

        let mut tx = self.pool.begin().await.map_err(conn_err)?;
        ensure_notebook(&mut tx, record.user_id, draft.notebook_id).await?;

        let res = sqlx::query(
            r"
                INSERT INTO goals (
                    user_id, title, description, period, unit, target_value,
                    notebook_id, deadline, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(record.user_id.as_uuid())
        .bind(&draft.title)
        .bind(draft.description.as_deref())
        .bind(draft.period.as_str())
        .bind(draft.unit.as_str())
        .bind(draft.target_value)
        .bind(optional_notebook_i64(draft.notebook_id)?)
        .bind(draft.deadline)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        tx.commit().await.map_err(conn_err)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("goal id sign overflow".into()))?;
        Goal::from_draft(GoalId::new(id), draft, record.created_at).map_err(invalid)
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 ORDER BY id ASC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut goals = Vec::with_capacity(rows.len());
        for row in rows {
            goals.push(map_goal_row(&row)?);
        }
        Ok(goals)
    }

    async fn update_goal(
        &self,
        user_id: UserId,
        id: GoalId,
        patch: GoalPatch,
    ) -> Result<Goal, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        let current = fetch_goal(&mut tx, user_id, id).await?;
        let updated = current.apply_patch(patch).map_err(invalid)?;
        ensure_notebook(&mut tx, user_id, updated.notebook_id()).await?;

        sqlx::query(
            r"
                UPDATE goals
                SET title = ?1,
                    description = ?2,
                    period = ?3,
                    unit = ?4,
                    target_value = ?5,
                    notebook_id = ?6,
                    deadline = ?7
                WHERE id = ?8 AND user_id = ?9
            ",
        )
        .bind(updated.title())
        .bind(updated.description())
        .bind(updated.period().as_str())
        .bind(updated.unit().as_str())
        .bind(updated.target_value())
        .bind(optional_notebook_i64(updated.notebook_id())?)
        .bind(updated.deadline())
        .bind(id_i64("goal_id", id.value())?)
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        tx.commit().await.map_err(conn_err)?;
        Ok(updated)
    }

    async fn delete_goal(&self, user_id: UserId, id: GoalId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM goals WHERE id = ?1 AND user_id = ?2")
            .bind(id_i64("goal_id", id.value())?)
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(conn_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
