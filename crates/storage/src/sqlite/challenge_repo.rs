use sheet_core::model::{Challenge, ChallengeId, ChallengePatch, UserId};
use sqlx::SqliteConnection;

use super::mapping::{id_i64, map_challenge_row};
use super::{SqliteRepository, conn_err, ensure_notebook};
use crate::repository::{ChallengeRepository, NewChallengeRecord, StorageError, invalid};

const CHALLENGE_COLUMNS: &str = r"
    id, title, description, target_percentage, notebook_id, deadline, created_at
";

async fn fetch_challenge(
    conn: &mut SqliteConnection,
    user_id: UserId,
    id: ChallengeId,
) -> Result<Challenge, StorageError> {
    let row = sqlx::query(&format!(
        "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = ?1 AND user_id = ?2"
    ))
    .bind(id_i64("challenge_id", id.value())?)
    .bind(user_id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(conn_err)?
    .ok_or(StorageError::NotFound)?;
    map_challenge_row(&row)
}

#[async_trait::async_trait]
impl ChallengeRepository for SqliteRepository {
    async fn insert_new_challenge(
        &self,
        record: NewChallengeRecord,
    ) -> Result<Challenge, StorageError> {
        let draft = record.draft.validate().map_err(invalid)?;

        let mut tx = self.pool.begin().await.map_err(conn_err)?;
        ensure_notebook(&mut tx, record.user_id, Some(draft.notebook_id)).await?;

        let res = sqlx::query(
            r"
                INSERT INTO challenges (
                    user_id, title, description, target_percentage,
                    notebook_id, deadline, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(record.user_id.as_uuid())
        .bind(&draft.title)
        .bind(draft.description.as_deref())
        .bind(draft.target_percentage)
        .bind(id_i64("notebook_id", draft.notebook_id.value())?)
        .bind(draft.deadline)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        tx.commit().await.map_err(conn_err)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("challenge id sign overflow".into()))?;
        Challenge::from_draft(ChallengeId::new(id), draft, record.created_at).map_err(invalid)
    }

    async fn list_challenges(&self, user_id: UserId) -> Result<Vec<Challenge>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE user_id = ?1 ORDER BY id ASC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut challenges = Vec::with_capacity(rows.len());
        for row in rows {
            challenges.push(map_challenge_row(&row)?);
        }
        Ok(challenges)
    }

    async fn update_challenge(
        &self,
        user_id: UserId,
        id: ChallengeId,
        patch: ChallengePatch,
    ) -> Result<Challenge, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn_err)?;

        let current = fetch_challenge(&mut tx, user_id, id).await?;
        let updated = current.apply_patch(patch).map_err(invalid)?;
        ensure_notebook(&mut tx, user_id, Some(updated.notebook_id())).await?;

        sqlx::query(
            r"
                UPDATE challenges
                SET title = ?1,
                    description = ?2,
                    target_percentage = ?3,
                    notebook_id = ?4,
                    deadline = ?5
                WHERE id = ?6 AND user_id = ?7
            ",
        )
        .bind(updated.title())
        .bind(updated.description())
        .bind(updated.target_percentage())
        .bind(id_i64("notebook_id", updated.notebook_id().value())?)
        .bind(updated.deadline())
        .bind(id_i64("challenge_id", id.value())?)
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(conn_err)?;

        tx.commit().await.map_err(conn_err)?;
        Ok(updated)
    }

    async fn delete_challenge(
        &self,
        user_id: UserId,
        id: ChallengeId,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM challenges WHERE id = ?1 AND user_id = ?2")
            .bind(id_i64("challenge_id", id.value())?)
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
