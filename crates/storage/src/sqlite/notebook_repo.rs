use sheet_core::model::{Notebook, UserId, validate_notebook_name};

use super::mapping::{map_notebook_row, notebook_id_from_i64};
use super::{SqliteRepository, conn_err};
use crate::repository::{NewNotebookRecord, NotebookRepository, StorageError, invalid};

#[async_trait::async_trait]
impl NotebookRepository for SqliteRepository {
    async fn insert_new_notebook(
        &self,
        record: NewNotebookRecord,
    ) -> Result<Notebook, StorageError> {
        let name = validate_notebook_name(record.name).map_err(invalid)?;

        let res = sqlx::query(
            r"
                INSERT INTO notebooks (user_id, name, created_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(record.user_id.as_uuid())
        .bind(&name)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn_err)?;

        let id = notebook_id_from_i64(res.last_insert_rowid())?;
        Notebook::new(id, name, record.created_at).map_err(invalid)
    }

    async fn list_notebooks(&self, user_id: UserId) -> Result<Vec<Notebook>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, name, created_at
                FROM notebooks
                WHERE user_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(conn_err)?;

        let mut notebooks = Vec::with_capacity(rows.len());
        for row in rows {
            notebooks.push(map_notebook_row(&row)?);
        }
        Ok(notebooks)
    }
}
