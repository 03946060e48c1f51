use std::sync::Arc;

use sheet_core::model::{Notebook, UserId, validate_notebook_name};
use storage::repository::{NewNotebookRecord, NotebookRepository};
use tracing::info;

use crate::Clock;
use crate::error::NotebookServiceError;

/// Creates and lists the user's notebooks.
#[derive(Clone)]
pub struct NotebookService {
    clock: Clock,
    user_id: UserId,
    notebooks: Arc<dyn NotebookRepository>,
}

impl NotebookService {
    #[must_use]
    pub fn new(clock: Clock, user_id: UserId, notebooks: Arc<dyn NotebookRepository>) -> Self {
        Self {
            clock,
            user_id,
            notebooks,
        }
    }

    /// Create a notebook with the given name.
    ///
    /// # Errors
    ///
    /// Returns `NotebookServiceError::Notebook` for a blank name.
    /// Returns `NotebookServiceError::Storage` if persistence fails.
    pub async fn create_notebook(&self, name: String) -> Result<Notebook, NotebookServiceError> {
        let name = validate_notebook_name(name)?;
        let notebook = self
            .notebooks
            .insert_new_notebook(NewNotebookRecord {
                user_id: self.user_id,
                name,
                created_at: self.clock.now(),
            })
            .await?;
        info!(notebook_id = %notebook.id(), name = notebook.name(), "notebook created");
        Ok(notebook)
    }

    /// # Errors
    ///
    /// Returns `NotebookServiceError::Storage` if repository access fails.
    pub async fn list_notebooks(&self) -> Result<Vec<Notebook>, NotebookServiceError> {
        Ok(self.notebooks.list_notebooks(self.user_id).await?)
    }
}
