use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::NotebookId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotebookError {
    #[error("notebook name cannot be empty")]
    EmptyName,
}

/// A named grouping of quizzes by subject ("caderno").
///
/// Goals and challenges reference notebooks only to scope which attempts
/// count toward them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    id: NotebookId,
    name: String,
    created_at: DateTime<Utc>,
}

impl Notebook {
    /// Creates a new notebook.
    ///
    /// # Errors
    ///
    /// Returns `NotebookError::EmptyName` if name is empty or whitespace-only.
    pub fn new(
        id: NotebookId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, NotebookError> {
        let name = validate_name(name)?;
        Ok(Self {
            id,
            name,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> NotebookId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Trims a notebook name and rejects blank input.
///
/// # Errors
///
/// Returns `NotebookError::EmptyName` for blank names.
pub fn validate_name(name: impl Into<String>) -> Result<String, NotebookError> {
    let name = name.into();
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NotebookError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn notebook_trims_name() {
        let nb = Notebook::new(NotebookId::new(3), "  Direito Penal ", fixed_now()).unwrap();
        assert_eq!(nb.name(), "Direito Penal");
        assert_eq!(nb.id(), NotebookId::new(3));
    }

    #[test]
    fn notebook_rejects_blank_name() {
        let err = Notebook::new(NotebookId::new(1), "   ", fixed_now()).unwrap_err();
        assert_eq!(err, NotebookError::EmptyName);
    }
}
