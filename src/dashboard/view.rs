use serde::Serialize;

use crate::dashboard::error::RepoError;

pub const DB_UNAVAILABLE: &str = "Base de données non disponible";

/// Inline message shown to the professor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }

    /// Maps a data-access failure to display text. `context` prefixes query errors.
    pub fn from_repo_error(err: &RepoError, context: &str) -> Self {
        match err {
            RepoError::Unavailable => Notice::Error(DB_UNAVAILABLE.to_string()),
            RepoError::ProfessorNotFound(_) => {
                Notice::Error("Profil professeur non trouvé".to_string())
            }
            RepoError::Query(e) => Notice::Error(format!("{context}{e}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: i64,
}

/// Read-only key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

impl Field {
    pub fn new(label: &'static str, value: impl ToString) -> Self {
        Self {
            label,
            value: value.to_string(),
        }
    }
}
