use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database unavailable")]
    Unavailable,
    #[error("no professor linked to user {0}")]
    ProfessorNotFound(i64),
    #[error(transparent)]
    Query(#[from] sqlx::Error),
}
