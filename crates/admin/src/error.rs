use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Storage error: {0}")]
    StorageError(#[from] storage::error::StorageError),

    #[error("Competition {0} not found")]
    CompetitionNotFound(i32),

    #[error("Member {0} is not a recorder")]
    NotARecorder(i32),
}
