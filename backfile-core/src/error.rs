use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No filename assigned for url: {0}")]
    NotFound(String),

    #[error("Url has not been fetched yet: {0}")]
    NotFetched(String),

    #[error("Links already recorded for url: {0}")]
    AlreadyScanned(String),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] backfile_fetch::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Ledger serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
