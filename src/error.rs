//! Error types for ews-private-flag

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("connection error: {0}")]
    Connect(String),

    #[error("folder search error: {0}")]
    FolderSearch(String),

    #[error("item search error: {0}")]
    ItemSearch(String),

    #[error("folder path lookup error: {0}")]
    FolderPath(String),

    #[error("item update error: {0}")]
    Update(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("response parsing error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Missing configuration exits with 1, a failed folder path lookup
    /// during name filtering with 2, and every fatal remote failure
    /// (connect, folder search, item search) with 3.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::FolderPath(_) => 2,
            _ => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
