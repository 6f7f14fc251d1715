use thiserror::Error;

use crate::extractor::ExtractError;

pub type Result<T> = std::result::Result<T, ShellError>;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("admin privileges required")]
    Forbidden,
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Ledger(#[from] ledger::LedgerError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
