use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a dataset snapshot could not be built.
///
/// These never cross the query interface: the store keeps the error next to an
/// empty record list and every query degrades to "no data".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("dataset file '{}' does not exist", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read dataset '{}': {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("dataset '{}' is not valid: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("dataset '{}' is not a sequence of records", path.display())]
    NotASequence { path: PathBuf },
}

/// Failure arm of the catalog query results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Missing {0}")]
    MissingArgument(&'static str),
}
