use crate::model::MonthKey;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatError>;

#[derive(Error, Debug)]
pub enum StatError {
    #[error("Git command failed: {0}")]
    GitCommand(String),
    #[error("Failed to read directory {}: {source}", path.display())]
    DirectoryListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed statistics line {line} ({reason}): {content:?}")]
    MalformedStatLine {
        line: usize,
        reason: &'static str,
        content: String,
    },
    #[error("Scan of {} for {month} failed: {source}", dir.display())]
    Scan {
        dir: PathBuf,
        month: MonthKey,
        #[source]
        source: Box<StatError>,
    },
    #[error("Invalid scan plan: {0}")]
    InvalidPlan(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatError {
    pub(crate) fn scan(dir: impl Into<PathBuf>, month: MonthKey, source: StatError) -> Self {
        StatError::Scan {
            dir: dir.into(),
            month,
            source: Box::new(source),
        }
    }
}
