//! Error types for mapsync-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Why one job failed. None of these abort sibling jobs.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unexpected response: status {status}, content type {content_type:?}: {body}")]
    InvalidResponse {
        status: u16,
        content_type: Option<String>,
        /// Leading part of the error body, for diagnostics.
        body: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {} into place after {attempts} attempts: {source}", path.display())]
    CommitFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("no download mirror configured")]
    NoSource,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown delivery variant: {0} (expected full, novideo or mini)")]
pub struct ParseVariantError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_path_and_attempts() {
        let err = FetchError::CommitFailed {
            path: PathBuf::from("out/42.osz"),
            attempts: 3,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "locked"),
        };
        let msg = err.to_string();
        assert!(msg.contains("42.osz"));
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("locked"));
    }

    #[test]
    fn test_invalid_response_display() {
        let err = FetchError::InvalidResponse {
            status: 200,
            content_type: Some("text/html".into()),
            body: "<html>".into(),
        };
        assert!(err.to_string().contains("text/html"));
    }
}
