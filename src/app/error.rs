use thiserror::Error;

use crate::archiver::ArchiveError;
use crate::resolver::ResolveError;

#[derive(Error, Debug)]
pub enum MagpieError {
    #[error("{0}")]
    Validation(String),

    #[error("Image search unavailable: {0}")]
    ResolverUnavailable(#[from] ResolveError),

    #[error("No images found or could be downloaded for '{query}'")]
    EmptyBatch { query: String },

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

/// The four failure classes a caller is expected to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ResolverUnavailable,
    EmptyBatch,
    Internal,
}

impl MagpieError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MagpieError::Validation(_) => ErrorKind::Validation,
            MagpieError::ResolverUnavailable(_) => ErrorKind::ResolverUnavailable,
            MagpieError::EmptyBatch { .. } => ErrorKind::EmptyBatch,
            MagpieError::Archive(_)
            | MagpieError::Http(_)
            | MagpieError::Io(_)
            | MagpieError::Config(_)
            | MagpieError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to show an end user. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation => self.to_string(),
            ErrorKind::ResolverUnavailable => {
                "The image search service is unavailable right now. Please try again later."
                    .to_string()
            }
            ErrorKind::EmptyBatch => format!("{}. Please try a different search term.", self),
            ErrorKind::Internal => {
                "An error occurred during the process. Please check the logs for details."
                    .to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MagpieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            MagpieError::Validation("empty".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            MagpieError::EmptyBatch {
                query: "cats".into()
            }
            .kind(),
            ErrorKind::EmptyBatch
        );
        assert_eq!(
            MagpieError::ResolverUnavailable(ResolveError::MissingToken).kind(),
            ErrorKind::ResolverUnavailable
        );
        assert_eq!(
            MagpieError::Internal("boom".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = MagpieError::Validation("Please enter a search term.".into());
        assert_eq!(err.user_message(), "Please enter a search term.");
    }

    #[test]
    fn test_empty_batch_message_suggests_another_query() {
        let err = MagpieError::EmptyBatch {
            query: "zzqx".into(),
        };
        let msg = err.user_message();
        assert!(msg.contains("'zzqx'"));
        assert!(msg.contains("different search term"));
    }

    #[test]
    fn test_internal_message_hides_detail() {
        let err = MagpieError::Io(std::io::Error::other("disk on fire"));
        assert!(!err.user_message().contains("disk on fire"));
    }
}
