use std::ops::RangeInclusive;

use crate::app::{MagpieError, Result};

pub const DEFAULT_MIN_LIMIT: usize = 10;
pub const DEFAULT_MAX_LIMIT: usize = 200;

/// A validated query and result limit for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    query: String,
    limit: usize,
}

impl RetrievalRequest {
    /// Validate a request against the accepted limit range.
    ///
    /// The query is trimmed; a blank query or a limit outside `range` is
    /// rejected before any I/O happens.
    pub fn new(query: &str, limit: usize, range: RangeInclusive<usize>) -> Result<Self> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MagpieError::Validation(
                "Please enter a search term.".to_string(),
            ));
        }

        if !range.contains(&limit) {
            return Err(MagpieError::Validation(format!(
                "Number of images must be between {} and {}, got {}.",
                range.start(),
                range.end(),
                limit
            )));
        }

        Ok(Self {
            query: query.to_string(),
            limit,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
