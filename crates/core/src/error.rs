use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Slot, Suggestion};

/// Failures the language front-end recovers from inside a turn.
///
/// Only `DownstreamCreationFailure` is reported back to the caller, after the
/// dialogue context has been reset.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NluError {
    #[error("no resort matches \"{query}\"")]
    EntityNotFound {
        query: String,
        suggestions: Vec<Suggestion>,
    },
    #[error("\"{query}\" matches {} resorts", .candidates.len())]
    AmbiguousMatch {
        query: String,
        candidates: Vec<Suggestion>,
    },
    #[error("could not read a date from \"{input}\"")]
    UnparsableTemporalExpression { input: String },
    #[error("missing required slot: {slot}")]
    MissingRequiredSlot { slot: Slot },
    #[error("{message}")]
    DownstreamCreationFailure { message: String },
    #[error("catalog fetch failed: {message}")]
    CatalogFetchFailure { message: String },
}

impl NluError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::DownstreamCreationFailure { .. })
    }
}
