//! Crate error type.
//!
//! Only programmer and configuration errors surface here. Statistical misses
//! inside the synthesizer are reported through [`crate::synthesis::Synthesis`]
//! and never become errors.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StimgenError>;

#[derive(Debug, Error)]
pub enum StimgenError {
    #[error("{topics} topics cannot be split evenly across {levels} correlation levels")]
    UnevenTopicGroups { topics: usize, levels: usize },

    #[error("at least one correlation level is required")]
    EmptyLevels,

    #[error("at least one stimulus variant per (level, topic) is required")]
    NoVariants,

    #[error("at least one reveal delay is required")]
    EmptyRevealDelays,

    #[error("mismatched lengths for {what}: {left} vs {right}")]
    MismatchedLengths {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("duplicate component id: {0}")]
    DuplicateComponent(String),

    #[error("sequence references unknown component: {0}")]
    UnknownComponent(String),

    #[error("unknown sequence slot: {0}")]
    UnknownSlot(String),

    #[error("scheme {scheme} breaks matching for topic {topic}")]
    UnmatchedScheme { scheme: String, topic: usize },

    #[error("malformed study document: {0}")]
    DocumentShape(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StimgenError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString) -> Self {
        StimgenError::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StimgenError::Io {
            path: path.into(),
            source,
        }
    }
}
