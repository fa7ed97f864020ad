//! Error types for seed finding.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage that owns a count-then-fill buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BottomDoublets,
    TopDoublets,
    Triplets,
    Seeds,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::BottomDoublets => write!(f, "bottom doublets"),
            Stage::TopDoublets => write!(f, "top doublets"),
            Stage::Triplets => write!(f, "triplets"),
            Stage::Seeds => write!(f, "seeds"),
        }
    }
}

/// Errors that can occur during seed finding.
///
/// An event without any compatible doublets, triplets or seeds is not an
/// error: the pipeline returns an empty collection instead.
#[derive(Debug, Error)]
pub enum SeedingError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// A fill pass wrote a different number of items than its count pass
    /// reserved for the lane. This is a logic defect, never a transient
    /// condition.
    #[error("Count mismatch in {stage}, lane {lane}: counted {counted}, written {written}")]
    CountMismatch {
        stage: Stage,
        lane: usize,
        counted: usize,
        written: usize,
    },

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported configuration file: {0}")]
    ConfigFormat(#[from] common::FileExtensionError),

    #[error("Failed to parse configuration file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: common::SerdeFormatError,
    },
}

impl SeedingError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SeedingError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeedingError>;
