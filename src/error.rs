use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Run-level errors.
///
/// Anything surfaced through this type stops the run. Per-item trouble is reported through
/// [`FailureKind`] instead so one bad chunk never takes the rest of the batch down with it.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing prompt file, missing input directory, invalid options.
    #[error("setup error: {0}")]
    Setup(String),

    /// The failure journal could not be read or written.
    ///
    /// This is fatal: continuing would risk forgetting failures between runs.
    #[error("failure journal '{}': {source}", .path.display())]
    Journal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn setup(message: impl Into<String>) -> Self {
        Self::Setup(message.into())
    }

    pub(crate) fn journal(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Journal {
            path: path.into(),
            source,
        }
    }

    /// Whether this error happened before any work item was touched.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

/// Why a single work item did not produce an output file.
///
/// Every variant is recorded in the failure journal and retried on the next run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// The transformation service errored or returned empty text on every attempt.
    #[error("gave up after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// The source file could not be read as a document.
    #[error("unreadable input '{}': {reason}", .path.display())]
    MalformedInput { path: PathBuf, reason: String },

    /// The transformed text could not be written.
    #[error("failed to write output '{}': {reason}", .path.display())]
    OutputWrite { path: PathBuf, reason: String },
}
