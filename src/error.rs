//! Error types shared by the ingestion pipeline and the host capabilities.
//!
//! Per-item conversion failures are [`MediaError`]s. They are logged and folded
//! into the batch's `fails` list rather than returned to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single media source failed to turn into an inline element.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to set up the HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: server answered {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{context} ({path}): {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("media source has neither a path nor a URL")]
    EmptySource,

    #[error("transcoder produced no output for {input}")]
    NoOutput { input: PathBuf },

    #[error("media store rejected {path}: {reason}")]
    Store { path: PathBuf, reason: String },

    #[error("background task failed: {0}")]
    Task(String),
}

impl MediaError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MediaError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

/// Failures reported by the host application behind the capability traits.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),

    #[error("note {0} not found")]
    NoteNotFound(i64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A background task that never produced its output (it panicked, or was
/// cancelled with the runtime).
#[derive(Debug, Clone, Error)]
#[error("background task {task} failed: {reason}")]
pub struct TaskFailed {
    pub task: &'static str,
    pub reason: String,
}

impl TaskFailed {
    pub fn new(task: &'static str, reason: impl Into<String>) -> Self {
        Self {
            task,
            reason: reason.into(),
        }
    }
}
