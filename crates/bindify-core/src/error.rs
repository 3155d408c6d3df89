//! Unified Error Model
use thiserror::Error;

/// Fatal conditions. Anything recoverable is a
/// [`BuildWarning`](crate::data_model::BuildWarning) instead.
#[derive(Error, Debug)]
pub enum BindifyError {
    #[error("SCHEMA/{path}: {reason}")]
    Schema { path: String, reason: String },

    #[error("API/unknown target api '{0}' (expected gl, glx or wgl)")]
    UnknownApi(String),

    #[error("VERSION/{api} {requested} is below the minimum supported version {minimum}")]
    VersionBelowMinimum {
        api: String,
        requested: String,
        minimum: String,
    },

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("EMIT/{0}")]
    Emit(String),

    #[error("LOADER/{0}")]
    Loader(String),

    #[error("IO/{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl BindifyError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
