use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Core error type for monaco-workers operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown language worker label '{label}'")]
    UnknownWorkerLabel { label: String },

    #[error("Cannot resolve worker entry '{entry}' (tried {} location(s))", .tried.len())]
    Resolution { entry: String, tried: Vec<PathBuf> },

    #[error("Failed to bundle worker entry '{entry}': {message}")]
    Build { entry: String, message: String },

    #[error("Failed to prepare cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create distribution directory {path}: {source}")]
    DistDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The same failure observed by every request that awaited one build.
    #[error(transparent)]
    Shared(Arc<Error>),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Take ownership of a shared error when this is the last holder.
    #[must_use]
    pub fn from_shared(shared: Arc<Error>) -> Self {
        Arc::try_unwrap(shared).unwrap_or_else(Self::Shared)
    }

    /// The underlying error, looking through [`Error::Shared`].
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Self::Shared(inner) => inner.root(),
            other => other,
        }
    }

    /// Whether the entry module could not be found on disk.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::Resolution { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_shared_unwraps_last_holder() {
        let shared = Arc::new(Error::other("boom"));
        assert!(matches!(Error::from_shared(shared), Error::Other(_)));
    }

    #[test]
    fn test_from_shared_keeps_arc_when_shared() {
        let shared = Arc::new(Error::Resolution {
            entry: "monaco-editor/esm/vs/language/json/json.worker".to_string(),
            tried: vec![],
        });
        let other = Arc::clone(&shared);
        let err = Error::from_shared(shared);
        assert!(matches!(err, Error::Shared(_)));
        assert!(err.is_not_found());
        drop(other);
    }

    #[test]
    fn test_resolution_message_counts_candidates() {
        let err = Error::Resolution {
            entry: "x/worker".to_string(),
            tried: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        };
        assert_eq!(
            err.to_string(),
            "Cannot resolve worker entry 'x/worker' (tried 2 location(s))"
        );
    }
}
