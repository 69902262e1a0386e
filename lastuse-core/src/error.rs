//! Typed error handling for lastuse.
//!
//! These are operational failures (reading files, loading configuration).
//! Findings in the analyzed code are never errors; they are
//! [`Diagnostic`](crate::diagnostic::Diagnostic)s.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for lastuse operations.
#[derive(Error, Debug)]
pub enum LastuseError {
    /// I/O error when reading files or walking directories
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Source file is not valid UTF-8
    #[error("Encoding error in {path}: file is not valid UTF-8")]
    Encoding { path: PathBuf },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl LastuseError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an encoding error.
    pub fn encoding(path: impl Into<PathBuf>) -> Self {
        Self::Encoding { path: path.into() }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if analysis of other files can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Encoding { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Encoding { path } => Some(path),
            Self::Config { path, .. } => Some(path),
            Self::InvalidArgument { .. } => None,
        }
    }
}

/// Convenience type alias for lastuse results.
pub type LastuseResult<T> = Result<T, LastuseError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> LastuseResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> LastuseResult<T> {
        self.map_err(|e| LastuseError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = LastuseError::io(
            PathBuf::from("/test/main.c"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, LastuseError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/test/main.c")));
        assert!(err.to_string().contains("/test/main.c"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(LastuseError::encoding("/bin.c").is_recoverable());
        assert!(!LastuseError::config("lastuse.toml", "bad").is_recoverable());
        assert!(!LastuseError::invalid_argument("--jobs 0").is_recoverable());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let lastuse_result = result.with_path("/missing/file.c");
        assert!(matches!(lastuse_result, Err(LastuseError::Io { .. })));
    }
}
