use std::fmt;

/// Result type for taskforge-providers operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the completer layer
#[derive(Debug)]
pub enum Error {
    /// Completer process could not be spawned
    Spawn(String),

    /// IO while talking to the completer
    Io(std::io::Error),

    /// Completer ran but reported failure
    Upstream(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spawn(msg) => write!(f, "Failed to start completer: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Upstream(msg) => write!(f, "Completer error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Spawn(_) | Error::Upstream(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
