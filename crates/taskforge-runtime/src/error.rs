use std::fmt;

/// Result type for taskforge-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Store layer error (carries the domain error kinds)
    Store(taskforge_store::Error),

    /// Completer capability error
    Completer(taskforge_providers::Error),

    /// Completer exceeded its deadline
    CompleterTimeout { seconds: u64 },

    /// Decomposer output did not parse into sub-task specs
    Decompose(taskforge_engine::DecomposeError),

    /// Execution prompt requested before analysis was saved
    NotAnalyzed(String),

    /// IO operation failed
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// Invalid input to an operation
    Validation(String),
}

impl Error {
    /// Stable error kind for the tool surface taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Store(err) => match err {
                taskforge_store::Error::NotFound(_) => "NotFound",
                taskforge_store::Error::InvalidTransition { .. } => "InvalidTransition",
                taskforge_store::Error::DependenciesNotDone { .. } => "DependenciesNotDone",
                taskforge_store::Error::Cycle(_) => "CycleError",
                taskforge_store::Error::MissingDependency(_) => "MissingDepError",
                taskforge_store::Error::HasDependents { .. } => "HasDependents",
                taskforge_store::Error::HasCompletedWork { .. } => "HasCompletedWork",
                taskforge_store::Error::ExternalDependents { .. } => "ExternalDependents",
                taskforge_store::Error::Validation(_) => "ValidationError",
                _ => "InternalError",
            },
            Error::Completer(_) => "UpstreamError",
            Error::CompleterTimeout { .. } => "UpstreamTimeout",
            Error::Decompose(_) => "ParseError",
            Error::NotAnalyzed(_) => "NotAnalyzed",
            Error::Validation(_) => "ValidationError",
            Error::Io(_) | Error::Config(_) => "InternalError",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Store(err) => write!(f, "{}", err),
            Error::Completer(err) => write!(f, "{}", err),
            Error::CompleterTimeout { seconds } => {
                write!(f, "Completer did not answer within {}s", seconds)
            }
            Error::Decompose(err) => write!(f, "{}", err),
            Error::NotAnalyzed(task_id) => write!(
                f,
                "Task {} has no saved analysis; call save_task_analysis first",
                task_id
            ),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            Error::Completer(err) => Some(err),
            Error::Decompose(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<taskforge_store::Error> for Error {
    fn from(err: taskforge_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<taskforge_providers::Error> for Error {
    fn from(err: taskforge_providers::Error) -> Self {
        Error::Completer(err)
    }
}

impl From<taskforge_engine::DecomposeError> for Error {
    fn from(err: taskforge_engine::DecomposeError) -> Self {
        Error::Decompose(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
