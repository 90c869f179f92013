use crate::interfaces::HostError;
use std::io;

/// Errors that can occur during hostpilot operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No running host instance found")]
    HostNotRunning,

    #[error("No host instance with process id {0}")]
    InstanceNotFound(u32),

    #[error("No solution is open")]
    NoSolution,

    #[error("No project matches '{0}'")]
    ProjectNotFound(String),

    #[error("No file matches '{0}'")]
    FileNotFound(String),

    #[error("No configuration matches '{0}'")]
    ConfigurationNotFound(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("The solution has no active configuration")]
    NoActiveConfiguration,

    /// Host failure text, passed through verbatim
    #[error("{0}")]
    Host(String),

    #[error("{step} step failed: {message}")]
    BuildStep { step: &'static str, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl Error {
    /// Resolution failures: nothing matched, nothing running, nothing open
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::HostNotRunning
                | Error::InstanceNotFound(_)
                | Error::NoSolution
                | Error::ProjectNotFound(_)
                | Error::FileNotFound(_)
                | Error::ConfigurationNotFound(_)
        )
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }
}

impl From<HostError> for Error {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Busy => Error::Host("host remained busy, call rejected".to_string()),
            HostError::Unavailable(what) => Error::Host(format!("{what} is unavailable")),
            HostError::Failed(message) => Error::Host(message),
        }
    }
}

/// Result type alias for hostpilot operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_failure_text_is_verbatim() {
        let err: Error = HostError::Failed("Build failed: 3 errors".to_string()).into();
        assert_eq!(err.to_string(), "Build failed: 3 errors");
    }

    #[test]
    fn test_classification() {
        assert!(Error::ProjectNotFound("Foo".into()).is_not_found());
        assert!(Error::HostNotRunning.is_not_found());
        assert!(!Error::Usage("bad".into()).is_not_found());
        assert!(Error::Usage("bad".into()).is_usage());
        assert!(!Error::Host("boom".into()).is_usage());
    }
}
