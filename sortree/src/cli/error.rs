//! CLI-level errors (wraps library errors)

use thiserror::Error;

use crate::config::SettingsError;
use crate::errors::TreeError;
use crate::outline::OutlineError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("{0}")]
    Outline(#[from] OutlineError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no node at path: {0}")]
    NodeNotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Outline(_) | CliError::NodeNotFound(_) => crate::exitcode::DATAERR,
            CliError::Settings(SettingsError::NotFound(_)) => crate::exitcode::NOINPUT,
            CliError::Settings(_) => crate::exitcode::CONFIG,
            CliError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                crate::exitcode::NOINPUT
            }
            CliError::Io { .. } => crate::exitcode::IOERR,
            CliError::Tree(_) => crate::exitcode::SOFTWARE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exitcode;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::InvalidArgs("x".into()).exit_code(), exitcode::USAGE);
        assert_eq!(CliError::NodeNotFound("a/b".into()).exit_code(), exitcode::DATAERR);
        assert_eq!(
            CliError::from(TreeError::Incomparable).exit_code(),
            exitcode::SOFTWARE
        );
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(CliError::io("read", missing).exit_code(), exitcode::NOINPUT);
    }
}
