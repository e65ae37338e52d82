//! Error types for cpcontainer.

use thiserror::Error;

/// Result type alias using cpcontainer's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cpcontainer.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Caller Errors
    // =========================================================================
    #[error("Validation failed: {0}")]
    Validation(String),

    // =========================================================================
    // Runtime Invocation Errors
    // =========================================================================
    #[error("`{command}` failed ({}): {stderr}", describe_exit(.exit_code))]
    Invocation {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{kind} not found: {name}")]
    NotFound {
        kind: &'static str,
        name: String,
        stderr: String,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    // =========================================================================
    // Output Errors
    // =========================================================================
    #[error("Failed to parse {kind}: {message}")]
    Parse { kind: &'static str, message: String },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invocation error from a failed runtime call.
    pub fn invocation(args: &[String], exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::Invocation {
            command: args.join(" "),
            exit_code,
            stderr: stderr.into().trim().to_string(),
        }
    }

    /// Create a not-found error for a resource the runtime reported absent.
    pub fn not_found(kind: &'static str, name: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
            stderr: stderr.into().trim().to_string(),
        }
    }

    /// Create a parse error.
    pub fn parse(kind: &'static str, msg: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            message: msg.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Whether the runtime affirmatively reported the resource absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the runtime exited nonzero. Includes [`Error::NotFound`].
    pub fn is_invocation_failure(&self) -> bool {
        matches!(self, Self::Invocation { .. } | Self::NotFound { .. })
    }

    /// Whether the failure came from decoding runtime output.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Whether the caller supplied malformed input.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
