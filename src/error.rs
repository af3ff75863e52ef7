use std::time::Duration;

use thiserror::Error;

// Basic error handling with thiserror
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Connection to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout { endpoint: String, timeout: Duration },

    #[error("No host candidates configured")]
    NoCandidates,

    #[error("Could not reach any host candidate (last error: {0})")]
    Unreachable(Box<ChatError>),

    #[error("Line exceeds maximum length of {0} bytes")]
    LineTooLong(usize),

    #[error("Writer not available")]
    WriterUnavailable,

    #[error("No Tokio runtime available")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Task panicked or cancelled")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

impl ChatError {
    /// Short class name of the error, used as the prefix of session error strings.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::IoError(_) => "IoError",
            ChatError::ConnectTimeout { .. } => "ConnectTimeout",
            ChatError::NoCandidates => "NoCandidates",
            ChatError::Unreachable(_) => "Unreachable",
            ChatError::LineTooLong(_) => "LineTooLong",
            ChatError::WriterUnavailable => "WriterUnavailable",
            ChatError::NoRuntime => "NoRuntime",
            ChatError::InvalidConfig(_) => "InvalidConfig",
            ChatError::TaskJoinError(_) => "TaskJoinError",
        }
    }

    /// Human-readable `"<kind>: <message>"` string stored on the session.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }

    /// Helper to check if an error happened while establishing the connection
    /// (as opposed to mid-session I/O).
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            ChatError::ConnectTimeout { .. } | ChatError::NoCandidates | ChatError::Unreachable(_)
        )
    }
}
