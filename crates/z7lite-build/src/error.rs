//! Build and load errors.

use std::path::PathBuf;

use thiserror::Error;
use z7lite_platform::ErrorKind;
use z7lite_soc::SocError;

/// Errors that can occur while building or loading a bitstream.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to invoke {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed ({}): {stderr}", exit_status(.code))]
    ExternalTool {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("artifact not found: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {what}: '{value}'")]
    Invalid { what: &'static str, value: String },

    #[error(transparent)]
    Soc(#[from] SocError),
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".to_string(),
    }
}

impl BuildError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::Spawn { .. } | BuildError::ExternalTool { .. } => ErrorKind::ExternalTool,
            BuildError::ArtifactMissing { .. } => ErrorKind::Lookup,
            BuildError::Write { .. } => ErrorKind::Io,
            BuildError::Invalid { .. } => ErrorKind::Configuration,
            BuildError::Soc(e) => e.kind(),
        }
    }

    /// Exit status of the failed tool, when it reported one.
    pub fn tool_exit_code(&self) -> Option<i32> {
        match self {
            BuildError::ExternalTool { code, .. } => *code,
            _ => None,
        }
    }
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
