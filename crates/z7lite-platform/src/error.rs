//! Error types for pin and connector operations.

use std::path::PathBuf;

/// Broad classification shared by every layer of the board target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The target description is unsatisfiable (duplicate binding, pin conflict, ...).
    Configuration,
    /// A signal, connector, or pad that does not exist was referenced.
    Lookup,
    /// An external tool (synthesis, programmer) returned a failure status.
    ExternalTool,
    /// Reading or writing a file failed.
    Io,
}

/// Errors that can occur while building or querying a platform description.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Requested signal is not registered.
    #[error("unknown signal '{name}' instance {instance}")]
    UnknownSignal { name: String, instance: u32 },

    /// Requested signal name has no instances at all.
    #[error("unknown signal '{name}'")]
    UnknownSignalName { name: String },

    /// A pad reference names a connector the platform does not have.
    #[error("unknown connector '{name}'")]
    UnknownConnector { name: String },

    /// A pad reference is outside the connector's pad range.
    #[error("connector '{connector}' has no pad {pad} (pads are 1..={count})")]
    PadOutOfRange {
        connector: String,
        pad: usize,
        count: usize,
    },

    /// The same (name, instance) was requested twice.
    #[error("signal '{name}' instance {instance} is already bound")]
    DuplicateBinding { name: String, instance: u32 },

    /// A package pin would drive two different nets.
    #[error("pin {pin} of {requested} is already bound to {owner}")]
    PinConflict {
        pin: String,
        requested: String,
        owner: String,
    },

    /// A table lists the same (name, instance) twice.
    #[error("signal '{name}' instance {instance} is defined more than once")]
    DuplicateEntry { name: String, instance: u32 },

    /// An extension table reuses a name that is already registered.
    #[error("extension signal '{name}' collides with an existing entry")]
    NameCollision { name: String },

    /// A connector's pad list does not match its header geometry.
    #[error("connector '{name}' has {actual} pads, geometry requires {expected}")]
    ConnectorGeometry {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Malformed pin identifier, standard, or hint.
    #[error("invalid {what}: '{value}'")]
    Invalid { what: &'static str, value: String },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading an extension table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Extension table file not found.
    #[error("extension table not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },
}

impl PlatformError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlatformError::UnknownSignal { .. }
            | PlatformError::UnknownSignalName { .. }
            | PlatformError::UnknownConnector { .. }
            | PlatformError::PadOutOfRange { .. }
            | PlatformError::NotFound { .. } => ErrorKind::Lookup,
            PlatformError::Io(_) => ErrorKind::Io,
            _ => ErrorKind::Configuration,
        }
    }
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
