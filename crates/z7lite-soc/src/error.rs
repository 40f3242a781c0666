//! SoC composition errors.

use thiserror::Error;
use z7lite_platform::{ErrorKind, PlatformError};

/// Errors that can occur while planning or composing the SoC.
#[derive(Debug, Error)]
pub enum SocError {
    #[error("system clock must be exactly {required} Hz when sourced from the hard processor, got {requested} Hz")]
    FrequencyMismatch { requested: u64, required: u64 },

    #[error("CPU type '{cpu}' needs direct hard-processor integration, which is not implemented")]
    UnimplementedCpu { cpu: String },

    #[error("invalid frequency for {what}: {hz} Hz")]
    InvalidFrequency { what: String, hz: u64 },

    #[error("unknown UART '{name}'")]
    UnknownUart { name: String },

    #[error("clock generator '{generator}': {detail}")]
    ClockGenerator { generator: String, detail: String },

    #[error("{feature} needs the '{domain}' clock domain, which is not driven when {reason}")]
    UndrivenDomain {
        feature: String,
        domain: String,
        reason: String,
    },

    #[error("clock domain '{name}' is not available")]
    MissingDomain { name: String },

    #[error("domain '{domain}' runs at {domain_hz} Hz but timings {timings} need {timings_hz} Hz")]
    PixelClockMismatch {
        domain: String,
        domain_hz: u64,
        timings: String,
        timings_hz: u64,
    },

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SocError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SocError::Platform(e) => e.kind(),
            SocError::MissingDomain { .. } => ErrorKind::Lookup,
            SocError::Serialize(_) => ErrorKind::Io,
            _ => ErrorKind::Configuration,
        }
    }
}

/// Result type for SoC operations.
pub type Result<T> = std::result::Result<T, SocError>;
