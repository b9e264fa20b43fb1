//! Crate-level error types.

use std::fmt;

use crate::gpu::BackendError;

/// Errors produced by the keel crate.
#[derive(Debug)]
pub enum KeelError {
    /// Backend resource creation or device failure.
    Backend(BackendError),
    /// A handle referred to a slot that was freed or never issued.
    StaleHandle(&'static str),
    /// A model source arrived with no surfaces.
    EmptyModel(String),
    /// A fixed-capacity shader slot allocator is full.
    SlotsExhausted(&'static str),
    /// The light kind has no shader-visible array.
    UnsupportedLightKind,
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for KeelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(e) => write!(f, "backend error: {e}"),
            Self::StaleHandle(kind) => {
                write!(f, "stale or unknown {kind} handle")
            }
            Self::EmptyModel(path) => {
                write!(f, "model '{path}' has no surfaces")
            }
            Self::SlotsExhausted(label) => {
                write!(f, "shader slot allocator '{label}' is full")
            }
            Self::UnsupportedLightKind => {
                write!(f, "light kind has no shader-visible array")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for KeelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BackendError> for KeelError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

impl From<std::io::Error> for KeelError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
