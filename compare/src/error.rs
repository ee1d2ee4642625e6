use std::{fmt, io};

use sas_core::SasErr;

/// All errors that can occur while driving a comparison.
#[derive(Debug)]
pub enum CompareError {
    /// Invalid configuration, caught before any model is evaluated.
    InvalidConfig(String),
    /// A model, parameter or engine error.
    Sas(SasErr),
    Io(io::Error),
    Json(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompareError>;

impl fmt::Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Sas(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "invalid JSON: {e}"),
        }
    }
}

impl std::error::Error for CompareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sas(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<SasErr> for CompareError {
    fn from(e: SasErr) -> Self {
        Self::Sas(e)
    }
}

impl From<io::Error> for CompareError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for CompareError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
