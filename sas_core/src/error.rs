use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::{BetaError, uniform::Error as UniformError};

/// The result type used across the harness crates.
pub type Result<T> = std::result::Result<T, SasErr>;

/// The harness error type.
#[derive(Debug, Clone, PartialEq)]
pub enum SasErr {
    /// A parameter key does not resolve to a declared parameter or one of its variants.
    UnknownParameter { model: String, name: String },
    /// A parameter required by a repair or an engine is absent from the set.
    MissingParameter { model: String, name: String },
    /// A numeric value was expected but a categorical one was found.
    NotNumeric { name: String },
    /// A numeric sampling range was requested for a categorical parameter.
    CategoricalRange { name: String },
    /// A sampling interval is empty or not finite.
    InvalidRange { name: String, low: f64, high: f64 },
    /// A value is outside the vocabulary of its parameter.
    InvalidValue { name: String, value: String },
    /// A probability distribution could not be built.
    Distribution(String),
    /// The requested backend or precision is not present in this runtime.
    Unavailable { backend: String, reason: String },
    /// The model has no equivalent in the legacy adapter.
    UnknownLegacyModel { model: String },
    /// The composite model cannot be expressed by the requested backend.
    UnsupportedComposite { model: String, reason: String },
    /// The model is not in the catalog.
    UnknownModel { name: String },
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
}

impl SasErr {
    /// Whether this error means a side of a comparison could not be computed at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SasErr::Unavailable { .. })
    }
}

impl Display for SasErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SasErr::UnknownParameter { model, name } => {
                write!(f, "{name:?} is not a parameter of model {model}")
            }
            SasErr::MissingParameter { model, name } => {
                write!(f, "model {model} requires parameter {name:?}")
            }
            SasErr::NotNumeric { name } => write!(f, "parameter {name:?} is not numeric"),
            SasErr::CategoricalRange { name } => {
                write!(f, "cannot return a range for categorical parameter {name:?}")
            }
            SasErr::InvalidRange { name, low, high } => {
                write!(f, "empty sampling range [{low}, {high}] for parameter {name:?}")
            }
            SasErr::InvalidValue { name, value } => {
                write!(f, "invalid value {value:?} for parameter {name:?}")
            }
            SasErr::Distribution(msg) => write!(f, "distribution error: {msg}"),
            SasErr::Unavailable { backend, reason } => {
                write!(f, "{backend} backend not available: {reason}")
            }
            SasErr::UnknownLegacyModel { model } => {
                write!(f, "model {model:?} does not exist in the legacy engine")
            }
            SasErr::UnsupportedComposite { model, reason } => {
                write!(f, "composite model {model:?} is not supported: {reason}")
            }
            SasErr::UnknownModel { name } => write!(f, "could not find model {name:?}"),
            SasErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "size mismatch for {what}: got {got}, expected {expected}"),
        }
    }
}

impl Error for SasErr {}

impl From<BetaError> for SasErr {
    fn from(value: BetaError) -> Self {
        Self::Distribution(value.to_string())
    }
}

impl From<UniformError> for SasErr {
    fn from(value: UniformError) -> Self {
        Self::Distribution(value.to_string())
    }
}
