use std::{fmt, str::FromStr};

use sas_core::SasErr;

use crate::precision::Precision;

/// The precision asked for on the command line or in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecisionRequest {
    /// The engine picks: single for models that tolerate it, otherwise double.
    Default,
    Named(Precision),
    /// Extended precision; no backend provides it.
    Quad,
}

impl FromStr for PrecisionRequest {
    type Err = SasErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let request = match s {
            "" | "default" => PrecisionRequest::Default,
            "half" | "f16" | "float16" => PrecisionRequest::Named(Precision::Half),
            "fast" => PrecisionRequest::Named(Precision::Fast),
            "single" | "f32" | "float32" | "float" => PrecisionRequest::Named(Precision::Single),
            "double" | "f64" | "float64" => PrecisionRequest::Named(Precision::Double),
            "quad" | "float128" | "longdouble" => PrecisionRequest::Quad,
            other => {
                return Err(SasErr::InvalidValue {
                    name: "engine".into(),
                    value: other.into(),
                });
            }
        };
        Ok(request)
    }
}

/// Which engine to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSpec {
    /// The legacy model library, through its adapter.
    Legacy,
    /// The data-parallel backend.
    Accelerated(PrecisionRequest),
    /// The one-point-at-a-time backend; written with a trailing `!`.
    Sequential(PrecisionRequest),
}

impl FromStr for EngineSpec {
    type Err = SasErr;

    /// Parses `legacy` (or `sasview`), a precision name such as `single`, or a precision
    /// name followed by `!` for the sequential backend.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if matches!(s, "legacy" | "sasview") {
            return Ok(EngineSpec::Legacy);
        }

        match s.strip_suffix('!') {
            Some(name) => Ok(EngineSpec::Sequential(name.parse()?)),
            None => Ok(EngineSpec::Accelerated(s.parse()?)),
        }
    }
}

impl fmt::Display for EngineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |request: &PrecisionRequest| match request {
            PrecisionRequest::Default => "default",
            PrecisionRequest::Quad => "quad",
            PrecisionRequest::Named(Precision::Half) => "half",
            PrecisionRequest::Named(Precision::Fast) => "fast",
            PrecisionRequest::Named(Precision::Single) => "single",
            PrecisionRequest::Named(Precision::Double) => "double",
        };
        match self {
            EngineSpec::Legacy => write!(f, "legacy"),
            EngineSpec::Accelerated(r) => write!(f, "{}", name(r)),
            EngineSpec::Sequential(r) => write!(f, "{}!", name(r)),
        }
    }
}
