use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::Result;

/// A setting that is either shared by both sides of a comparison or given per side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Paired<T> {
    One(T),
    Two([T; 2]),
}

impl<T: Clone> Paired<T> {
    /// The `(base, comp)` values.
    pub fn pair(&self) -> (T, T) {
        match self {
            Paired::One(v) => (v.clone(), v.clone()),
            Paired::Two([base, comp]) => (base.clone(), comp.clone()),
        }
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, Paired::Two(_))
    }
}

/// How 1-D q points are spaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Log,
    Linear,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub qmax: f64,
    pub nq: usize,
    pub is2d: bool,
    /// Adds a `q = 0` point to 1-D grids.
    pub zero: bool,
    /// Pinhole resolution `dq/q`; 0 disables smearing.
    pub res: f64,
    pub view: View,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            qmax: 0.05,
            nq: 128,
            is2d: false,
            zero: false,
            res: 0.,
            view: View::Log,
        }
    }
}

/// `42` or `"random"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeedConfig {
    Value(u64),
    Named(String),
}

/// Backend availability overrides; unset fields keep the detected value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    pub accelerator: Option<bool>,
    pub half_precision: Option<bool>,
    pub legacy: Option<bool>,
}

/// The `sascomp` configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub model: Paired<String>,
    pub engine: Paired<String>,
    pub evals: Paired<u32>,
    pub cutoff: Paired<f64>,
    /// Randomizes the parameters; absent means preset values.
    pub seed: Option<SeedConfig>,
    /// Number of parameter sets to compare; 0 runs a single set.
    pub sets: u32,
    pub mono: bool,
    pub magnetic: bool,
    pub use_demo: bool,
    pub show_pars: bool,
    pub grid: GridConfig,
    /// Parameter overrides, `key=value` or `key=base,comp`.
    pub values: Vec<String>,
    pub capabilities: CapabilitiesConfig,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            model: Paired::One(String::new()),
            engine: Paired::One("default".into()),
            evals: Paired::One(1),
            cutoff: Paired::One(0.),
            seed: None,
            sets: 0,
            mono: true,
            magnetic: false,
            use_demo: true,
            show_pars: false,
            grid: GridConfig::default(),
            values: Vec::new(),
            capabilities: CapabilitiesConfig::default(),
        }
    }
}

impl CompareConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    /// `CompareError::Io` if the file cannot be read, `CompareError::Json` if it does not
    /// parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = CompareConfig::from_json(r#"{"model": "sphere"}"#).unwrap();

        assert_eq!(config.model, Paired::One("sphere".into()));
        assert_eq!(config.engine.pair(), ("default".into(), "default".into()));
        assert_eq!(config.grid, GridConfig::default());
        assert!(config.mono && config.use_demo && !config.magnetic);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn paired_fields_accept_two_values() {
        let json = r#"{
            "model": "sphere",
            "engine": ["single", "double!"],
            "evals": [1, 5],
            "seed": "random",
            "grid": {"nq": 16, "view": "linear"}
        }"#;
        let config = CompareConfig::from_json(json).unwrap();

        assert!(config.engine.is_paired());
        assert_eq!(config.evals.pair(), (1, 5));
        assert_eq!(config.seed, Some(SeedConfig::Named("random".into())));
        assert_eq!(config.grid.nq, 16);
        assert_eq!(config.grid.view, View::Linear);
        assert_eq!(config.grid.qmax, 0.05);
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = CompareConfig::from_json(r#"{"model": 3}"#).unwrap_err();
        assert!(matches!(err, crate::error::CompareError::Json(_)));
    }
}
