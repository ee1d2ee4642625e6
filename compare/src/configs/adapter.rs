use engines::{Capabilities, EngineSpec};
use rand::Rng;
use randomization::with_rng;
use sas_core::{EvalGrid, Resolution};

use super::{CapabilitiesConfig, CompareConfig, GridConfig, SeedConfig, View};
use crate::error::{CompareError, Result};

/// A parameter override, with the value for each side. An empty side is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub key: String,
    pub base: Option<String>,
    pub comp: Option<String>,
}

/// A validated configuration, with every per-side setting resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub models: [String; 2],
    pub engines: [EngineSpec; 2],
    pub evals: [u32; 2],
    pub cutoff: [f64; 2],
    /// Whether a second engine runs at all.
    pub comparison: bool,
    pub seed: Option<u64>,
    pub sets: u32,
    pub mono: bool,
    pub magnetic: bool,
    pub use_demo: bool,
    pub show_pars: bool,
    pub grid: GridConfig,
    pub presets: Vec<Preset>,
    pub capabilities: Capabilities,
}

impl Plan {
    /// Builds the evaluation grid the plan describes.
    pub fn build_grid(&self) -> EvalGrid {
        let GridConfig {
            qmax,
            nq,
            is2d,
            zero,
            res,
            view,
        } = self.grid;

        if is2d {
            return EvalGrid::square_2d(qmax, nq);
        }

        let grid = if view == View::Log && !zero {
            EvalGrid::log_1d(qmax, nq)
        } else {
            EvalGrid::linear_1d(qmax, nq)
        };
        let grid = if zero { grid.with_zero() } else { grid };
        if res > 0. {
            grid.with_resolution(Resolution::Pinhole { dq_over_q: res })
        } else {
            grid
        }
    }
}

/// Validates a `CompareConfig` and resolves it into a `Plan`.
pub struct Adapter {
    detected: Capabilities,
}

impl Adapter {
    pub fn new() -> Self {
        Self {
            detected: Capabilities::detect(),
        }
    }

    /// Uses `detected` instead of probing the machine.
    pub fn with_capabilities(detected: Capabilities) -> Self {
        Self { detected }
    }

    pub fn adapt(&self, config: CompareConfig) -> Result<Plan> {
        self.validate(&config)?;

        let (base_model, comp_model) = config.model.pair();
        let (base_engine, comp_engine) = config.engine.pair();
        let (base_evals, comp_evals) = config.evals.pair();
        let (base_cutoff, comp_cutoff) = config.cutoff.pair();
        let presets = config
            .values
            .iter()
            .map(String::as_str)
            .map(parse_preset)
            .collect::<Result<Vec<_>>>()?;

        let comparison = config.model.is_paired()
            || config.engine.is_paired()
            || config.evals.is_paired()
            || config.cutoff.is_paired()
            || config.values.iter().any(|v| v.contains(','));

        let mut grid = config.grid.clone();
        // Magnetic scattering is only visible in 2-D.
        if config.magnetic {
            grid.is2d = true;
        }

        let seed = match &config.seed {
            None if config.sets >= 1 => Some(random_seed()),
            None => None,
            Some(SeedConfig::Value(seed)) => Some(*seed),
            Some(SeedConfig::Named(_)) => Some(random_seed()),
        };

        Ok(Plan {
            models: [base_model, comp_model],
            engines: [parse_engine(&base_engine)?, parse_engine(&comp_engine)?],
            evals: [base_evals, comp_evals],
            cutoff: [base_cutoff, comp_cutoff],
            comparison,
            seed,
            sets: config.sets.max(1),
            mono: config.mono,
            magnetic: config.magnetic,
            use_demo: config.use_demo,
            show_pars: config.show_pars,
            grid,
            presets,
            capabilities: self.capabilities(config.capabilities),
        })
    }

    fn validate(&self, config: &CompareConfig) -> Result<()> {
        let (base, comp) = config.model.pair();
        if base.trim().is_empty() || comp.trim().is_empty() {
            return Err(invalid("model name must not be empty"));
        }

        let grid = &config.grid;
        if !(grid.qmax.is_finite() && grid.qmax > 0.) {
            return Err(invalid(format!("qmax must be positive, got {}", grid.qmax)));
        }
        if grid.nq == 0 {
            return Err(invalid("nq must be at least 1"));
        }
        if !(grid.res.is_finite() && grid.res >= 0.) {
            return Err(invalid(format!("res must be non-negative, got {}", grid.res)));
        }

        let (base, comp) = config.cutoff.pair();
        if [base, comp].iter().any(|c| !(0. ..=1.).contains(c)) {
            return Err(invalid(format!("cutoff must be in [0, 1], got {base} and {comp}")));
        }

        if let Some(SeedConfig::Named(name)) = &config.seed {
            if name != "random" {
                return Err(invalid(format!("seed must be a number or \"random\", got {name:?}")));
            }
        }
        Ok(())
    }

    fn capabilities(&self, overrides: CapabilitiesConfig) -> Capabilities {
        Capabilities {
            accelerator: overrides.accelerator.unwrap_or(self.detected.accelerator),
            half_precision: overrides.half_precision.unwrap_or(self.detected.half_precision),
            legacy: overrides.legacy.unwrap_or(self.detected.legacy),
        }
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(msg: impl Into<String>) -> CompareError {
    CompareError::InvalidConfig(msg.into())
}

fn random_seed() -> u64 {
    with_rng(|rng| rng.random_range(0..1_000_000))
}

fn parse_engine(name: &str) -> Result<EngineSpec> {
    name.parse()
        .map_err(|_| invalid(format!("unknown engine {name:?}")))
}

fn parse_preset(text: &str) -> Result<Preset> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| invalid(format!("value {text:?} is not of the form key=value")))?;
    let (base, comp) = value.split_once(',').unwrap_or((value, value));
    let side = |v: &str| (!v.is_empty()).then(|| v.to_string());

    Ok(Preset {
        key: key.trim().to_string(),
        base: side(base),
        comp: side(comp),
    })
}

#[cfg(test)]
mod tests {
    use engines::PrecisionRequest;
    use sas_core::Coords;

    use super::*;
    use crate::configs::Paired;

    fn adapt(json: &str) -> Result<Plan> {
        let config = CompareConfig::from_json(json)?;
        Adapter::with_capabilities(Capabilities::all()).adapt(config)
    }

    #[test]
    fn single_settings_mean_no_comparison() {
        let plan = adapt(r#"{"model": "sphere"}"#).unwrap();

        assert!(!plan.comparison);
        assert_eq!(plan.models, ["sphere".to_string(), "sphere".to_string()]);
        assert_eq!(plan.engines[0], EngineSpec::Accelerated(PrecisionRequest::Default));
        assert_eq!(plan.sets, 1);
        assert_eq!(plan.seed, None);
    }

    #[test]
    fn any_pair_turns_comparison_on() {
        for json in [
            r#"{"model": ["sphere", "guinier"]}"#,
            r#"{"model": "sphere", "engine": ["single", "double!"]}"#,
            r#"{"model": "sphere", "cutoff": [0, 0.001]}"#,
            r#"{"model": "sphere", "values": ["radius=20,30"]}"#,
        ] {
            assert!(adapt(json).unwrap().comparison, "{json}");
        }
    }

    #[test]
    fn sets_force_a_seed() {
        let plan = adapt(r#"{"model": "sphere", "sets": 3}"#).unwrap();
        assert!(plan.seed.is_some_and(|s| s < 1_000_000));
        assert_eq!(plan.sets, 3);

        let plan = adapt(r#"{"model": "sphere", "seed": 24}"#).unwrap();
        assert_eq!(plan.seed, Some(24));
    }

    #[test]
    fn magnetic_forces_2d() {
        let plan = adapt(r#"{"model": "sphere", "magnetic": true}"#).unwrap();
        assert!(plan.grid.is2d);
        assert!(plan.build_grid().is_2d());
    }

    #[test]
    fn presets_split_per_side() {
        let plan = adapt(r#"{"model": "sphere", "values": ["radius=20,", "sld=,3", "scale=2"]}"#).unwrap();

        let sides: Vec<_> = plan
            .presets
            .iter()
            .map(|p| (p.key.as_str(), p.base.as_deref(), p.comp.as_deref()))
            .collect();
        assert_eq!(
            sides,
            vec![
                ("radius", Some("20"), None),
                ("sld", None, Some("3")),
                ("scale", Some("2"), Some("2")),
            ]
        );
    }

    #[test]
    fn invalid_configs_are_rejected() {
        for json in [
            r#"{}"#,
            r#"{"model": "sphere", "grid": {"qmax": -1}}"#,
            r#"{"model": "sphere", "grid": {"nq": 0}}"#,
            r#"{"model": "sphere", "engine": "triple"}"#,
            r#"{"model": "sphere", "seed": "sometimes"}"#,
            r#"{"model": "sphere", "values": ["radius"]}"#,
        ] {
            assert!(
                matches!(adapt(json), Err(CompareError::InvalidConfig(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn log_view_with_zero_falls_back_to_linear() {
        let mut config = CompareConfig {
            model: Paired::One("sphere".into()),
            ..CompareConfig::default()
        };
        config.grid.nq = 4;
        config.grid.zero = true;
        let plan = Adapter::with_capabilities(Capabilities::all()).adapt(config).unwrap();

        let grid = plan.build_grid();
        let Coords::OneD(q) = grid.coords() else {
            panic!("expected a 1-D grid");
        };
        assert_eq!(q.len(), 5);
        assert_eq!(q[0], 0.);
        assert!((q[1] - 5e-5).abs() < 1e-12);
    }

    #[test]
    fn capability_overrides_win() {
        let plan = adapt(r#"{"model": "sphere", "capabilities": {"legacy": false}}"#).unwrap();
        assert!(!plan.capabilities.legacy);
        assert!(plan.capabilities.accelerator);
    }
}
