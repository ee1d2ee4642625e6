use std::{collections::BTreeSet, io::Write, sync::Arc};

use engines::{EngineFactory, EngineSpec};
use log::{info, warn};
use models::load_model;
use randomization::{
    Seed, SeedScope, constrain_pars, get_pars, parlist, randomize_pars, share_values,
};
use sas_core::{Calculator, EvalGrid, Limits, ModelInfo, ParKey, ParValue, ParameterSet, Part};

use crate::{
    configs::{Plan, Preset},
    error::{CompareError, Result},
    runner::{RunResult, run_models},
};

/// A comparison ready to run: models loaded, grid built and calculators constructed.
pub struct Session {
    plan: Plan,
    infos: [Arc<ModelInfo>; 2],
    grid: Arc<EvalGrid>,
    base: Option<Box<dyn Calculator>>,
    comp: Option<Box<dyn Calculator>>,
}

impl Session {
    /// Creates a new `Session`.
    ///
    /// # Errors
    /// Unknown models, calculator build failures other than an unavailable backend, and
    /// runs where no side is left to evaluate. An unavailable backend on one side of a
    /// comparison only drops that side.
    pub fn new(plan: Plan) -> Result<Self> {
        let infos = [load_model(&plan.models[0])?, load_model(&plan.models[1])?];
        for info in &infos {
            info!(model = info.id(); "loaded {}", info.title());
        }
        let grid = Arc::new(plan.build_grid());
        let factory = EngineFactory::new(plan.capabilities);

        let base = factory.build(&infos[0], &grid, plan.engines[0], plan.cutoff[0]);
        let comp = plan
            .comparison
            .then(|| factory.build(&infos[1], &grid, plan.engines[1], plan.cutoff[1]));

        let (base, comp) = match (base, comp) {
            (Err(e), None | Some(Err(_))) => return Err(e.into()),
            (base, comp) => {
                let base = usable(base, plan.engines[0], "base")?;
                let comp = match comp {
                    Some(comp) => usable(comp, plan.engines[1], "comparison")?,
                    None => None,
                };
                (base, comp)
            }
        };

        Ok(Self {
            plan,
            infos,
            grid,
            base,
            comp,
        })
    }

    /// Runs every parameter set, writing the report to `out`.
    ///
    /// All sets draw from one seeded generator, so the whole run is reproducible from the
    /// seed while each set differs from the last.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<Vec<RunResult>> {
        let _scope = SeedScope::push(self.plan.seed.map(Seed::Value));
        if let Some(seed) = self.plan.seed {
            writeln!(out, "Randomize using -random={seed}")?;
        }

        let mut results = Vec::with_capacity(self.plan.sets as usize);
        for set in 0..self.plan.sets {
            info!(set = set; "comparing parameter set");
            let (base_pars, comp_pars) = self.parse_pars()?;
            if self.plan.show_pars {
                for line in self.show_pars(&base_pars, &comp_pars)? {
                    writeln!(out, "{line}")?;
                }
            }

            let result = run_models(
                &self.grid,
                self.base.as_deref(),
                self.comp.as_deref(),
                (&base_pars, &comp_pars),
                (self.plan.evals[0], self.plan.evals[1]),
            )?;
            for line in result.report() {
                writeln!(out, "{line}")?;
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Builds the `(base, comp)` parameter sets for one round: defaults or demo values,
    /// randomized and repaired when seeded, dispersion and magnetism switched per the
    /// plan, then the presets applied on top.
    pub fn parse_pars(&self) -> Result<(ParameterSet, ParameterSet)> {
        let [info, info2] = &self.infos;
        let same_model = info.id() == info2.id();

        let mut pars = get_pars(info, self.plan.use_demo);
        let mut pars2 = get_pars(info2, self.plan.use_demo);
        share_values(&pars, &mut pars2);

        if self.plan.seed.is_some() {
            pars = randomize_pars(info, &pars)?;
            if same_model {
                pars2 = pars.clone();
            } else {
                pars2 = randomize_pars(info2, &pars2)?;
                share_values(&pars, &mut pars2);
            }
            constrain_pars(info, &mut pars)?;
            constrain_pars(info2, &mut pars2)?;
        }

        let pars = pars
            .suppress_pd(self.plan.mono)
            .suppress_magnetism(!self.plan.magnetic);
        let pars2 = pars2
            .suppress_pd(self.plan.mono)
            .suppress_magnetism(!self.plan.magnetic);

        apply_presets(&self.plan.presets, [info.as_ref(), info2.as_ref()], pars, pars2)
    }

    fn show_pars(&self, pars: &ParameterSet, pars2: &ParameterSet) -> Result<Vec<String>> {
        let [info, info2] = &self.infos;
        let is2d = self.grid.is_2d();

        if info.id() == info2.id() && pars == pars2 {
            return Ok(vec![parlist(info, pars, is2d)?]);
        }
        Ok(vec![
            format!("==== {} =====", info.id()),
            parlist(info, pars, is2d)?,
            format!("==== {} =====", info2.id()),
            parlist(info2, pars2, is2d)?,
        ])
    }
}

/// Keeps a built calculator, or drops it with a warning when its backend cannot run here.
fn usable(
    built: sas_core::Result<Box<dyn Calculator>>,
    spec: EngineSpec,
    side: &str,
) -> Result<Option<Box<dyn Calculator>>> {
    match built {
        Ok(calc) => Ok(Some(calc)),
        Err(e) if e.is_unavailable() => {
            let engine = spec.to_string();
            warn!(engine = engine.as_str(); "running without the {side} side: {e}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Applies the presets to both sides. A dispersion width given without a point count
/// gets 35 points.
fn apply_presets(
    presets: &[Preset],
    [info, info2]: [&ModelInfo; 2],
    mut pars: ParameterSet,
    mut pars2: ParameterSet,
) -> Result<(ParameterSet, ParameterSet)> {
    let mut base = ParameterSet::new();
    let mut comp = ParameterSet::new();

    for preset in presets {
        let key = preset.key.as_str();
        if !pars.contains_key(key) && !pars2.contains_key(key) {
            let names: BTreeSet<&str> = pars.keys().map(|k| Part::split(k).1).collect();
            let names: Vec<&str> = names.into_iter().collect();
            return Err(CompareError::InvalidConfig(format!(
                "{key:?} invalid; parameters are: {}",
                names.join(", ")
            )));
        }
        if let (Some(v), true) = (&preset.base, pars.contains_key(key)) {
            base.set(key, v.as_str());
        }
        if let (Some(v), true) = (&preset.comp, pars2.contains_key(key)) {
            comp.set(key, v.as_str());
        }
    }

    default_pd_points(&mut base);
    default_pd_points(&mut comp);

    let base = resolve_presets(info, &base, &pars)?;
    let mut context = pars.clone();
    context.extend(base.iter().map(|(k, v)| (k.to_string(), v.clone())));
    let comp = resolve_presets(info2, &comp, &context)?;

    pars.extend(base.iter().map(|(k, v)| (k.to_string(), v.clone())));
    pars2.extend(comp.iter().map(|(k, v)| (k.to_string(), v.clone())));
    Ok((pars, pars2))
}

fn default_pd_points(presets: &mut ParameterSet) {
    let widths: Vec<String> = presets
        .keys()
        .filter(|k| k.ends_with("_pd"))
        .map(|k| format!("{k}_n"))
        .collect();
    for key in widths {
        if !presets.contains_key(&key) {
            presets.set(key, 35.);
        }
    }
}

/// Turns preset text into values: numbers parse as numbers, a parameter name takes that
/// parameter's value in `context` (or a numeric preset), and dispersion shapes and
/// choice names stay text.
///
/// # Errors
/// `InvalidConfig` for any other text, such as an arithmetic expression.
fn resolve_presets(
    info: &ModelInfo,
    presets: &ParameterSet,
    context: &ParameterSet,
) -> Result<ParameterSet> {
    let numeric = |text: &str| text.trim().parse::<f64>().ok();

    presets
        .iter()
        .map(|(key, value)| {
            let resolved = match value {
                ParValue::Number(_) => value.clone(),
                ParValue::Text(text) => {
                    if let Some(v) = numeric(text) {
                        ParValue::Number(v)
                    } else if key.ends_with("_type") || is_choice(info, key, text.trim()) {
                        value.clone()
                    } else if let Some(v) = presets
                        .get(text.trim())
                        .and_then(|p| p.as_number().or_else(|| p.as_text().and_then(numeric)))
                        .or_else(|| context.number(text.trim()))
                    {
                        ParValue::Number(v)
                    } else {
                        return Err(CompareError::InvalidConfig(format!(
                            "{key}={text:?} is neither a number nor a parameter name"
                        )));
                    }
                }
            };
            Ok((key.to_string(), resolved))
        })
        .collect()
}

fn is_choice(info: &ModelInfo, key: &str, text: &str) -> bool {
    ParKey::parse(key, info)
        .ok()
        .and_then(|key| info.parameter(&key.base))
        .is_some_and(|par| matches!(&par.limits, Limits::Choices(c) if c.iter().any(|c| c == text)))
}

#[cfg(test)]
mod tests {
    use sas_core::{FnKernel, KernelPars, Parameter, Role};

    use super::*;

    fn info() -> ModelInfo {
        ModelInfo::builder("shell", FnKernel(|_: f64, _: &KernelPars| 1.))
            .parameter(Parameter::new("radius", "Ang", 50., Limits::non_negative(), Role::Volume))
            .parameter(Parameter::new("thickness", "Ang", 10., Limits::non_negative(), Role::Volume))
            .parameter(Parameter::new(
                "shape",
                "",
                0.,
                Limits::Choices(vec!["round".into(), "flat".into()]),
                Role::Other,
            ))
            .build()
    }

    fn set(values: &[(&str, f64)]) -> ParameterSet {
        values.iter().map(|(k, v)| (k.to_string(), ParValue::Number(*v))).collect()
    }

    fn preset(key: &str, base: Option<&str>, comp: Option<&str>) -> Preset {
        Preset {
            key: key.into(),
            base: base.map(Into::into),
            comp: comp.map(Into::into),
        }
    }

    #[test]
    fn presets_apply_per_side() {
        let info = info();
        let pars = set(&[("radius", 50.), ("radius_pd", 0.), ("radius_pd_n", 0.)]);
        let presets = [preset("radius", Some("20"), Some("30")), preset("radius_pd", Some("0.1"), None)];

        let (a, b) = apply_presets(&presets, [&info, &info], pars.clone(), pars).unwrap();
        assert_eq!(a.number("radius"), Some(20.));
        assert_eq!(a.number("radius_pd"), Some(0.1));
        assert_eq!(a.number("radius_pd_n"), Some(35.));
        assert_eq!(b.number("radius"), Some(30.));
        assert_eq!(b.number("radius_pd_n"), Some(0.));
    }

    #[test]
    fn presets_can_reference_parameters() {
        let info = info();
        let pars = set(&[("radius", 50.), ("thickness", 10.)]);
        let presets = [preset("thickness", Some("radius"), Some("radius"))];

        let (a, b) = apply_presets(&presets, [&info, &info], pars.clone(), pars).unwrap();
        assert_eq!(a.number("thickness"), Some(50.));
        assert_eq!(b.number("thickness"), Some(50.));
    }

    #[test]
    fn comparison_presets_see_base_presets() {
        let info = info();
        let pars = set(&[("radius", 50.), ("thickness", 10.)]);
        let presets = [
            preset("radius", Some("70"), None),
            preset("thickness", None, Some("radius")),
        ];

        let (_, b) = apply_presets(&presets, [&info, &info], pars.clone(), pars).unwrap();
        assert_eq!(b.number("thickness"), Some(70.));
    }

    #[test]
    fn unknown_preset_lists_parameters() {
        let info = info();
        let pars = set(&[("radius", 50.), ("radius_pd", 0.)]);
        let presets = [preset("length", Some("3"), Some("3"))];

        let Err(CompareError::InvalidConfig(msg)) = apply_presets(&presets, [&info, &info], pars.clone(), pars) else {
            panic!("expected an invalid config");
        };
        assert_eq!(msg, "\"length\" invalid; parameters are: radius");
    }

    #[test]
    fn dispersion_shapes_stay_text() {
        let info = info();
        let mut pars = set(&[("radius_pd", 0.)]);
        pars.set("radius_pd_type", "gaussian");
        let presets = [preset("radius_pd_type", Some("schulz"), None)];

        let (a, _) = apply_presets(&presets, [&info, &info], pars.clone(), pars).unwrap();
        assert_eq!(a.get("radius_pd_type"), Some(&ParValue::from("schulz")));
    }

    #[test]
    fn choice_names_stay_text() {
        let info = info();
        let pars = set(&[("radius", 50.), ("shape", 0.)]);
        let presets = [preset("shape", Some("flat"), None)];

        let (a, _) = apply_presets(&presets, [&info, &info], pars.clone(), pars).unwrap();
        assert_eq!(a.get("shape"), Some(&ParValue::from("flat")));
    }

    #[test]
    fn expressions_are_rejected_up_front() {
        let info = info();
        let pars = set(&[("radius", 50.), ("thickness", 10.)]);
        let presets = [preset("radius", Some("2*radius"), Some("2*radius"))];

        let Err(CompareError::InvalidConfig(msg)) =
            apply_presets(&presets, [&info, &info], pars.clone(), pars)
        else {
            panic!("expected an invalid config");
        };
        assert_eq!(msg, "radius=\"2*radius\" is neither a number nor a parameter name");
    }
}
