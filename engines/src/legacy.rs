use std::{collections::HashMap, sync::Arc};

use log::debug;
use sas_core::{
    Calculator, Composition, EvalGrid, Masked, ModelInfo, ParKey, ParameterSet, Part, Result,
    SasErr,
};

use crate::{direct::DirectModel, precision::Precision};

/// How one model is named in the legacy library.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyName {
    pub name: String,
    /// `(current, legacy)` base parameter names that differ.
    pub renames: Vec<(String, String)>,
}

/// Maps current model identifiers to the legacy library's names.
#[derive(Debug, Clone, Default)]
pub struct LegacyCatalog {
    entries: HashMap<String, LegacyName>,
}

impl LegacyCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The catalog of every bundled model the legacy library also ships.
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        catalog.register("sphere", "SphereModel", &[("sld", "sldSph"), ("sld_solvent", "sldSolv")]);
        catalog.register(
            "parallelepiped",
            "ParallelepipedModel",
            &[
                ("sld", "sldPipe"),
                ("sld_solvent", "sldSolv"),
                ("length_a", "short_a"),
                ("length_b", "short_b"),
                ("length_c", "long_c"),
                ("theta", "parallel_theta"),
                ("phi", "parallel_phi"),
                ("psi", "parallel_psi"),
            ],
        );
        catalog.register("guinier", "GuinierModel", &[]);
        catalog.register(
            "hardsphere",
            "HardsphereStructure",
            &[("radius_effective", "effect_radius")],
        );
        catalog.register(
            "core_multi_shell",
            "CoreMultiShellModel",
            &[
                ("sld_core", "core_sld"),
                ("radius", "rad_core0"),
                ("sld_solvent", "sld_solv"),
                ("n", "n_shells"),
                ("sld", "sld_shell"),
                ("thickness", "thick_shell"),
            ],
        );
        catalog
    }

    pub fn register(&mut self, id: &str, name: &str, renames: &[(&str, &str)]) {
        let renames = renames
            .iter()
            .map(|(current, legacy)| (current.to_string(), legacy.to_string()))
            .collect();
        self.entries.insert(
            id.to_string(),
            LegacyName {
                name: name.to_string(),
                renames,
            },
        );
    }

    /// Resolves the legacy name of `info`, combining both parts of a product.
    pub fn revert_name(&self, info: &ModelInfo) -> Result<LegacyName> {
        match info.composition() {
            None => self
                .entries
                .get(info.id())
                .cloned()
                .ok_or_else(|| SasErr::UnknownLegacyModel {
                    model: info.id().into(),
                }),
            Some(Composition::Product(form, structure)) => {
                let form = self.revert_name(form)?;
                let structure = self.revert_name(structure)?;
                let mut renames = form.renames;
                renames.extend(structure.renames);
                Ok(LegacyName {
                    name: format!("{}*{}", form.name, structure.name),
                    renames,
                })
            }
            Some(Composition::Mixture(_)) => Err(SasErr::UnsupportedComposite {
                model: info.id().into(),
                reason: "the legacy library has no mixtures".into(),
            }),
        }
    }
}

/// Evaluates a model through the legacy library's parameter naming.
///
/// Parameters are translated to legacy names on the way in and back on the way out, so a
/// set that does not survive the round trip fails here instead of silently diverging.
pub struct LegacyCalculator {
    legacy: LegacyName,
    inner: DirectModel,
    info: Arc<ModelInfo>,
}

impl LegacyCalculator {
    /// Creates a new `LegacyCalculator`.
    ///
    /// # Arguments
    /// * `catalog` - The legacy names to translate through.
    /// * `info` - The model to evaluate.
    /// * `grid` - The points to evaluate at.
    /// * `cutoff` - Passed to the underlying evaluator.
    pub fn new(
        catalog: &LegacyCatalog,
        info: Arc<ModelInfo>,
        grid: Arc<EvalGrid>,
        cutoff: f64,
    ) -> Result<Self> {
        let legacy = catalog.revert_name(&info)?;
        let inner = DirectModel::new(info.clone(), grid, Precision::Double, false, cutoff);
        Ok(Self {
            legacy,
            inner,
            info,
        })
    }

    pub fn legacy_name(&self) -> &str {
        &self.legacy.name
    }

    /// Renames every key to its legacy spelling.
    pub fn to_legacy(&self, pars: &ParameterSet) -> Result<ParameterSet> {
        let mut out = ParameterSet::new();
        for (key, value) in pars.iter() {
            let mut parsed = ParKey::parse(key, &self.info)?;
            if let Some((_, legacy)) = self.legacy.renames.iter().find(|(c, _)| *c == parsed.base) {
                parsed.base = legacy.clone();
            }
            out.set(parsed.to_string(), value.clone());
        }
        Ok(out)
    }

    /// Renames legacy keys back to current spellings.
    pub fn from_legacy(&self, pars: &ParameterSet) -> ParameterSet {
        pars.iter()
            .map(|(key, value)| (self.revert_key(key), value.clone()))
            .collect()
    }

    fn revert_key(&self, key: &str) -> String {
        let (part, scalar) = Part::split(key);
        for (current, legacy) in &self.legacy.renames {
            let Some(slot) = scalar.strip_prefix(legacy.as_str()) else {
                continue;
            };
            if slot.chars().all(|c| c.is_ascii_digit()) {
                let parsed = ParKey {
                    base: current.clone(),
                    index: slot.parse().ok(),
                    part,
                };
                return parsed.to_string();
            }
        }
        key.to_string()
    }
}

impl Calculator for LegacyCalculator {
    fn engine(&self) -> &str {
        "legacy"
    }

    fn evaluate(&self, pars: &ParameterSet) -> Result<Masked> {
        let legacy = self.to_legacy(pars)?;
        debug!(model = self.legacy.name.as_str(), keys = legacy.len(); "evaluating legacy model");
        self.inner.evaluate(&self.from_legacy(&legacy))
    }
}
