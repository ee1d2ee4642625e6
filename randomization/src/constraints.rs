use std::{collections::HashMap, sync::OnceLock};

use log::{debug, warn};
use sas_core::{ModelInfo, ParameterSet, Result};

/// A model-specific fixup restoring physical validity of a parameter set.
pub type Repair = fn(&ModelInfo, &mut ParameterSet) -> Result<()>;

/// Maps model identifiers to their repairs.
pub struct ConstraintRegistry {
    repairs: HashMap<String, Repair>,
}

impl ConstraintRegistry {
    /// Creates an empty `ConstraintRegistry`.
    pub fn empty() -> Self {
        Self {
            repairs: HashMap::new(),
        }
    }

    /// Creates a `ConstraintRegistry` with the repairs of the known models.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("barbell", barbell);
        registry.register("capped_cylinder", capped_cylinder);
        registry.register("guinier", guinier);
        registry.register("pearl_necklace", pearl_necklace);
        registry.register("rpa", rpa);
        registry
    }

    /// Adds or replaces the repair of model `id`.
    pub fn register(&mut self, id: &str, repair: Repair) {
        self.repairs.insert(id.to_string(), repair);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.repairs.contains_key(id)
    }

    /// Restricts `pars` to valid values for `info`, in place.
    ///
    /// Magnetism is zeroed first for models that cannot evaluate it. Products dispatch on
    /// their form factor, since structure factors need no repairs.
    pub fn constrain_pars(&self, info: &ModelInfo, pars: &mut ParameterSet) -> Result<()> {
        if !info.supports_magnetism() {
            *pars = pars.suppress_magnetism(true);
        }

        let id = info.dispatch_id();
        if let Some(repair) = self.repairs.get(id) {
            debug!(model = id; "repairing parameters");
            repair(info, pars)?;
        }
        Ok(())
    }
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Restricts `pars` to valid values using the repairs of the known models.
pub fn constrain_pars(info: &ModelInfo, pars: &mut ParameterSet) -> Result<()> {
    static REGISTRY: OnceLock<ConstraintRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ConstraintRegistry::new).constrain_pars(info, pars)
}

/// Swaps `inner` and `outer` when `inner` is the larger.
fn order(info: &ModelInfo, pars: &mut ParameterSet, inner: &str, outer: &str) -> Result<()> {
    let a = pars.require(info.id(), inner)?;
    let b = pars.require(info.id(), outer)?;
    if b < a {
        pars.set(inner, b);
        pars.set(outer, a);
    }
    Ok(())
}

fn barbell(info: &ModelInfo, pars: &mut ParameterSet) -> Result<()> {
    order(info, pars, "radius", "radius_bell")
}

fn capped_cylinder(info: &ModelInfo, pars: &mut ParameterSet) -> Result<()> {
    order(info, pars, "radius", "radius_cap")
}

fn pearl_necklace(info: &ModelInfo, pars: &mut ParameterSet) -> Result<()> {
    order(info, pars, "thick_string", "radius")
}

/// Keeps `I(q_max) > 1e-30` so single precision does not underflow:
/// `rg < sqrt(90 ln 10 + 3 ln scale) / q_max`.
fn guinier(info: &ModelInfo, pars: &mut ParameterSet) -> Result<()> {
    const Q_MAX: f64 = 1.0;

    let scale = pars.require(info.id(), "scale")?;
    let rg = pars.require(info.id(), "rg")?;
    let rg_max = (90. * 10f64.ln() + 3. * scale.ln()).sqrt() / Q_MAX;
    // `min` ignores a NaN bound from a tiny scale.
    pars.set("rg", rg.min(rg_max));
    Ok(())
}

/// Volume fractions of the active components must sum to one.
fn rpa(info: &ModelInfo, pars: &mut ParameterSet) -> Result<()> {
    const FRACTIONS: [&str; 4] = ["Phi1", "Phi2", "Phi3", "Phi4"];

    let case_num = pars.require(info.id(), "case_num")?;
    if case_num < 2. {
        pars.set("Phi1", 0.);
        pars.set("Phi2", 0.);
    } else if case_num < 5. {
        pars.set("Phi1", 0.);
    }

    let mut total = 0.;
    for name in FRACTIONS {
        total += pars.require(info.id(), name)?;
    }
    if total == 0. {
        warn!(model = info.id(); "all volume fractions are zero, leaving them unnormalized");
        return Ok(());
    }

    for name in FRACTIONS {
        let phi = pars.require(info.id(), name)?;
        pars.set(name, phi / total);
    }
    Ok(())
}
