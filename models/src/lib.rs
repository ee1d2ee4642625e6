//! Built-in model catalog.

use std::sync::Arc;

use log::debug;
use sas_core::{ModelInfo, Result, SasErr};

pub mod core_multi_shell;
pub mod guinier;
pub mod hardsphere;
pub mod parallelepiped;
pub mod polymer_micelle;
pub mod special;
pub mod sphere;

/// Names accepted by `load_model`, besides products and mixtures of them.
pub const MODEL_NAMES: [&str; 6] = [
    "core_multi_shell",
    "guinier",
    "hardsphere",
    "parallelepiped",
    "polymer_micelle",
    "sphere",
];

/// Loads a model descriptor by name. `a*b` builds the product of form factor `a` with
/// structure factor `b`; `a+b` a mixture.
///
/// # Errors
/// `SasErr::UnknownModel` if any part is not in the catalog.
pub fn load_model(name: &str) -> Result<Arc<ModelInfo>> {
    if let Some((form, structure)) = name.split_once('*') {
        let info = ModelInfo::product(load_model(form)?, load_model(structure)?);
        debug!(model = info.id(); "loaded product model");
        return Ok(Arc::new(info));
    }

    if name.contains('+') {
        let parts = name
            .split('+')
            .map(load_model)
            .collect::<Result<Vec<_>>>()?;
        let info = ModelInfo::mixture(parts).ok_or_else(|| SasErr::UnknownModel {
            name: name.to_string(),
        })?;
        return Ok(Arc::new(info));
    }

    let info = match name.trim() {
        "core_multi_shell" => core_multi_shell::info(),
        "guinier" => guinier::info(),
        "hardsphere" => hardsphere::info(),
        "parallelepiped" => parallelepiped::info(),
        "polymer_micelle" => polymer_micelle::info(),
        "sphere" => sphere::info(),
        other => {
            return Err(SasErr::UnknownModel {
                name: other.to_string(),
            });
        }
    };
    Ok(Arc::new(info))
}
