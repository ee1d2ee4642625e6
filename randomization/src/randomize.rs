use rand::{Rng, distr::Uniform, rngs::StdRng};
use rand_distr::{Beta, Distribution};
use sas_core::{
    Limits, MagneticPart, ModelInfo, ParKey, ParValue, ParameterSet, Part, Result, Role, SasErr,
};

use crate::{dispersion::select_dispersions_with, range::parameter_range, seed::with_rng};

/// Draws a random value for one parameter key, using the global generator.
///
/// # Arguments
/// * `info` - The model the key belongs to.
/// * `name` - The flattened key.
/// * `value` - The current value, used by the fallback range heuristic.
pub fn randomize_one(info: &ModelInfo, name: &str, value: &ParValue) -> Result<ParValue> {
    with_rng(|rng| randomize_one_with(info, name, value, rng))
}

/// Like `randomize_one`, drawing from `rng`.
pub fn randomize_one_with(
    info: &ModelInfo,
    name: &str,
    value: &ParValue,
    rng: &mut StdRng,
) -> Result<ParValue> {
    let key = ParKey::parse(name, info)?;
    let par = info
        .parameter(&key.base)
        .ok_or_else(|| SasErr::UnknownParameter {
            model: info.id().into(),
            name: name.into(),
        })?;

    let drawn = match key.part {
        Part::PdWidth if par.role == Role::Orientation => {
            // Peaks around 13 degrees, 95% below 42.
            180. * Beta::new(2.5, 20.)?.sample(rng)
        }
        // Peaks around 15%, 95% below 40%.
        Part::PdWidth => Beta::new(1.5, 7.)?.sample(rng),
        // Dispersion is switched on globally by `select_dispersions`.
        Part::PdN => 0.,
        Part::PdType => return Ok(ParValue::Text("gaussian".into())),
        Part::PdNsigma => 3.,
        _ if name == "background" => 10f64.powf(rng.random_range(-2.0..0.0)),
        _ if name == "scale" => 10f64.powf(rng.random_range(-3.0..-0.5)),
        // Zero up to the moment of iron.
        Part::Magnetic(MagneticPart::M0) => rng.random_range(0.0..5.0),
        // Any direction, whatever the current value.
        Part::Magnetic(MagneticPart::Theta | MagneticPart::Phi) => {
            Uniform::new_inclusive(-180., 180.)?.sample(rng)
        }
        Part::Value => match &par.limits {
            Limits::Choices(choices) => rng.random_range(0..choices.len().max(1)) as f64,
            limits if limits.is_finite() => {
                let (low, high) = limits.bounds();
                Uniform::new_inclusive(low, high)?.sample(rng)
            }
            _ if par.role == Role::Sld => rng.random_range(-0.5..12.0),
            _ if par.role == Role::Volume
                && ["length", "radius", "thick"].iter().any(|s| name.contains(s)) =>
            {
                10f64.powf(rng.random_range(2.0..4.0))
            }
            limits => fallback(name, value, limits.clone(), rng)?,
        },
    };

    Ok(ParValue::Number(drawn))
}

/// Uniform over the intersection of the declared limits and the range heuristic.
fn fallback(name: &str, value: &ParValue, limits: Limits, rng: &mut StdRng) -> Result<f64> {
    let value = value
        .as_number()
        .ok_or_else(|| SasErr::NotNumeric { name: name.into() })?;
    let (guess_low, guess_high) = parameter_range(name, value)?;
    let (lim_low, lim_high) = limits.bounds();
    let (low, high) = (lim_low.max(guess_low), lim_high.min(guess_high));

    if !(low <= high && low.is_finite() && high.is_finite()) {
        return Err(SasErr::InvalidRange {
            name: name.into(),
            low,
            high,
        });
    }
    Ok(Uniform::new_inclusive(low, high)?.sample(rng))
}

/// Draws random values for every key of `pars`, using the global generator.
///
/// Keys are visited in lexicographic order so the draw sequence is fixed for a seed. The
/// model's random hook then overrides its keys, and finally a random subset of the
/// dispersions is switched on. Relations between parameters are left to
/// `constrain_pars`.
///
/// # Returns
/// A new parameter set; `pars` is left untouched.
pub fn randomize_pars(info: &ModelInfo, pars: &ParameterSet) -> Result<ParameterSet> {
    with_rng(|rng| randomize_pars_with(info, pars, rng))
}

/// Like `randomize_pars`, drawing from `rng`.
pub fn randomize_pars_with(
    info: &ModelInfo,
    pars: &ParameterSet,
    rng: &mut StdRng,
) -> Result<ParameterSet> {
    let mut random = ParameterSet::new();
    for (name, value) in pars.iter() {
        random.set(name, randomize_one_with(info, name, value, rng)?);
    }

    if let Some(hook) = info.random_hook() {
        for (name, value) in hook(rng) {
            ParKey::parse(&name, info)?;
            random.set(name, value);
        }
    }

    select_dispersions_with(info, &mut random, rng);
    Ok(random)
}
