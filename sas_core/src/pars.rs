use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SasErr},
    model_info::{Limits, ModelInfo, Parameter, Role},
};

/// A parameter value: numeric, or a categorical tag such as a dispersion shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParValue {
    Number(f64),
    Text(String),
}

impl ParValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParValue::Number(v) => Some(*v),
            ParValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParValue::Number(_) => None,
            ParValue::Text(s) => Some(s),
        }
    }
}

impl From<f64> for ParValue {
    fn from(value: f64) -> Self {
        ParValue::Number(value)
    }
}

impl From<&str> for ParValue {
    fn from(value: &str) -> Self {
        ParValue::Text(value.to_string())
    }
}

impl From<String> for ParValue {
    fn from(value: String) -> Self {
        ParValue::Text(value)
    }
}

impl Display for ParValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParValue::Number(v) => write!(f, "{v}"),
            ParValue::Text(s) => f.write_str(s),
        }
    }
}

/// The magnetic component addressed by a prefixed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagneticPart {
    M0,
    Theta,
    Phi,
}

impl MagneticPart {
    pub const ALL: [MagneticPart; 3] = [MagneticPart::M0, MagneticPart::Theta, MagneticPart::Phi];

    pub fn prefix(self) -> &'static str {
        match self {
            MagneticPart::M0 => "M0:",
            MagneticPart::Theta => "mtheta:",
            MagneticPart::Phi => "mphi:",
        }
    }
}

/// Which facet of a parameter a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Value,
    PdWidth,
    PdN,
    PdNsigma,
    PdType,
    Magnetic(MagneticPart),
}

impl Part {
    const SUFFIXES: [(&'static str, Part); 4] = [
        ("_pd_nsigma", Part::PdNsigma),
        ("_pd_type", Part::PdType),
        ("_pd_n", Part::PdN),
        ("_pd", Part::PdWidth),
    ];

    /// Splits a flattened key into its facet and the scalar name it applies to, without
    /// consulting any model.
    pub fn split(key: &str) -> (Part, &str) {
        for magnetic in MagneticPart::ALL {
            if let Some(rest) = key.strip_prefix(magnetic.prefix()) {
                return (Part::Magnetic(magnetic), rest);
            }
        }

        for (suffix, part) in Self::SUFFIXES {
            if let Some(rest) = key.strip_suffix(suffix) {
                return (part, rest);
            }
        }

        (Part::Value, key)
    }

    fn decorate(self, scalar: &str) -> String {
        match self {
            Part::Value => scalar.to_string(),
            Part::PdWidth => format!("{scalar}_pd"),
            Part::PdN => format!("{scalar}_pd_n"),
            Part::PdNsigma => format!("{scalar}_pd_nsigma"),
            Part::PdType => format!("{scalar}_pd_type"),
            Part::Magnetic(m) => format!("{}{scalar}", m.prefix()),
        }
    }
}

/// A parameter key resolved against a model: the declared parameter, the vector slot
/// (1-based) when the parameter is a vector, and the facet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParKey {
    pub base: String,
    pub index: Option<usize>,
    pub part: Part,
}

impl ParKey {
    /// Resolves a flattened key against `info`.
    ///
    /// # Arguments
    /// * `key` - The flattened key, e.g. `radius_pd_n`, `sld2` or `M0:sld_solvent`.
    /// * `info` - The model the key must belong to.
    ///
    /// # Returns
    /// The structured key, or `SasErr::UnknownParameter` when the key names no declared
    /// parameter or a facet the parameter does not have.
    pub fn parse(key: &str, info: &ModelInfo) -> Result<Self> {
        let unknown = || SasErr::UnknownParameter {
            model: info.id().to_string(),
            name: key.to_string(),
        };

        // Declared names win over suffix parsing.
        if let Some((par, index)) = resolve_scalar(key, info) {
            return Ok(Self {
                base: par.name.clone(),
                index,
                part: Part::Value,
            });
        }

        let (part, scalar) = Part::split(key);
        let (par, index) = resolve_scalar(scalar, info).ok_or_else(unknown)?;

        let allowed = match part {
            Part::Value => true,
            Part::PdWidth | Part::PdN | Part::PdNsigma | Part::PdType => par.polydisperse,
            Part::Magnetic(_) => par.role == Role::Sld,
        };
        if !allowed {
            return Err(unknown());
        }

        Ok(Self {
            base: par.name.clone(),
            index,
            part,
        })
    }

    /// The scalar name this key applies to, e.g. `sld2`.
    pub fn scalar(&self) -> String {
        match self.index {
            Some(k) => format!("{}{k}", self.base),
            None => self.base.clone(),
        }
    }
}

impl Display for ParKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.part.decorate(&self.scalar()))
    }
}

fn resolve_scalar<'a>(scalar: &str, info: &'a ModelInfo) -> Option<(&'a Parameter, Option<usize>)> {
    if let Some(par) = info.parameter(scalar).filter(|p| !p.is_vector()) {
        return Some((par, None));
    }

    info.parameters().iter().filter(|p| p.is_vector()).find_map(|p| {
        let k: usize = scalar.strip_prefix(p.name.as_str())?.parse().ok()?;
        (1..=p.length).contains(&k).then_some((p, Some(k)))
    })
}

/// The shape of a dispersion distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispersionShape {
    #[default]
    Gaussian,
    Rectangle,
    Uniform,
    Lognormal,
    Schulz,
}

impl DispersionShape {
    pub fn as_str(self) -> &'static str {
        match self {
            DispersionShape::Gaussian => "gaussian",
            DispersionShape::Rectangle => "rectangle",
            DispersionShape::Uniform => "uniform",
            DispersionShape::Lognormal => "lognormal",
            DispersionShape::Schulz => "schulz",
        }
    }
}

impl FromStr for DispersionShape {
    type Err = SasErr;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gaussian" => Ok(DispersionShape::Gaussian),
            "rectangle" => Ok(DispersionShape::Rectangle),
            "uniform" => Ok(DispersionShape::Uniform),
            "lognormal" => Ok(DispersionShape::Lognormal),
            "schulz" => Ok(DispersionShape::Schulz),
            other => Err(SasErr::InvalidValue {
                name: "pd_type".into(),
                value: other.into(),
            }),
        }
    }
}

impl Display for DispersionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The dispersion facet of a polydisperse parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispersion {
    pub width: f64,
    pub npts: usize,
    pub nsigma: f64,
    pub shape: DispersionShape,
}

impl Dispersion {
    pub fn is_active(&self) -> bool {
        self.npts > 0 && self.width != 0.
    }
}

/// The magnetic facet of an sld parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Magnetism {
    pub m0: f64,
    pub mtheta: f64,
    pub mphi: f64,
}

impl Magnetism {
    pub fn is_active(&self) -> bool {
        self.m0 != 0.
    }
}

/// The structured view of one scalar parameter inside a `ParameterSet`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
    pub name: String,
    pub role: Role,
    pub relative_pd: bool,
    pub value: f64,
    pub dispersion: Option<Dispersion>,
    pub magnetism: Option<Magnetism>,
}

/// A flat map from parameter key to value, iterated in lexicographic key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParValue> {
        self.values.get(key)
    }

    /// The numeric value of `key`, `None` when absent or categorical.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(ParValue::as_number)
    }

    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    /// The numeric value of `key`, failing when it is absent or categorical.
    ///
    /// # Arguments
    /// * `model` - The model name, for the error message.
    /// * `key` - The flattened key.
    pub fn require(&self, model: &str, key: &str) -> Result<f64> {
        match self.values.get(key) {
            Some(ParValue::Number(v)) => Ok(*v),
            Some(ParValue::Text(_)) => Err(SasErr::NotNumeric { name: key.into() }),
            None => Err(SasErr::MissingParameter {
                model: model.into(),
                name: key.into(),
            }),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Checks every key resolves against `info`.
    pub fn validate(&self, info: &ModelInfo) -> Result<()> {
        for key in self.values.keys() {
            ParKey::parse(key, info)?;
        }
        Ok(())
    }

    /// With `suppress`, zeroes every dispersion point count. Otherwise ensures at least
    /// one parameter is dispersed, activating the first dispersion key with 35 points and
    /// a 15% width when none is active.
    pub fn suppress_pd(&self, suppress: bool) -> Self {
        let mut pars = self.clone();
        let pd_n_keys: Vec<String> = self
            .keys()
            .filter(|k| Part::split(k).0 == Part::PdN)
            .map(str::to_string)
            .collect();

        if suppress {
            for key in pd_n_keys {
                pars.set(key, 0.);
            }
            return pars;
        }

        let width_key = |n_key: &str| n_key[..n_key.len() - 2].to_string();
        let any_pd = pd_n_keys
            .iter()
            .any(|k| self.number_or(k, 0.) != 0. && self.number_or(&width_key(k), 0.) != 0.);

        if let (false, Some(first)) = (any_pd, pd_n_keys.first()) {
            if self.number_or(first, 0.) == 0. {
                pars.set(first.clone(), 35.);
            }
            let width = width_key(first);
            if self.number_or(&width, 0.) == 0. {
                pars.set(width, 0.15);
            }
        }
        pars
    }

    /// With `suppress`, zeroes every magnetic moment. Otherwise ensures at least one
    /// sld is magnetic, setting the first moment key to 8 when none is active.
    pub fn suppress_magnetism(&self, suppress: bool) -> Self {
        let mut pars = self.clone();
        let m0_keys: Vec<String> = self
            .keys()
            .filter(|k| k.starts_with(MagneticPart::M0.prefix()))
            .map(str::to_string)
            .collect();

        if suppress {
            for key in m0_keys {
                pars.set(key, 0.);
            }
            return pars;
        }

        let any_mag = m0_keys.iter().any(|k| self.number_or(k, 0.) != 0.);
        if let (false, Some(first)) = (any_mag, m0_keys.first()) {
            pars.set(first.clone(), 8.);
        }
        pars
    }

    /// Derives the structured per-parameter view of the set, filling defaults for
    /// anything the set does not mention.
    pub fn records(&self, info: &ModelInfo) -> Result<Vec<ParameterRecord>> {
        let mut records = Vec::new();
        for par in info.parameters() {
            for name in par.scalar_names() {
                records.push(self.record(par, name)?);
            }
        }
        Ok(records)
    }

    fn record(&self, par: &Parameter, name: String) -> Result<ParameterRecord> {
        let value = match self.values.get(&name) {
            None => par.default,
            Some(ParValue::Number(v)) => *v,
            Some(ParValue::Text(text)) => text_as_number(par, &name, text)?,
        };

        let dispersion = if par.polydisperse {
            let shape = match self.get(&Part::PdType.decorate(&name)) {
                Some(ParValue::Text(tag)) => tag.parse()?,
                _ => DispersionShape::default(),
            };
            let npts = self.number_or(&Part::PdN.decorate(&name), 0.);
            Some(Dispersion {
                width: self.number_or(&Part::PdWidth.decorate(&name), 0.),
                npts: npts.max(0.).round() as usize,
                nsigma: self.number_or(&Part::PdNsigma.decorate(&name), 3.),
                shape,
            })
        } else {
            None
        };

        let magnetism = (par.role == Role::Sld).then(|| Magnetism {
            m0: self.number_or(&Part::Magnetic(MagneticPart::M0).decorate(&name), 0.),
            mtheta: self.number_or(&Part::Magnetic(MagneticPart::Theta).decorate(&name), 0.),
            mphi: self.number_or(&Part::Magnetic(MagneticPart::Phi).decorate(&name), 0.),
        });

        Ok(ParameterRecord {
            name,
            role: par.role,
            relative_pd: par.relative_pd,
            value,
            dispersion,
            magnetism,
        })
    }
}

fn text_as_number(par: &Parameter, name: &str, text: &str) -> Result<f64> {
    if let Ok(v) = text.trim().parse() {
        return Ok(v);
    }
    if let Limits::Choices(choices) = &par.limits {
        if let Some(k) = choices.iter().position(|c| c == text) {
            return Ok(k as f64);
        }
    }
    Err(SasErr::NotNumeric { name: name.into() })
}

impl FromIterator<(String, ParValue)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (String, ParValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Extend<(String, ParValue)> for ParameterSet {
    fn extend<T: IntoIterator<Item = (String, ParValue)>>(&mut self, iter: T) {
        self.values.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{FnKernel, KernelPars};

    fn core_shell() -> ModelInfo {
        ModelInfo::builder("onion", FnKernel(|_: f64, _: &KernelPars| 1.))
            .parameter(Parameter::new("sld_solvent", "", 6.4, Limits::unbounded(), Role::Sld))
            .parameter(Parameter::new("n", "", 2., Limits::range(0., 4.), Role::Other))
            .parameter(
                Parameter::new("sld", "", 1., Limits::unbounded(), Role::Sld).vector(4, Some("n")),
            )
            .parameter(Parameter::new("radius", "Ang", 50., Limits::non_negative(), Role::Volume))
            .parameter(Parameter::new("theta", "deg", 60., Limits::range(-360., 360.), Role::Orientation))
            .build()
    }

    #[test]
    fn keys_parse_into_facets() {
        let info = core_shell();

        let key = ParKey::parse("radius_pd_n", &info).unwrap();
        assert_eq!((key.base.as_str(), key.index, key.part), ("radius", None, Part::PdN));

        let key = ParKey::parse("M0:sld3", &info).unwrap();
        assert_eq!(key.part, Part::Magnetic(MagneticPart::M0));
        assert_eq!(key.scalar(), "sld3");
        assert_eq!(key.to_string(), "M0:sld3");

        let key = ParKey::parse("sld_solvent", &info).unwrap();
        assert_eq!((key.index, key.part), (None, Part::Value));

        let key = ParKey::parse("theta_pd_nsigma", &info).unwrap();
        assert_eq!(key.to_string(), "theta_pd_nsigma");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let info = core_shell();

        for key in ["radius_cap", "sld5", "sld", "sld_solvent_pd", "M0:radius", "n_pd_n"] {
            assert!(
                matches!(ParKey::parse(key, &info), Err(SasErr::UnknownParameter { .. })),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn suppress_pd_activates_first_dispersion() {
        let mut pars = ParameterSet::new();
        pars.set("radius", 50.);
        pars.set("radius_pd", 0.);
        pars.set("radius_pd_n", 0.);
        pars.set("theta_pd_n", 0.);

        let forced = pars.suppress_pd(false);
        assert_eq!(forced.number("radius_pd_n"), Some(35.));
        assert_eq!(forced.number("radius_pd"), Some(0.15));
        assert_eq!(forced.number("theta_pd_n"), Some(0.));

        let suppressed = forced.suppress_pd(true);
        assert_eq!(suppressed.number("radius_pd_n"), Some(0.));
    }

    #[test]
    fn suppress_pd_keeps_active_dispersion() {
        let mut pars = ParameterSet::new();
        pars.set("radius_pd", 0.1);
        pars.set("radius_pd_n", 0.);
        pars.set("theta_pd", 5.);
        pars.set("theta_pd_n", 10.);

        assert_eq!(pars.suppress_pd(false), pars);
    }

    #[test]
    fn suppress_magnetism_forces_first_moment() {
        let mut pars = ParameterSet::new();
        pars.set("M0:sld1", 0.);
        pars.set("M0:sld_solvent", 0.);

        let forced = pars.suppress_magnetism(false);
        assert_eq!(forced.number("M0:sld1"), Some(8.));
        assert_eq!(forced.number("M0:sld_solvent"), Some(0.));
        assert_eq!(forced.suppress_magnetism(true).number("M0:sld1"), Some(0.));
    }

    #[test]
    fn records_fill_defaults() {
        let info = core_shell();
        let mut pars = ParameterSet::new();
        pars.set("radius_pd", 0.1);
        pars.set("radius_pd_n", 35.);
        pars.set("radius_pd_type", "schulz");
        pars.set("M0:sld2", 2.);

        let records = pars.records(&info).unwrap();
        let radius = records.iter().find(|r| r.name == "radius").unwrap();
        let dispersion = radius.dispersion.as_ref().unwrap();
        assert_eq!(radius.value, 50.);
        assert_eq!((dispersion.npts, dispersion.shape), (35, DispersionShape::Schulz));
        assert!(dispersion.is_active());

        let sld2 = records.iter().find(|r| r.name == "sld2").unwrap();
        assert!(sld2.magnetism.as_ref().unwrap().is_active());
        assert!(sld2.dispersion.is_none());
        assert_eq!(records.iter().filter(|r| r.name.starts_with("sld")).count(), 5);
    }

    #[test]
    fn bad_dispersion_shape_is_an_error() {
        let info = core_shell();
        let mut pars = ParameterSet::new();
        pars.set("radius_pd_type", "triangle");

        assert!(matches!(pars.records(&info), Err(SasErr::InvalidValue { .. })));
    }

    #[test]
    fn untagged_values_deserialize() {
        let pars: ParameterSet =
            serde_json::from_str(r#"{"radius": 20.0, "radius_pd_type": "gaussian"}"#).unwrap();

        assert_eq!(pars.number("radius"), Some(20.));
        assert_eq!(pars.get("radius_pd_type"), Some(&ParValue::Text("gaussian".into())));
    }
}
