use std::{fmt, sync::Arc};

use rand::rngs::StdRng;

use crate::{
    kernel::{Kernel, KernelPars},
    pars::ParValue,
};

/// The semantic role of a parameter, which drives randomization and dispersion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sld,
    Volume,
    Orientation,
    Other,
}

/// The declared validity limits of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Limits {
    /// An inclusive numeric interval, possibly unbounded.
    Range { low: f64, high: f64 },
    /// A discrete choice list; values are indices into the list.
    Choices(Vec<String>),
}

impl Limits {
    pub fn range(low: f64, high: f64) -> Self {
        Limits::Range { low, high }
    }

    pub fn unbounded() -> Self {
        Limits::Range {
            low: f64::NEG_INFINITY,
            high: f64::INFINITY,
        }
    }

    pub fn non_negative() -> Self {
        Limits::Range {
            low: 0.,
            high: f64::INFINITY,
        }
    }

    /// The numeric bounds, choice lists spanning their index range.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Limits::Range { low, high } => (*low, *high),
            Limits::Choices(choices) => (0., choices.len().saturating_sub(1) as f64),
        }
    }

    pub fn is_finite(&self) -> bool {
        let (low, high) = self.bounds();
        low.is_finite() && high.is_finite()
    }
}

/// A parameter declaration of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub units: String,
    pub default: f64,
    pub limits: Limits,
    pub role: Role,
    pub polydisperse: bool,
    /// Dispersion width is a fraction of the value rather than an absolute width.
    pub relative_pd: bool,
    /// Number of slots of a vector parameter, `1` for scalars.
    pub length: usize,
    /// The parameter whose value sets how many slots of this vector are in use.
    pub length_control: Option<String>,
    pub description: String,
}

impl Parameter {
    /// Creates a new scalar `Parameter`.
    ///
    /// Volume and orientation parameters are polydisperse by default.
    ///
    /// # Arguments
    /// * `name` - The parameter name.
    /// * `units` - The units, for display only.
    /// * `default` - The default value.
    /// * `limits` - The inclusive validity limits.
    /// * `role` - The semantic role.
    pub fn new(name: &str, units: &str, default: f64, limits: Limits, role: Role) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            default,
            limits,
            role,
            polydisperse: matches!(role, Role::Volume | Role::Orientation),
            relative_pd: role == Role::Volume,
            length: 1,
            length_control: None,
            description: String::new(),
        }
    }

    pub fn polydisperse(mut self, polydisperse: bool) -> Self {
        self.polydisperse = polydisperse;
        self
    }

    /// Turns the parameter into a vector with `length` slots, optionally controlled by
    /// the value of another parameter.
    pub fn vector(mut self, length: usize, control: Option<&str>) -> Self {
        self.length = length.max(1);
        self.length_control = control.map(str::to_string);
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn is_vector(&self) -> bool {
        self.length > 1 || self.length_control.is_some()
    }

    /// The scalar names this declaration expands to: `name` for scalars, `name1..nameN`
    /// for vectors.
    pub fn scalar_names(&self) -> Vec<String> {
        if self.is_vector() {
            (1..=self.length).map(|k| format!("{}{k}", self.name)).collect()
        } else {
            vec![self.name.clone()]
        }
    }
}

/// A model-specific generator of sane random parameters. Its entries take precedence over
/// the generic randomization for the same keys.
pub type RandomHook = Arc<dyn Fn(&mut StdRng) -> Vec<(String, ParValue)> + Send + Sync>;

/// How a composite model is put together.
#[derive(Clone)]
pub enum Composition {
    /// Form factor times structure factor.
    Product(Arc<ModelInfo>, Arc<ModelInfo>),
    /// Sum of independent models.
    Mixture(Vec<Arc<ModelInfo>>),
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Composition::Product(p, s) => write!(f, "Product({}, {})", p.id, s.id),
            Composition::Mixture(parts) => {
                let ids: Vec<_> = parts.iter().map(|p| p.id.as_str()).collect();
                write!(f, "Mixture({ids:?})")
            }
        }
    }
}

/// The immutable manifest of a model.
#[derive(Clone)]
pub struct ModelInfo {
    id: String,
    title: String,
    parameters: Vec<Parameter>,
    kernel: Arc<dyn Kernel>,
    random: Option<RandomHook>,
    demo: Vec<(String, ParValue)>,
    single: bool,
    magnetic: bool,
    legacy_only: bool,
    composition: Option<Composition>,
}

impl ModelInfo {
    /// Starts the declaration of a model.
    ///
    /// # Arguments
    /// * `id` - The model identifier, also used for constraint dispatch.
    /// * `kernel` - The model's form.
    pub fn builder<K>(id: &str, kernel: K) -> ModelInfoBuilder
    where
        K: Kernel + 'static,
    {
        ModelInfoBuilder {
            id: id.to_string(),
            title: String::new(),
            parameters: Vec::new(),
            kernel: Arc::new(kernel),
            random: None,
            demo: Vec::new(),
            single: true,
            magnetic: true,
            legacy_only: false,
        }
    }

    /// Composes a form factor with a structure factor. The structure factor's `scale` and
    /// `background`, and any parameter already declared by the form factor, are dropped.
    pub fn product(form: Arc<ModelInfo>, structure: Arc<ModelInfo>) -> Self {
        let mut parameters = form.parameters.clone();
        for p in &structure.parameters {
            if !parameters.iter().any(|q| q.name == p.name) {
                parameters.push(p.clone());
            }
        }

        let mut demo = form.demo.clone();
        demo.extend(
            structure
                .demo
                .iter()
                .filter(|(k, _)| k != "scale" && k != "background")
                .cloned(),
        );

        let kernel = ProductKernel {
            form: Arc::clone(&form.kernel),
            structure: Arc::clone(&structure.kernel),
        };

        Self {
            id: format!("{}*{}", form.id, structure.id),
            title: format!("{} times {}", form.id, structure.id),
            parameters,
            kernel: Arc::new(kernel),
            random: form.random.clone(),
            demo,
            single: form.single && structure.single,
            magnetic: form.magnetic,
            legacy_only: form.legacy_only || structure.legacy_only,
            composition: Some(Composition::Product(form, structure)),
        }
    }

    /// Sums independent models. Parameters are merged by name, so parts sharing a name share
    /// its value; demo values and the random hook come from the first part.
    pub fn mixture(parts: Vec<Arc<ModelInfo>>) -> Option<Self> {
        let first = parts.first()?;

        let mut parameters: Vec<Parameter> = Vec::new();
        for p in parts.iter().flat_map(|part| &part.parameters) {
            if !parameters.iter().any(|q| q.name == p.name) {
                parameters.push(p.clone());
            }
        }
        let kernel = MixtureKernel {
            parts: parts.iter().map(|p| Arc::clone(&p.kernel)).collect(),
        };
        let ids: Vec<&str> = parts.iter().map(|p| p.id.as_str()).collect();

        Some(Self {
            id: ids.join("+"),
            title: format!("mixture of {}", ids.join(", ")),
            parameters,
            kernel: Arc::new(kernel),
            random: first.random.clone(),
            demo: first.demo.clone(),
            single: parts.iter().all(|p| p.single),
            magnetic: parts.iter().all(|p| p.magnetic),
            legacy_only: parts.iter().any(|p| p.legacy_only),
            composition: Some(Composition::Mixture(parts.clone())),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    pub fn kernel(&self) -> &dyn Kernel {
        self.kernel.as_ref()
    }

    pub fn random_hook(&self) -> Option<&RandomHook> {
        self.random.as_ref()
    }

    pub fn demo(&self) -> &[(String, ParValue)] {
        &self.demo
    }

    /// Whether the model is stable in single precision.
    pub fn is_single(&self) -> bool {
        self.single
    }

    pub fn supports_magnetism(&self) -> bool {
        self.magnetic
    }

    /// Whether the model only exists through the legacy adapter.
    pub fn is_legacy_only(&self) -> bool {
        self.legacy_only
    }

    pub fn composition(&self) -> Option<&Composition> {
        self.composition.as_ref()
    }

    /// The identifier used to look up model-specific behavior: the form factor for
    /// products, the first part for mixtures, the model itself otherwise.
    pub fn dispatch_id(&self) -> &str {
        match &self.composition {
            Some(Composition::Product(form, _)) => form.dispatch_id(),
            Some(Composition::Mixture(parts)) => parts
                .first()
                .map(|p| p.dispatch_id())
                .unwrap_or(self.id.as_str()),
            None => &self.id,
        }
    }
}

impl fmt::Debug for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInfo")
            .field("id", &self.id)
            .field("parameters", &self.parameters)
            .field("single", &self.single)
            .field("magnetic", &self.magnetic)
            .field("legacy_only", &self.legacy_only)
            .field("composition", &self.composition)
            .finish_non_exhaustive()
    }
}

/// Builds `ModelInfo`s, adding the `scale` and `background` parameters every model has.
pub struct ModelInfoBuilder {
    id: String,
    title: String,
    parameters: Vec<Parameter>,
    kernel: Arc<dyn Kernel>,
    random: Option<RandomHook>,
    demo: Vec<(String, ParValue)>,
    single: bool,
    magnetic: bool,
    legacy_only: bool,
}

impl ModelInfoBuilder {
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn random<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StdRng) -> Vec<(String, ParValue)> + Send + Sync + 'static,
    {
        self.random = Some(Arc::new(hook));
        self
    }

    pub fn demo<I, K, V>(mut self, demo: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParValue>,
    {
        self.demo = demo.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Marks the model as unstable in single precision.
    pub fn double_only(mut self) -> Self {
        self.single = false;
        self
    }

    /// Marks the model's evaluation as unable to handle magnetic parameters.
    pub fn non_magnetic(mut self) -> Self {
        self.magnetic = false;
        self
    }

    pub fn legacy_only(mut self) -> Self {
        self.legacy_only = true;
        self
    }

    pub fn build(self) -> ModelInfo {
        let mut parameters = vec![
            Parameter::new("scale", "", 1., Limits::non_negative(), Role::Other)
                .describe("Source intensity"),
            Parameter::new("background", "1/cm", 1e-3, Limits::unbounded(), Role::Other)
                .describe("Source background"),
        ];
        parameters.extend(self.parameters);

        ModelInfo {
            id: self.id,
            title: self.title,
            parameters,
            kernel: self.kernel,
            random: self.random,
            demo: self.demo,
            single: self.single,
            magnetic: self.magnetic,
            legacy_only: self.legacy_only,
            composition: None,
        }
    }
}

struct ProductKernel {
    form: Arc<dyn Kernel>,
    structure: Arc<dyn Kernel>,
}

impl Kernel for ProductKernel {
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        self.form.iq(q, pars) * self.structure.iq(q, pars)
    }

    fn iqxy(&self, qx: f64, qy: f64, pars: &KernelPars) -> f64 {
        self.form.iqxy(qx, qy, pars) * self.structure.iq(qx.hypot(qy), pars)
    }
}

struct MixtureKernel {
    parts: Vec<Arc<dyn Kernel>>,
}

impl Kernel for MixtureKernel {
    fn iq(&self, q: f64, pars: &KernelPars) -> f64 {
        self.parts.iter().map(|k| k.iq(q, pars)).sum()
    }

    fn iqxy(&self, qx: f64, qy: f64, pars: &KernelPars) -> f64 {
        self.parts.iter().map(|k| k.iqxy(qx, qy, pars)).sum()
    }
}
