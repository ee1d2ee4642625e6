use std::sync::Arc;

use log::info;
use sas_core::{Calculator, EvalGrid, ModelInfo, Result, SasErr};

use crate::{
    direct::DirectModel,
    legacy::{LegacyCalculator, LegacyCatalog},
    precision::Precision,
    spec::{EngineSpec, PrecisionRequest},
};

/// Which backends this machine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub accelerator: bool,
    pub half_precision: bool,
    pub legacy: bool,
}

impl Capabilities {
    /// Probes the current machine. The accelerated backend needs more than one worker in
    /// the rayon pool.
    pub fn detect() -> Self {
        Self {
            accelerator: rayon::current_num_threads() > 1,
            half_precision: true,
            legacy: true,
        }
    }

    pub fn all() -> Self {
        Self {
            accelerator: true,
            half_precision: true,
            legacy: true,
        }
    }
}

/// Builds calculators for an `EngineSpec`, checking the request against what the machine
/// and the model support.
pub struct EngineFactory {
    capabilities: Capabilities,
    legacy: LegacyCatalog,
}

impl EngineFactory {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            legacy: LegacyCatalog::new(),
        }
    }

    /// Builds the calculator for `spec`.
    ///
    /// # Arguments
    /// * `info` - The model to evaluate.
    /// * `grid` - The shared evaluation grid.
    /// * `spec` - The requested engine.
    /// * `cutoff` - The dispersion weight cutoff.
    ///
    /// # Returns
    /// The calculator, or `SasErr::Unavailable` when the backend or precision cannot run
    /// here. Legacy name lookups fail with their own errors.
    pub fn build(
        &self,
        info: &Arc<ModelInfo>,
        grid: &Arc<EvalGrid>,
        spec: EngineSpec,
        cutoff: f64,
    ) -> Result<Box<dyn Calculator>> {
        let calculator: Box<dyn Calculator> = match spec {
            EngineSpec::Legacy => {
                if !self.capabilities.legacy {
                    return Err(unavailable("legacy", "the legacy model library is not installed"));
                }
                let calc = LegacyCalculator::new(&self.legacy, info.clone(), grid.clone(), cutoff)?;
                Box::new(calc)
            }
            EngineSpec::Accelerated(request) => {
                if !self.capabilities.accelerator {
                    return Err(unavailable("accelerated", "no parallel workers available"));
                }
                native_only(info, "accelerated")?;
                let precision = self.accelerated_precision(info, request)?;
                Box::new(DirectModel::new(info.clone(), grid.clone(), precision, true, cutoff))
            }
            EngineSpec::Sequential(request) => {
                native_only(info, "sequential")?;
                let precision = match request {
                    PrecisionRequest::Default => Precision::Double,
                    PrecisionRequest::Named(p @ (Precision::Single | Precision::Double)) => p,
                    _ => {
                        let reason = format!("{spec} precision is not supported");
                        return Err(unavailable("sequential", &reason));
                    }
                };
                Box::new(DirectModel::new(info.clone(), grid.clone(), precision, false, cutoff))
            }
        };

        info!(model = info.id(), engine = calculator.engine(); "built calculator");
        Ok(calculator)
    }

    fn accelerated_precision(&self, info: &ModelInfo, request: PrecisionRequest) -> Result<Precision> {
        match request {
            PrecisionRequest::Default if info.is_single() => Ok(Precision::Single),
            PrecisionRequest::Default => Ok(Precision::Double),
            PrecisionRequest::Named(Precision::Half) if !self.capabilities.half_precision => {
                Err(unavailable("accelerated", "half precision is not supported here"))
            }
            PrecisionRequest::Named(p) => Ok(p),
            PrecisionRequest::Quad => Err(unavailable("accelerated", "quad precision is not supported")),
        }
    }
}

/// Builds a calculator with the capabilities of the current machine.
pub fn build_engine(
    info: &Arc<ModelInfo>,
    grid: &Arc<EvalGrid>,
    spec: EngineSpec,
    cutoff: f64,
) -> Result<Box<dyn Calculator>> {
    EngineFactory::new(Capabilities::detect()).build(info, grid, spec, cutoff)
}

fn native_only(info: &ModelInfo, backend: &str) -> Result<()> {
    if info.is_legacy_only() {
        let reason = format!("{} only exists in the legacy library", info.id());
        return Err(unavailable(backend, &reason));
    }
    Ok(())
}

fn unavailable(backend: &str, reason: &str) -> SasErr {
    SasErr::Unavailable {
        backend: backend.into(),
        reason: reason.into(),
    }
}
