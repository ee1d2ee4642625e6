//! Cross-engine comparison of scattering models: configuration, the per-round
//! comparison and its statistics, and the multi-set driver behind `sascomp`.

pub mod configs;
pub mod error;
pub mod runner;
mod session;
pub mod stats;

use std::{io::Write, path::Path};

use configs::{Adapter, CompareConfig};
use log::info;

pub use error::{CompareError, Result};
pub use runner::{RunResult, SideResult, relative_error, run_models};
pub use session::Session;
pub use stats::{Summary, summarize};

/// Runs the comparison described by `config`, writing the report to `out`.
///
/// # Errors
/// Returns a `CompareError` if the configuration is invalid, a model cannot be loaded
/// or the base calculator fails.
pub fn compare<W: Write>(config: CompareConfig, out: &mut W) -> Result<Vec<RunResult>> {
    info!("adapting config");
    let plan = Adapter::new().adapt(config)?;
    info!(
        "comparing {} on {} against {} on {}",
        plan.models[0], plan.engines[0], plan.models[1], plan.engines[1]
    );
    Session::new(plan)?.run(out)
}

/// Loads the configuration at `path` and runs it.
pub fn compare_file<W: Write>(path: impl AsRef<Path>, out: &mut W) -> Result<Vec<RunResult>> {
    compare(CompareConfig::load(path)?, out)
}
