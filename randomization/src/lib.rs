//! Reproducible random parameter sets: the scoped global generator, per-parameter
//! sampling heuristics, dispersion selection, model-specific repairs and presets.

pub mod constraints;
pub mod dispersion;
pub mod presets;
pub mod randomize;
pub mod range;
pub mod seed;

pub use constraints::{ConstraintRegistry, Repair, constrain_pars};
pub use dispersion::{select_dispersions, select_dispersions_with};
pub use presets::{get_pars, parlist, share_values};
pub use randomize::{randomize_one, randomize_one_with, randomize_pars, randomize_pars_with};
pub use range::parameter_range;
pub use seed::{Seed, SeedScope, with_rng};
