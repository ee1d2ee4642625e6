//! Shared vocabulary of the comparison harness: model descriptors, parameter
//! sets, evaluation grids, masked outputs and the calculator contract that
//! every engine implements.

mod calculator;
pub mod error;
pub mod format;
pub mod grid;
mod kernel;
mod masked;
pub mod model_info;
pub mod pars;

pub use calculator::Calculator;
pub use error::{Result, SasErr};
pub use grid::{Coords, EvalGrid, Resolution};
pub use kernel::{FnKernel, Kernel, KernelPars};
pub use masked::Masked;
pub use model_info::{Composition, Limits, ModelInfo, ModelInfoBuilder, Parameter, RandomHook, Role};
pub use pars::{
    Dispersion, DispersionShape, MagneticPart, Magnetism, ParKey, ParValue, ParameterRecord,
    ParameterSet, Part,
};
