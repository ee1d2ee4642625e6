use std::sync::Arc;

use ndarray::{Array1, Zip};
use sas_core::{
    Calculator, Coords, EvalGrid, KernelPars, Masked, ModelInfo, ParKey, ParameterRecord,
    ParameterSet, Resolution, Result, Role, SasErr,
};

use crate::{precision::Precision, weights::dispersion_points};

/// Offsets, in widths, of the points averaged by pinhole smearing.
const RESOLUTION_OFFSETS: [f64; 7] = [-2.5, -5. / 3., -5. / 6., 0., 5. / 6., 5. / 3., 2.5];

/// One dispersed parameter: its name and `(value, weight)` points.
struct Axis {
    name: String,
    points: Vec<(f64, f64)>,
}

/// The dispersion mesh as one axis per dispersed parameter. Points are visited by
/// walking the axis indices, so the full product is never stored.
struct Mesh {
    base: KernelPars,
    axes: Vec<Axis>,
    /// Points weighing less than this are skipped.
    floor: f64,
}

impl Mesh {
    /// Calls `f` with the kernel inputs and joint weight of every kept point. The first
    /// axis varies fastest.
    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&KernelPars, f64),
    {
        if self.axes.iter().any(|axis| axis.points.is_empty()) {
            return;
        }

        let mut pars = self.base.clone();
        let mut index = vec![0; self.axes.len()];
        for axis in &self.axes {
            pars.replace(&axis.name, axis.points[0].0);
        }

        loop {
            let weight: f64 = self
                .axes
                .iter()
                .zip(&index)
                .map(|(axis, &i)| axis.points[i].1)
                .product();
            if weight >= self.floor {
                f(&pars, weight);
            }

            let mut d = 0;
            loop {
                let Some(axis) = self.axes.get(d) else {
                    return;
                };
                index[d] += 1;
                if index[d] < axis.points.len() {
                    pars.replace(&axis.name, axis.points[index[d]].0);
                    break;
                }
                index[d] = 0;
                pars.replace(&axis.name, axis.points[0].0);
                d += 1;
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        let mut n = 0;
        self.for_each(|_, _| n += 1);
        n
    }
}

/// Evaluates a model kernel directly on every grid point, integrating over the active
/// dispersions.
///
/// The parallel variant spreads grid points over the rayon pool; both variants round
/// kernel inputs, kernel outputs and running sums to the engine precision.
pub struct DirectModel {
    info: Arc<ModelInfo>,
    grid: Arc<EvalGrid>,
    precision: Precision,
    parallel: bool,
    cutoff: f64,
    engine: String,
}

impl DirectModel {
    /// Creates a new `DirectModel`.
    ///
    /// # Arguments
    /// * `info` - The model to evaluate.
    /// * `grid` - The points to evaluate at.
    /// * `precision` - The arithmetic width to emulate.
    /// * `parallel` - Whether grid points are evaluated on the rayon pool.
    /// * `cutoff` - Mesh points weighing less than `cutoff` times the heaviest are skipped.
    pub fn new(
        info: Arc<ModelInfo>,
        grid: Arc<EvalGrid>,
        precision: Precision,
        parallel: bool,
        cutoff: f64,
    ) -> Self {
        let backend = if parallel { "ACC" } else { "SEQ" };
        Self {
            info,
            grid,
            precision,
            parallel,
            cutoff,
            engine: format!("{backend}{}", precision.tag()),
        }
    }

    /// Builds the weighted dispersion mesh for the parameter set.
    fn mesh(&self, records: &[ParameterRecord]) -> Result<Mesh> {
        let p = self.precision;
        let mut base = KernelPars::new();
        let mut axes = Vec::new();

        for record in records {
            base.set(record.name.clone(), record.value);
            let value = p.round(record.value);

            let Some(pd) = record.dispersion.as_ref().filter(|d| d.is_active()) else {
                continue;
            };
            // Orientation averaging only shows in 2-D.
            if record.role == Role::Orientation && !self.grid.is_2d() {
                continue;
            }

            let sigma = if record.relative_pd {
                pd.width * value.abs()
            } else {
                pd.width
            };
            let limits = self.limits(&record.name)?;
            let points = dispersion_points(pd.shape, value, sigma, pd.npts, pd.nsigma, limits)
                .into_iter()
                .map(|(x, w)| (p.round(x), w))
                .collect();
            axes.push(Axis {
                name: record.name.clone(),
                points,
            });
        }

        let heaviest: f64 = axes
            .iter()
            .map(|axis| axis.points.iter().map(|&(_, w)| w).fold(0., f64::max))
            .product();
        Ok(Mesh {
            base: base.map_values(|v| p.round(v)),
            axes,
            floor: self.cutoff * heaviest,
        })
    }

    fn limits(&self, scalar: &str) -> Result<(f64, f64)> {
        let key = ParKey::parse(scalar, &self.info)?;
        self.info
            .parameter(&key.base)
            .map(|par| par.limits.bounds())
            .ok_or_else(|| SasErr::UnknownParameter {
                model: self.info.id().into(),
                name: scalar.into(),
            })
    }

    /// Dispersion-averaged kernel at one coordinate, before scale and background.
    fn average<F>(&self, mesh: &Mesh, kernel: F) -> f64
    where
        F: Fn(&KernelPars) -> f64,
    {
        let p = self.precision;
        let mut total = 0.;
        let mut norm = 0.;
        mesh.for_each(|pars, w| {
            total = p.round(total + p.round(w * p.round(kernel(pars))));
            norm += w;
        });
        if norm == 0. { 0. } else { p.round(total / norm) }
    }

    fn iq(&self, mesh: &Mesh, q: f64) -> f64 {
        let kernel = self.info.kernel();
        let q = self.precision.round(q);
        self.average(mesh, |pars| kernel.iq(q, pars))
    }

    fn iq_smeared(&self, mesh: &Mesh, q: f64) -> f64 {
        let Some(Resolution::Pinhole { dq_over_q }) = self.grid.resolution() else {
            return self.iq(mesh, q);
        };
        let dq = dq_over_q * q;
        if dq <= 0. {
            return self.iq(mesh, q);
        }

        let mut total = 0.;
        let mut norm = 0.;
        for z in RESOLUTION_OFFSETS {
            let qz = q + z * dq;
            if qz <= 0. {
                continue;
            }
            let w = (-0.5 * z * z).exp();
            total += w * self.iq(mesh, qz);
            norm += w;
        }
        self.precision.round(total / norm)
    }

    fn iqxy(&self, mesh: &Mesh, qx: f64, qy: f64) -> f64 {
        let kernel = self.info.kernel();
        let (qx, qy) = (self.precision.round(qx), self.precision.round(qy));
        self.average(mesh, |pars| kernel.iqxy(qx, qy, pars))
    }

    fn intensity(&self, records: &[ParameterRecord], mesh: &Mesh) -> Array1<f64> {
        let p = self.precision;
        let value = |name: &str, default: f64| {
            records
                .iter()
                .find(|r| r.name == name)
                .map_or(default, |r| p.round(r.value))
        };
        let scale = value("scale", 1.);
        let background = value("background", 0.);
        let finish = |i: f64| p.round(p.round(scale * i) + background);
        let mask = self.grid.mask();

        match self.grid.coords() {
            Coords::OneD(q) => {
                let point = |&q: &f64, &masked: &bool| {
                    if masked { 0. } else { finish(self.iq_smeared(mesh, q)) }
                };
                if self.parallel {
                    Zip::from(q).and(mask).par_map_collect(point)
                } else {
                    Zip::from(q).and(mask).map_collect(point)
                }
            }
            Coords::TwoD { qx, qy } => {
                let point = |&qx: &f64, &qy: &f64, &masked: &bool| {
                    if masked { 0. } else { finish(self.iqxy(mesh, qx, qy)) }
                };
                if self.parallel {
                    Zip::from(qx).and(qy).and(mask).par_map_collect(point)
                } else {
                    Zip::from(qx).and(qy).and(mask).map_collect(point)
                }
            }
        }
    }
}

impl Calculator for DirectModel {
    fn engine(&self) -> &str {
        &self.engine
    }

    fn evaluate(&self, pars: &ParameterSet) -> Result<Masked> {
        pars.validate(&self.info)?;
        let records = pars.records(&self.info)?;
        let mesh = self.mesh(&records)?;
        let values = self.intensity(&records, &mesh);
        Masked::new(values, self.grid.mask().clone())
    }
}
