use ndarray::{Array1, Zip};

use crate::{
    error::{Result, SasErr},
    format::general,
};

/// Beam stop radius applied to synthetic 2-D detectors.
pub const DEFAULT_BEAM_STOP: f64 = 0.0004;

/// Evaluation coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Coords {
    OneD(Array1<f64>),
    /// Flattened detector pixels.
    TwoD { qx: Array1<f64>, qy: Array1<f64> },
}

/// Instrument resolution applied to 1-D grids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Gaussian pinhole smearing with a width proportional to q.
    Pinhole { dq_over_q: f64 },
}

/// The points a model is evaluated at, shared read-only by every engine of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalGrid {
    coords: Coords,
    resolution: Option<Resolution>,
    /// `true` excludes the point.
    mask: Array1<bool>,
}

impl EvalGrid {
    /// Creates a 1-D grid with every point included.
    pub fn one_d(q: Array1<f64>) -> Self {
        let mask = Array1::from_elem(q.len(), false);
        Self {
            coords: Coords::OneD(q),
            resolution: None,
            mask,
        }
    }

    /// Creates a 2-D grid from flattened pixel coordinates.
    pub fn two_d(qx: Array1<f64>, qy: Array1<f64>) -> Result<Self> {
        if qx.len() != qy.len() {
            return Err(SasErr::SizeMismatch {
                what: "qy",
                got: qy.len(),
                expected: qx.len(),
            });
        }

        let mask = Array1::from_elem(qx.len(), false);
        Ok(Self {
            coords: Coords::TwoD { qx, qy },
            resolution: None,
            mask,
        })
    }

    /// `nq` points evenly spaced in `[qmax / 1000, qmax]`.
    pub fn linear_1d(qmax: f64, nq: usize) -> Self {
        Self::one_d(Array1::linspace(0.001 * qmax, qmax, nq))
    }

    /// `nq` points evenly spaced in log q over the three decades below `qmax`.
    pub fn log_1d(qmax: f64, nq: usize) -> Self {
        let top = qmax.log10();
        Self::one_d(Array1::logspace(10., top - 3., top, nq))
    }

    /// A square detector of `nq x nq` pixels spanning `[-qmax, qmax]` on both axes, with
    /// the default beam stop.
    pub fn square_2d(qmax: f64, nq: usize) -> Self {
        let axis = Array1::linspace(-qmax, qmax, nq);
        let qx = Array1::from_iter((0..nq * nq).map(|i| axis[i % nq]));
        let qy = Array1::from_iter((0..nq * nq).map(|i| axis[i / nq]));
        let mask = Array1::from_elem(nq * nq, false);

        let grid = Self {
            coords: Coords::TwoD { qx, qy },
            resolution: None,
            mask,
        };
        grid.with_beam_stop(DEFAULT_BEAM_STOP, None)
    }

    /// Prepends a `q = 0` point to a 1-D grid; 2-D grids are returned unchanged.
    pub fn with_zero(self) -> Self {
        let Coords::OneD(q) = &self.coords else {
            return self;
        };

        let mut points = vec![0.];
        points.extend(q.iter().copied());
        Self {
            resolution: self.resolution,
            ..Self::one_d(Array1::from_vec(points))
        }
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Masks every point with `|q| < radius`, and with `|q| >= outer` when given.
    pub fn with_beam_stop(mut self, radius: f64, outer: Option<f64>) -> Self {
        let q = self.q_magnitude();
        Zip::from(&mut self.mask).and(&q).for_each(|m, &q| {
            *m = q < radius || outer.is_some_and(|outer| q >= outer);
        });
        self
    }

    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    pub fn mask(&self) -> &Array1<bool> {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn is_2d(&self) -> bool {
        matches!(self.coords, Coords::TwoD { .. })
    }

    /// `|q|` at every point.
    pub fn q_magnitude(&self) -> Array1<f64> {
        match &self.coords {
            Coords::OneD(q) => q.mapv(f64::abs),
            Coords::TwoD { qx, qy } => Zip::from(qx).and(qy).map_collect(|x, y| x.hypot(*y)),
        }
    }

    /// Describes the intensity at point `i` with its coordinates, e.g. `I(0.1)=nan`.
    pub fn describe_point(&self, i: usize, value: f64) -> String {
        let value = general(value);
        match &self.coords {
            Coords::OneD(q) => format!("I({})={value}", general(q[i])),
            Coords::TwoD { qx, qy } => format!("I({},{})={value}", general(qx[i]), general(qy[i])),
        }
    }
}
