use ndarray::{Array1, Zip};

use crate::error::{Result, SasErr};

/// A numeric array with an exclusion mask (`true` = excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct Masked {
    values: Array1<f64>,
    mask: Array1<bool>,
}

impl Masked {
    /// Creates a new `Masked`.
    ///
    /// # Arguments
    /// * `values` - The raw values.
    /// * `mask` - The exclusion mask, of the same length as `values`.
    pub fn new(values: Array1<f64>, mask: Array1<bool>) -> Result<Self> {
        if values.len() != mask.len() {
            return Err(SasErr::SizeMismatch {
                what: "mask",
                got: mask.len(),
                expected: values.len(),
            });
        }
        Ok(Self { values, mask })
    }

    pub fn unmasked(values: Array1<f64>) -> Self {
        let mask = Array1::from_elem(values.len(), false);
        Self { values, mask }
    }

    /// Additionally masks every non-finite value.
    pub fn masked_invalid(mut self) -> Self {
        Zip::from(&mut self.mask)
            .and(&self.values)
            .for_each(|m, v| *m |= !v.is_finite());
        self
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn mask(&self) -> &Array1<bool> {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The included values, in order.
    pub fn compressed(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(&self.mask)
            .filter(|(_, m)| !**m)
            .map(|(v, _)| *v)
            .collect()
    }

    /// Sum of the included values.
    pub fn sum(&self) -> f64 {
        self.compressed().iter().sum()
    }

    /// Indices of masked points whose value is not finite.
    pub fn invalid_points(&self) -> Vec<usize> {
        self.values
            .iter()
            .zip(&self.mask)
            .enumerate()
            .filter(|(_, (v, m))| **m && !v.is_finite())
            .map(|(i, _)| i)
            .collect()
    }

    /// Combines two arrays point by point; a point is masked if it is masked in either.
    pub fn zip_with<F>(&self, other: &Masked, f: F) -> Result<Masked>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.len() != other.len() {
            return Err(SasErr::SizeMismatch {
                what: "masked array",
                got: other.len(),
                expected: self.len(),
            });
        }

        let values = Zip::from(&self.values)
            .and(&other.values)
            .map_collect(|&a, &b| f(a, b));
        let mask = Zip::from(&self.mask)
            .and(&other.mask)
            .map_collect(|&a, &b| a || b);
        Ok(Masked { values, mask })
    }
}
