use sas_core::{Masked, format::sci};

/// Order statistics of the absolute errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Summary {
    NoValidValues,
    Stats {
        max: f64,
        median: f64,
        p98: f64,
        rms: f64,
        /// Mean of the absolute errors.
        zero_offset: f64,
    },
}

impl Summary {
    /// Formats the summary as one report line headed by `label`.
    pub fn line(&self, label: &str) -> String {
        match *self {
            Summary::NoValidValues => format!("{label}  no valid values"),
            Summary::Stats {
                max,
                median,
                p98,
                rms,
                zero_offset,
            } => format!(
                "{label}  max:{}  median:{}  98%:{}  rms:{}  zero-offset:{}",
                sci(max, 3, false),
                sci(median, 3, false),
                sci(p98, 3, false),
                sci(rms, 3, false),
                sci(zero_offset, 3, true),
            ),
        }
    }
}

/// Summarizes the unmasked entries of `errors`.
///
/// Percentiles index the sorted absolute errors at `floor((n - 1) * p)`.
pub fn summarize(errors: &Masked) -> Summary {
    let mut sorted: Vec<f64> = errors.compressed().into_iter().map(f64::abs).collect();
    if sorted.is_empty() {
        return Summary::NoValidValues;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let at = |p: f64| sorted[((n - 1) as f64 * p).floor() as usize];
    let mean = |f: fn(f64) -> f64| sorted.iter().map(|&e| f(e)).sum::<f64>() / n as f64;

    Summary::Stats {
        max: sorted[n - 1],
        median: at(0.5),
        p98: at(0.98),
        rms: mean(|e| e * e).sqrt(),
        zero_offset: mean(|e| e),
    }
}
