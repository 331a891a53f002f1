//! Column-wise standardization: z = (x - mean) / std.

use log::{debug, warn};
use ndarray::{Array2, Axis};

// Relative to the magnitude of the mean.
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// The parameters of the standardization, fit once on the cleaned data.
///
/// The standard deviation uses the population formula (division by n).
/// A column without variance gets a scale of 1, which maps all its values to
/// zero.
#[derive(PartialEq, Debug, Clone)]
pub struct Standardizer {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub constant: Vec<bool>,
}

impl Standardizer {
    pub fn fit(x: &Array2<f64>) -> Standardizer {
        let n = x.nrows();
        let mut means: Vec<f64> = Vec::with_capacity(x.ncols());
        let mut scales: Vec<f64> = Vec::with_capacity(x.ncols());
        let mut constant: Vec<bool> = Vec::with_capacity(x.ncols());
        for col in x.axis_iter(Axis(1)) {
            if n == 0 {
                means.push(0.0);
                scales.push(1.0);
                constant.push(true);
                continue;
            }
            let mean = col.sum() / n as f64;
            let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
            let std = var.sqrt();
            let is_constant = !(std > ZERO_VARIANCE_TOLERANCE * (1.0 + mean.abs()));
            means.push(mean);
            scales.push(if is_constant { 1.0 } else { std });
            constant.push(is_constant);
        }
        debug!(
            "Standardizer::fit: means: {:?} scales: {:?}",
            means, scales
        );
        Standardizer {
            means,
            scales,
            constant,
        }
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut z = x.clone();
        for (j, mut col) in z.axis_iter_mut(Axis(1)).enumerate() {
            if self.constant[j] {
                col.fill(0.0);
            } else {
                let (mean, scale) = (self.means[j], self.scales[j]);
                col.mapv_inplace(|v| (v - mean) / scale);
            }
        }
        z
    }
}

/// Fits on `x` and standardizes it. The names are only used for reporting the
/// constant columns.
pub fn standardize(x: &Array2<f64>, names: &[String]) -> (Standardizer, Array2<f64>) {
    let st = Standardizer::fit(x);
    for (name, c) in names.iter().zip(st.constant.iter()) {
        if *c {
            warn!(
                "Indicator {:?} has no variance: it is set to zero and gets no weight",
                name
            );
        }
    }
    let z = st.transform(x);
    (st, z)
}
