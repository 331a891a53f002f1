use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView2};

/// The index value given to every row when all the raw scores are equal.
pub const DEGENERATE_INDEX: u8 = 50;

const ZERO_RANGE_TOLERANCE: f64 = 1e-12;

/// One weight per indicator: the sum of the absolute loadings over the
/// retained components, normalized to sum to 1.
///
/// `loadings` has one row per retained component and one column per
/// indicator. If all the loadings are zero (no component was retained), every
/// indicator gets the same weight.
pub fn loading_weights(loadings: ArrayView2<f64>) -> Vec<f64> {
    let n = loadings.ncols();
    let sums: Vec<f64> = loadings
        .columns()
        .into_iter()
        .map(|col| col.iter().map(|x| x.abs()).sum())
        .collect();
    let total: f64 = sums.iter().sum();
    if total > 0.0 {
        sums.iter().map(|s| s / total).collect()
    } else {
        warn!("No loading available: every indicator gets the same weight");
        vec![1.0 / n as f64; n]
    }
}

/// The weighted sum of the standardized indicators, per row.
pub fn raw_scores(z: &Array2<f64>, weights: &[f64]) -> Vec<f64> {
    let w = Array1::from(weights.to_vec());
    z.dot(&w).to_vec()
}

/// Maps the raw scores linearly onto [0, 100] and rounds them (half to even).
///
/// The smallest score gets 0 and the largest 100. When they are equal, every
/// row gets `DEGENERATE_INDEX`.
pub fn rescale(raw: &[f64]) -> Vec<u8> {
    let min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    debug!("rescale: min: {} max: {}", min, max);
    if raw.is_empty() {
        return Vec::new();
    }
    if !(range > ZERO_RANGE_TOLERANCE) {
        warn!(
            "All the rows have the same score: the index is set to {} for every row",
            DEGENERATE_INDEX
        );
        return vec![DEGENERATE_INDEX; raw.len()];
    }
    raw.iter()
        .map(|x| {
            let scaled = ((x - min) / range * 100.0).round_ties_even();
            scaled.clamp(0.0, 100.0) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn weights_from_absolute_loadings() {
        let loadings = array![[0.6, -0.8, 0.0], [0.0, 0.6, -0.8]];
        let w = loading_weights(loadings.view());
        assert!((w[0] - 0.6 / 2.8).abs() < 1e-12);
        assert!((w[1] - 1.4 / 2.8).abs() < 1e-12);
        assert!((w[2] - 0.8 / 2.8).abs() < 1e-12);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_loadings_give_uniform_weights() {
        let loadings: Array2<f64> = Array2::zeros((0, 4));
        assert_eq!(loading_weights(loadings.view()), vec![0.25; 4]);
    }

    #[test]
    fn scores_are_dot_products() {
        let z = array![[1.0, 2.0], [-1.0, 0.5]];
        assert_eq!(raw_scores(&z, &[0.25, 0.75]), vec![1.75, 0.125]);
    }

    #[test]
    fn rescale_hits_both_bounds() {
        assert_eq!(rescale(&[-2.0, 0.0, 2.0, 1.0]), vec![0, 50, 100, 75]);
    }

    #[test]
    fn rescale_rounds_half_to_even() {
        // 0.125 * 100 = 12.5 -> 12, 0.375 * 100 = 37.5 -> 38
        assert_eq!(rescale(&[0.0, 0.125, 0.375, 1.0]), vec![0, 12, 38, 100]);
    }

    #[test]
    fn zero_range_maps_to_midpoint() {
        assert_eq!(rescale(&[3.0, 3.0, 3.0]), vec![50, 50, 50]);
        assert_eq!(rescale(&[0.0]), vec![50]);
        assert!(rescale(&[]).is_empty());
    }
}
