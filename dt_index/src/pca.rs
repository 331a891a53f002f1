//! Principal component analysis of the standardized indicators.
//!
//! The components are the eigenvectors of the covariance matrix, computed with
//! cyclic Jacobi rotations (one row and column per indicator).

use log::{debug, info};
use ndarray::{Array1, Array2, Axis};

const MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-15;

/// Eigenvalues and eigenvectors of a symmetric matrix.
///
/// The eigenvectors are the columns of the returned matrix, in the same order
/// as the eigenvalues. No ordering is applied.
pub fn symmetric_eigen(m: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = m.nrows();
    assert_eq!(n, m.ncols(), "symmetric_eigen: the matrix must be square");
    let mut a = m.clone();
    let mut v: Array2<f64> = Array2::eye(n);

    let scale = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    for sweep in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off.sqrt() <= JACOBI_TOLERANCE * scale {
            debug!("symmetric_eigen: converged after {} sweeps", sweep);
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                // The smaller root of t^2 + 2 theta t - 1 = 0.
                let t = if theta >= 0.0 {
                    1.0 / (theta + (theta * theta + 1.0).sqrt())
                } else {
                    -1.0 / (-theta + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                rotate_columns(&mut a, p, q, c, s);
                rotate_rows(&mut a, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }
    }
    (a.diag().to_owned(), v)
}

fn rotate_columns(m: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.nrows() {
        let mkp = m[[k, p]];
        let mkq = m[[k, q]];
        m[[k, p]] = c * mkp - s * mkq;
        m[[k, q]] = s * mkp + c * mkq;
    }
}

fn rotate_rows(m: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.ncols() {
        let mpk = m[[p, k]];
        let mqk = m[[q, k]];
        m[[p, k]] = c * mpk - s * mqk;
        m[[q, k]] = s * mpk + c * mqk;
    }
}

/// The sample covariance matrix (division by n - 1) of the columns of `x`.
pub fn covariance(x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let means = x.sum_axis(Axis(0)) / n.max(1) as f64;
    let centered = x - &means;
    let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };
    centered.t().dot(&centered) / denom
}

/// A fitted decomposition.
#[derive(PartialEq, Debug, Clone)]
pub struct Decomposition {
    /// The variance along each component, in decreasing order.
    pub explained_variance: Vec<f64>,
    pub explained_variance_ratio: Vec<f64>,
    /// One component per row, one indicator per column.
    pub components: Array2<f64>,
}

impl Decomposition {
    /// Fits all the components of `x` (rows are observations).
    ///
    /// Components are sorted by decreasing variance. Ties keep the order in
    /// which the eigensolver returns them, which follows the column order.
    /// Every component is oriented so that its largest loading is positive.
    pub fn fit(x: &Array2<f64>) -> Decomposition {
        let cov = covariance(x);
        let (eigenvalues, eigenvectors) = symmetric_eigen(&cov);
        let n = eigenvalues.len();

        let mut order: Vec<usize> = (0..n).collect();
        // Stable sort: equal variances keep the column order.
        order.sort_by(|&i, &j| {
            eigenvalues[j]
                .partial_cmp(&eigenvalues[i])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let explained_variance: Vec<f64> =
            order.iter().map(|&i| eigenvalues[i].max(0.0)).collect();
        let total: f64 = explained_variance.iter().sum();
        let explained_variance_ratio: Vec<f64> = explained_variance
            .iter()
            .map(|v| if total > 0.0 { v / total } else { 0.0 })
            .collect();

        let mut components: Array2<f64> = Array2::zeros((n, eigenvectors.nrows()));
        for (row, &i) in order.iter().enumerate() {
            let mut comp = eigenvectors.column(i).to_owned();
            let mut pivot = 0;
            for (k, x) in comp.iter().enumerate() {
                if x.abs() > comp[pivot].abs() {
                    pivot = k;
                }
            }
            if comp[pivot] < 0.0 {
                comp.mapv_inplace(|x| -x);
            }
            components.row_mut(row).assign(&comp);
        }

        debug!(
            "Decomposition::fit: explained variance ratio: {:?}",
            explained_variance_ratio
        );
        Decomposition {
            explained_variance,
            explained_variance_ratio,
            components,
        }
    }

    /// The decomposition restricted to its leading `k` components.
    pub fn truncate(&self, k: usize) -> Decomposition {
        let k = k.min(self.explained_variance.len());
        Decomposition {
            explained_variance: self.explained_variance[..k].to_vec(),
            explained_variance_ratio: self.explained_variance_ratio[..k].to_vec(),
            components: self.components.slice(ndarray::s![..k, ..]).to_owned(),
        }
    }
}

pub fn cumulative(ratios: &[f64]) -> Vec<f64> {
    ratios
        .iter()
        .scan(0.0, |acc, r| {
            *acc += r;
            Some(*acc)
        })
        .collect()
}

/// The smallest number of leading components whose cumulative explained
/// variance ratio reaches `threshold`, or all of them if it is never reached.
pub fn components_for_threshold(ratios: &[f64], threshold: f64) -> usize {
    let cum = cumulative(ratios);
    match cum.iter().position(|c| *c >= threshold) {
        Some(idx) => idx + 1,
        None => ratios.len(),
    }
}

/// Fits the full decomposition, chooses the number of components for the
/// threshold, and returns the decomposition restricted to them along with the
/// ratios of all the components.
pub fn fit_for_threshold(x: &Array2<f64>, threshold: f64) -> (Decomposition, Vec<f64>) {
    let full = Decomposition::fit(x);
    let k = components_for_threshold(&full.explained_variance_ratio, threshold);
    let cum = cumulative(&full.explained_variance_ratio);
    if k > 0 {
        info!(
            "Selected {} principal component(s), cumulative explained variance: {:.2}%",
            k,
            cum[k - 1] * 100.0
        );
    }
    (full.truncate(k), full.explained_variance_ratio)
}
