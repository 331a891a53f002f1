pub mod builder;
mod cleaning;
mod config;
pub mod manual;
pub mod pca;
mod scoring;
mod standardize;

use log::{debug, info};
use ndarray::{Array2, Axis};

pub use crate::cleaning::{clean, normalize_entity_id};
pub use crate::config::*;
pub use crate::scoring::{loading_weights, raw_scores, rescale, DEGENERATE_INDEX};
pub use crate::standardize::{standardize, Standardizer};

/// Builds the digital transformation index for a raw dataset.
///
/// The steps are:
/// * cleaning: checking the columns and dropping the incomplete rows
/// * standardization of every indicator
/// * principal component analysis of the standardized indicators, keeping the
///   leading components that explain `config.variance_threshold` of the variance
/// * one weight per indicator, from the magnitude of its loadings
/// * the weighted sum per row, rescaled to an integer between 0 and 100
///
/// Arguments:
/// * `raw` the input table, including its header
/// * `config` the column roles and the options of the run
pub fn build_index(raw: &RawDataset, config: &IndexConfig) -> Result<IndexResult, IndexError> {
    info!(
        "build_index: processing {} rows, {} columns",
        raw.rows.len(),
        raw.columns.len()
    );
    debug!("build_index: config: {:?}", config);
    let threshold = config.variance_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(IndexError::InvalidThreshold(threshold));
    }

    let (cleaned, mut report) = clean(raw, config)?;
    if cleaned.records.is_empty() {
        return Err(IndexError::EmptyDataset);
    }

    let n = cleaned.records.len();
    let m = cleaned.indicators.len();
    let x = Array2::from_shape_fn((n, m), |(i, j)| cleaned.records[i].counts[j]);
    let (st, z) = standardize(&x, &cleaned.indicators);
    report.constant_indicators = cleaned
        .indicators
        .iter()
        .zip(st.constant.iter())
        .filter(|(_, c)| **c)
        .map(|(name, _)| name.clone())
        .collect();

    // Constant indicators carry no variance: they stay out of the
    // decomposition and keep a zero loading.
    let active: Vec<usize> = (0..m).filter(|j| !st.constant[*j]).collect();
    let components = if active.is_empty() {
        ComponentSummary {
            explained_variance_ratio: Vec::new(),
            cumulative_variance_ratio: Vec::new(),
            retained: 0,
            loadings: Array2::zeros((0, m)),
        }
    } else {
        let z_active = z.select(Axis(1), &active);
        let (dec, ratios) = pca::fit_for_threshold(&z_active, threshold);
        let retained = dec.components.nrows();
        let mut loadings: Array2<f64> = Array2::zeros((retained, m));
        for (a, j) in active.iter().enumerate() {
            loadings.column_mut(*j).assign(&dec.components.column(a));
        }
        ComponentSummary {
            cumulative_variance_ratio: pca::cumulative(&ratios),
            explained_variance_ratio: ratios,
            retained,
            loadings,
        }
    };

    let weight_values = loading_weights(components.loadings.view());
    let weights: Vec<IndicatorWeight> = cleaned
        .indicators
        .iter()
        .zip(weight_values.iter())
        .map(|(name, w)| IndicatorWeight {
            name: name.clone(),
            weight: *w,
        })
        .collect();
    for w in weights.iter() {
        info!("Weight: {}: {:.4}", w.name, w.weight);
    }

    let raw_scores = raw_scores(&z, &weight_values);
    let index = rescale(&raw_scores);

    let rows: Vec<IndexRow> = cleaned
        .records
        .iter()
        .zip(index.iter())
        .map(|(r, idx)| IndexRow {
            entity_id: r.entity_id.clone(),
            entity_name: r.entity_name.clone(),
            period: r.period.clone(),
            labels: r.labels.clone(),
            counts: r.counts.clone(),
            total_count: r.counts.iter().sum(),
            index: *idx,
        })
        .collect();

    let standardized = StandardizedTable {
        indicators: cleaned.indicators.clone(),
        means: st.means,
        scales: st.scales,
        values: z,
    };

    info!("build_index: computed the index for {} rows", rows.len());
    Ok(IndexResult {
        cleaned,
        standardized,
        components,
        weights,
        raw_scores,
        rows,
        report,
    })
}
