// Writing the result tables.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use snafu::prelude::*;

use dt_index::{IndexConfig, IndexResult};

use crate::dti::io_common::{format_number, unique_path};
use crate::dti::*;

pub const INDEX_COLUMN: &str = "数字化转型指数(0-100分)";
pub const TOTAL_COLUMN: &str = "总词频数";
pub const WEIGHT_NAME_COLUMN: &str = "指标名称";
pub const WEIGHT_VALUE_COLUMN: &str = "权重值";

/// Where the tables of a run were written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFiles {
    pub cleaned: PathBuf,
    pub standardized: PathBuf,
    pub weights: PathBuf,
    pub index: PathBuf,
}

// The tables start with a byte order mark, so that spreadsheet programs
// recognize them as UTF-8.
fn write_csv(path: &Path, header: &[String], rows: &[Vec<String>]) -> csv::Result<()> {
    let mut file = File::create(path)?;
    file.write_all("\u{feff}".as_bytes())?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(header)?;
    for row in rows.iter() {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn is_permission_denied(e: &csv::Error) -> bool {
    matches!(e.kind(), csv::ErrorKind::Io(io_err) if io_err.kind() == std::io::ErrorKind::PermissionDenied)
}

/// Writes a table in `dir` without replacing an existing file. When the
/// directory is not writable, the table goes to the temporary directory.
fn write_table(
    dir: &Path,
    file_name: &str,
    header: &[String],
    rows: &[Vec<String>],
) -> DtiResult<PathBuf> {
    let path = unique_path(dir, file_name);
    debug!("write_table: {:?} ({} rows)", path, rows.len());
    match write_csv(&path, header, rows) {
        Ok(()) => Ok(path),
        Err(e) if is_permission_denied(&e) => {
            let alt_path = unique_path(&std::env::temp_dir(), file_name);
            warn!(
                "Permission denied when writing {:?}, writing {:?} instead",
                path, alt_path
            );
            write_csv(&alt_path, header, rows).context(WritingCsvSnafu {
                path: alt_path.display().to_string(),
            })?;
            Ok(alt_path)
        }
        Err(e) => Err(DtiError::WritingCsv {
            source: e,
            path: path.display().to_string(),
        }),
    }
}

/// The columns that identify a row: identifier, name and the period if the
/// input has one.
fn key_header(config: &IndexConfig, with_period: bool) -> Vec<String> {
    let mut header = vec![config.id_column.clone(), config.name_column.clone()];
    if with_period {
        header.push(config.period_column.clone());
    }
    header
}

fn key_cells(id: &str, name: &str, period: &Option<String>, with_period: bool) -> Vec<String> {
    let mut cells = vec![id.to_string(), name.to_string()];
    if with_period {
        cells.push(period.clone().unwrap_or_default());
    }
    cells
}

pub fn write_outputs(
    dir: &Path,
    dataset_name: &str,
    config: &IndexConfig,
    res: &IndexResult,
) -> DtiResult<OutputFiles> {
    let cleaned = &res.cleaned;
    let with_period = cleaned.records.iter().any(|r| r.period.is_some());

    // Cleaned rows
    let mut header = key_header(config, with_period);
    header.extend(cleaned.label_columns.iter().cloned());
    header.extend(cleaned.indicators.iter().cloned());
    let rows: Vec<Vec<String>> = cleaned
        .records
        .iter()
        .map(|r| {
            let mut cells = key_cells(&r.entity_id, &r.entity_name, &r.period, with_period);
            cells.extend(r.labels.iter().cloned());
            cells.extend(r.counts.iter().map(|x| format_number(*x)));
            cells
        })
        .collect();
    let cleaned_path = write_table(dir, &format!("{}_1_cleaned.csv", dataset_name), &header, &rows)?;

    // Standardized indicators
    let mut header = key_header(config, with_period);
    header.extend(res.standardized.indicators.iter().cloned());
    let rows: Vec<Vec<String>> = cleaned
        .records
        .iter()
        .zip(res.standardized.values.rows())
        .map(|(r, z)| {
            let mut cells = key_cells(&r.entity_id, &r.entity_name, &r.period, with_period);
            cells.extend(z.iter().map(|x| x.to_string()));
            cells
        })
        .collect();
    let standardized_path = write_table(
        dir,
        &format!("{}_2_standardized.csv", dataset_name),
        &header,
        &rows,
    )?;

    // Weights
    let header = vec![
        WEIGHT_NAME_COLUMN.to_string(),
        WEIGHT_VALUE_COLUMN.to_string(),
    ];
    let rows: Vec<Vec<String>> = res
        .weights
        .iter()
        .map(|w| vec![w.name.clone(), w.weight.to_string()])
        .collect();
    let weights_path = write_table(dir, &format!("{}_3_weights.csv", dataset_name), &header, &rows)?;

    // Index
    let mut header = key_header(config, with_period);
    header.extend(cleaned.label_columns.iter().cloned());
    header.push(INDEX_COLUMN.to_string());
    header.extend(cleaned.indicators.iter().cloned());
    header.push(TOTAL_COLUMN.to_string());
    let rows: Vec<Vec<String>> = res
        .rows
        .iter()
        .map(|r| {
            let mut cells = key_cells(&r.entity_id, &r.entity_name, &r.period, with_period);
            cells.extend(r.labels.iter().cloned());
            cells.push(r.index.to_string());
            cells.extend(r.counts.iter().map(|x| format_number(*x)));
            cells.push(format_number(r.total_count));
            cells
        })
        .collect();
    let index_path = write_table(dir, &format!("{}_4_index.csv", dataset_name), &header, &rows)?;

    Ok(OutputFiles {
        cleaned: cleaned_path,
        standardized: standardized_path,
        weights: weights_path,
        index: index_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_index::builder::Builder;
    use dt_index::build_index;

    fn read_back(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let raw = crate::dti::io_csv::read_csv_file(path.to_str().unwrap()).unwrap();
        let rows = raw
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.as_text().unwrap_or_default()).collect())
            .collect();
        (raw.columns, rows)
    }

    fn sample_result(config: &IndexConfig) -> IndexResult {
        let mut b = Builder::new(&["股票代码", "企业名称", "年份", "A", "B"]).unwrap();
        b.add_counts("1", "Alpha", Some("2013"), &[Some(0.0), Some(0.0)])
            .unwrap();
        b.add_counts("2", "Beta", Some("2013"), &[Some(1.0), Some(1.0)])
            .unwrap();
        b.add_counts("3", "Gamma", Some("2013"), &[Some(2.0), Some(2.0)])
            .unwrap();
        b.add_counts("4", "Delta", Some("2013"), &[None, Some(2.0)])
            .unwrap();
        build_index(&b.build(), config).unwrap()
    }

    #[test]
    fn writes_the_four_tables() {
        let dir = tempfile::tempdir().unwrap();
        let config = IndexConfig::default();
        let res = sample_result(&config);
        let files = write_outputs(dir.path(), "t", &config, &res).unwrap();
        assert_eq!(files.index, dir.path().join("t_4_index.csv"));

        let (header, rows) = read_back(&files.cleaned);
        assert_eq!(header, vec!["股票代码", "企业名称", "年份", "行业名称", "行业代码", "A", "B"]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["000001", "Alpha", "2013", "未知行业", "未知", "0", "0"]);

        let (header, rows) = read_back(&files.standardized);
        assert_eq!(header, vec!["股票代码", "企业名称", "年份", "A", "B"]);
        assert_eq!(rows[1][3], "0");

        let (header, rows) = read_back(&files.weights);
        assert_eq!(header, vec![WEIGHT_NAME_COLUMN, WEIGHT_VALUE_COLUMN]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "A");
        let w: f64 = rows[0][1].parse().unwrap();
        assert!((w - 0.5).abs() < 1e-12);

        let (header, rows) = read_back(&files.index);
        assert_eq!(header[5], INDEX_COLUMN);
        assert_eq!(header[8], TOTAL_COLUMN);
        let indexes: Vec<&str> = rows.iter().map(|r| r[5].as_str()).collect();
        assert_eq!(indexes, vec!["0", "50", "100"]);
        assert_eq!(rows[2][8], "4");
    }

    #[test]
    fn second_run_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = IndexConfig::default();
        let res = sample_result(&config);
        let first = write_outputs(dir.path(), "t", &config, &res).unwrap();
        let second = write_outputs(dir.path(), "t", &config, &res).unwrap();
        assert_ne!(first.index, second.index);
        assert!(first.index.exists());
        assert!(second.index.exists());
    }

    #[test]
    fn permission_errors_are_recognized() {
        let denied = csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert!(is_permission_denied(&denied));
        let other = csv::Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!is_permission_denied(&other));
    }
}
