use log::{debug, info, warn};

use dt_index::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::dti::config_reader::*;
use crate::dti::io_common::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_output;

#[derive(Debug, Snafu)]
pub enum DtiError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} does not contain any worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} does not contain a worksheet named {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot access the working directory"))]
    WorkingDir { source: std::io::Error },
    #[snafu(display("Unknown input type {provider:?} (expected xlsx or csv)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Error computing the index"))]
    Index { source: dt_index::IndexError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DtiResult<T> = Result<T, DtiError>;

/// Rounds the floating point values of the summary, so that summaries can be
/// compared as text.
fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

fn build_summary_js(dataset_name: &str, config: &IndexConfig, res: &IndexResult) -> JSValue {
    let weights: Vec<JSValue> = res
        .weights
        .iter()
        .map(|w| json!({"indicator": w.name, "weight": round6(w.weight)}))
        .collect();
    let results: Vec<JSValue> = res
        .rows
        .iter()
        .map(|r| {
            json!({
                "id": r.entity_id,
                "name": r.entity_name,
                "period": r.period,
                "index": r.index,
                "totalCount": r.total_count,
            })
        })
        .collect();
    let report = &res.report;
    json!({
        "config": {
            "dataset": dataset_name,
            "indicators": report.indicators,
            "varianceThreshold": config.variance_threshold,
        },
        "cleaning": {
            "rowsIn": report.rows_in,
            "rowsDropped": report.rows_dropped,
            "rowsRetained": report.rows_retained,
            "missingIndicators": report.missing_indicators,
            "constantIndicators": report.constant_indicators,
        },
        "components": {
            "retained": res.components.retained,
            "explainedVarianceRatio": res.components.explained_variance_ratio.iter().map(|x| round6(*x)).collect::<Vec<f64>>(),
            "cumulativeVarianceRatio": res.components.cumulative_variance_ratio.iter().map(|x| round6(*x)).collect::<Vec<f64>>(),
        },
        "weights": weights,
        "results": results,
    })
}

fn read_source(root_path: &Path, cfs: &FileSource) -> DtiResult<RawDataset> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read file {:?}", p2);
    let raw = match cfs.provider()? {
        InputProvider::Xlsx => {
            io_excel::read_excel_file(&p2, cfs.excel_worksheet_name.as_deref())?
        }
        InputProvider::Csv => io_csv::read_csv_file(&p2)?,
    };
    info!(
        "Read {} rows and {} columns from {:?}",
        raw.rows.len(),
        raw.columns.len(),
        p2
    );
    Ok(raw)
}

// The paths of the command line are relative to the working directory, not
// to the configuration file.
fn from_working_dir(path: &str) -> DtiResult<String> {
    if Path::new(path).is_absolute() {
        return Ok(path.to_string());
    }
    let cwd = std::env::current_dir().context(WorkingDirSnafu {})?;
    Ok(cwd.join(path).display().to_string())
}

/// Applies the command line flags on top of the configuration file (if any).
///
/// Returns the configuration and the directory that relative input paths are
/// resolved against.
fn resolve_config(args: &Args) -> DtiResult<(DtiConfig, PathBuf)> {
    let (mut config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (DtiConfig::default(), PathBuf::new()),
    };

    if let Some(input) = &args.input {
        let provider = match &args.input_type {
            Some(t) => t.clone(),
            None => provider_from_extension(input).to_string(),
        };
        config.file_sources = vec![FileSource {
            provider,
            file_path: from_working_dir(input)?,
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }];
    }
    if let Some(indicators) = &args.indicators {
        config.indicators = Some(indicators.clone());
    }
    if let Some(threshold) = args.threshold {
        config.rules = Some(DtiRules {
            variance_threshold: Some(threshold),
        });
    }
    let settings = config.output_settings.get_or_insert_with(OutputSettings::default);
    if let Some(out) = &args.out {
        settings.output_directory = Some(from_working_dir(out)?);
    }
    if let Some(summary) = &args.summary {
        let summary = if summary == "stdout" {
            summary.clone()
        } else {
            from_working_dir(summary)?
        };
        settings.summary_path = Some(summary);
    }
    debug!("resolve_config: config: {:?} root: {:?}", config, root);
    Ok((config, root))
}

pub fn run_index(args: &Args) -> DtiResult<()> {
    let (config, root) = resolve_config(args)?;
    info!("config: {:?}", config);

    if config.file_sources.is_empty() {
        whatever!("No input file: use --input or the fileSources section of the configuration");
    }

    let index_config = config.index_config()?;

    let mut tables: Vec<RawDataset> = Vec::new();
    for cfs in config.file_sources.iter() {
        tables.push(read_source(&root, cfs)?);
    }
    let raw = merge_tables(tables);

    let res = build_index(&raw, &index_config).context(IndexSnafu {})?;

    let report = &res.report;
    if !report.missing_indicators.is_empty() {
        warn!(
            "Missing indicator columns, ignored: {:?}",
            report.missing_indicators
        );
    }
    info!(
        "{} rows read, {} incomplete rows dropped, {} rows in the index",
        report.rows_in, report.rows_dropped, report.rows_retained
    );

    let settings = config.output_settings.clone().unwrap_or_default();
    let dataset_name = match settings.dataset_name {
        Some(name) => name,
        None => format!(
            "{}_index",
            simplify_file_name(&config.file_sources[0].file_path)
        ),
    };
    let out_dir: PathBuf = match settings.output_directory {
        Some(d) => root.join(d),
        None => root.clone(),
    };
    if !out_dir.as_os_str().is_empty() {
        fs::create_dir_all(&out_dir).context(WritingFileSnafu {
            path: out_dir.display().to_string(),
        })?;
    }
    let files = io_output::write_outputs(&out_dir, &dataset_name, &index_config, &res)?;
    info!("Results saved: {:?}", files);

    let summary_js = build_summary_js(&dataset_name, &index_config, &res);
    let pretty_js_summary = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    match settings.summary_path.as_deref() {
        Some("stdout") => println!("{}", pretty_js_summary),
        Some(path) => {
            let summary_path = root.join(path);
            fs::write(&summary_path, &pretty_js_summary).context(WritingFileSnafu {
                path: summary_path.display().to_string(),
            })?;
            info!("Summary written to {:?}", summary_path);
        }
        None => {
            let summary_path = unique_path(&out_dir, &format!("{}_summary.json", dataset_name));
            fs::write(&summary_path, &pretty_js_summary).context(WritingFileSnafu {
                path: summary_path.display().to_string(),
            })?;
            info!("Summary written to {:?}", summary_path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference) = &args.reference {
        let summary_ref = read_summary(reference)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
        info!("The summary matches the reference {:?}", reference);
    }

    Ok(())
}
