// Primitives for reading CSV files.

use csv::ReaderBuilder;
use log::debug;
use snafu::prelude::*;

use dt_index::{CellValue, RawDataset};

use crate::dti::io_common::header_name;
use crate::dti::*;

fn read_cell(s: &str) -> CellValue {
    if s.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(s.to_string())
    }
}

/// Reads a CSV file with a header line.
///
/// All the cells are read as text. The numbers are interpreted later, when the
/// role of each column is known.
pub fn read_csv_file(path: &str) -> DtiResult<RawDataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let columns: Vec<String> = rdr
        .headers()
        .context(CsvOpenSnafu { path })?
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let s = s.trim_start_matches('\u{feff}');
            header_name(idx, read_cell(s).as_text())
        })
        .collect();
    debug!("read_csv_file: header: {:?}", columns);

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<CellValue> = line.iter().map(read_cell).collect();
        if cells.iter().all(|c| c.is_missing()) {
            debug!("read_csv_file: skipping empty line {}", lineno);
            continue;
        }
        rows.push(cells);
    }
    Ok(RawDataset { columns, rows })
}
