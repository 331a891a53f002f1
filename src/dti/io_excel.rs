// Reading the keyword statistics from Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use dt_index::{CellValue, RawDataset};

use crate::dti::io_common::header_name;
use crate::dti::*;

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> DtiResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}

fn read_cell(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(s) if s.trim().is_empty() => CellValue::Empty,
        DataType::String(s) => CellValue::Text(s.clone()),
        DataType::Float(f) => CellValue::Number(*f),
        DataType::Int(i) => CellValue::Number(*i as f64),
        DataType::DateTime(f) => CellValue::Number(*f),
        DataType::Bool(b) => CellValue::Text(b.to_string()),
        _ => CellValue::Empty,
    }
}

/// Reads one worksheet (the first one by default). The first row is the
/// header. The rows in which all the cells are empty are skipped.
pub fn read_excel_file(path: &str, worksheet_name: Option<&str>) -> DtiResult<RawDataset> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu { path })?;
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_name(idx, read_cell(cell).as_text()))
        .collect();
    debug!("read_excel_file: header: {:?}", columns);

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(read_cell).collect();
        if cells.iter().all(|c| c.is_missing()) {
            debug!("read_excel_file: skipping empty row {}", idx + 2);
            continue;
        }
        rows.push(cells);
    }
    Ok(RawDataset { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Int(12)), CellValue::Number(12.0));
        assert_eq!(read_cell(&DataType::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(
            read_cell(&DataType::String("平安银行".to_string())),
            CellValue::Text("平安银行".to_string())
        );
        assert_eq!(read_cell(&DataType::String("  ".to_string())), CellValue::Empty);
        assert_eq!(read_cell(&DataType::Empty), CellValue::Empty);
    }

    #[test]
    fn missing_workbook() {
        let res = read_excel_file("/nonexistent/keywords.xlsx", None);
        assert!(matches!(res, Err(DtiError::OpeningExcel { .. })));
    }
}
