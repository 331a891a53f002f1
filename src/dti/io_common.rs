use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, warn};

use dt_index::{CellValue, RawDataset};

/// The name of a file, without its directory and its extension.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string()
}

/// The provider of an input file, guessed from its extension. Excel is the
/// default.
pub fn provider_from_extension(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("csv") => "csv",
        _ => "xlsx",
    }
}

/// The name of a column from its header cell. Unnamed columns get a name from
/// their position.
pub fn header_name(idx: usize, cell: Option<String>) -> String {
    match cell {
        Some(s) => s,
        None => format!("column_{}", idx + 1),
    }
}

/// Concatenates the rows of several tables.
///
/// The columns of the result are the union of the columns of the tables, in
/// the order in which they are first seen. The cells of the columns that a
/// table does not have are empty.
pub fn merge_tables(mut tables: Vec<RawDataset>) -> RawDataset {
    if tables.len() == 1 {
        return tables.remove(0);
    }
    let mut columns: Vec<String> = Vec::new();
    for t in tables.iter() {
        for c in t.columns.iter() {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
    }
    debug!("merge_tables: columns: {:?}", columns);
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (tidx, t) in tables.into_iter().enumerate() {
        let positions: Vec<Option<usize>> =
            columns.iter().map(|c| t.column_index(c)).collect();
        let missing: Vec<&String> = columns
            .iter()
            .zip(positions.iter())
            .filter(|(_, p)| p.is_none())
            .map(|(c, _)| c)
            .collect();
        if !missing.is_empty() {
            warn!(
                "File source #{} does not have the columns {:?}: they are left empty",
                tidx + 1,
                missing
            );
        }
        for row in t.rows.into_iter() {
            let merged: Vec<CellValue> = positions
                .iter()
                .map(|p| {
                    p.and_then(|idx| row.get(idx).cloned())
                        .unwrap_or(CellValue::Empty)
                })
                .collect();
            rows.push(merged);
        }
    }
    RawDataset { columns, rows }
}

/// A path in `dir` for a new file, that does not replace an existing file.
///
/// If `file_name` is taken, a timestamp is inserted before the extension.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let p = Path::new(file_name);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let ext = p
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| format!(".{}", s))
        .unwrap_or_default();
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut res = dir.join(format!("{}_{}{}", stem, timestamp, ext));
    let mut counter = 1;
    while res.exists() {
        res = dir.join(format!("{}_{}_{}{}", stem, timestamp, counter, ext));
        counter += 1;
    }
    debug!("unique_path: {:?} exists, using {:?}", candidate, res);
    res
}

/// Numbers as they are written in the output tables: integral values without
/// a fractional part.
pub fn format_number(x: f64) -> String {
    CellValue::Number(x).as_text().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("data/2013年年报.xlsx"), "2013年年报");
        assert_eq!(provider_from_extension("a/b.CSV"), "csv");
        assert_eq!(provider_from_extension("a/b.xlsx"), "xlsx");
        assert_eq!(provider_from_extension("a/b"), "xlsx");
        assert_eq!(header_name(2, None), "column_3");
    }

    #[test]
    fn merge_unions_columns() {
        let t1 = RawDataset {
            columns: vec!["id".to_string(), "A".to_string()],
            rows: vec![vec![text("1"), CellValue::Number(2.0)]],
        };
        let t2 = RawDataset {
            columns: vec!["id".to_string(), "B".to_string(), "A".to_string()],
            rows: vec![vec![text("2"), CellValue::Number(5.0), CellValue::Number(3.0)]],
        };
        let merged = merge_tables(vec![t1, t2]);
        assert_eq!(merged.columns, vec!["id", "A", "B"]);
        assert_eq!(
            merged.rows,
            vec![
                vec![text("1"), CellValue::Number(2.0), CellValue::Empty],
                vec![text("2"), CellValue::Number(3.0), CellValue::Number(5.0)],
            ]
        );
    }

    #[test]
    fn unique_path_never_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = unique_path(dir.path(), "out_4_index.csv");
        assert_eq!(p1, dir.path().join("out_4_index.csv"));
        std::fs::write(&p1, "x").unwrap();
        let p2 = unique_path(dir.path(), "out_4_index.csv");
        assert_ne!(p1, p2);
        assert!(!p2.exists());
        let name = p2.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("out_4_index_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(0.25), "0.25");
    }
}
