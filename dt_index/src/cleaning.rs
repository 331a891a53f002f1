use log::{debug, info, warn};

use std::collections::HashSet;

use crate::config::*;

/// Where each role lives in the input.
#[derive(Eq, PartialEq, Debug, Clone)]
struct ColumnRoles {
    id: usize,
    name: usize,
    period: Option<usize>,
    // None when the label column is absent and the default applies.
    labels: Vec<Option<usize>>,
    // (column name, column position), in input order.
    indicators: Vec<(String, usize)>,
}

/// Pads numeric identifiers to a fixed width.
///
/// The unknown sentinel, identifiers that are not made of digits, and
/// identifiers that are already wide enough are returned unchanged.
pub fn normalize_entity_id(raw: &str, unknown: &str, width: usize) -> String {
    let id = raw.trim();
    if id == unknown {
        return id.to_string();
    }
    let numeric = !id.is_empty() && id.chars().all(|c| c.is_ascii_digit());
    if numeric && id.chars().count() < width {
        format!("{:0>width$}", id, width = width)
    } else {
        id.to_string()
    }
}

fn resolve_columns(
    raw: &RawDataset,
    config: &IndexConfig,
) -> Result<(ColumnRoles, Vec<String>), IndexError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for c in raw.columns.iter() {
        if !seen.insert(c.as_str()) {
            return Err(IndexError::DuplicateColumn(c.clone()));
        }
    }

    let id = raw
        .column_index(&config.id_column)
        .ok_or_else(|| IndexError::MissingRequiredColumn(config.id_column.clone()))?;
    let name = raw
        .column_index(&config.name_column)
        .ok_or_else(|| IndexError::MissingRequiredColumn(config.name_column.clone()))?;
    let period = raw.column_index(&config.period_column);
    let labels: Vec<Option<usize>> = config
        .label_columns
        .iter()
        .map(|lc| raw.column_index(&lc.name))
        .collect();

    let missing_indicators: Vec<String> = config
        .core_indicators
        .iter()
        .filter(|c| raw.column_index(c).is_none())
        .cloned()
        .collect();
    if !missing_indicators.is_empty() {
        warn!(
            "The following indicator columns are missing and will be ignored: {:?}",
            missing_indicators
        );
    }

    // Everything that is not an identifier, a name, a period or a label is an
    // indicator.
    let mut reserved: HashSet<usize> = HashSet::new();
    reserved.insert(id);
    reserved.insert(name);
    reserved.extend(period);
    reserved.extend(labels.iter().flatten());
    let indicators: Vec<(String, usize)> = raw
        .columns
        .iter()
        .enumerate()
        .filter(|(idx, _)| !reserved.contains(idx))
        .map(|(idx, c)| (c.clone(), idx))
        .collect();
    if indicators.is_empty() {
        return Err(IndexError::NoIndicatorColumns);
    }

    let roles = ColumnRoles {
        id,
        name,
        period,
        labels,
        indicators,
    };
    debug!("resolve_columns: roles: {:?}", roles);
    Ok((roles, missing_indicators))
}

fn read_record(
    row: &[CellValue],
    roles: &ColumnRoles,
    config: &IndexConfig,
) -> Option<Record> {
    let entity_id = row[roles.id].as_text()?;
    let entity_name = row[roles.name].as_text()?;
    let mut counts: Vec<f64> = Vec::with_capacity(roles.indicators.len());
    for (_, idx) in roles.indicators.iter() {
        counts.push(row[*idx].as_count()?);
    }
    let period = roles.period.and_then(|idx| row[idx].as_text());
    let labels: Vec<String> = roles
        .labels
        .iter()
        .zip(config.label_columns.iter())
        .map(|(idx_o, lc)| {
            idx_o
                .and_then(|idx| row[idx].as_text())
                .unwrap_or_else(|| lc.default.clone())
        })
        .collect();
    Some(Record {
        entity_id: normalize_entity_id(&entity_id, &config.unknown_id, config.id_width),
        entity_name,
        period,
        labels,
        counts,
    })
}

/// Checks the input and keeps the complete rows.
///
/// A missing identifier or name column is fatal. A row is dropped when its
/// identifier, its name or any of its indicator counts is missing.
pub fn clean(
    raw: &RawDataset,
    config: &IndexConfig,
) -> Result<(CleanedDataset, CleaningReport), IndexError> {
    let (roles, missing_indicators) = resolve_columns(raw, config)?;
    let width = raw.columns.len();

    let mut records: Vec<Record> = Vec::with_capacity(raw.rows.len());
    for (idx, row) in raw.rows.iter().enumerate() {
        if row.len() != width {
            return Err(IndexError::RowWidthMismatch {
                row: idx,
                expected: width,
                actual: row.len(),
            });
        }
        match read_record(row, &roles, config) {
            Some(r) => records.push(r),
            None => debug!("clean: dropping incomplete row {}: {:?}", idx, row),
        }
    }

    let report = CleaningReport {
        rows_in: raw.rows.len(),
        rows_dropped: raw.rows.len() - records.len(),
        rows_retained: records.len(),
        indicators: roles.indicators.iter().map(|(c, _)| c.clone()).collect(),
        missing_indicators,
        constant_indicators: Vec::new(),
    };
    info!(
        "Cleaning done: {} rows, {} incomplete rows dropped, {} rows retained",
        report.rows_in, report.rows_dropped, report.rows_retained
    );
    info!("Indicators used for the index: {:?}", report.indicators);

    let cleaned = CleanedDataset {
        indicators: report.indicators.clone(),
        label_columns: config
            .label_columns
            .iter()
            .map(|lc| lc.name.clone())
            .collect(),
        records,
    };
    Ok((cleaned, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn num(x: f64) -> CellValue {
        CellValue::Number(x)
    }

    fn small_config() -> IndexConfig {
        IndexConfig {
            id_column: "id".to_string(),
            name_column: "name".to_string(),
            period_column: "year".to_string(),
            label_columns: vec![LabelColumn::new("industry", "unknown industry")],
            core_indicators: vec!["A".to_string(), "B".to_string()],
            ..IndexConfig::default()
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pads_short_numeric_ids() {
        assert_eq!(normalize_entity_id("123", "未知", 6), "000123");
        assert_eq!(normalize_entity_id("600519", "未知", 6), "600519");
        assert_eq!(normalize_entity_id("未知", "未知", 6), "未知");
        assert_eq!(normalize_entity_id("AB12", "未知", 6), "AB12");
        assert_eq!(normalize_entity_id("1234567", "未知", 6), "1234567");
    }

    #[test]
    fn numeric_id_cells_are_padded() {
        let raw = RawDataset {
            columns: columns(&["id", "name", "A"]),
            rows: vec![vec![num(123.0), text("Firm"), num(1.0)]],
        };
        let (cleaned, _) = clean(&raw, &small_config()).unwrap();
        assert_eq!(cleaned.records[0].entity_id, "000123");
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let raw = RawDataset {
            columns: columns(&["id", "A", "B"]),
            rows: vec![vec![text("1"), num(1.0), num(2.0)]],
        };
        let res = clean(&raw, &small_config());
        assert_eq!(
            res,
            Err(IndexError::MissingRequiredColumn("name".to_string()))
        );
    }

    #[test]
    fn no_indicator_left_is_fatal() {
        let raw = RawDataset {
            columns: columns(&["id", "name", "year"]),
            rows: vec![vec![text("1"), text("Firm"), num(2013.0)]],
        };
        assert_eq!(
            clean(&raw, &small_config()),
            Err(IndexError::NoIndicatorColumns)
        );
    }

    #[test]
    fn duplicate_header_is_fatal() {
        let raw = RawDataset {
            columns: columns(&["id", "name", "A", "A"]),
            rows: vec![],
        };
        assert_eq!(
            clean(&raw, &small_config()),
            Err(IndexError::DuplicateColumn("A".to_string()))
        );
    }

    #[test]
    fn ragged_row_is_fatal() {
        let raw = RawDataset {
            columns: columns(&["id", "name", "A"]),
            rows: vec![vec![text("1"), text("Firm")]],
        };
        assert_eq!(
            clean(&raw, &small_config()),
            Err(IndexError::RowWidthMismatch {
                row: 0,
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn drops_incomplete_rows_and_counts_them() {
        let raw = RawDataset {
            columns: columns(&["id", "name", "year", "A", "B"]),
            rows: vec![
                vec![text("1"), text("Alpha"), num(2013.0), num(1.0), num(2.0)],
                // Missing indicator
                vec![text("2"), text("Beta"), num(2013.0), CellValue::Empty, num(2.0)],
                // Missing name
                vec![text("3"), text("  "), num(2013.0), num(1.0), num(2.0)],
                // Missing period: kept
                vec![text("4"), text("Delta"), CellValue::Empty, num(3.0), num(0.0)],
                // Not a count
                vec![text("5"), text("Eps"), num(2013.0), text("n/a"), num(0.0)],
                vec![CellValue::Empty, text("Zeta"), num(2013.0), num(1.0), num(1.0)],
            ],
        };
        let (cleaned, report) = clean(&raw, &small_config()).unwrap();
        assert_eq!(report.rows_in, 6);
        assert_eq!(report.rows_dropped, 4);
        assert_eq!(report.rows_retained, 2);
        assert_eq!(report.rows_retained, report.rows_in - report.rows_dropped);
        let ids: Vec<&str> = cleaned
            .records
            .iter()
            .map(|r| r.entity_id.as_str())
            .collect();
        assert_eq!(ids, vec!["000001", "000004"]);
        assert_eq!(cleaned.records[0].period, Some("2013".to_string()));
        assert_eq!(cleaned.records[1].period, None);
    }

    #[test]
    fn absent_declared_indicator_is_reported() {
        let raw = RawDataset {
            columns: columns(&["id", "name", "A"]),
            rows: vec![vec![text("1"), text("Alpha"), num(1.0)]],
        };
        let (cleaned, report) = clean(&raw, &small_config()).unwrap();
        assert_eq!(report.missing_indicators, vec!["B".to_string()]);
        assert_eq!(report.indicators, vec!["A".to_string()]);
        assert_eq!(cleaned.indicators, vec!["A".to_string()]);
        assert_eq!(report.rows_dropped, 0);
    }

    #[test]
    fn undeclared_columns_are_indicators_and_labels_are_not() {
        let raw = RawDataset {
            columns: columns(&["industry", "id", "name", "A", "B", "C"]),
            rows: vec![
                vec![
                    text("Software"),
                    text("1"),
                    text("Alpha"),
                    num(1.0),
                    num(2.0),
                    num(3.0),
                ],
                vec![
                    CellValue::Empty,
                    text("2"),
                    text("Beta"),
                    num(1.0),
                    num(2.0),
                    num(3.0),
                ],
            ],
        };
        let (cleaned, report) = clean(&raw, &small_config()).unwrap();
        assert_eq!(report.indicators, columns(&["A", "B", "C"]));
        assert_eq!(cleaned.records[0].labels, vec!["Software".to_string()]);
        assert_eq!(
            cleaned.records[1].labels,
            vec!["unknown industry".to_string()]
        );
        assert_eq!(cleaned.records[0].counts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn absent_label_column_uses_default() {
        let raw = RawDataset {
            columns: columns(&["id", "name", "A"]),
            rows: vec![vec![text("1"), text("Alpha"), num(1.0)]],
        };
        let (cleaned, _) = clean(&raw, &small_config()).unwrap();
        assert_eq!(cleaned.label_columns, vec!["industry".to_string()]);
        assert_eq!(
            cleaned.records[0].labels,
            vec!["unknown industry".to_string()]
        );
    }
}
