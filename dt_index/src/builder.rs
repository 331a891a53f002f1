pub use crate::config::*;

/// A builder for assembling a raw dataset row by row.
///
/// ```
/// pub use dt_index::builder::Builder;
/// pub use dt_index::{CellValue, IndexConfig, IndexError};
///
/// let mut builder = Builder::new(&["id", "name", "A", "B"])?;
/// builder.add_row(vec![
///     CellValue::Text("1".to_string()),
///     CellValue::Text("Alpha".to_string()),
///     CellValue::Number(1.0),
///     CellValue::Number(2.0),
/// ])?;
/// builder.add_counts("2", "Beta", None, &[Some(3.0), None])?;
///
/// let raw = builder.build();
/// assert_eq!(raw.rows.len(), 2);
/// # Ok::<(), IndexError>(())
/// ```
pub struct Builder {
    pub(crate) _columns: Vec<String>,
    pub(crate) _rows: Vec<Vec<CellValue>>,
}

impl Builder {
    pub fn new(columns: &[&str]) -> Result<Builder, IndexError> {
        let mut cols: Vec<String> = Vec::new();
        for c in columns {
            if cols.iter().any(|x| x == c) {
                return Err(IndexError::DuplicateColumn(c.to_string()));
            }
            cols.push(c.to_string());
        }
        Ok(Builder {
            _columns: cols,
            _rows: Vec::new(),
        })
    }

    /// Adds a row of cells, one per column.
    pub fn add_row(&mut self, cells: Vec<CellValue>) -> Result<(), IndexError> {
        if cells.len() != self._columns.len() {
            return Err(IndexError::RowWidthMismatch {
                row: self._rows.len(),
                expected: self._columns.len(),
                actual: cells.len(),
            });
        }
        self._rows.push(cells);
        Ok(())
    }

    /// Adds a row made of an identifier, a name, an optional period and then
    /// the counts, in this column order.
    ///
    /// It is the simplest use case when the builder was created with the
    /// columns `[id, name, period?, indicators...]`.
    pub fn add_counts(
        &mut self,
        id: &str,
        name: &str,
        period: Option<&str>,
        counts: &[Option<f64>],
    ) -> Result<(), IndexError> {
        let mut cells: Vec<CellValue> = vec![
            CellValue::Text(id.to_string()),
            CellValue::Text(name.to_string()),
        ];
        if let Some(p) = period {
            cells.push(CellValue::Text(p.to_string()));
        }
        cells.extend(counts.iter().map(|c| match c {
            Some(x) => CellValue::Number(*x),
            None => CellValue::Empty,
        }));
        self.add_row(cells)
    }

    pub fn build(self) -> RawDataset {
        RawDataset {
            columns: self._columns,
            rows: self._rows,
        }
    }
}
