// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use ndarray::Array2;

/// The content of a single cell, as read from a spreadsheet or a CSV file.
///
/// Readers should not interpret the cells: the cleaner decides what counts as
/// a missing identifier or a missing count.
#[derive(PartialEq, Debug, Clone)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// True for empty cells and cells that only contain whitespace.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(x) => x.is_nan(),
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// The textual form of the cell. Integral numbers are written without a
    /// fractional part, so that a code stored as `123.0` reads as `123`.
    pub fn as_text(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        match self {
            CellValue::Empty => None,
            CellValue::Number(x) if x.fract() == 0.0 && x.abs() < 1e15 => {
                Some(format!("{}", *x as i64))
            }
            CellValue::Number(x) => Some(x.to_string()),
            CellValue::Text(s) => Some(s.trim().to_string()),
        }
    }

    /// The cell read as a keyword count.
    ///
    /// Text is accepted if it parses as a number. Negative and non-finite
    /// values are not valid counts.
    pub fn as_count(&self) -> Option<f64> {
        let x = match self {
            CellValue::Empty => None,
            CellValue::Number(x) => Some(*x),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        }?;
        if x.is_finite() && x >= 0.0 {
            Some(x)
        } else {
            None
        }
    }
}

/// A table as read from the input: a header row and the rows below it.
///
/// Every row is expected to have exactly one cell per column.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawDataset {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

// ********* Configuration **********

pub const DEFAULT_ID_COLUMN: &str = "股票代码";
pub const DEFAULT_NAME_COLUMN: &str = "企业名称";
pub const DEFAULT_PERIOD_COLUMN: &str = "年份";
pub const DEFAULT_UNKNOWN_ID: &str = "未知";
pub const DEFAULT_ID_WIDTH: usize = 6;
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.85;
pub const DEFAULT_CORE_INDICATORS: [&str; 5] = [
    "人工智能词频数",
    "大数据词频数",
    "云计算词频数",
    "区块链词频数",
    "数字技术运用词频数",
];

/// A pass-through text column (industry name, industry code, ...).
///
/// Label columns are never used as indicators. When the column is absent or
/// the cell is empty, the default is used.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LabelColumn {
    pub name: String,
    pub default: String,
}

impl LabelColumn {
    pub fn new(name: &str, default: &str) -> LabelColumn {
        LabelColumn {
            name: name.to_string(),
            default: default.to_string(),
        }
    }
}

/// The configuration of one run of the index construction.
///
/// The defaults follow the layout of the annual-report keyword statistics.
#[derive(PartialEq, Debug, Clone)]
pub struct IndexConfig {
    pub id_column: String,
    pub name_column: String,
    /// The period (year) column. It is optional in the input.
    pub period_column: String,
    pub label_columns: Vec<LabelColumn>,
    /// The indicators that are expected in the input. Any of them missing from
    /// the input is reported and ignored.
    pub core_indicators: Vec<String>,
    /// The share of the total variance the retained components must explain,
    /// in (0, 1].
    pub variance_threshold: f64,
    /// The identifier value that denotes an unknown firm.
    pub unknown_id: String,
    /// Numeric identifiers shorter than this are padded with zeros.
    pub id_width: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            id_column: DEFAULT_ID_COLUMN.to_string(),
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            period_column: DEFAULT_PERIOD_COLUMN.to_string(),
            label_columns: vec![
                LabelColumn::new("行业名称", "未知行业"),
                LabelColumn::new("行业代码", "未知"),
            ],
            core_indicators: DEFAULT_CORE_INDICATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            variance_threshold: DEFAULT_VARIANCE_THRESHOLD,
            unknown_id: DEFAULT_UNKNOWN_ID.to_string(),
            id_width: DEFAULT_ID_WIDTH,
        }
    }
}

// ******** Output data structures *********

/// One firm-year observation that passed the checks.
#[derive(PartialEq, Debug, Clone)]
pub struct Record {
    pub entity_id: String,
    pub entity_name: String,
    pub period: Option<String>,
    /// One value per label column, in configuration order.
    pub labels: Vec<String>,
    /// One count per indicator, in the order of `CleanedDataset::indicators`.
    pub counts: Vec<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CleanedDataset {
    pub indicators: Vec<String>,
    pub label_columns: Vec<String>,
    pub records: Vec<Record>,
}

/// What happened to the input during the run.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_dropped: usize,
    pub rows_retained: usize,
    /// The indicators used for the computation, in input order.
    pub indicators: Vec<String>,
    /// Declared indicators that are not in the input.
    pub missing_indicators: Vec<String>,
    /// Indicators without any variance in the cleaned data. They get a
    /// weight of zero.
    pub constant_indicators: Vec<String>,
}

/// The standardized indicator matrix (rows x indicators) and the parameters
/// that produced it.
#[derive(PartialEq, Debug, Clone)]
pub struct StandardizedTable {
    pub indicators: Vec<String>,
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub values: Array2<f64>,
}

/// The outcome of the principal component analysis.
#[derive(PartialEq, Debug, Clone)]
pub struct ComponentSummary {
    /// For every component, in decreasing order.
    pub explained_variance_ratio: Vec<f64>,
    pub cumulative_variance_ratio: Vec<f64>,
    /// The number of leading components kept for the weights.
    pub retained: usize,
    /// The retained components (retained x indicators). Constant indicators
    /// have a zero loading.
    pub loadings: Array2<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct IndicatorWeight {
    pub name: String,
    pub weight: f64,
}

/// One row of the final index table.
#[derive(PartialEq, Debug, Clone)]
pub struct IndexRow {
    pub entity_id: String,
    pub entity_name: String,
    pub period: Option<String>,
    pub labels: Vec<String>,
    pub counts: Vec<f64>,
    pub total_count: f64,
    /// The index, between 0 and 100.
    pub index: u8,
}

#[derive(PartialEq, Debug, Clone)]
pub struct IndexResult {
    pub cleaned: CleanedDataset,
    pub standardized: StandardizedTable,
    pub components: ComponentSummary,
    pub weights: Vec<IndicatorWeight>,
    /// The raw weighted sums, before rescaling.
    pub raw_scores: Vec<f64>,
    pub rows: Vec<IndexRow>,
    pub report: CleaningReport,
}

/// Errors that prevent the index from being computed.
#[derive(PartialEq, Debug, Clone)]
pub enum IndexError {
    /// A required column (identifier or name) is not in the input.
    MissingRequiredColumn(String),
    /// The same column name appears twice in the header.
    DuplicateColumn(String),
    /// No column is left to be used as an indicator.
    NoIndicatorColumns,
    /// No row survived the cleaning.
    EmptyDataset,
    InvalidThreshold(f64),
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl Error for IndexError {}

impl Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::MissingRequiredColumn(c) => {
                write!(f, "the input is missing the required column {:?}", c)
            }
            IndexError::DuplicateColumn(c) => {
                write!(f, "the column {:?} appears more than once in the input", c)
            }
            IndexError::NoIndicatorColumns => {
                write!(f, "no indicator column left in the input")
            }
            IndexError::EmptyDataset => write!(f, "no complete row left after cleaning"),
            IndexError::InvalidThreshold(t) => {
                write!(f, "the variance threshold must be in (0, 1], got {}", t)
            }
            IndexError::RowWidthMismatch {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row {} has {} cells but the header has {} columns",
                row, actual, expected
            ),
        }
    }
}
