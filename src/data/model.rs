use std::collections::BTreeMap;
use std::fmt;

/// Name of the column holding the poster image path.
pub const PATH_COLUMN: &str = "image_path";
/// Name of the column holding the IMDB score.
pub const SCORE_COLUMN: &str = "imdb_score";
/// Name of the annotation column added by the existence check.
pub const EXISTS_COLUMN: &str = "file_exists";

// ---------------------------------------------------------------------------
// CellValue – a single cell in a passthrough column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Columns the pipeline does not interpret are carried through as these.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// The CSV field for this cell. Nulls serialize as the empty field,
    /// everything else as its `Display` form.
    pub fn to_csv_field(&self) -> String {
        self.to_string()
    }

    /// The JSON value for this cell.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::String(s) => serde_json::Value::String(s.clone()),
            CellValue::Integer(i) => serde_json::Value::from(*i),
            CellValue::Float(v) => serde_json::Value::from(*v),
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Null => serde_json::Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// PosterRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single dataset row: the two columns the pipeline interprets, the
/// annotation it adds, and everything else carried through untouched.
#[derive(Debug, Clone, Default)]
pub struct PosterRecord {
    /// Relative path of the poster image; `None` when the cell is absent.
    pub image_path: Option<String>,
    /// IMDB score; `None` when the cell is empty or not numeric.
    pub imdb_score: Option<f64>,
    /// Set by the existence-check pass; `None` until then.
    pub file_exists: Option<bool>,
    /// Passthrough columns: column_name → value.
    pub extras: BTreeMap<String, CellValue>,
}

// ---------------------------------------------------------------------------
// PosterDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset. `columns` preserves the input column order
/// (including `image_path` / `imdb_score` wherever they appeared) so the
/// writer can reproduce it.
#[derive(Debug, Clone, Default)]
pub struct PosterDataset {
    /// All rows, in input order.
    pub records: Vec<PosterRecord>,
    /// Column names in input order.
    pub columns: Vec<String>,
}

impl PosterDataset {
    pub fn new(records: Vec<PosterRecord>, columns: Vec<String>) -> Self {
        PosterDataset { records, columns }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the input carried the named column.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}
