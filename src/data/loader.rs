use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, PosterDataset, PosterRecord, PATH_COLUMN, SCORE_COLUMN};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a poster dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, `image_path` and `imdb_score` columns (primary)
/// * `.json`    – `[{ "image_path": "...", "imdb_score": 7.5, ...extras }, ...]`
/// * `.parquet` – flat columns, `image_path` Utf8 and `imdb_score` numeric
///
/// A missing `image_path`/`imdb_score` column is not a load failure; the
/// corresponding fields simply come back as `None`.
pub fn load_file(path: &Path) -> Result<PosterDataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

/// An empty or non-numeric score cell is a missing score, not an error.
fn parse_score(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names.  `image_path` and `imdb_score`
/// are interpreted; every other column is carried through untouched.
fn load_csv(path: &Path) -> Result<PosterDataset, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let path_idx = columns.iter().position(|c| c == PATH_COLUMN);
    let score_idx = columns.iter().position(|c| c == SCORE_COLUMN);

    let mut records = Vec::new();

    for result in reader.records() {
        let row = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let image_path = path_idx
            .and_then(|i| row.get(i))
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.to_string());
        let imdb_score = score_idx.and_then(|i| row.get(i)).and_then(parse_score);

        let mut extras = BTreeMap::new();
        for (col_idx, cell) in row.iter().enumerate() {
            if Some(col_idx) == path_idx || Some(col_idx) == score_idx {
                continue;
            }
            if let Some(col_name) = columns.get(col_idx) {
                extras.insert(col_name.clone(), guess_cell_type(cell));
            }
        }

        records.push(PosterRecord {
            image_path,
            imdb_score,
            file_exists: None,
            extras,
        });
    }

    Ok(PosterDataset::new(records, columns))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "image_path": "poster_images/Heat.jpg", "imdb_score": 8.3, "title": "Heat" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<PosterDataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = root.as_array().ok_or_else(|| LoadError::JsonShape {
        path: path.to_path_buf(),
    })?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let obj = row.as_object().ok_or_else(|| LoadError::JsonShape {
            path: path.to_path_buf(),
        })?;

        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }

        let image_path = obj
            .get(PATH_COLUMN)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let imdb_score = obj.get(SCORE_COLUMN).and_then(|v| v.as_f64());

        let mut extras = BTreeMap::new();
        for (key, val) in obj {
            if key == PATH_COLUMN || key == SCORE_COLUMN {
                continue;
            }
            extras.insert(key.clone(), json_to_cell(val));
        }

        records.push(PosterRecord {
            image_path,
            imdb_score,
            file_exists: None,
            extras,
        });
    }

    Ok(PosterDataset::new(records, columns))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.  `image_path` must be a string
/// column and `imdb_score` a numeric one; everything else becomes a
/// passthrough cell.  Works with files written by both Pandas
/// (`df.to_parquet()`) and Polars (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<PosterDataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|source| LoadError::Parquet {
            path: path.to_path_buf(),
            source,
        })?;
    let reader = builder.build().map_err(|source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    })?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.map_err(|source| LoadError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = batch.schema();

        if columns.is_empty() {
            columns = schema.fields().iter().map(|f| f.name().clone()).collect();
        }

        let path_idx = schema.index_of(PATH_COLUMN).ok();
        let score_idx = schema.index_of(SCORE_COLUMN).ok();

        let extra_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != path_idx && Some(*i) != score_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let image_path = path_idx.and_then(|i| extract_string(batch.column(i), row));
            let imdb_score = score_idx.and_then(|i| extract_f64(batch.column(i), row));

            let mut extras = BTreeMap::new();
            for (col_idx, col_name) in &extra_cols {
                let value = extract_cell_value(batch.column(*col_idx), row);
                extras.insert(col_name.clone(), value);
            }

            records.push(PosterRecord {
                image_path,
                imdb_score,
                file_exists: None,
                extras,
            });
        }
    }

    Ok(PosterDataset::new(records, columns))
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|arr| arr.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|arr| arr.value(row)),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|arr| arr.value(row) as f64),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|arr| arr.value(row) as f64),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|arr| arr.value(row) as f64),
        _ => None,
    }
}

/// Extract a single passthrough value from an Arrow column at a given row.
fn extract_cell_value(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                CellValue::String(s.value(row).to_string())
            } else {
                let s = col.as_string::<i64>();
                CellValue::String(s.value(row).to_string())
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            CellValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            CellValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            CellValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            CellValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            CellValue::Bool(arr.value(row))
        }
        _ => CellValue::String(format!("{:?}", col.data_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_load_keeps_column_order_and_extras() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp(
            &dir,
            "posters.csv",
            "title,image_path,imdb_score\nHeat,poster_images/Heat.jpg,8.3\nUnrated,poster_images/Unrated.jpg,\n",
        );

        let dataset = load_file(&input).unwrap();
        assert_eq!(dataset.columns, vec!["title", "image_path", "imdb_score"]);
        assert_eq!(dataset.len(), 2);

        let first = &dataset.records[0];
        assert_eq!(first.image_path.as_deref(), Some("poster_images/Heat.jpg"));
        assert_eq!(first.imdb_score, Some(8.3));
        assert_eq!(
            first.extras.get("title"),
            Some(&CellValue::String("Heat".to_string()))
        );

        // Empty score cell loads as missing, not as an error.
        assert_eq!(dataset.records[1].imdb_score, None);
    }

    #[test]
    fn csv_non_numeric_score_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp(
            &dir,
            "posters.csv",
            "image_path,imdb_score\na.jpg,n/a\nb.jpg,7\n",
        );

        let dataset = load_file(&input).unwrap();
        assert_eq!(dataset.records[0].imdb_score, None);
        assert_eq!(dataset.records[1].imdb_score, Some(7.0));
    }

    #[test]
    fn csv_without_score_column_loads() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp(&dir, "posters.csv", "image_path\na.jpg\n");

        let dataset = load_file(&input).unwrap();
        assert_eq!(dataset.records[0].imdb_score, None);
        assert!(!dataset.has_column(SCORE_COLUMN));
    }

    #[test]
    fn json_load_reads_records() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp(
            &dir,
            "posters.json",
            r#"[{"image_path":"a.jpg","imdb_score":6.1,"year":1995},
                {"image_path":"b.jpg","imdb_score":null}]"#,
        );

        let dataset = load_file(&input).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].imdb_score, Some(6.1));
        assert_eq!(
            dataset.records[0].extras.get("year"),
            Some(&CellValue::Integer(1995))
        );
        assert_eq!(dataset.records[1].imdb_score, None);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_file(Path::new("/nonexistent/posters.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("posters.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }
}
