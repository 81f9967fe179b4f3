use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::filter::RejectedRecord;
use super::model::{
    CellValue, PosterDataset, PosterRecord, EXISTS_COLUMN, PATH_COLUMN, SCORE_COLUMN,
};
use crate::error::WriteError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Serialize a dataset to a file.  Dispatch by extension, mirroring the
/// loader: `.csv`, `.json`, `.parquet`/`.pq`.
///
/// Column order is the input order.  The `file_exists` annotation goes out
/// as the last column, unless the input already carried a `file_exists`
/// column, in which case the fresh value is written in that position.
pub fn write_file(dataset: &PosterDataset, path: &Path) -> Result<(), WriteError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => write_csv(dataset, path),
        "json" => write_json(dataset, path),
        "parquet" | "pq" => write_parquet(dataset, path),
        other => Err(WriteError::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

/// Append dropped rows to a rejects log, one JSON object per line.
pub fn write_rejects(rejected: &[RejectedRecord], path: &Path) -> Result<(), WriteError> {
    if rejected.is_empty() {
        return Ok(());
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let mut out = BufWriter::new(file);

    for record in rejected {
        let line = serde_json::to_string(record).map_err(|source| WriteError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writeln!(out, "{line}").map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    out.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Output column order: the input columns, plus `file_exists` at the end
/// when the annotation exists and the input did not already carry it.
fn output_columns(dataset: &PosterDataset) -> Vec<String> {
    let mut columns = dataset.columns.clone();
    let annotated = dataset.records.iter().any(|r| r.file_exists.is_some());
    if annotated && !dataset.has_column(EXISTS_COLUMN) {
        columns.push(EXISTS_COLUMN.to_string());
    }
    columns
}

/// The cell a record contributes to a named column.  The fresh existence
/// annotation wins over a stale `file_exists` passthrough cell.
fn cell_for(record: &PosterRecord, column: &str) -> CellValue {
    match column {
        PATH_COLUMN => record
            .image_path
            .clone()
            .map(CellValue::String)
            .unwrap_or(CellValue::Null),
        SCORE_COLUMN => record
            .imdb_score
            .map(CellValue::Float)
            .unwrap_or(CellValue::Null),
        EXISTS_COLUMN => match record.file_exists {
            Some(exists) => CellValue::Bool(exists),
            None => record
                .extras
                .get(column)
                .cloned()
                .unwrap_or(CellValue::Null),
        },
        _ => record
            .extras
            .get(column)
            .cloned()
            .unwrap_or(CellValue::Null),
    }
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

/// Plain CSV: header row, then one record per row.  No row-index column.
fn write_csv(dataset: &PosterDataset, path: &Path) -> Result<(), WriteError> {
    let columns = output_columns(dataset);
    let mut writer = csv::Writer::from_path(path).map_err(|source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    writer
        .write_record(&columns)
        .map_err(|source| WriteError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    for record in &dataset.records {
        let row: Vec<String> = columns
            .iter()
            .map(|col| cell_for(record, col).to_csv_field())
            .collect();
        writer.write_record(&row).map_err(|source| WriteError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    }

    writer.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// JSON writer
// ---------------------------------------------------------------------------

/// Records-oriented JSON array, the inverse of the JSON loader.
fn write_json(dataset: &PosterDataset, path: &Path) -> Result<(), WriteError> {
    let columns = output_columns(dataset);

    let rows: Vec<JsonValue> = dataset
        .records
        .iter()
        .map(|record| {
            let mut obj = JsonMap::new();
            for col in &columns {
                obj.insert(col.clone(), cell_for(record, col).to_json());
            }
            JsonValue::Object(obj)
        })
        .collect();

    let file = File::create(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), &JsonValue::Array(rows)).map_err(
        |source| WriteError::Json {
            path: path.to_path_buf(),
            source,
        },
    )
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

/// Arrow type a passthrough column is written as, chosen by scanning its
/// cells.  Mixed-type columns degrade to Utf8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn column_kind(dataset: &PosterDataset, column: &str) -> ColumnKind {
    let mut saw_int = false;
    let mut saw_float = false;
    let mut saw_bool = false;
    let mut saw_text = false;

    for record in &dataset.records {
        match cell_for(record, column) {
            CellValue::Null => {}
            CellValue::Integer(_) => saw_int = true,
            CellValue::Float(_) => saw_float = true,
            CellValue::Bool(_) => saw_bool = true,
            CellValue::String(_) => saw_text = true,
        }
    }

    if saw_text || (saw_bool && (saw_int || saw_float)) {
        ColumnKind::Text
    } else if saw_bool {
        ColumnKind::Bool
    } else if saw_float {
        ColumnKind::Float
    } else if saw_int {
        ColumnKind::Int
    } else {
        // All-null column; Utf8 holds nulls fine.
        ColumnKind::Text
    }
}

fn build_column(dataset: &PosterDataset, column: &str, kind: ColumnKind) -> ArrayRef {
    match kind {
        ColumnKind::Int => {
            let mut builder = Int64Builder::new();
            for record in &dataset.records {
                match cell_for(record, column) {
                    CellValue::Integer(i) => builder.append_value(i),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Float => {
            let mut builder = Float64Builder::new();
            for record in &dataset.records {
                match cell_for(record, column) {
                    CellValue::Float(v) => builder.append_value(v),
                    CellValue::Integer(i) => builder.append_value(i as f64),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Bool => {
            let mut builder = BooleanBuilder::new();
            for record in &dataset.records {
                match cell_for(record, column) {
                    CellValue::Bool(b) => builder.append_value(b),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Text => {
            let mut builder = StringBuilder::new();
            for record in &dataset.records {
                match cell_for(record, column) {
                    CellValue::Null => builder.append_null(),
                    cell => builder.append_value(cell.to_string()),
                }
            }
            Arc::new(builder.finish())
        }
    }
}

fn write_parquet(dataset: &PosterDataset, path: &Path) -> Result<(), WriteError> {
    let columns = output_columns(dataset);

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for column in &columns {
        let kind = column_kind(dataset, column);
        let data_type = match kind {
            ColumnKind::Int => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Bool => DataType::Boolean,
            ColumnKind::Text => DataType::Utf8,
        };
        fields.push(Field::new(column, data_type, true));
        arrays.push(build_column(dataset, column, kind));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch =
        RecordBatch::try_new(schema.clone(), arrays).map_err(|source| WriteError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;

    let file = File::create(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).map_err(|source| WriteError::Parquet {
            path: path.to_path_buf(),
            source,
        })?;
    writer.write(&batch).map_err(|source| WriteError::Parquet {
        path: path.to_path_buf(),
        source,
    })?;
    writer.close().map_err(|source| WriteError::Parquet {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{RejectReason, RejectedRecord};
    use crate::data::loader::load_file;
    use std::collections::BTreeMap;

    fn annotated_record(
        title: &str,
        path: &str,
        score: f64,
        exists: bool,
    ) -> PosterRecord {
        let mut extras = BTreeMap::new();
        extras.insert("title".to_string(), CellValue::String(title.to_string()));
        PosterRecord {
            image_path: Some(path.to_string()),
            imdb_score: Some(score),
            file_exists: Some(exists),
            extras,
        }
    }

    #[test]
    fn csv_output_appends_exists_column_without_index() {
        let dataset = PosterDataset::new(
            vec![
                annotated_record("Heat", "poster_images/Heat.jpg", 8.3, true),
                annotated_record("Lost Reel", "poster_images/Lost_Reel.jpg", 6.4, false),
            ],
            vec![
                "title".to_string(),
                "image_path".to_string(),
                "imdb_score".to_string(),
            ],
        );

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("filtered.csv");
        write_file(&dataset, &out).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "title,image_path,imdb_score,file_exists");
        assert_eq!(lines[1], "Heat,poster_images/Heat.jpg,8.3,true");
        assert_eq!(lines[2], "Lost Reel,poster_images/Lost_Reel.jpg,6.4,false");
    }

    #[test]
    fn existing_exists_column_keeps_its_position_and_is_refreshed() {
        let mut record = annotated_record("Heat", "a.jpg", 8.3, true);
        // Stale verdict from a previous run, loaded as a passthrough cell.
        record
            .extras
            .insert(EXISTS_COLUMN.to_string(), CellValue::Bool(false));

        let dataset = PosterDataset::new(
            vec![record],
            vec![
                "title".to_string(),
                "file_exists".to_string(),
                "image_path".to_string(),
                "imdb_score".to_string(),
            ],
        );

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("filtered.csv");
        write_file(&dataset, &out).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "title,file_exists,image_path,imdb_score");
        assert_eq!(lines[1], "Heat,true,a.jpg,8.3");
    }

    #[test]
    fn rejects_log_is_one_json_object_per_line() {
        let rejected = vec![
            RejectedRecord {
                image_path: Some("a.jpg".to_string()),
                reason: RejectReason::MissingScore,
            },
            RejectedRecord {
                image_path: None,
                reason: RejectReason::ZeroScore,
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rejects.jsonl");
        write_rejects(&rejected, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"image_path":"a.jpg","reason":"missing_score"}"#);
        assert_eq!(lines[1], r#"{"image_path":null,"reason":"zero_score"}"#);
    }

    #[test]
    fn parquet_output_reloads_with_same_values() {
        let dataset = PosterDataset::new(
            vec![annotated_record("Heat", "poster_images/Heat.jpg", 8.3, true)],
            vec![
                "title".to_string(),
                "image_path".to_string(),
                "imdb_score".to_string(),
            ],
        );

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("filtered.parquet");
        write_file(&dataset, &out).unwrap();

        let reloaded = load_file(&out).unwrap();
        assert_eq!(
            reloaded.columns,
            vec!["title", "image_path", "imdb_score", "file_exists"]
        );
        let record = &reloaded.records[0];
        assert_eq!(record.image_path.as_deref(), Some("poster_images/Heat.jpg"));
        assert_eq!(record.imdb_score, Some(8.3));
        assert_eq!(
            record.extras.get(EXISTS_COLUMN),
            Some(&CellValue::Bool(true))
        );
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dataset = PosterDataset::default();
        let err = write_file(&dataset, Path::new("out.xlsx")).unwrap_err();
        assert!(matches!(err, WriteError::UnsupportedFormat { .. }));
    }
}
