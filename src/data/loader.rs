use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int32Array, Int64Array, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, ColumnKind, Row, Table};
use crate::error::ReportError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`                                   – header row + records
/// * `.xlsx` / `.xlsm` / `.xls` / `.xlsb` / `.ods` – first worksheet, first row is the header
/// * `.parquet` / `.pq`                        – flat columns (Pandas / Polars output)
/// * `.json`                                  – `[{ "Data": ..., "Valor": ... }, ...]`
///
/// When `date_column` is present every non-null cell in it must be a date,
/// otherwise the whole load fails. There is never a partial table.
pub fn load_file(path: &Path, date_column: &str) -> Result<Table, ReportError> {
    load_any(path, date_column)
        .map_err(|e| ReportError::DataFormat(format!("{}: {e:#}", path.display())))
}

fn load_any(path: &Path, date_column: &str) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_spreadsheet(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::debug!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.column_names.len(),
        path.display()
    );

    coerce_date_column(&mut table, date_column)?;
    Ok(table)
}

/// Turn the date column into `CellValue::Date`, like `pd.to_datetime`.
fn coerce_date_column(table: &mut Table, date_column: &str) -> Result<()> {
    if !table.has_column(date_column) {
        return Ok(());
    }
    for (row_no, row) in table.rows.iter_mut().enumerate() {
        let Some(cell) = row.get_mut(date_column) else {
            continue;
        };
        let coerced = match &*cell {
            CellValue::Date(_) | CellValue::Null => continue,
            CellValue::String(s) => parse_date(s),
            _ => None,
        };
        match coerced {
            Some(d) => *cell = CellValue::Date(d),
            None => bail!("row {row_no}: '{cell}' in column '{date_column}' is not a date"),
        }
    }
    // kinds were inferred before the coercion
    *table = Table::from_rows(
        std::mem::take(&mut table.column_names),
        std::mem::take(&mut table.rows),
    );
    debug_assert!(matches!(
        table.column_kind(date_column),
        Some(ColumnKind::Date | ColumnKind::Empty)
    ));
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every other row a record.
/// Cell types are guessed one by one.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(col_idx, col_name)| {
                (col_name.clone(), guess_cell_type(record.get(col_idx).unwrap_or("")))
            })
            .collect();
        rows.push(row);
    }

    Ok(Table::from_rows(headers, rows))
}

/// Guess the type of a textual cell.
pub fn guess_cell_type(raw: &str) -> CellValue {
    let s = raw.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_nan() {
            return CellValue::Null;
        }
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    if let Some(d) = parse_date(s) {
        return CellValue::Date(d);
    }
    CellValue::String(s.to_string())
}

/// Parse the date spellings found in sales sheets.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M",
        "%d/%m/%Y %H:%M:%S",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

    let s = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ---------------------------------------------------------------------------
// Spreadsheet loader (xlsx, xls, ods)
// ---------------------------------------------------------------------------

/// Read the first worksheet; its first row holds the column names.
fn load_spreadsheet(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .context("spreadsheet has no sheets")?
        .clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}'"))?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        // A sheet without even a header is a valid, empty table.
        return Ok(Table::default());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| match cell {
            Data::String(s) => s.trim().to_string(),
            Data::Empty => String::new(),
            other => other.to_string(),
        })
        .collect();

    let mut rows = Vec::new();
    for (row_no, sheet_row) in sheet_rows.enumerate() {
        // Sheets often carry trailing blank rows
        if sheet_row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let mut row = Row::new();
        for (col_idx, col_name) in headers.iter().enumerate() {
            let value = match sheet_row.get(col_idx) {
                Some(cell) => spreadsheet_cell(cell)
                    .with_context(|| format!("row {row_no}, column '{col_name}'"))?,
                None => CellValue::Null,
            };
            row.insert(col_name.clone(), value);
        }
        rows.push(row);
    }

    Ok(Table::from_rows(headers, rows))
}

fn spreadsheet_cell(cell: &Data) -> Result<CellValue> {
    Ok(match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => guess_cell_type(s),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Date(
            excel_serial_to_datetime(dt.as_f64())
                .with_context(|| format!("date serial {} out of range", dt.as_f64()))?,
        ),
        Data::DateTimeIso(s) => CellValue::Date(
            parse_date(s).with_context(|| format!("unrecognised ISO date '{s}'"))?,
        ),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => bail!("cell error {e:?}"),
    })
}

/// Excel serial dates count days from 1899-12-30, the fraction is the time of day.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Data": "2023-01-01", "Produto": "Teclado", "Categoria": "Periféricos", "Valor": 150.0 },
///   ...
/// ]
/// ```
///
/// Column order follows the first appearance of each key.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = Row::new();
        for (key, val) in obj {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        rows.push(row);
    }

    Ok(Table::from_rows(headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => guess_cell_type(s),
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

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); nested columns are rejected.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut cells = BTreeMap::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = extract_cell(batch.column(col_idx), row)
                    .with_context(|| format!("Row {row}, column '{}'", field.name()))?;
                cells.insert(field.name().clone(), value);
            }
            rows.push(cells);
        }
    }

    Ok(Table::from_rows(headers, rows))
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let s = downcast::<StringArray>(col)?;
            guess_cell_type(s.value(row))
        }
        DataType::LargeUtf8 => guess_cell_type(col.as_string::<i64>().value(row)),
        DataType::Int32 => CellValue::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => CellValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => CellValue::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => {
            let v = downcast::<Float64Array>(col)?.value(row);
            if v.is_nan() { CellValue::Null } else { CellValue::Float(v) }
        }
        DataType::Boolean => CellValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        DataType::Date32 => date_cell(downcast::<Date32Array>(col)?.value_as_datetime(row))?,
        DataType::Date64 => date_cell(downcast::<Date64Array>(col)?.value_as_datetime(row))?,
        DataType::Timestamp(unit, _) => {
            let dt = match unit {
                TimeUnit::Second => downcast::<TimestampSecondArray>(col)?.value_as_datetime(row),
                TimeUnit::Millisecond => {
                    downcast::<TimestampMillisecondArray>(col)?.value_as_datetime(row)
                }
                TimeUnit::Microsecond => {
                    downcast::<TimestampMicrosecondArray>(col)?.value_as_datetime(row)
                }
                TimeUnit::Nanosecond => {
                    downcast::<TimestampNanosecondArray>(col)?.value_as_datetime(row)
                }
            };
            date_cell(dt)?
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

fn downcast<T: 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

fn date_cell(dt: Option<NaiveDateTime>) -> Result<CellValue> {
    dt.map(CellValue::Date).context("date out of range")
}
