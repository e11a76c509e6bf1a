use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};

use crate::config::ColumnNames;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the common Pandas dtypes.
/// Grouped sums key on `CellValue`, so it must be `Ord` and `Hash`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Null,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

/// Plain rendition used for table cells and group labels. Floats keep their
/// natural representation here; currency formatting happens in the report.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) if d.time() == NaiveTime::MIN => {
                write!(f, "{}", d.format("%Y-%m-%d"))
            }
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` for aggregation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – the dtype inferred for a whole column
// ---------------------------------------------------------------------------

/// Column-level type, inferred from every non-null cell.
///
/// Integers mixed with floats upcast to `Float`, any other mix falls back to
/// `Text`. A column with only nulls is `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Empty,
    Bool,
    Integer,
    Float,
    Date,
    Text,
}

impl ColumnKind {
    fn of(value: &CellValue) -> Self {
        match value {
            CellValue::Null => ColumnKind::Empty,
            CellValue::Bool(_) => ColumnKind::Bool,
            CellValue::Integer(_) => ColumnKind::Integer,
            CellValue::Float(_) => ColumnKind::Float,
            CellValue::Date(_) => ColumnKind::Date,
            CellValue::String(_) => ColumnKind::Text,
        }
    }

    fn merge(self, other: Self) -> Self {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Empty, k) | (k, Empty) => k,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

// ---------------------------------------------------------------------------
// Row / Table
// ---------------------------------------------------------------------------

/// One row of the source sheet: column_name → value.
pub type Row = BTreeMap<String, CellValue>;

/// The full loaded table with its column order and inferred dtypes.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// All rows, in source order.
    pub rows: Vec<Row>,
    /// Column names in header order.
    pub column_names: Vec<String>,
    /// Inferred kind for each column (same order as `column_names`).
    pub column_kinds: Vec<ColumnKind>,
}

impl Table {
    /// Build the table and infer column kinds from the loaded rows.
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Row>) -> Self {
        let column_kinds = column_names
            .iter()
            .map(|col| {
                rows.iter()
                    .filter_map(|row| row.get(col))
                    .map(ColumnKind::of)
                    .fold(ColumnKind::Empty, ColumnKind::merge)
            })
            .collect();
        Table {
            rows,
            column_names,
            column_kinds,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.column_names
            .iter()
            .position(|c| c == name)
            .map(|i| self.column_kinds[i])
    }
}

static NULL: CellValue = CellValue::Null;

/// Cell lookup that treats a missing key as `Null`.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&NULL)
}

// ---------------------------------------------------------------------------
// TableSchema – which optional columns the report can use
// ---------------------------------------------------------------------------

/// Capability set computed once after loading; downstream steps consult it
/// instead of probing column names themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableSchema {
    pub has_date: bool,
    pub has_category: bool,
    pub has_product: bool,
    pub has_value: bool,
}

impl TableSchema {
    pub fn detect(table: &Table, columns: &ColumnNames) -> Self {
        TableSchema {
            has_date: table.column_kind(&columns.date) == Some(ColumnKind::Date),
            has_category: table.has_column(&columns.category),
            has_product: table.has_column(&columns.product),
            has_value: table.has_column(&columns.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn integer_and_float_cells_upcast_to_float_column() {
        let table = Table::from_rows(
            vec!["Valor".into()],
            vec![
                row(&[("Valor", CellValue::Integer(150))]),
                row(&[("Valor", CellValue::Float(80.5))]),
                row(&[("Valor", CellValue::Null)]),
            ],
        );
        assert_eq!(table.column_kind("Valor"), Some(ColumnKind::Float));
    }

    #[test]
    fn mixed_text_and_numbers_is_text() {
        let table = Table::from_rows(
            vec!["Produto".into()],
            vec![
                row(&[("Produto", CellValue::String("Mouse".into()))]),
                row(&[("Produto", CellValue::Integer(7))]),
            ],
        );
        assert_eq!(table.column_kind("Produto"), Some(ColumnKind::Text));
    }

    #[test]
    fn schema_reports_present_columns() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let table = Table::from_rows(
            vec!["Data".into(), "Categoria".into(), "Valor".into()],
            vec![row(&[
                ("Data", CellValue::Date(date)),
                ("Categoria", CellValue::String("Telas".into())),
                ("Valor", CellValue::Float(1.0)),
            ])],
        );
        let schema = TableSchema::detect(&table, &ColumnNames::default());
        assert!(schema.has_date);
        assert!(schema.has_category);
        assert!(!schema.has_product);
        assert!(schema.has_value);
    }

    #[test]
    fn date_display_drops_midnight_time() {
        let d = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        assert_eq!(
            CellValue::Date(d.and_hms_opt(0, 0, 0).unwrap()).to_string(),
            "2023-01-05"
        );
        assert_eq!(
            CellValue::Date(d.and_hms_opt(13, 30, 0).unwrap()).to_string(),
            "2023-01-05 13:30:00"
        );
    }
}
