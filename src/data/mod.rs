//! Tabular input: cell model, file loaders and row filters.
//!
//! ```text
//!  .csv  .xlsx/.xls/.ods  .parquet  .json
//!            \     |     /
//!          loader::load_file ── date column coerced to CellValue::Date
//!                  │
//!                Table  (rows, column order, ColumnKind per column)
//!                  │
//!          filter::drop_missing   (only with ReportConfig::drop_missing)
//!                  │
//!          TableSchema::detect ── which optional columns are usable
//! ```

pub mod filter;
pub mod loader;
pub mod model;
