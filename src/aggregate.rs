//! KPIs and grouped sums computed from a loaded table.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};

use crate::config::ColumnNames;
use crate::data::model::{CellValue, Table, TableSchema, cell};
use crate::error::{ReportError, Result};

/// Label used when there is no entity to name.
pub const NO_ENTITY: &str = "N/A";

/// Headline numbers of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSet {
    pub total: f64,
    pub average: f64,
    pub top_entity: String,
}

/// Everything downstream steps need from the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub kpis: KpiSet,
    /// Summed value per category, ascending by category.
    pub category_totals: Vec<(String, f64)>,
    /// Summed value per week, keyed by the Sunday closing the week.
    /// `None` when the table has no usable date column or no rows.
    pub weekly_totals: Option<Vec<(NaiveDate, f64)>>,
}

/// Compute KPIs, category sums and weekly sums in one pass over the schema.
pub fn aggregate(table: &Table, schema: &TableSchema, columns: &ColumnNames) -> Result<Aggregates> {
    if !schema.has_value {
        return Err(ReportError::MissingColumn(columns.value.clone()));
    }
    let values = numeric_values(table, &columns.value)?;

    let total: f64 = values.iter().flatten().sum();
    let count = values.iter().flatten().count();
    let average = if count == 0 { 0.0 } else { total / count as f64 };

    // Bar chart groups by category; the headline entity prefers products.
    let category_key = match (schema.has_category, schema.has_product) {
        (true, _) => Some(columns.category.as_str()),
        (false, true) => Some(columns.product.as_str()),
        (false, false) => None,
    };
    let entity_key = match (schema.has_product, schema.has_category) {
        (true, _) => Some(columns.product.as_str()),
        (false, true) => Some(columns.category.as_str()),
        (false, false) => None,
    };

    let category_totals = category_key
        .map(|key| group_sums(table, key, &values))
        .unwrap_or_default();

    let top_entity = entity_key
        .and_then(|key| top_key(&group_sums(table, key, &values)))
        .unwrap_or_else(|| NO_ENTITY.to_string());

    let weekly_totals = (schema.has_date && !table.is_empty())
        .then(|| weekly_sums(table, &columns.date, &values));

    log::debug!(
        "aggregated {} rows: total={total}, average={average}, top='{top_entity}', {} categories",
        table.len(),
        category_totals.len()
    );

    Ok(Aggregates {
        kpis: KpiSet {
            total,
            average,
            top_entity,
        },
        category_totals,
        weekly_totals,
    })
}

/// One entry per row: the numeric value, or `None` for a missing cell.
fn numeric_values(table: &Table, column: &str) -> Result<Vec<Option<f64>>> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_no, row)| match cell(row, column) {
            CellValue::Null => Ok(None),
            other => other.as_f64().map(Some).ok_or_else(|| {
                ReportError::DataFormat(format!(
                    "row {row_no}: '{other}' in column '{column}' is not a number"
                ))
            }),
        })
        .collect()
}

/// Sum values per distinct key, ascending by key. Rows whose key is missing
/// are left out, like `groupby` does with NaN keys.
pub fn group_sums(table: &Table, key: &str, values: &[Option<f64>]) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&CellValue, f64> = BTreeMap::new();
    for (row, value) in table.rows.iter().zip(values) {
        let k = cell(row, key);
        if k.is_null() {
            continue;
        }
        *sums.entry(k).or_default() += value.unwrap_or(0.0);
    }
    sums.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Key with the largest sum; the first one in key order wins a tie.
fn top_key(sums: &[(String, f64)]) -> Option<String> {
    sums.iter()
        .fold(None::<&(String, f64)>, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        })
        .map(|(k, _)| k.clone())
}

/// The Sunday on or after `date`: pandas' `W` (`W-SUN`) bucket label.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_to_sunday = 6 - date.weekday().num_days_from_monday();
    date + Days::new(days_to_sunday as u64)
}

/// Weekly sums from the first to the last week present, gaps filled with zero.
fn weekly_sums(table: &Table, date_column: &str, values: &[Option<f64>]) -> Vec<(NaiveDate, f64)> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (row, value) in table.rows.iter().zip(values) {
        let Some(at) = cell(row, date_column).as_date() else {
            continue;
        };
        *buckets.entry(week_ending(at.date())).or_default() += value.unwrap_or(0.0);
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };
    let mut weeks = Vec::new();
    let mut week = first;
    while week <= last {
        weeks.push((week, buckets.get(&week).copied().unwrap_or(0.0)));
        week = week + Days::new(7);
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Row;

    fn table(rows: &[&[(&str, CellValue)]]) -> Table {
        let mut names: Vec<String> = Vec::new();
        let rows: Vec<Row> = rows
            .iter()
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|(k, v)| {
                        if !names.iter().any(|n| n == k) {
                            names.push(k.to_string());
                        }
                        (k.to_string(), v.clone())
                    })
                    .collect()
            })
            .collect();
        Table::from_rows(names, rows)
    }

    fn run(t: &Table) -> Aggregates {
        let columns = ColumnNames::default();
        let schema = TableSchema::detect(t, &columns);
        aggregate(t, &schema, &columns).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> CellValue {
        CellValue::Date(day(y, m, d).and_hms_opt(0, 0, 0).unwrap())
    }

    fn s(v: &str) -> CellValue {
        CellValue::String(v.into())
    }

    #[test]
    fn empty_table_has_safe_kpis() {
        let t = Table::from_rows(vec!["Categoria".into(), "Valor".into()], Vec::new());
        let agg = run(&t);
        assert_eq!(agg.kpis.total, 0.0);
        assert_eq!(agg.kpis.average, 0.0);
        assert_eq!(agg.kpis.top_entity, NO_ENTITY);
        assert!(agg.category_totals.is_empty());
        assert!(agg.weekly_totals.is_none());
    }

    #[test]
    fn category_ranking_and_top_entity() {
        let t = table(&[
            &[("Categoria", s("A")), ("Valor", CellValue::Float(10.0))],
            &[("Categoria", s("B")), ("Valor", CellValue::Float(30.0))],
            &[("Categoria", s("C")), ("Valor", CellValue::Float(20.0))],
        ]);
        let agg = run(&t);
        assert_eq!(agg.kpis.top_entity, "B");
        assert_eq!(agg.kpis.total, 60.0);
        assert_eq!(agg.kpis.average, 20.0);
        assert_eq!(
            agg.category_totals,
            vec![("A".into(), 10.0), ("B".into(), 30.0), ("C".into(), 20.0)]
        );
    }

    #[test]
    fn top_entity_prefers_product_column() {
        let t = table(&[
            &[("Produto", s("Mouse")), ("Categoria", s("Periféricos")), ("Valor", CellValue::Integer(80))],
            &[("Produto", s("Teclado")), ("Categoria", s("Periféricos")), ("Valor", CellValue::Integer(150))],
            &[("Produto", s("Monitor")), ("Categoria", s("Telas")), ("Valor", CellValue::Integer(200))],
        ]);
        let agg = run(&t);
        assert_eq!(agg.kpis.top_entity, "Monitor");
        assert_eq!(agg.category_totals[0], ("Periféricos".into(), 230.0));
    }

    #[test]
    fn ties_go_to_first_key() {
        let t = table(&[
            &[("Categoria", s("Z")), ("Valor", CellValue::Float(5.0))],
            &[("Categoria", s("M")), ("Valor", CellValue::Float(5.0))],
        ]);
        assert_eq!(run(&t).kpis.top_entity, "M");
    }

    #[test]
    fn null_values_are_skipped_in_mean() {
        let t = table(&[
            &[("Valor", CellValue::Float(10.0))],
            &[("Valor", CellValue::Null)],
            &[("Valor", CellValue::Float(20.0))],
        ]);
        let agg = run(&t);
        assert_eq!(agg.kpis.total, 30.0);
        assert_eq!(agg.kpis.average, 15.0);
        assert_eq!(agg.kpis.top_entity, NO_ENTITY);
    }

    #[test]
    fn missing_value_column_is_an_error() {
        let t = table(&[&[("Categoria", s("A"))]]);
        let columns = ColumnNames::default();
        let schema = TableSchema::detect(&t, &columns);
        let err = aggregate(&t, &schema, &columns).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(c) if c == "Valor"));
    }

    #[test]
    fn text_in_value_column_is_a_format_error() {
        let t = table(&[&[("Valor", s("muito"))]]);
        let columns = ColumnNames::default();
        let schema = TableSchema::detect(&t, &columns);
        assert!(matches!(
            aggregate(&t, &schema, &columns),
            Err(ReportError::DataFormat(_))
        ));
    }

    #[test]
    fn weeks_end_on_sunday() {
        // 2023-01-01 is a Sunday
        assert_eq!(week_ending(day(2023, 1, 1)), day(2023, 1, 1));
        assert_eq!(week_ending(day(2023, 1, 2)), day(2023, 1, 8));
        assert_eq!(week_ending(day(2023, 1, 8)), day(2023, 1, 8));
    }

    #[test]
    fn weekly_sums_fill_gaps() {
        let t = table(&[
            &[("Data", date(2023, 1, 1)), ("Valor", CellValue::Float(150.0))],
            &[("Data", date(2023, 1, 3)), ("Valor", CellValue::Float(80.5))],
            &[("Data", date(2023, 1, 4)), ("Valor", CellValue::Float(1200.0))],
            &[("Data", date(2023, 1, 20)), ("Valor", CellValue::Float(250.0))],
        ]);
        let weekly = run(&t).weekly_totals.unwrap();
        assert_eq!(
            weekly,
            vec![
                (day(2023, 1, 1), 150.0),
                (day(2023, 1, 8), 1280.5),
                (day(2023, 1, 15), 0.0),
                (day(2023, 1, 22), 250.0),
            ]
        );
    }

    #[test]
    fn no_date_column_means_no_weekly_totals() {
        let t = table(&[&[("Categoria", s("A")), ("Valor", CellValue::Float(1.0))]]);
        assert!(run(&t).weekly_totals.is_none());
    }
}
