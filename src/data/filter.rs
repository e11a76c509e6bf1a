use super::model::{Table, cell};

// ---------------------------------------------------------------------------
// Row filters applied between loading and aggregation
// ---------------------------------------------------------------------------

/// Return indices of rows that have a value in every column.
///
/// A row fails when:
/// * any of its cells is `Null`, or
/// * it lacks a key for a column the table declares (JSON records can omit keys)
pub fn complete_row_indices(table: &Table) -> Vec<usize> {
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            table
                .column_names
                .iter()
                .all(|col| !cell(row, col).is_null())
        })
        .map(|(i, _)| i)
        .collect()
}

/// Drop every row with a missing value, like `DataFrame.dropna()`.
/// Returns how many rows were removed.
pub fn drop_missing(table: &mut Table) -> usize {
    let keep = complete_row_indices(table);
    let removed = table.len() - keep.len();
    if removed == 0 {
        return 0;
    }

    let mut idx = 0;
    table.rows.retain(|_| {
        let complete = keep.binary_search(&idx).is_ok();
        idx += 1;
        complete
    });

    // a column may have lost its last float, so kinds are re-inferred
    *table = Table::from_rows(
        std::mem::take(&mut table.column_names),
        std::mem::take(&mut table.rows),
    );
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, ColumnKind, Row};

    fn table() -> Table {
        let rows: Vec<Row> = vec![
            [("Produto", CellValue::String("Mouse".into())), ("Valor", CellValue::Float(80.5))],
            [("Produto", CellValue::Null), ("Valor", CellValue::Float(10.0))],
            [("Produto", CellValue::String("Cadeira".into())), ("Valor", CellValue::Integer(850))],
            [("Produto", CellValue::String("Headset".into())), ("Valor", CellValue::Null)],
        ]
        .into_iter()
        .map(|pairs| pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
        .collect();
        Table::from_rows(vec!["Produto".into(), "Valor".into()], rows)
    }

    #[test]
    fn finds_complete_rows() {
        assert_eq!(complete_row_indices(&table()), vec![0, 2]);
    }

    #[test]
    fn drop_missing_keeps_order_and_reinfers_kinds() {
        let mut t = table();
        assert_eq!(drop_missing(&mut t), 2);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[0]["Produto"], CellValue::String("Mouse".into()));
        assert_eq!(t.rows[1]["Produto"], CellValue::String("Cadeira".into()));
        assert_eq!(t.column_kind("Valor"), Some(ColumnKind::Float));
    }

    #[test]
    fn missing_key_counts_as_missing() {
        let mut row = Row::new();
        row.insert("Valor".into(), CellValue::Integer(1));
        let mut t = Table::from_rows(vec!["Produto".into(), "Valor".into()], vec![row]);
        assert_eq!(drop_missing(&mut t), 1);
        assert!(t.is_empty());
    }
}
