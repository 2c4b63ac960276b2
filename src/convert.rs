//! CSV to SQLite conversion
//!
//! The first CSV row is the header; every following row becomes one row in a
//! single `csv_data` table at the target path. Column types are inferred from
//! the data, and a pre-existing `csv_data` table is replaced, never appended.

use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use std::path::Path;
use crate::query::quote_ident;
use crate::{Error, Result};

/// Fixed table name every converted CSV lands in
pub const CSV_TABLE: &str = "csv_data";

/// SQLite column affinity inferred for a CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    /// Convert one CSV field to a typed SQL value. Empty fields are NULL.
    fn coerce(&self, field: &str) -> SqlValue {
        if field.is_empty() {
            return SqlValue::Null;
        }
        match self {
            Self::Integer => field
                .parse::<i64>()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(field.to_string())),
            Self::Real => field
                .parse::<f64>()
                .map(SqlValue::Real)
                .unwrap_or_else(|_| SqlValue::Text(field.to_string())),
            Self::Text => SqlValue::Text(field.to_string()),
        }
    }
}

/// Convert a headered CSV file into a SQLite database at `db_path`,
/// replacing any existing `csv_data` table. Returns the number of data rows
/// written. The target may be left partially written on failure; callers
/// must not expose the identifier in that case.
pub fn csv_to_sqlite(csv_path: &Path, db_path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new().from_path(csv_path)?;
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(Error::Conversion("CSV file has no header row".to_string()));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }

    let types = infer_column_types(headers.len(), &records);

    let columns = headers
        .iter()
        .zip(&types)
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");

    let mut conn = Connection::open(db_path)?;
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {CSV_TABLE}; CREATE TABLE {CSV_TABLE} ({columns});"
    ))?;

    let placeholders = (1..=headers.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let insert_sql = format!("INSERT INTO {CSV_TABLE} VALUES ({placeholders})");

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for record in &records {
            let values: Vec<SqlValue> = record
                .iter()
                .zip(&types)
                .map(|(field, ty)| ty.coerce(field))
                .collect();
            stmt.execute(rusqlite::params_from_iter(values))?;
        }
    }
    tx.commit()?;

    Ok(records.len())
}

/// Infer a type per column by scanning every value: all integers -> INTEGER,
/// all numerics -> REAL, otherwise TEXT. Empty fields are NULLs and do not
/// veto a numeric column; a column with no values at all is TEXT.
fn infer_column_types(column_count: usize, records: &[csv::StringRecord]) -> Vec<ColumnType> {
    (0..column_count)
        .map(|i| {
            let mut ty = ColumnType::Integer;
            let mut saw_value = false;
            for record in records {
                let field = record.get(i).unwrap_or("");
                if field.is_empty() {
                    continue;
                }
                saw_value = true;
                ty = match ty {
                    ColumnType::Integer if field.parse::<i64>().is_ok() => ColumnType::Integer,
                    ColumnType::Integer | ColumnType::Real if field.parse::<f64>().is_ok() => {
                        ColumnType::Real
                    }
                    _ => ColumnType::Text,
                };
                if ty == ColumnType::Text {
                    break;
                }
            }
            if saw_value { ty } else { ColumnType::Text }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::query::{execute_query, read_schema};

    fn convert(dir: &Path, csv: &str) -> crate::Result<std::path::PathBuf> {
        let csv_path = dir.join("input.csv");
        let db_path = dir.join("output.sqlite");
        std::fs::write(&csv_path, csv).unwrap();
        csv_to_sqlite(&csv_path, &db_path)?;
        Ok(db_path)
    }

    #[test]
    fn test_basic_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let db = convert(dir.path(), "a,b\n1,2\n").unwrap();

        let rows = execute_query(&db, "SELECT * FROM csv_data").unwrap();
        assert_eq!(rows, vec![vec![json!(1), json!(2)]]);
    }

    #[test]
    fn test_type_inference() {
        let dir = tempfile::tempdir().unwrap();
        let db = convert(dir.path(), "n,price,label\n1,1.5,ok\n2,2,maybe\n3,0.25,\n").unwrap();

        let schema = read_schema(&db).unwrap();
        let ddl = schema[0].create_statement.as_deref().unwrap();
        assert!(ddl.contains("\"n\" INTEGER"));
        assert!(ddl.contains("\"price\" REAL"));
        assert!(ddl.contains("\"label\" TEXT"));

        let rows = execute_query(&db, "SELECT n, price, label FROM csv_data ORDER BY n").unwrap();
        assert_eq!(rows[1], vec![json!(2), json!(2.0), json!("maybe")]);
        assert_eq!(rows[2], vec![json!(3), json!(0.25), serde_json::Value::Null]);
    }

    #[test]
    fn test_numeric_column_with_stray_text_becomes_text() {
        let dir = tempfile::tempdir().unwrap();
        let db = convert(dir.path(), "v\n1\n2\noops\n").unwrap();

        let schema = read_schema(&db).unwrap();
        assert!(schema[0].create_statement.as_deref().unwrap().contains("\"v\" TEXT"));
    }

    #[test]
    fn test_header_only_csv_creates_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let db = convert(dir.path(), "a,b\n").unwrap();

        let rows = execute_query(&db, "SELECT COUNT(*) FROM csv_data").unwrap();
        assert_eq!(rows, vec![vec![json!(0)]]);
    }

    #[test]
    fn test_empty_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(convert(dir.path(), "").is_err());
    }

    #[test]
    fn test_ragged_rows_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(convert(dir.path(), "a,b\n1\n").is_err());
    }

    #[test]
    fn test_reconversion_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        convert(dir.path(), "a\n1\n2\n").unwrap();
        let db = convert(dir.path(), "a\n9\n").unwrap();

        let rows = execute_query(&db, "SELECT * FROM csv_data").unwrap();
        assert_eq!(rows, vec![vec![json!(9)]]);
    }

    #[test]
    fn test_quoted_header_names() {
        let dir = tempfile::tempdir().unwrap();
        let db = convert(dir.path(), "weird \"name\",b\nx,1\n").unwrap();

        let rows = execute_query(&db, "SELECT \"weird \"\"name\"\"\" FROM csv_data").unwrap();
        assert_eq!(rows, vec![vec![json!("x")]]);
    }
}
