//! Read-only query execution and schema introspection
//!
//! Every request opens a fresh connection against the artifact file and
//! drops it when done. Connections are opened with SQLITE_OPEN_READ_ONLY;
//! the SELECT prefix gate in front of them is syntactic only.

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use crate::{Error, Result};

/// Number of example rows returned per table by schema introspection
const EXAMPLE_ROW_LIMIT: usize = 3;

/// Schema entry for one table: name, original DDL, and a few sample rows
#[derive(Debug, Serialize)]
pub struct TableSchema {
    pub table: String,
    pub create_statement: Option<String>,
    pub example_rows: Vec<Vec<JsonValue>>,
}

/// Prefix check for the read-only gate: trimmed, case-insensitive `SELECT`.
/// This is a syntactic check only, not a statement parser.
pub fn is_select(query: &str) -> bool {
    let trimmed = query.trim_start();
    trimmed
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"))
}

/// Quote an identifier for embedding in SQL text, doubling embedded quotes.
/// Applied to table names coming back from the catalog before they are
/// re-embedded in the sample-row query.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Execute a query and collect the full result set as rows of JSON values
pub fn execute_query(db_path: &Path, query: &str) -> Result<Vec<Vec<JsonValue>>> {
    let conn = open_readonly(db_path)?;
    collect_rows(&conn, query)
}

/// List every table with its creation statement and first example rows
pub fn read_schema(db_path: &Path) -> Result<Vec<TableSchema>> {
    let conn = open_readonly(db_path)?;

    let mut stmt = conn.prepare("SELECT name, sql FROM sqlite_master WHERE type = 'table'")?;
    let tables: Vec<(String, Option<String>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    drop(stmt);

    let mut schema = Vec::with_capacity(tables.len());
    for (table, create_statement) in tables {
        let sample_sql = format!(
            "SELECT * FROM {} LIMIT {}",
            quote_ident(&table),
            EXAMPLE_ROW_LIMIT
        );
        let example_rows = collect_rows(&conn, &sample_sql)?;
        schema.push(TableSchema {
            table,
            create_statement,
            example_rows,
        });
    }

    Ok(schema)
}

/// Open an artifact read-only. A file that vanished (e.g. swept between the
/// existence check and here) surfaces as `ArtifactNotFound`, not an engine
/// fault.
fn open_readonly(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::CannotOpen =>
        {
            Error::ArtifactNotFound(db_path.display().to_string())
        }
        other => Error::Storage(other),
    })
}

fn collect_rows(conn: &Connection, query: &str) -> Result<Vec<Vec<JsonValue>>> {
    let mut stmt = conn.prepare(query)?;
    let column_count = stmt.column_count();

    let mut rows = stmt.query([])?;
    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(value_to_json(row.get_ref(i)?));
        }
        results.push(values);
    }

    Ok(results)
}

fn value_to_json(value: rusqlite::types::ValueRef<'_>) -> JsonValue {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(f) => JsonValue::from(f),
        ValueRef::Text(t) => JsonValue::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
    }
}
