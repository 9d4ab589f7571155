//! PostgreSQL table store (`postgres` feature).

use std::path::Path;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Bool, Text};

use crate::error::{LendcleanError, Result};
use crate::input::Parser;
use crate::table::{Column, ColumnKind, Dataset, Value};

use super::store::TableStore;

/// Rows per INSERT statement.
const INSERT_BATCH: usize = 500;

#[derive(QueryableByName)]
struct TableFound {
    #[diesel(sql_type = Bool)]
    found: bool,
}

/// A live connection to a PostgreSQL database.
pub struct PostgresStore {
    conn: PgConnection,
    url: String,
}

impl PostgresStore {
    /// Connect, giving up after `connect_timeout`.
    pub fn connect(url: &str, connect_timeout: Duration) -> Result<Self> {
        let separator = if url.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{}connect_timeout={}",
            url,
            separator,
            connect_timeout.as_secs().max(1)
        );
        let conn = PgConnection::establish(&url)
            .map_err(|e| LendcleanError::Store(format!("Failed to connect: {}", e)))?;
        Ok(Self {
            conn,
            url: redact(&url),
        })
    }
}

fn map_diesel_error(err: diesel::result::Error) -> LendcleanError {
    LendcleanError::Store(err.to_string())
}

/// Connection string with any password removed.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            let credentials = &url[scheme + 3..at];
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}{}@{}", &url[..scheme + 3], user, &url[at + 1..])
        }
        _ => url.to_string(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(column: &Column) -> &'static str {
    match column.kind() {
        ColumnKind::Integer => "BIGINT",
        ColumnKind::Float => "DOUBLE PRECISION",
        ColumnKind::Boolean => "BOOLEAN",
        ColumnKind::Date => "DATE",
        ColumnKind::Text | ColumnKind::Mixed | ColumnKind::Empty => "TEXT",
    }
}

fn sql_literal(value: &Value, sql_type: &str) -> String {
    match value {
        Value::Missing => "NULL".to_string(),
        Value::Int(n) if sql_type != "TEXT" => n.to_string(),
        Value::Float(f) if sql_type != "TEXT" => {
            if f.is_finite() {
                f.to_string()
            } else {
                "NULL".to_string()
            }
        }
        Value::Bool(b) if sql_type == "BOOLEAN" => b.to_string().to_uppercase(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

/// Index column first, then data columns, each with its SQL type.
fn table_columns(dataset: &Dataset) -> Vec<(String, Column)> {
    dataset
        .index()
        .map(|i| (i.name.clone(), Column::new(i.keys.clone())))
        .into_iter()
        .chain(
            dataset
                .columns()
                .map(|(name, column)| (name.to_string(), column.clone())),
        )
        .collect()
}

impl TableStore for PostgresStore {
    fn table_exists(&mut self, name: &str) -> Result<bool> {
        let row: TableFound = sql_query(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1) AS found",
        )
        .bind::<Text, _>(name)
        .get_result(&mut self.conn)
        .map_err(map_diesel_error)?;
        Ok(row.found)
    }

    fn create_table_from_file(&mut self, path: &Path, name: &str) -> Result<()> {
        if self.table_exists(name)? {
            return Err(LendcleanError::TableExists(name.to_string()));
        }

        let (dataset, _) = Parser::new().parse_file(path)?;
        let columns = table_columns(&dataset);
        let types: Vec<&'static str> = columns.iter().map(|(_, c)| sql_type(c)).collect();

        let definition = columns
            .iter()
            .zip(&types)
            .map(|((col, _), ty)| format!("{} {}", quote_ident(col), ty))
            .collect::<Vec<_>>()
            .join(", ");
        let create = format!("CREATE TABLE {} ({})", quote_ident(name), definition);

        let rows: Vec<String> = (0..dataset.row_count())
            .map(|row| {
                let cells = columns
                    .iter()
                    .zip(&types)
                    .map(|((_, c), ty)| sql_literal(c.get(row).unwrap_or(&Value::Missing), ty))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", cells)
            })
            .collect();

        self.conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                sql_query(create).execute(conn)?;
                for batch in rows.chunks(INSERT_BATCH) {
                    let insert = format!(
                        "INSERT INTO {} VALUES {}",
                        quote_ident(name),
                        batch.join(", ")
                    );
                    sql_query(insert).execute(conn)?;
                }
                Ok(())
            })
            .map_err(map_diesel_error)?;

        tracing::debug!(table = name, rows = dataset.row_count(), "Inserted rows");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("postgres {}", self.url)
    }
}
