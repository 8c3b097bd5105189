//! Destinations a finished dataset can be written to.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use polars::prelude::*;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions};
use sqlx::{Connection, Sqlite, SqliteConnection};

use crate::error::{PipelineError, Result};

#[async_trait]
pub trait DatasetSink: Send + Sync {
    /// Human readable destination, used in logs and errors.
    fn describe(&self) -> String;

    async fn write(&self, df: &DataFrame) -> Result<()>;
}

/// Writes the dataset to a CSV file, replacing any existing file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, df: &DataFrame) -> std::result::Result<(), PolarsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(&self.path)?;
        let mut frame = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)
    }
}

#[async_trait]
impl DatasetSink for CsvSink {
    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }

    async fn write(&self, df: &DataFrame) -> Result<()> {
        self.write_file(df)
            .map_err(|err| PipelineError::sink_write(self.describe(), err))?;
        tracing::info!(path = %self.path.display(), rows = df.height(), "Data saved to CSV");
        Ok(())
    }
}

/// Replaces a table in a SQLite database with the dataset.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: PathBuf,
    table: String,
}

impl SqliteSink {
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Opens (creating if needed) the database file.
    pub async fn connect(&self) -> std::result::Result<SqliteConnection, sqlx::Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);
        SqliteConnection::connect_with(&options).await
    }

    async fn replace_table(&self, df: &DataFrame) -> std::result::Result<(), sqlx::Error> {
        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await?;

        let table = quote_identifier(&self.table);
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&create_table_sql(&table, df))
            .execute(&mut *tx)
            .await?;

        if df.width() > 0 {
            let insert = insert_sql(&table, df);
            let columns = df.get_columns();
            for idx in 0..df.height() {
                let mut query = sqlx::query(&insert);
                for column in columns {
                    let value = column
                        .get(idx)
                        .map_err(|err| sqlx::Error::Encode(Box::new(err)))?;
                    query = bind_value(query, value)?;
                }
                query.execute(&mut *tx).await?;
            }
        }

        tx.commit().await?;
        conn.close().await?;
        Ok(())
    }
}

#[async_trait]
impl DatasetSink for SqliteSink {
    fn describe(&self) -> String {
        format!("SQLite table '{}' in {}", self.table, self.path.display())
    }

    async fn write(&self, df: &DataFrame) -> Result<()> {
        self.replace_table(df)
            .await
            .map_err(|err| PipelineError::sink_write(self.describe(), err))?;
        tracing::info!(
            path = %self.path.display(),
            table = %self.table,
            rows = df.height(),
            "Data saved to SQLite"
        );
        Ok(())
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Float32 | DataType::Float64 => "REAL",
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "INTEGER",
        _ => "TEXT",
    }
}

fn create_table_sql(table: &str, df: &DataFrame) -> String {
    let columns: Vec<String> = df
        .get_columns()
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier(column.name().as_str()),
                sql_type(column.dtype())
            )
        })
        .collect();

    if columns.is_empty() {
        // SQLite rejects tables without columns.
        format!("CREATE TABLE {table} (\"_empty\" TEXT)")
    } else {
        format!("CREATE TABLE {table} ({})", columns.join(", "))
    }
}

fn insert_sql(table: &str, df: &DataFrame) -> String {
    let names: Vec<String> = df
        .get_columns()
        .iter()
        .map(|column| quote_identifier(column.name().as_str()))
        .collect();
    let placeholders = vec!["?"; names.len()].join(", ");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        names.join(", ")
    )
}

/// SQLite integers are signed 64-bit; a `u64` above `i64::MAX` fails to encode.
fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: AnyValue<'_>,
) -> std::result::Result<Query<'q, Sqlite, SqliteArguments<'q>>, sqlx::Error> {
    let query = match value {
        AnyValue::Null => query.bind(None::<String>),
        AnyValue::Boolean(v) => query.bind(v),
        AnyValue::Int8(v) => query.bind(i64::from(v)),
        AnyValue::Int16(v) => query.bind(i64::from(v)),
        AnyValue::Int32(v) => query.bind(i64::from(v)),
        AnyValue::Int64(v) => query.bind(v),
        AnyValue::UInt8(v) => query.bind(i64::from(v)),
        AnyValue::UInt16(v) => query.bind(i64::from(v)),
        AnyValue::UInt32(v) => query.bind(i64::from(v)),
        AnyValue::UInt64(v) => {
            let v = i64::try_from(v).map_err(|err| sqlx::Error::Encode(Box::new(err)))?;
            query.bind(v)
        }
        AnyValue::Float32(v) => query.bind(f64::from(v)),
        AnyValue::Float64(v) => query.bind(v),
        AnyValue::String(v) => query.bind(v.to_string()),
        AnyValue::StringOwned(v) => query.bind(v.to_string()),
        other => query.bind(other.to_string()),
    };
    Ok(query)
}
