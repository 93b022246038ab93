//! Relational store — DuckDB connection, schema, and per-table upserts.
//!
//! A `Store` owns its connection; dropping it releases the connection on every
//! exit path. Each table loads in its own transaction: a table either commits
//! all of its rows or is rolled back to its prior state. A failed table does
//! not stop the remaining tables; the failure is reported in `LoadSummary`.
//!
//! The three derived tables are caches over the fact table. They are refreshed
//! wholesale from `Store::facts` after the fact table commits: rows not written
//! by the current load (older `loaded_at`) are deleted inside the same
//! transaction.

pub mod schema;

use chrono::NaiveDateTime;
use duckdb::{params, Connection, Statement};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use wbetl_core::{CountrySummary, IndicatorRecord, LatestIndicator, YoyChange};

use schema::{FACT_TABLE, LATEST_TABLE, SUMMARY_TABLE, YOY_TABLE};

/// Errors from the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open store at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("schema creation failed: {0}")]
    Schema(#[source] duckdb::Error),

    #[error("query on {table} failed: {source}")]
    Query {
        table: String,
        #[source]
        source: duckdb::Error,
    },
}

/// Outcome of loading one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableLoad {
    pub table: String,
    pub rows: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Stale rows deleted from a derived table.
    pub removed: usize,
    /// Set when the table's transaction was rolled back.
    pub error: Option<String>,
}

impl TableLoad {
    pub fn committed(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a full load, one entry per table in load order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub loaded_at: Option<NaiveDateTime>,
    pub tables: Vec<TableLoad>,
}

impl LoadSummary {
    pub fn inserted(&self) -> usize {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn updated(&self) -> usize {
        self.tables.iter().map(|t| t.updated).sum()
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| !t.committed())
            .map(|t| t.table.as_str())
            .collect()
    }

    pub fn table(&self, name: &str) -> Option<&TableLoad> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Fact rows committed by this load.
    pub fn facts_loaded(&self) -> usize {
        self.table(FACT_TABLE)
            .filter(|t| t.committed())
            .map_or(0, |t| t.rows)
    }
}

/// Handle on the DuckDB database.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Connect {
            path: path.display().to_string(),
            source,
        })?;
        info!("Connected to store at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Connect {
            path: ":memory:".into(),
            source,
        })?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the sequence and all four tables if absent.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(schema::create_tables())
            .map_err(StoreError::Schema)?;
        info!("Schema ready");
        Ok(())
    }

    pub fn count(&self, table: &str) -> Result<usize, StoreError> {
        count_rows(&self.conn, table).map_err(|source| StoreError::Query {
            table: table.to_string(),
            source,
        })
    }

    /// Upsert the fact table in one transaction. Existing keys are overwritten.
    pub fn load_facts(&mut self, records: &[IndicatorRecord], loaded_at: NaiveDateTime) -> TableLoad {
        self.load_table(FACT_TABLE, schema::UPSERT_FACT, records, loaded_at, false, |stmt, r| {
            stmt.execute(params![
                r.country_code,
                r.country_name,
                r.indicator_code,
                r.indicator_name,
                r.year,
                r.value,
                r.decade,
                r.period,
                r.continent,
                r.extracted_at,
                loaded_at,
            ])
        })
    }

    /// Every fact row currently stored, ordered by natural key.
    pub fn facts(&self) -> Result<Vec<IndicatorRecord>, StoreError> {
        let query = |conn: &Connection| -> duckdb::Result<Vec<IndicatorRecord>> {
            let mut stmt = conn.prepare(schema::SELECT_FACTS)?;
            let rows = stmt.query_map([], |row| {
                Ok(IndicatorRecord {
                    country_code: row.get(0)?,
                    country_name: row.get(1)?,
                    indicator_code: row.get(2)?,
                    indicator_name: row.get(3)?,
                    year: row.get(4)?,
                    value: row.get(5)?,
                    decade: row.get(6)?,
                    period: row.get(7)?,
                    continent: row.get(8)?,
                    extracted_at: row.get(9)?,
                    loaded_at: row.get(10)?,
                })
            })?;
            rows.collect()
        };
        query(&self.conn).map_err(|source| StoreError::Query {
            table: FACT_TABLE.to_string(),
            source,
        })
    }

    /// Replace the three derived tables, each in its own transaction.
    pub fn load_derived(
        &mut self,
        latest: &[LatestIndicator],
        yoy: &[YoyChange],
        summary: &[CountrySummary],
        loaded_at: NaiveDateTime,
    ) -> Vec<TableLoad> {
        vec![
            self.load_table(LATEST_TABLE, schema::UPSERT_LATEST, latest, loaded_at, true, |stmt, l| {
                let r = &l.record;
                stmt.execute(params![
                    r.country_code,
                    r.indicator_code,
                    r.country_name,
                    r.indicator_name,
                    r.year,
                    r.value,
                    r.decade,
                    r.period,
                    r.continent,
                    r.extracted_at,
                    loaded_at,
                ])
            }),
            self.load_table(YOY_TABLE, schema::UPSERT_YOY, yoy, loaded_at, true, |stmt, y| {
                stmt.execute(params![
                    y.country_code,
                    y.indicator_code,
                    y.year,
                    y.value_prev,
                    y.value_curr,
                    y.pct_change,
                    loaded_at,
                ])
            }),
            self.load_table(SUMMARY_TABLE, schema::UPSERT_SUMMARY, summary, loaded_at, true, |stmt, s| {
                stmt.execute(params![
                    s.country_code,
                    s.country_name,
                    s.total_indicators as i64,
                    s.latest_gdp,
                    s.latest_population,
                    s.avg_gdp_growth,
                    loaded_at,
                ])
            }),
        ]
    }

    /// Upsert every table, each in its own transaction, fact table first.
    ///
    /// `loaded_at` is the load phase start; it stamps every written row.
    pub fn load(
        &mut self,
        records: &[IndicatorRecord],
        latest: &[LatestIndicator],
        yoy: &[YoyChange],
        summary: &[CountrySummary],
        loaded_at: NaiveDateTime,
    ) -> LoadSummary {
        let mut tables = vec![self.load_facts(records, loaded_at)];
        tables.extend(self.load_derived(latest, yoy, summary, loaded_at));
        LoadSummary {
            loaded_at: Some(loaded_at),
            tables,
        }
    }

    fn load_table<T, F>(
        &mut self,
        table: &str,
        upsert_sql: &str,
        rows: &[T],
        loaded_at: NaiveDateTime,
        prune_stale: bool,
        bind: F,
    ) -> TableLoad
    where
        F: FnMut(&mut Statement<'_>, &T) -> duckdb::Result<usize>,
    {
        match upsert_in_transaction(&mut self.conn, table, upsert_sql, rows, loaded_at, prune_stale, bind) {
            Ok(load) => {
                info!(
                    "Loaded {table}: {} rows ({} inserted, {} updated, {} stale removed)",
                    load.rows, load.inserted, load.updated, load.removed
                );
                load
            }
            Err(e) => {
                error!("Loading {table} failed, rolled back: {e}");
                TableLoad {
                    table: table.to_string(),
                    rows: rows.len(),
                    error: Some(e.to_string()),
                    ..TableLoad::default()
                }
            }
        }
    }
}

fn count_rows(conn: &Connection, table: &str) -> duckdb::Result<usize> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(n as usize)
}

/// Insert-or-update `rows`, counting new keys by the row-count delta.
/// Dropping the transaction without commit rolls it back.
fn upsert_in_transaction<T, F>(
    conn: &mut Connection,
    table: &str,
    upsert_sql: &str,
    rows: &[T],
    loaded_at: NaiveDateTime,
    prune_stale: bool,
    mut bind: F,
) -> duckdb::Result<TableLoad>
where
    F: FnMut(&mut Statement<'_>, &T) -> duckdb::Result<usize>,
{
    let tx = conn.transaction()?;
    let before = count_rows(&tx, table)?;

    {
        let mut stmt = tx.prepare(upsert_sql)?;
        for row in rows {
            bind(&mut stmt, row)?;
        }
    }

    let after = count_rows(&tx, table)?;
    let removed = if prune_stale {
        tx.execute(
            &format!("DELETE FROM {table} WHERE loaded_at <> ?"),
            params![loaded_at],
        )?
    } else {
        0
    };

    tx.commit()?;

    let inserted = after.saturating_sub(before);
    Ok(TableLoad {
        table: table.to_string(),
        rows: rows.len(),
        inserted,
        updated: rows.len().saturating_sub(inserted),
        removed,
        error: None,
    })
}
