//! Loader behavior against a real DuckDB file.

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use wbetl_core::{latest, summary, yoy, IndicatorRecord, SummaryIndicators};
use wbetl_runner::store::schema::{ALL_TABLES, FACT_TABLE, LATEST_TABLE, SUMMARY_TABLE, YOY_TABLE};
use wbetl_runner::Store;

fn stamp(minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(10, minute, 0)
        .unwrap()
}

fn record(country: &str, indicator: &str, year: i32, value: f64) -> IndicatorRecord {
    IndicatorRecord {
        country_code: country.into(),
        country_name: format!("{country} name"),
        indicator_code: indicator.into(),
        indicator_name: format!("{indicator} name"),
        year,
        value: Some(value),
        decade: wbetl_core::decade(year),
        period: format!("{}s", wbetl_core::decade(year)),
        continent: "Asia".into(),
        extracted_at: stamp(0),
        loaded_at: None,
    }
}

fn series(country: &str, indicator: &str, years: std::ops::RangeInclusive<i32>) -> Vec<IndicatorRecord> {
    years
        .map(|y| record(country, indicator, y, 100.0 + f64::from(y - 2000)))
        .collect()
}

fn load_all(store: &mut Store, records: &[IndicatorRecord], at: NaiveDateTime) -> wbetl_runner::LoadSummary {
    let codes = SummaryIndicators::default();
    store.load(
        records,
        &latest(records),
        &yoy(records),
        &summary(records, &codes),
        at,
    )
}

fn open_temp() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("etl.duckdb")).unwrap();
    store.ensure_schema().unwrap();
    (dir, store)
}

#[test]
fn second_identical_load_updates_instead_of_inserting() {
    let (_dir, mut store) = open_temp();
    let mut records = series("IND", "NY.GDP.MKTP.CD", 2015..=2020);
    records.extend(series("USA", "SP.POP.TOTL", 2018..=2020));

    let first = load_all(&mut store, &records, stamp(1));
    assert!(first.failed_tables().is_empty());
    let fact = first.table(FACT_TABLE).unwrap();
    assert_eq!((fact.inserted, fact.updated), (9, 0));

    let counts: Vec<usize> = ALL_TABLES.iter().map(|t| store.count(t).unwrap()).collect();

    let second = load_all(&mut store, &records, stamp(2));
    let fact = second.table(FACT_TABLE).unwrap();
    assert_eq!((fact.inserted, fact.updated), (0, 9));
    assert_eq!(second.inserted(), 0);
    assert_eq!(second.updated(), first.inserted());

    let again: Vec<usize> = ALL_TABLES.iter().map(|t| store.count(t).unwrap()).collect();
    assert_eq!(counts, again);
    assert_eq!(again, vec![9, 2, 7, 2]);
}

#[test]
fn upsert_overwrites_value_and_stamps_load_time() {
    let (_dir, mut store) = open_temp();
    load_all(&mut store, &[record("IND", "SP.POP.TOTL", 2020, 1.0)], stamp(1));
    load_all(&mut store, &[record("IND", "SP.POP.TOTL", 2020, 2.5)], stamp(2));

    let (value, loaded_at): (f64, NaiveDateTime) = store
        .connection()
        .query_row(
            "SELECT CAST(value AS DOUBLE), loaded_at FROM economic_indicators \
             WHERE country_code = 'IND' AND year = 2020",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(value, 2.5);
    assert_eq!(loaded_at, stamp(2));
}

/// Derive from the whole stored fact table, the way a pipeline run does.
fn refresh_derived(store: &mut Store, at: NaiveDateTime) -> Vec<wbetl_runner::TableLoad> {
    let facts = store.facts().unwrap();
    let codes = SummaryIndicators::default();
    store.load_derived(&latest(&facts), &yoy(&facts), &summary(&facts, &codes), at)
}

#[test]
fn derived_tables_cover_the_whole_fact_table() {
    let (_dir, mut store) = open_temp();
    store.load_facts(&series("IND", "SP.POP.TOTL", 2018..=2020), stamp(1));
    refresh_derived(&mut store, stamp(1));

    // second run only sees USA; IND stays in the facts and in every cache
    store.load_facts(&series("USA", "SP.POP.TOTL", 2019..=2020), stamp(2));
    let tables = refresh_derived(&mut store, stamp(2));

    assert_eq!(store.count(FACT_TABLE).unwrap(), 5);
    assert_eq!(store.count(LATEST_TABLE).unwrap(), 2);
    assert_eq!(store.count(YOY_TABLE).unwrap(), 3);
    assert_eq!(store.count(SUMMARY_TABLE).unwrap(), 2);
    assert!(tables.iter().all(|t| t.committed() && t.removed == 0));

    let facts = store.facts().unwrap();
    let latest_years: Vec<(String, i32)> = {
        let mut stmt = store
            .connection()
            .prepare("SELECT country_code, year FROM latest_indicators ORDER BY country_code")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    };
    let expected: Vec<(String, i32)> = latest(&facts)
        .into_iter()
        .map(|l| (l.record.country_code, l.record.year))
        .collect();
    assert_eq!(latest_years, expected);
}

#[test]
fn derived_rows_for_deleted_series_are_pruned() {
    let (_dir, mut store) = open_temp();
    store.load_facts(&series("IND", "SP.POP.TOTL", 2018..=2020), stamp(1));
    refresh_derived(&mut store, stamp(1));

    store
        .connection()
        .execute("DELETE FROM economic_indicators WHERE country_code = 'IND'", [])
        .unwrap();
    store.load_facts(&series("USA", "SP.POP.TOTL", 2019..=2020), stamp(2));
    let tables = refresh_derived(&mut store, stamp(2));

    assert_eq!(store.count(LATEST_TABLE).unwrap(), 1);
    assert_eq!(store.count(YOY_TABLE).unwrap(), 1);
    assert_eq!(tables[0].removed, 1);
    assert_eq!(tables[1].removed, 2);
}

#[test]
fn reopening_the_file_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etl.duckdb");
    {
        let mut store = Store::open(&path).unwrap();
        store.ensure_schema().unwrap();
        load_all(&mut store, &series("BRA", "FP.CPI.TOTL.ZG", 2020..=2022), stamp(1));
    }
    let store = Store::open(&path).unwrap();
    store.ensure_schema().unwrap();
    assert_eq!(store.count(FACT_TABLE).unwrap(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Loading the same batch twice never changes any table's row count.
    #[test]
    fn repeated_load_is_idempotent(
        years in prop::collection::btree_set(2000i32..2024, 1..12),
        values in prop::collection::vec(-1.0e6f64..1.0e6, 12),
    ) {
        let records: Vec<IndicatorRecord> = years
            .iter()
            .zip(values.iter())
            .map(|(&y, &v)| record("IND", "NY.GDP.MKTP.CD", y, (v * 100.0).round() / 100.0))
            .collect();

        let mut store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();

        let first = load_all(&mut store, &records, stamp(1));
        let before: Vec<usize> = ALL_TABLES.iter().map(|t| store.count(t).unwrap()).collect();
        let second = load_all(&mut store, &records, stamp(2));
        let after: Vec<usize> = ALL_TABLES.iter().map(|t| store.count(t).unwrap()).collect();

        prop_assert_eq!(before, after);
        prop_assert_eq!(first.table(FACT_TABLE).unwrap().inserted, records.len());
        prop_assert_eq!(second.inserted(), 0);
        prop_assert!(second.failed_tables().is_empty());
    }
}
