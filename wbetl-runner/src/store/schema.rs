//! DuckDB schema for the fact table and the three derived tables.

pub const FACT_TABLE: &str = "economic_indicators";
pub const LATEST_TABLE: &str = "latest_indicators";
pub const YOY_TABLE: &str = "yoy_changes";
pub const SUMMARY_TABLE: &str = "country_summary";

/// Load order; the fact table always goes first.
pub const ALL_TABLES: [&str; 4] = [FACT_TABLE, LATEST_TABLE, YOY_TABLE, SUMMARY_TABLE];

/// DDL for all four tables. Idempotent.
pub fn create_tables() -> &'static str {
    r#"
CREATE SEQUENCE IF NOT EXISTS economic_indicators_id_seq START 1;

CREATE TABLE IF NOT EXISTS economic_indicators (
    id BIGINT PRIMARY KEY DEFAULT nextval('economic_indicators_id_seq'),
    country_code VARCHAR(3) NOT NULL,
    country_name VARCHAR NOT NULL,
    indicator_code VARCHAR NOT NULL,
    indicator_name VARCHAR NOT NULL,
    year INTEGER NOT NULL,
    value DECIMAL(20, 2),
    decade INTEGER NOT NULL,
    period VARCHAR NOT NULL,
    continent VARCHAR NOT NULL,
    extracted_at TIMESTAMP NOT NULL,
    loaded_at TIMESTAMP NOT NULL,
    UNIQUE (country_code, indicator_code, year)
);

CREATE TABLE IF NOT EXISTS latest_indicators (
    country_code VARCHAR(3) NOT NULL,
    indicator_code VARCHAR NOT NULL,
    country_name VARCHAR NOT NULL,
    indicator_name VARCHAR NOT NULL,
    year INTEGER NOT NULL,
    value DECIMAL(20, 2),
    decade INTEGER NOT NULL,
    period VARCHAR NOT NULL,
    continent VARCHAR NOT NULL,
    extracted_at TIMESTAMP NOT NULL,
    loaded_at TIMESTAMP NOT NULL,
    PRIMARY KEY (country_code, indicator_code)
);

CREATE TABLE IF NOT EXISTS yoy_changes (
    country_code VARCHAR(3) NOT NULL,
    indicator_code VARCHAR NOT NULL,
    year INTEGER NOT NULL,
    value_prev DECIMAL(20, 2) NOT NULL,
    value_curr DECIMAL(20, 2) NOT NULL,
    pct_change DECIMAL(38, 4) NOT NULL,
    loaded_at TIMESTAMP NOT NULL,
    PRIMARY KEY (country_code, indicator_code, year)
);

CREATE TABLE IF NOT EXISTS country_summary (
    country_code VARCHAR(3) NOT NULL PRIMARY KEY,
    country_name VARCHAR NOT NULL,
    total_indicators INTEGER NOT NULL,
    latest_gdp DECIMAL(20, 2),
    latest_population DECIMAL(20, 2),
    avg_gdp_growth DECIMAL(38, 4),
    loaded_at TIMESTAMP NOT NULL
);
"#
}

pub(crate) const UPSERT_FACT: &str = r#"
INSERT INTO economic_indicators (
    country_code, country_name, indicator_code, indicator_name,
    year, value, decade, period, continent, extracted_at, loaded_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (country_code, indicator_code, year) DO UPDATE SET
    country_name = excluded.country_name,
    indicator_name = excluded.indicator_name,
    value = excluded.value,
    decade = excluded.decade,
    period = excluded.period,
    continent = excluded.continent,
    extracted_at = excluded.extracted_at,
    loaded_at = excluded.loaded_at
"#;

pub(crate) const UPSERT_LATEST: &str = r#"
INSERT INTO latest_indicators (
    country_code, indicator_code, country_name, indicator_name,
    year, value, decade, period, continent, extracted_at, loaded_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (country_code, indicator_code) DO UPDATE SET
    country_name = excluded.country_name,
    indicator_name = excluded.indicator_name,
    year = excluded.year,
    value = excluded.value,
    decade = excluded.decade,
    period = excluded.period,
    continent = excluded.continent,
    extracted_at = excluded.extracted_at,
    loaded_at = excluded.loaded_at
"#;

pub(crate) const UPSERT_YOY: &str = r#"
INSERT INTO yoy_changes (
    country_code, indicator_code, year, value_prev, value_curr, pct_change, loaded_at
) VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (country_code, indicator_code, year) DO UPDATE SET
    value_prev = excluded.value_prev,
    value_curr = excluded.value_curr,
    pct_change = excluded.pct_change,
    loaded_at = excluded.loaded_at
"#;

pub(crate) const UPSERT_SUMMARY: &str = r#"
INSERT INTO country_summary (
    country_code, country_name, total_indicators,
    latest_gdp, latest_population, avg_gdp_growth, loaded_at
) VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (country_code) DO UPDATE SET
    country_name = excluded.country_name,
    total_indicators = excluded.total_indicators,
    latest_gdp = excluded.latest_gdp,
    latest_population = excluded.latest_population,
    avg_gdp_growth = excluded.avg_gdp_growth,
    loaded_at = excluded.loaded_at
"#;

pub(crate) const SELECT_FACTS: &str = r#"
SELECT country_code, country_name, indicator_code, indicator_name,
       year, CAST(value AS DOUBLE), decade, period, continent, extracted_at, loaded_at
FROM economic_indicators
ORDER BY country_code, indicator_code, year
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_creates_every_table() {
        let ddl = create_tables();
        for table in ALL_TABLES {
            assert!(
                ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "missing DDL for {table}"
            );
        }
    }

    #[test]
    fn upserts_target_natural_keys() {
        assert!(UPSERT_FACT.contains("ON CONFLICT (country_code, indicator_code, year)"));
        assert!(UPSERT_LATEST.contains("ON CONFLICT (country_code, indicator_code)"));
        assert!(UPSERT_YOY.contains("ON CONFLICT (country_code, indicator_code, year)"));
        assert!(UPSERT_SUMMARY.contains("ON CONFLICT (country_code)"));
    }
}
