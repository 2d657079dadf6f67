//! Tests for dialect primitives.

use chrono::{TimeZone, Utc};
use insta::assert_snapshot;
use metricsql::error::SqlGenError;
use metricsql::sql::{DateUnit, Dialect, SqlDialect};

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_names_and_aliases() {
    let cases = [
        ("bigquery", Dialect::BigQuery),
        ("Snowflake", Dialect::Snowflake),
        ("postgresql", Dialect::Postgres),
        ("redshift", Dialect::Redshift),
        ("MySQL", Dialect::MySql),
        ("mssql", Dialect::TSql),
        ("databricks", Dialect::Databricks),
        ("duckdb", Dialect::DuckDb),
        ("clickhouse", Dialect::ClickHouse),
        ("athena", Dialect::Presto),
        ("trino", Dialect::Presto),
    ];
    for (name, expected) in cases {
        assert_eq!(name.parse::<Dialect>().unwrap(), expected, "{}", name);
    }
}

#[test]
fn test_unknown_dialect_fails() {
    let err = "oracle".parse::<Dialect>().unwrap_err();
    assert_eq!(err, SqlGenError::UnsupportedDialect("oracle".to_string()));
    assert!("".parse::<Dialect>().is_err());
}

#[test]
fn test_display_round_trips() {
    for dialect in Dialect::ALL {
        assert_eq!(dialect.to_string().parse::<Dialect>().unwrap(), dialect);
    }
}

// ============================================================================
// String escaping
// ============================================================================

#[test]
fn test_escape_backslash_dialects() {
    for dialect in [
        Dialect::BigQuery,
        Dialect::Snowflake,
        Dialect::MySql,
        Dialect::Databricks,
        Dialect::ClickHouse,
        Dialect::Redshift,
    ] {
        assert_eq!(
            dialect.escape_string_literal(r"test\'string"),
            r"test\\\'string",
            "{}",
            dialect
        );
    }
}

#[test]
fn test_escape_doubled_quote_dialects() {
    for dialect in [Dialect::Postgres, Dialect::TSql, Dialect::DuckDb, Dialect::Presto] {
        assert_eq!(
            dialect.escape_string_literal("it's"),
            "it''s",
            "{}",
            dialect
        );
    }
}

#[test]
fn test_quote_string_literal() {
    assert_snapshot!(Dialect::BigQuery.quote_string_literal("o'brien"), @r"'o\'brien'");
    assert_snapshot!(Dialect::Postgres.quote_string_literal("o'brien"), @"'o''brien'");
}

// ============================================================================
// Date arithmetic
// ============================================================================

#[test]
fn test_date_add_negative_amounts() {
    assert_eq!(
        Dialect::BigQuery.date_add("t", -4, DateUnit::Hour),
        "DATETIME_SUB(t, INTERVAL 4 HOUR)"
    );
    assert_eq!(
        Dialect::Postgres.date_add("t", -4, DateUnit::Hour),
        "t - INTERVAL '4 hours'"
    );
    assert_eq!(
        Dialect::Snowflake.date_add("t", -4, DateUnit::Hour),
        "DATEADD(hour, -4, t)"
    );
    assert_eq!(
        Dialect::ClickHouse.date_add("t", -4, DateUnit::Hour),
        "dateSub(hour, 4, t)"
    );
    assert_eq!(
        Dialect::Presto.date_add("t", -4, DateUnit::Hour),
        "t - INTERVAL '4' hour"
    );
}

#[test]
fn test_presto_weeks_become_days() {
    assert_snapshot!(Dialect::Presto.date_add("t", 2, DateUnit::Week), @"t + INTERVAL '14' day");
}

#[test]
fn test_date_add_hours_zero_is_identity() {
    for dialect in Dialect::ALL {
        assert_eq!(dialect.date_add_hours("d.timestamp", 0.0), "d.timestamp");
    }
}

#[test]
fn test_date_add_hours_fraction() {
    assert_eq!(
        Dialect::MySql.date_add_hours("t", 1.5),
        "DATE_ADD(t, INTERVAL 90 MINUTE)"
    );
}

#[test]
fn test_date_trunc_week() {
    assert_snapshot!(Dialect::Snowflake.date_trunc("t", DateUnit::Week), @"date_trunc('week', t)");
    assert_snapshot!(
        Dialect::MySql.date_trunc("t", DateUnit::Week),
        @"DATE_SUB(DATE(t), INTERVAL WEEKDAY(t) DAY)"
    );
    assert_snapshot!(Dialect::TSql.date_trunc("t", DateUnit::Week), @"DATETRUNC(week, t)");
}

// ============================================================================
// Timestamp literals
// ============================================================================

#[test]
fn test_timestamp_literals() {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
    let cases = [
        (Dialect::BigQuery, r#"DATETIME("2024-03-01 12:30:05")"#),
        (Dialect::Snowflake, "TO_TIMESTAMP_NTZ('2024-03-01 12:30:05')"),
        (Dialect::Postgres, "TIMESTAMP '2024-03-01 12:30:05'"),
        (Dialect::MySql, "TIMESTAMP('2024-03-01 12:30:05')"),
        (Dialect::TSql, "'2024-03-01 12:30:05'"),
        (Dialect::ClickHouse, "toDateTime('2024-03-01 12:30:05', 'UTC')"),
        (Dialect::Presto, "from_iso8601_timestamp('2024-03-01T12:30:05Z')"),
    ];
    for (dialect, expected) in cases {
        assert_eq!(dialect.timestamp_literal(&ts), expected, "{}", dialect);
    }
}

// ============================================================================
// Capping
// ============================================================================

#[test]
fn test_least_null_safety() {
    assert_eq!(Dialect::BigQuery.least("v", "10"), "LEAST(v, 10)");
    assert_eq!(Dialect::Snowflake.least("v", "10"), "LEAST(v, 10)");
    for dialect in [
        Dialect::Postgres,
        Dialect::Redshift,
        Dialect::DuckDb,
        Dialect::Databricks,
        Dialect::TSql,
    ] {
        assert_eq!(
            dialect.least("v", "10"),
            "(CASE WHEN v > 10 THEN 10 ELSE v END)",
            "{}",
            dialect
        );
    }
}

#[test]
fn test_escaping_is_single_pass() {
    let once = Dialect::BigQuery.escape_string_literal(r"test\'string");
    let twice = Dialect::BigQuery.escape_string_literal(&once);
    assert_ne!(once, twice);
    assert_eq!(twice, r"test\\\\\\\'string");
}
