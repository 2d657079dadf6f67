//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use chrono::{DateTime, Utc};

use super::super::interval::DateUnit;

// =============================================================================
// Date Arithmetic
// =============================================================================

/// `base + INTERVAL 'n units'` / `base - INTERVAL 'n units'`.
/// Used by: Postgres, DuckDB
pub fn date_add_interval_string(base: &str, amount: i64, unit: DateUnit) -> String {
    let sign = if amount < 0 { '-' } else { '+' };
    format!("{} {} INTERVAL '{} {}'", base, sign, amount.unsigned_abs(), unit)
}

/// `DATEADD(unit, n, base)` with a signed amount.
/// Used by: Snowflake, T-SQL, Redshift
pub fn date_add_dateadd(base: &str, amount: i64, unit: DateUnit) -> String {
    format!("DATEADD({}, {}, {})", unit.name(), amount, base)
}

/// `<add>(base, INTERVAL n UNIT)` or `<sub>(base, INTERVAL n UNIT)` by sign.
/// Used by: BigQuery (`DATETIME_ADD`), MySQL (`DATE_ADD`)
pub fn date_add_keyword_interval(
    add_fn: &str,
    sub_fn: &str,
    base: &str,
    amount: i64,
    unit: DateUnit,
) -> String {
    let func = if amount < 0 { sub_fn } else { add_fn };
    format!(
        "{}({}, INTERVAL {} {})",
        func,
        base,
        amount.unsigned_abs(),
        unit.keyword()
    )
}

// =============================================================================
// Date Truncation
// =============================================================================

/// `date_trunc('unit', expr)`.
/// Used by: Postgres, Redshift, DuckDB, Snowflake, Databricks, Presto
pub fn date_trunc_quoted_unit(expr: &str, granularity: DateUnit) -> String {
    format!("date_trunc('{}', {})", granularity.name(), expr)
}

// =============================================================================
// Timestamp Literals
// =============================================================================

/// `YYYY-MM-DD HH:MM:SS`, the body shared by most timestamp literals.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `TIMESTAMP 'YYYY-MM-DD HH:MM:SS'` (ANSI typed literal).
/// Used by: Postgres, Redshift, DuckDB, Databricks
pub fn timestamp_literal_typed(ts: &DateTime<Utc>) -> String {
    format!("TIMESTAMP '{}'", format_timestamp(ts))
}

// =============================================================================
// String Escaping
// =============================================================================

/// Backslash-escaping: `\` → `\\`, then `'` → `\'`.
///
/// Backslashes go first; escaping quotes first would escape the backslash
/// that was just inserted.
/// Used by: BigQuery, Snowflake, MySQL, Databricks, ClickHouse, Redshift
pub fn escape_backslash(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Standard SQL escaping: `'` → `''`. Backslash has no special meaning.
/// Used by: Postgres, DuckDB, T-SQL, Presto
pub fn escape_doubled_quote(raw: &str) -> String {
    raw.replace('\'', "''")
}

// =============================================================================
// Clamping
// =============================================================================

/// NULL-preserving clamp for warehouses whose `LEAST` skips NULL arguments.
/// Used by: Postgres, Redshift, DuckDB, Databricks, T-SQL
pub fn least_case(expr: &str, cap: &str) -> String {
    format!("(CASE WHEN {expr} > {cap} THEN {cap} ELSE {expr} END)")
}
