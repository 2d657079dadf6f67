//! DuckDB SQL dialect.
//!
//! DuckDB follows PostgreSQL for the primitives used here:
//! - Interval arithmetic (`expr + INTERVAL '72 hours'`)
//! - `date_trunc('day', expr)`
//! - Doubled-quote escaping
//! - `LEAST` ignores NULL arguments

use chrono::{DateTime, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        helpers::date_add_interval_string(base, amount, unit)
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        helpers::date_trunc_quoted_unit(expr, granularity)
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        helpers::timestamp_literal_typed(ts)
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        helpers::escape_doubled_quote(raw)
    }

    fn least(&self, expr: &str, cap: &str) -> String {
        helpers::least_case(expr, cap)
    }
}
