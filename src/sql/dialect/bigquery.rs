//! BigQuery SQL dialect.
//!
//! BigQuery features:
//! - `DATETIME_ADD` / `DATETIME_SUB` with `INTERVAL n UNIT`
//! - `date_trunc(expr, DAY)` (granularity second, unquoted)
//! - `DATETIME("...")` timestamp literals
//! - Backslash escapes in string literals

use chrono::{DateTime, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// BigQuery SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        helpers::date_add_keyword_interval("DATETIME_ADD", "DATETIME_SUB", base, amount, unit)
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        format!("date_trunc({}, {})", expr, granularity.keyword())
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        format!("DATETIME(\"{}\")", helpers::format_timestamp(ts))
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        helpers::escape_backslash(raw)
    }
}
