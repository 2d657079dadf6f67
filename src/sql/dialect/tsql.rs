//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL differences from ANSI:
//! - `DATEADD(unit, n, expr)` with a signed amount
//! - Day truncation is `CAST(expr AS DATE)`; other units use `DATETRUNC` (2022+)
//! - No `DATE`/`TIMESTAMP` keyword on literals
//! - No portable `LEAST` before 2022, so capping uses a CASE

use chrono::{DateTime, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        helpers::date_add_dateadd(base, amount, unit)
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        match granularity {
            DateUnit::Day => format!("CAST({} AS DATE)", expr),
            other => format!("DATETRUNC({}, {})", other.name(), expr),
        }
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        format!("'{}'", helpers::format_timestamp(ts))
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        helpers::escape_doubled_quote(raw)
    }

    fn least(&self, expr: &str, cap: &str) -> String {
        helpers::least_case(expr, cap)
    }
}
