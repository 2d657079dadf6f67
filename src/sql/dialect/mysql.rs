//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - `DATE_ADD` / `DATE_SUB` with `INTERVAL n UNIT`
//! - No `date_trunc`; day truncation is `DATE(expr)`, finer units go through `DATE_FORMAT`
//! - Backslash escapes in string literals

use chrono::{DateTime, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        helpers::date_add_keyword_interval("DATE_ADD", "DATE_SUB", base, amount, unit)
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        match granularity {
            DateUnit::Minute => format!("DATE_FORMAT({}, '%Y-%m-%d %H:%i:00')", expr),
            DateUnit::Hour => format!("DATE_FORMAT({}, '%Y-%m-%d %H:00:00')", expr),
            DateUnit::Day => format!("DATE({})", expr),
            // WEEKDAY() is 0 for Monday
            DateUnit::Week => format!("DATE_SUB(DATE({0}), INTERVAL WEEKDAY({0}) DAY)", expr),
        }
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        format!("TIMESTAMP('{}')", helpers::format_timestamp(ts))
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        helpers::escape_backslash(raw)
    }
}
