//! ClickHouse SQL dialect.
//!
//! ClickHouse features:
//! - `dateAdd(unit, n, expr)` / `dateSub(unit, n, expr)`
//! - `toStartOf*` truncation functions
//! - `toDateTime('...', 'UTC')` literals
//! - Backslash escapes in string literals

use chrono::{DateTime, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// ClickHouse SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct ClickHouse;

impl SqlDialect for ClickHouse {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        let func = if amount < 0 { "dateSub" } else { "dateAdd" };
        format!("{}({}, {}, {})", func, unit.name(), amount.unsigned_abs(), base)
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        let func = match granularity {
            DateUnit::Minute => "toStartOfMinute",
            DateUnit::Hour => "toStartOfHour",
            DateUnit::Day => "toStartOfDay",
            DateUnit::Week => "toStartOfWeek",
        };
        format!("{}({})", func, expr)
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        format!("toDateTime('{}', 'UTC')", helpers::format_timestamp(ts))
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        helpers::escape_backslash(raw)
    }
}
