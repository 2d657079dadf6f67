//! Snowflake SQL dialect.
//!
//! Snowflake features:
//! - `DATEADD(unit, n, expr)` with a signed amount
//! - `date_trunc('day', expr)`
//! - `TO_TIMESTAMP_NTZ('...')` literals
//! - Backslash escapes in single-quoted strings

use chrono::{DateTime, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// Snowflake SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        helpers::date_add_dateadd(base, amount, unit)
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        helpers::date_trunc_quoted_unit(expr, granularity)
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        format!("TO_TIMESTAMP_NTZ('{}')", helpers::format_timestamp(ts))
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        helpers::escape_backslash(raw)
    }
}
