//! Databricks (Spark SQL) dialect.
//!
//! Databricks features:
//! - `timestampadd(UNIT, n, expr)` with a signed amount
//! - `date_trunc('day', expr)`
//! - Backslash escapes in string literals
//! - `least` skips NULL arguments, so capping uses a CASE

use chrono::{DateTime, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// Databricks SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Databricks;

impl SqlDialect for Databricks {
    fn name(&self) -> &'static str {
        "databricks"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        format!("timestampadd({}, {}, {})", unit.keyword(), amount, base)
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        helpers::date_trunc_quoted_unit(expr, granularity)
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        helpers::timestamp_literal_typed(ts)
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        helpers::escape_backslash(raw)
    }

    fn least(&self, expr: &str, cap: &str) -> String {
        helpers::least_case(expr, cap)
    }
}
