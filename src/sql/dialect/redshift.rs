//! Amazon Redshift SQL dialect.
//!
//! Redshift is PostgreSQL-based but differs in the primitives used here:
//! - Native `DATEADD(unit, n, expr)`
//! - Backslash is an escape character in string literals
//! - `LEAST` ignores NULL arguments, like Postgres

use chrono::{DateTime, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// Amazon Redshift SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Redshift;

impl SqlDialect for Redshift {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        helpers::date_add_dateadd(base, amount, unit)
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
