//! Presto / Trino / Athena SQL dialect.
//!
//! Presto differences:
//! - Interval literals take the amount as a string: `INTERVAL '72' hour`
//! - Day-time intervals have no week unit, weeks are rendered as days
//! - ISO-8601 timestamp literals via `from_iso8601_timestamp`
//! - Doubled-quote escaping

use chrono::{DateTime, SecondsFormat, Utc};

use super::helpers;
use super::SqlDialect;
use crate::sql::interval::DateUnit;

/// Presto SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Presto;

impl SqlDialect for Presto {
    fn name(&self) -> &'static str {
        "presto"
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        let (amount, unit) = match unit {
            DateUnit::Week => (amount.saturating_mul(7), DateUnit::Day),
            other => (amount, other),
        };
        let sign = if amount < 0 { '-' } else { '+' };
        format!(
            "{} {} INTERVAL '{}' {}",
            base,
            sign,
            amount.unsigned_abs(),
            unit.name()
        )
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        helpers::date_trunc_quoted_unit(expr, granularity)
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        format!(
            "from_iso8601_timestamp('{}')",
            ts.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        helpers::escape_doubled_quote(raw)
    }
}
