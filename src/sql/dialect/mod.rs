//! SQL dialect primitives.
//!
//! Window filters and aggregate columns are assembled from dialect-neutral
//! pieces; only a handful of primitives differ between warehouses:
//!
//! - Date arithmetic: `DATETIME_ADD` (BigQuery), `DATEADD` (Snowflake/T-SQL/Redshift),
//!   `+ INTERVAL` (Postgres/DuckDB/Presto), `DATE_ADD` (MySQL), ...
//! - Date truncation: `date_trunc('day', x)` vs `date_trunc(x, DAY)` vs `CAST(x AS DATE)`
//! - Timestamp literals
//! - String-literal escaping: backslash-escaping vs doubled quotes
//!
//! # Usage
//!
//! ```ignore
//! use metricsql::dialect::{Dialect, SqlDialect};
//! use metricsql::sql::DateUnit;
//!
//! let dialect: Dialect = "bigquery".parse()?;
//! let end = dialect.date_add("d.timestamp", 72, DateUnit::Hour);
//! // DATETIME_ADD(d.timestamp, INTERVAL 72 HOUR)
//! ```
//!
//! The supported set is closed. Every primitive on [`Dialect`] matches
//! exhaustively over the variants, so adding a warehouse without
//! implementing a primitive does not compile.

mod bigquery;
mod clickhouse;
mod databricks;
mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod presto;
mod redshift;
mod snowflake;
mod tsql;

pub use bigquery::BigQuery;
pub use clickhouse::ClickHouse;
pub use databricks::Databricks;
pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use presto::Presto;
pub use redshift::Redshift;
pub use snowflake::Snowflake;
pub use tsql::TSql;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interval::{DateUnit, Interval};
use crate::error::SqlGenError;

/// SQL dialect trait - the primitives each warehouse renders differently.
///
/// The four core primitives have no default implementation.
pub trait SqlDialect: fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Offset `base` by a signed `amount` of `unit`.
    ///
    /// - BigQuery: `DATETIME_ADD(base, INTERVAL 72 HOUR)`
    /// - Postgres/DuckDB: `base + INTERVAL '72 hours'`
    /// - Snowflake/T-SQL/Redshift: `DATEADD(hour, 72, base)`
    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String;

    /// Truncate `expr` to the start of its `granularity` bucket.
    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String;

    /// Render a UTC timestamp as a SQL literal.
    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String;

    /// Escape raw text for use inside a single-quoted string literal.
    ///
    /// Returns the literal contents without surrounding quotes.
    fn escape_string_literal(&self, raw: &str) -> String;

    /// Clamp `expr` to at most `cap`, keeping NULL as NULL.
    ///
    /// `LEAST` ignores NULL arguments on some warehouses, which would turn a
    /// missing value into the cap; those dialects override this with a CASE.
    fn least(&self, expr: &str, cap: &str) -> String {
        format!("LEAST({}, {})", expr, cap)
    }

    /// Offset `base` by a number of hours, emitting `base` unchanged for a
    /// zero offset.
    fn date_add_hours(&self, base: &str, hours: f64) -> String {
        match Interval::from_hours(hours) {
            Some(interval) => self.date_add(base, interval.amount, interval.unit),
            None => base.to_string(),
        }
    }

    /// Escape and wrap raw text in single quotes.
    fn quote_string_literal(&self, raw: &str) -> String {
        format!("'{}'", self.escape_string_literal(raw))
    }
}

/// Supported warehouse dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dialect {
    #[default]
    BigQuery,
    Snowflake,
    Postgres,
    Redshift,
    MySql,
    TSql,
    Databricks,
    DuckDb,
    ClickHouse,
    Presto,
}

/// Exhaustive static dispatch from a [`Dialect`] variant to its implementation.
macro_rules! dispatch {
    ($dialect:expr, $d:ident => $body:expr) => {
        match $dialect {
            Dialect::BigQuery => {
                let $d = &BigQuery;
                $body
            }
            Dialect::Snowflake => {
                let $d = &Snowflake;
                $body
            }
            Dialect::Postgres => {
                let $d = &Postgres;
                $body
            }
            Dialect::Redshift => {
                let $d = &Redshift;
                $body
            }
            Dialect::MySql => {
                let $d = &MySql;
                $body
            }
            Dialect::TSql => {
                let $d = &TSql;
                $body
            }
            Dialect::Databricks => {
                let $d = &Databricks;
                $body
            }
            Dialect::DuckDb => {
                let $d = &DuckDb;
                $body
            }
            Dialect::ClickHouse => {
                let $d = &ClickHouse;
                $body
            }
            Dialect::Presto => {
                let $d = &Presto;
                $body
            }
        }
    };
}

impl Dialect {
    /// Every supported dialect, in declaration order.
    pub const ALL: [Dialect; 10] = [
        Dialect::BigQuery,
        Dialect::Snowflake,
        Dialect::Postgres,
        Dialect::Redshift,
        Dialect::MySql,
        Dialect::TSql,
        Dialect::Databricks,
        Dialect::DuckDb,
        Dialect::ClickHouse,
        Dialect::Presto,
    ];
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        dispatch!(self, d => d.name())
    }

    fn date_add(&self, base: &str, amount: i64, unit: DateUnit) -> String {
        dispatch!(self, d => d.date_add(base, amount, unit))
    }

    fn date_trunc(&self, expr: &str, granularity: DateUnit) -> String {
        dispatch!(self, d => d.date_trunc(expr, granularity))
    }

    fn timestamp_literal(&self, ts: &DateTime<Utc>) -> String {
        dispatch!(self, d => d.timestamp_literal(ts))
    }

    fn escape_string_literal(&self, raw: &str) -> String {
        dispatch!(self, d => d.escape_string_literal(raw))
    }

    fn least(&self, expr: &str, cap: &str) -> String {
        dispatch!(self, d => d.least(expr, cap))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = SqlGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bigquery" => Ok(Dialect::BigQuery),
            "snowflake" => Ok(Dialect::Snowflake),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "redshift" => Ok(Dialect::Redshift),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "tsql" | "mssql" | "sqlserver" => Ok(Dialect::TSql),
            "databricks" => Ok(Dialect::Databricks),
            "duckdb" => Ok(Dialect::DuckDb),
            "clickhouse" => Ok(Dialect::ClickHouse),
            "presto" | "trino" | "athena" => Ok(Dialect::Presto),
            _ => Err(SqlGenError::UnsupportedDialect(s.to_string())),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = SqlGenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.name().to_string()
    }
}
