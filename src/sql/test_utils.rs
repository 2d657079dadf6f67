//! Test utilities for SQL fragment validation.
//!
//! Fragments are scalar expressions, so they are wrapped in a `SELECT` and
//! parsed with sqlparser-rs to check they compose into a statement.

use sqlparser::dialect::{
    ClickHouseDialect, DuckDbDialect, GenericDialect, MsSqlDialect, MySqlDialect,
    PostgreSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Validates that a SQL statement is syntactically valid for the given dialect.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
        Dialect::Snowflake => Box::new(SnowflakeDialect {}),
        Dialect::ClickHouse => Box::new(ClickHouseDialect {}),
        Dialect::Redshift => Box::new(PostgreSqlDialect {}), // Redshift is Postgres-like
        Dialect::BigQuery | Dialect::Databricks | Dialect::Presto => Box::new(GenericDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {:?}: {}\nSQL: {}", dialect, e, sql))
}

/// Validates a scalar fragment by selecting it from a joined source.
pub fn validate_fragment(fragment: &str, dialect: Dialect) -> Result<(), String> {
    let sql = format!(
        "SELECT {} AS v FROM exposures d JOIN events m ON m.user_id = d.user_id",
        fragment
    );
    validate_sql(&sql, dialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT * FROM users", Dialect::Postgres).unwrap();
        validate_sql("SELECT * FROM users", Dialect::DuckDb).unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        let result = validate_sql("SELEC * FORM users", Dialect::Postgres);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_fragment() {
        validate_fragment("SUM(COALESCE(m.amount, 0))", Dialect::Postgres).unwrap();
    }
}
