//! Tests for per-user aggregate columns.

use insta::assert_snapshot;
use metricsql::builder::{aggregate_metric_column, AggregateColumn};
use metricsql::error::SqlGenError;
use metricsql::model::{CappingSettings, MetricDefinition};
use metricsql::sql::Dialect;

// ============================================================================
// Formulas
// ============================================================================

#[test]
fn test_numeric_literal_formula() {
    let metric = MetricDefinition::binomial("reward").with_aggregation("33");
    let sql = aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap();
    assert_eq!(sql, "(CASE WHEN value IS NOT NULL THEN 33 ELSE 0 END)");
}

#[test]
fn test_decimal_literal_formula() {
    let metric = MetricDefinition::count("reward").with_aggregation(" 2.5 ");
    let sql = aggregate_metric_column(Dialect::Postgres, &metric, "value").unwrap();
    assert_eq!(sql, "(CASE WHEN value IS NOT NULL THEN 2.5 ELSE 0 END)");
}

#[test]
fn test_count_star_is_replaced() {
    let metric = MetricDefinition::count("smoothed").with_aggregation("COUNT(*) / (5 + COUNT(*))");
    let sql = aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap();
    assert_eq!(sql, "COUNT(value) / (5 + COUNT(value))");
}

#[test]
fn test_count_star_match_is_case_and_space_insensitive() {
    let metric = MetricDefinition::count("m").with_aggregation("count( * ) + Count(*)");
    let sql = aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap();
    assert_eq!(sql, "COUNT(value) + COUNT(value)");
}

#[test]
fn test_other_formulas_pass_through() {
    let metric = MetricDefinition::count("m").with_aggregation("SUM(value) / NULLIF(MAX(value), 0)");
    let sql = aggregate_metric_column(Dialect::Snowflake, &metric, "value").unwrap();
    assert_eq!(sql, "SUM(value) / NULLIF(MAX(value), 0)");
}

#[test]
fn test_malformed_formulas() {
    for formula in ["", "   ", "SUM(value", "COUNT(*))", "SUM(CASE WHEN x = 'a THEN 1 END)"] {
        let metric = MetricDefinition::count("m").with_aggregation(formula);
        let err = aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap_err();
        assert!(
            matches!(err, SqlGenError::MalformedAggregationFormula { .. }),
            "{:?} should be rejected, got {:?}",
            formula,
            err
        );
    }
}

#[test]
fn test_parens_inside_strings_are_ignored() {
    let metric = MetricDefinition::count("m")
        .with_aggregation("SUM(CASE WHEN value > 0 THEN 1 ELSE 0 END) || ')'");
    assert!(aggregate_metric_column(Dialect::Postgres, &metric, "value").is_ok());
}

#[test]
fn test_escaped_quotes_and_comments_pass_through() {
    for formula in [
        r"MAX(CASE WHEN name = 'O\'Brien' THEN 1 ELSE 0 END)",
        r#"COUNTIF(label = "it's")"#,
        "SUM(x) -- don't",
    ] {
        let metric = MetricDefinition::count("m").with_aggregation(formula);
        let sql = aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap();
        assert_eq!(sql, formula);
    }
}

#[test]
fn test_count_star_inside_identifier_is_kept() {
    let metric = MetricDefinition::count("m").with_aggregation("my_count(*) / COUNT(*)");
    assert_eq!(
        aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap(),
        "my_count(*) / COUNT(value)"
    );
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_default_sum() {
    let metric = MetricDefinition::count("revenue");
    assert_snapshot!(
        aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap(),
        @"SUM(COALESCE(value, 0))"
    );
}

#[test]
fn test_default_binomial() {
    let metric = MetricDefinition::binomial("converted");
    assert_snapshot!(
        aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap(),
        @"MAX(COALESCE(value, 0))"
    );
}

#[test]
fn test_custom_value_column() {
    let metric = MetricDefinition::count("revenue");
    assert_eq!(
        aggregate_metric_column(Dialect::DuckDb, &metric, "m.amount").unwrap(),
        "SUM(COALESCE(m.amount, 0))"
    );
}

// ============================================================================
// Capping
// ============================================================================

#[test]
fn test_absolute_cap_uses_least() {
    let metric = MetricDefinition::count("revenue").with_capping(CappingSettings::absolute(100.0));
    assert_snapshot!(
        aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap(),
        @"SUM(COALESCE(LEAST(value, 100), 0))"
    );
}

#[test]
fn test_absolute_cap_tsql_uses_case() {
    let metric = MetricDefinition::count("revenue").with_capping(CappingSettings::absolute(100.0));
    assert_snapshot!(
        aggregate_metric_column(Dialect::TSql, &metric, "value").unwrap(),
        @"SUM(COALESCE((CASE WHEN value > 100 THEN 100 ELSE value END), 0))"
    );
}

#[test]
fn test_percentile_cap_uses_resolved_value() {
    let metric =
        MetricDefinition::count("revenue").with_capping(CappingSettings::percentile(0.99));
    let sql = AggregateColumn::new(Dialect::Snowflake, &metric)
        .percentile_cap(250.5)
        .build()
        .unwrap();
    assert_eq!(sql, "SUM(COALESCE(LEAST(value, 250.5), 0))");
}

#[test]
fn test_percentile_cap_without_resolved_value_fails() {
    let metric =
        MetricDefinition::count("revenue").with_capping(CappingSettings::percentile(0.99));
    let err = aggregate_metric_column(Dialect::Snowflake, &metric, "value").unwrap_err();
    assert!(matches!(err, SqlGenError::InvalidInput(_)));
}

#[test]
fn test_cap_applies_inside_formula() {
    let metric = MetricDefinition::count("smoothed")
        .with_aggregation("COUNT(*) / (5 + COUNT(*))")
        .with_capping(CappingSettings::absolute(10.0));
    assert_eq!(
        aggregate_metric_column(Dialect::BigQuery, &metric, "value").unwrap(),
        "COUNT(LEAST(value, 10)) / (5 + COUNT(LEAST(value, 10)))"
    );
}

#[test]
fn test_binomial_and_literal_are_not_capped() {
    let binomial = MetricDefinition::binomial("converted").with_capping(CappingSettings::absolute(1.0));
    assert_eq!(
        aggregate_metric_column(Dialect::BigQuery, &binomial, "value").unwrap(),
        "MAX(COALESCE(value, 0))"
    );

    let literal = MetricDefinition::count("reward")
        .with_aggregation("33")
        .with_capping(CappingSettings::absolute(5.0));
    assert_eq!(
        aggregate_metric_column(Dialect::BigQuery, &literal, "value").unwrap(),
        "(CASE WHEN value IS NOT NULL THEN 33 ELSE 0 END)"
    );
}

#[test]
fn test_invalid_capping_settings_fail() {
    let negative = MetricDefinition::count("m").with_capping(CappingSettings::absolute(-1.0));
    assert!(matches!(
        aggregate_metric_column(Dialect::BigQuery, &negative, "value"),
        Err(SqlGenError::InvalidInput(_))
    ));

    let over_one = MetricDefinition::count("m").with_capping(CappingSettings::percentile(1.5));
    assert!(matches!(
        AggregateColumn::new(Dialect::BigQuery, &over_one).percentile_cap(10.0).build(),
        Err(SqlGenError::InvalidInput(_))
    ));
}
