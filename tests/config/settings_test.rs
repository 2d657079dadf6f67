//! Tests for TOML settings.

use chrono::{TimeZone, Utc};
use metricsql::config::{Settings, SettingsError};
use metricsql::model::{CappingType, MetricKind, WindowType};
use metricsql::sql::{DateUnit, Dialect};

const FULL: &str = r#"
[generation]
dialect = "snowflake"
value_column = "value"
user_id_column = "anonymous_id"
day_granularity = false
use_conversion_windows = true

[analysis]
start = "2024-01-01T00:00:00Z"
end = "2024-01-15T00:00:00Z"
exposure_sql = "SELECT anonymous_id, timestamp FROM exposures"

[metric_set]
numerator = "purchases"
denominator = "sessions"
activation = "signup"

[[metrics]]
id = "purchases"
name = "Purchases"
kind = "count"
aggregation = "COUNT(*)"
source = "SELECT anonymous_id, timestamp, 1 AS value FROM orders"

[metrics.window]
window_type = "conversion"
window_unit = "hours"
window_value = 72

[[metrics]]
id = "sessions"
kind = "count"
source = "SELECT anonymous_id, timestamp, 1 AS value FROM sessions"

[metrics.window]
window_type = "conversion"
window_unit = "days"
window_value = 1
delay_unit = "hours"
delay_value = -2.5

[metrics.capping]
type = "percentile"
value = 0.99

[[metrics]]
id = "signup"
kind = "binomial"
source = "SELECT anonymous_id, timestamp, 1 AS value FROM signups"
percentile_cap = 12.0
"#;

#[test]
fn test_parse_full_settings() {
    let settings: Settings = FULL.parse().unwrap();

    assert_eq!(settings.generation.dialect, Dialect::Snowflake);
    assert_eq!(settings.generation.user_id_column, "anonymous_id");
    assert_eq!(settings.metrics.len(), 3);

    let purchases = &settings.metric("purchases").unwrap().definition;
    assert_eq!(purchases.name, "Purchases");
    assert_eq!(purchases.kind, MetricKind::Count);
    assert_eq!(purchases.window.window_type, WindowType::Conversion);
    assert_eq!(purchases.window.window_value, 72.0);
    assert_eq!(purchases.aggregation.as_deref(), Some("COUNT(*)"));

    let sessions = &settings.metric("sessions").unwrap().definition;
    assert_eq!(sessions.window.window_unit, DateUnit::Day);
    assert_eq!(sessions.window.delay_value, -2.5);
    assert_eq!(sessions.capping.capping_type, CappingType::Percentile);
    assert_eq!(sessions.hours_to_convert(), Some(21.5));

    let signup = settings.metric("signup").unwrap();
    assert_eq!(signup.definition.kind, MetricKind::Binomial);
    assert!(!signup.definition.window.is_bounded());
}

#[test]
fn test_metric_set_resolution() {
    let settings: Settings = FULL.parse().unwrap();
    let set = settings.metric_set().unwrap();
    assert_eq!(set.numerator.id, "purchases");
    assert_eq!(set.denominator.as_ref().map(|m| m.id.as_str()), Some("sessions"));
    assert_eq!(set.activation.as_ref().map(|m| m.id.as_str()), Some("signup"));
}

#[test]
fn test_compile_options_from_generation() {
    let settings: Settings = FULL.parse().unwrap();
    let options = settings.compile_options();
    assert_eq!(options.dialect, Dialect::Snowflake);
    assert_eq!(options.user_id_column, "anonymous_id");
    assert_eq!(options.percentile_caps.get("signup"), Some(&12.0));
    assert!(options.use_conversion_windows);
}

#[test]
fn test_compile_input_from_analysis() {
    let settings: Settings = FULL.parse().unwrap();
    let input = settings.compile_input(settings.metric_set().unwrap()).unwrap();
    assert_eq!(input.period.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(input.period.end, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    assert_eq!(input.metric_sources.len(), 3);
    assert!(input.date_range_sql.is_none());
}

#[test]
fn test_env_vars_expanded_in_queries() {
    std::env::set_var("METRICSQL_SETTINGS_TEST_SCHEMA", "prod");
    let settings: Settings = r#"
[analysis]
start = "2024-01-01T00:00:00Z"
end = "2024-01-02T00:00:00Z"
exposure_sql = "SELECT user_id, timestamp FROM ${METRICSQL_SETTINGS_TEST_SCHEMA}.exposures"

[[metrics]]
id = "orders"
kind = "count"
source = "SELECT user_id, timestamp, total AS value FROM ${METRICSQL_SETTINGS_TEST_SCHEMA}.orders WHERE region = $1"
"#
    .parse()
    .unwrap();

    let input = settings.compile_input(settings.metric_set().unwrap()).unwrap();
    assert_eq!(input.exposure_sql, "SELECT user_id, timestamp FROM prod.exposures");
    assert_eq!(
        input.metric_sources["orders"],
        "SELECT user_id, timestamp, total AS value FROM prod.orders WHERE region = $1"
    );
    std::env::remove_var("METRICSQL_SETTINGS_TEST_SCHEMA");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_dialect_is_parse_error() {
    let result: Result<Settings, _> = "[generation]\ndialect = \"oracle\"\n".parse();
    let err = result.unwrap_err();
    assert!(matches!(err, SettingsError::ParseError(_)));
    assert!(err.to_string().contains("oracle"));
}

#[test]
fn test_malformed_window_unit_is_parse_error() {
    let toml = r#"
[[metrics]]
id = "m"
kind = "count"

[metrics.window]
window_type = "conversion"
window_unit = "fortnights"
window_value = 1
"#;
    let err = toml.parse::<Settings>().unwrap_err();
    assert!(matches!(err, SettingsError::ParseError(_)));
}

#[test]
fn test_duplicate_metric_ids() {
    let toml = r#"
[[metrics]]
id = "m"
kind = "count"

[[metrics]]
id = "m"
kind = "binomial"
"#;
    assert!(matches!(
        toml.parse::<Settings>(),
        Err(SettingsError::DuplicateMetric(id)) if id == "m"
    ));
}

#[test]
fn test_metric_set_references_unknown_metric() {
    let toml = r#"
[metric_set]
numerator = "missing"

[[metrics]]
id = "m"
kind = "count"
"#;
    assert!(matches!(
        toml.parse::<Settings>(),
        Err(SettingsError::MetricNotFound(id)) if id == "missing"
    ));
}

#[test]
fn test_invalid_metric_settings() {
    let toml = r#"
[[metrics]]
id = "m"
kind = "count"

[metrics.capping]
type = "percentile"
value = 2.0
"#;
    assert!(matches!(
        toml.parse::<Settings>(),
        Err(SettingsError::InvalidMetric(_))
    ));
}

#[test]
fn test_compile_input_requires_analysis() {
    let settings: Settings = "[[metrics]]\nid = \"m\"\nkind = \"count\"\n".parse().unwrap();
    assert!(matches!(
        settings.compile_input(settings.metric_set().unwrap()),
        Err(SettingsError::MissingAnalysis)
    ));
}

#[test]
fn test_file_not_found() {
    assert!(matches!(
        Settings::from_file("/nonexistent/metricsql.toml"),
        Err(SettingsError::FileNotFound(_))
    ));
}
