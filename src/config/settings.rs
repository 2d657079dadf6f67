//! TOML-based configuration for metricsql.
//!
//! SQL strings support `${VAR}` environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [generation]
//! dialect = "bigquery"
//! value_column = "value"
//! use_conversion_windows = true
//!
//! [analysis]
//! start = "2024-01-01T00:00:00Z"
//! end = "2024-01-15T00:00:00Z"
//! exposure_sql = "SELECT user_id, timestamp FROM ${DATASET}.exposures"
//!
//! [metric_set]
//! numerator = "purchases"
//! denominator = "sessions"
//!
//! [[metrics]]
//! id = "purchases"
//! kind = "count"
//! source = "SELECT user_id, timestamp, amount AS value FROM ${DATASET}.orders"
//!
//! [metrics.window]
//! window_type = "conversion"
//! window_unit = "days"
//! window_value = 3
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::compile::{AnalysisPeriod, CompileInput, CompileOptions};
use crate::error::SqlGenError;
use crate::model::{MetricDefinition, MetricSet};
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Metric not found: {0}")]
    MetricNotFound(String),

    #[error("Duplicate metric id: {0}")]
    DuplicateMetric(String),

    #[error("No metrics defined")]
    NoMetrics,

    #[error("Missing [analysis] section")]
    MissingAnalysis,

    #[error("Invalid metric: {0}")]
    InvalidMetric(#[from] SqlGenError),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// SQL generation options.
    pub generation: GenerationSettings,

    /// Analysis period and exposure query.
    pub analysis: Option<AnalysisSettings>,

    /// Which metrics form the numerator, denominator and activation.
    pub metric_set: Option<MetricSetSettings>,

    /// Metric definitions.
    pub metrics: Vec<MetricConfig>,
}

/// SQL generation options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub dialect: Dialect,
    pub value_column: String,
    pub user_id_column: String,
    pub use_conversion_windows: bool,
    pub day_granularity: bool,
    pub funnel: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        let defaults = CompileOptions::default();
        Self {
            dialect: defaults.dialect,
            value_column: defaults.value_column,
            user_id_column: defaults.user_id_column,
            use_conversion_windows: defaults.use_conversion_windows,
            day_granularity: defaults.day_granularity,
            funnel: defaults.is_funnel,
        }
    }
}

/// Analysis period and the queries feeding it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisSettings {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Query returning one row per exposed user (supports `${VAR}` expansion).
    pub exposure_sql: String,
    /// Query returning one `day` per calendar day (supports `${VAR}` expansion).
    #[serde(default)]
    pub date_range_sql: Option<String>,
}

/// Metric ids making up the analyzed metric set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricSetSettings {
    pub numerator: String,
    #[serde(default)]
    pub denominator: Option<String>,
    #[serde(default)]
    pub activation: Option<String>,
}

/// A metric definition plus where its rows come from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricConfig {
    #[serde(flatten)]
    pub definition: MetricDefinition,

    /// Query returning `<user id>, timestamp, value` (supports `${VAR}` expansion).
    #[serde(default)]
    pub source: Option<String>,

    /// Resolved cap for percentile capping.
    #[serde(default)]
    pub percentile_cap: Option<f64>,
}

impl FromStr for Settings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        content.parse()
    }

    /// Check metric definitions and metric set references.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut ids = HashSet::new();
        for metric in &self.metrics {
            if !ids.insert(metric.definition.id.as_str()) {
                return Err(SettingsError::DuplicateMetric(metric.definition.id.clone()));
            }
            metric.definition.validate()?;
        }
        if let Some(set) = &self.metric_set {
            for id in std::iter::once(&set.numerator)
                .chain(set.denominator.iter())
                .chain(set.activation.iter())
            {
                self.metric(id)?;
            }
        }
        Ok(())
    }

    /// Get a metric by id.
    pub fn metric(&self, id: &str) -> Result<&MetricConfig, SettingsError> {
        self.metrics
            .iter()
            .find(|m| m.definition.id == id)
            .ok_or_else(|| SettingsError::MetricNotFound(id.to_string()))
    }

    /// The configured metric set, or the first metric on its own.
    pub fn metric_set(&self) -> Result<MetricSet, SettingsError> {
        let Some(ids) = &self.metric_set else {
            let first = self.metrics.first().ok_or(SettingsError::NoMetrics)?;
            return Ok(MetricSet::new(first.definition.clone()));
        };
        let mut set = MetricSet::new(self.metric(&ids.numerator)?.definition.clone());
        if let Some(id) = &ids.denominator {
            set = set.with_denominator(self.metric(id)?.definition.clone());
        }
        if let Some(id) = &ids.activation {
            set = set.with_activation(self.metric(id)?.definition.clone());
        }
        Ok(set)
    }

    /// Compile options from `[generation]` and resolved percentile caps.
    pub fn compile_options(&self) -> CompileOptions {
        let generation = &self.generation;
        let mut options = CompileOptions {
            dialect: generation.dialect,
            value_column: generation.value_column.clone(),
            user_id_column: generation.user_id_column.clone(),
            use_conversion_windows: generation.use_conversion_windows,
            day_granularity: generation.day_granularity,
            is_funnel: generation.funnel,
            ..CompileOptions::default()
        };
        for metric in &self.metrics {
            if let Some(cap) = metric.percentile_cap {
                options = options.with_percentile_cap(metric.definition.id.clone(), cap);
            }
        }
        options
    }

    /// Compile input for `set`, with environment variables expanded in every query.
    pub fn compile_input(&self, set: MetricSet) -> Result<CompileInput, SettingsError> {
        let analysis = self.analysis.as_ref().ok_or(SettingsError::MissingAnalysis)?;
        let period = AnalysisPeriod::new(analysis.start, analysis.end);
        let mut input = CompileInput::new(set, period, expand_env_vars(&analysis.exposure_sql)?);
        if let Some(date_range) = &analysis.date_range_sql {
            input = input.with_date_range(expand_env_vars(date_range)?);
        }
        for metric in &self.metrics {
            if let Some(source) = &metric.source {
                input = input.with_source(metric.definition.id.clone(), expand_env_vars(source)?);
            }
        }
        Ok(input)
    }
}

/// Expand `${VAR}` environment variables in a string.
///
/// Bare `$` is left alone so positional parameters (`$1`) and dollar
/// quoting survive.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }
            if !closed {
                // Unterminated, keep it verbatim
                result.push_str("${");
                result.push_str(&var_name);
                continue;
            }
            let value =
                env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
