//! Metric query compilation.
//!
//! Composes the fragment builders into the per-user metric CTEs of an
//! analysis query:
//!
//! ```text
//! MetricSet → Size Window → Scan Range → Time Filters + Aggregates → SQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use metricsql::compile::{compile_metric_set, CompileInput, CompileOptions};
//! use metricsql::sql::Dialect;
//!
//! let input = CompileInput::new(metrics, period, "SELECT user_id, timestamp FROM exposures")
//!     .with_source("purchases", "SELECT user_id, timestamp, amount AS value FROM orders");
//! let options = CompileOptions::default().with_dialect(Dialect::BigQuery);
//! let output = compile_metric_set(&input, &options)?;
//! println!("{}", output.sql);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, trace};

use crate::builder::{
    exposure_start, max_hours_for_set, scan_end, scan_start, AggregateColumn, TimeFilter,
    WindowHours, DEFAULT_VALUE_COLUMN,
};
use crate::error::SqlGenError;
use crate::model::{MetricDefinition, MetricSet};
use crate::sql::{Dialect, SqlDialect};

const ACTIVATED_USERS: &str = "__activatedUsers";
const DENOMINATOR_USERS: &str = "__denominatorUsers";

/// Characters not allowed in generated CTE names.
static NON_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Generation error: {0}")]
    Generation(#[from] SqlGenError),

    #[error("No source query for metric: {0}")]
    MissingSource(String),

    #[error("Day granularity requires a date range query")]
    MissingDateRange,

    #[error("Invalid analysis period: start {start} is after end {end}")]
    InvalidPeriod {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,

    /// Column holding the per-row metric value.
    pub value_column: String,

    /// Column identifying a user in exposures and metric sources.
    pub user_id_column: String,

    /// Bound observations by each metric's conversion window. When false,
    /// every metric is observed up to the analysis end.
    pub use_conversion_windows: bool,

    /// Bucket per calendar day (`dr.day`) instead of per exact timestamp.
    pub day_granularity: bool,

    /// Evaluate denominator then numerator as sequential funnel stages: the
    /// numerator window opens when a user first converts on the denominator.
    pub is_funnel: bool,

    /// Resolved caps for percentile-capped metrics, by metric id.
    pub percentile_caps: HashMap<String, f64>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            value_column: DEFAULT_VALUE_COLUMN.to_string(),
            user_id_column: "user_id".to_string(),
            use_conversion_windows: true,
            day_granularity: false,
            is_funnel: false,
            percentile_caps: HashMap::new(),
        }
    }
}

impl CompileOptions {
    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_funnel(mut self, is_funnel: bool) -> Self {
        self.is_funnel = is_funnel;
        self
    }

    pub fn with_day_granularity(mut self, day_granularity: bool) -> Self {
        self.day_granularity = day_granularity;
        self
    }

    pub fn with_conversion_windows(mut self, use_conversion_windows: bool) -> Self {
        self.use_conversion_windows = use_conversion_windows;
        self
    }

    pub fn with_percentile_cap(mut self, metric_id: impl Into<String>, cap: f64) -> Self {
        self.percentile_caps.insert(metric_id.into(), cap);
        self
    }
}

// ============================================================================
// Input / Result Types
// ============================================================================

/// The exposure period of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Everything needed to compile one metric set.
#[derive(Debug, Clone)]
pub struct CompileInput {
    pub metrics: MetricSet,
    pub period: AnalysisPeriod,
    /// Query returning `<user id>, timestamp` per exposed user.
    pub exposure_sql: String,
    /// Query per metric id returning `<user id>, timestamp, value`.
    pub metric_sources: HashMap<String, String>,
    /// Query returning one `day` row per calendar day, for day granularity.
    pub date_range_sql: Option<String>,
}

impl CompileInput {
    pub fn new(metrics: MetricSet, period: AnalysisPeriod, exposure_sql: impl Into<String>) -> Self {
        Self {
            metrics,
            period,
            exposure_sql: exposure_sql.into(),
            metric_sources: HashMap::new(),
            date_range_sql: None,
        }
    }

    pub fn with_source(mut self, metric_id: impl Into<String>, sql: impl Into<String>) -> Self {
        self.metric_sources.insert(metric_id.into(), sql.into());
        self
    }

    pub fn with_date_range(mut self, sql: impl Into<String>) -> Self {
        self.date_range_sql = Some(sql.into());
        self
    }
}

/// Fragments produced for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMetric {
    pub metric_id: String,
    pub cte_name: String,
    pub time_filter: String,
    pub aggregate: String,
}

/// Result of compiling a metric set.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated SQL string.
    pub sql: String,

    /// The dialect used for generation.
    pub dialect: Dialect,

    /// Hours past the exposure period that metric rows are scanned.
    pub max_hours: WindowHours,

    /// First metric row timestamp scanned.
    pub scan_start: DateTime<Utc>,

    /// Last metric row timestamp scanned.
    pub scan_end: DateTime<Utc>,

    /// Per-metric fragments, numerator first.
    pub metrics: Vec<CompiledMetric>,
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile a metric set into per-user metric CTEs and a final SELECT.
///
/// The final SELECT returns one row per exposed (or activated) user with
/// `main_value` and, for ratio metrics, `denominator_value`.
pub fn compile_metric_set(
    input: &CompileInput,
    options: &CompileOptions,
) -> CompileResult<CompileOutput> {
    let period = input.period;
    if period.start > period.end {
        return Err(CompileError::InvalidPeriod {
            start: period.start,
            end: period.end,
        });
    }
    if options.day_granularity && input.date_range_sql.is_none() {
        return Err(CompileError::MissingDateRange);
    }
    let set = &input.metrics;
    set.validate()?;

    // Step 1: Size the scan
    let max_hours = max_hours_for_set(options.is_funnel, set)?;
    let all_metrics: Vec<&MetricDefinition> = set
        .ordered_metrics()
        .into_iter()
        .chain(set.activation.iter())
        .collect();
    let scan_start = scan_start(period.start, all_metrics.iter().copied())?;
    let scan_end = if options.use_conversion_windows {
        scan_end(period.end, max_hours)?.unwrap_or(period.end)
    } else {
        period.end
    };
    debug!(
        dialect = %options.dialect,
        ?max_hours,
        %scan_start,
        %scan_end,
        "sized metric scan range"
    );

    let ctx = Context {
        dialect: options.dialect,
        options,
        filter: TimeFilter::new(options.dialect, period.end),
    };

    // Step 2: Shared CTEs
    let mut ctes = vec![format!("__experiment AS (\n{}\n)", input.exposure_sql.trim())];
    if let Some(date_range) = input.date_range_sql.as_deref().filter(|_| options.day_granularity) {
        ctes.push(format!("__dateRange AS (\n{}\n)", date_range.trim()));
    }
    let mut seen = Vec::new();
    for metric in &all_metrics {
        if seen.contains(&metric.id) {
            continue;
        }
        seen.push(metric.id.clone());
        let source = input
            .metric_sources
            .get(&metric.id)
            .ok_or_else(|| CompileError::MissingSource(metric.id.clone()))?;
        ctes.push(ctx.metric_source_cte(metric, source, scan_start, scan_end));
    }

    // Step 3: Activation and funnel gates
    let exposure_base = match &set.activation {
        Some(activation) => {
            ctes.push(ctx.gate_cte(ACTIVATED_USERS, activation, "__experiment")?);
            ACTIVATED_USERS
        }
        None => "__experiment",
    };
    let numerator_base = match set.denominator.as_ref().filter(|_| options.is_funnel) {
        Some(denominator) => {
            ctes.push(ctx.gate_cte(DENOMINATOR_USERS, denominator, exposure_base)?);
            debug!(stage = %denominator.id, "gating numerator on funnel stage");
            DENOMINATOR_USERS
        }
        None => exposure_base,
    };

    // Step 4: Per-user metric CTEs
    let mut compiled = Vec::new();
    let mut user_metric_ctes: Vec<String> = Vec::new();
    let stages = std::iter::once((&set.numerator, numerator_base))
        .chain(set.denominator.iter().map(|d| (d, exposure_base)));
    for (metric, base) in stages {
        let (cte, fragments) = ctx.user_metric_cte(metric, base)?;
        trace!(metric = %metric.id, aggregate = %fragments.aggregate, "compiled metric");
        if !user_metric_ctes.contains(&fragments.cte_name) {
            user_metric_ctes.push(fragments.cte_name.clone());
            ctes.push(cte);
        }
        compiled.push(fragments);
    }

    // Step 5: Final SELECT
    let select = ctx.final_select(set, &compiled);
    let sql = format!("WITH\n{}\n{}", ctes.join(",\n"), select);

    Ok(CompileOutput {
        sql,
        dialect: options.dialect,
        max_hours,
        scan_start,
        scan_end,
        metrics: compiled,
    })
}

// ============================================================================
// Helper Functions
// ============================================================================

struct Context<'a> {
    dialect: Dialect,
    options: &'a CompileOptions,
    filter: TimeFilter,
}

impl Context<'_> {
    fn uid(&self) -> &str {
        &self.options.user_id_column
    }

    fn metric_source_cte(
        &self,
        metric: &MetricDefinition,
        source: &str,
        scan_start: DateTime<Utc>,
        scan_end: DateTime<Utc>,
    ) -> String {
        format!(
            "{name} AS (\nSELECT s.{uid} AS {uid}, s.timestamp AS timestamp, s.{val} AS value\n\
             FROM (\n{source}\n) s\n\
             WHERE s.timestamp >= {start} AND s.timestamp <= {end}\n)",
            name = source_cte_name(metric),
            uid = self.uid(),
            val = self.options.value_column,
            source = source.trim(),
            start = self.dialect.timestamp_literal(&scan_start),
            end = self.dialect.timestamp_literal(&scan_end),
        )
    }

    /// Delay-shifted exposures aliased as `d`.
    fn exposures(&self, metric: &MetricDefinition, base: &str) -> CompileResult<String> {
        Ok(format!(
            "(SELECT e.{uid} AS {uid}, {ts} AS timestamp FROM {base} e) d",
            uid = self.uid(),
            ts = exposure_start(self.dialect, "e.timestamp", metric)?,
            base = base,
        ))
    }

    /// Users of `base` who converted on `metric` inside its window, keyed by
    /// the first conversion time.
    fn gate_cte(&self, name: &str, metric: &MetricDefinition, base: &str) -> CompileResult<String> {
        let condition = if self.options.use_conversion_windows {
            self.filter.condition(metric, true, false)?
        } else {
            self.filter.analysis_end_condition(false)
        };
        Ok(format!(
            "{name} AS (\nSELECT d.{uid} AS {uid}, MIN(m.timestamp) AS timestamp\n\
             FROM {exposures}\n\
             JOIN {source} m ON (m.{uid} = d.{uid})\n\
             WHERE {condition}\n\
             GROUP BY d.{uid}\n)",
            uid = self.uid(),
            exposures = self.exposures(metric, base)?,
            source = source_cte_name(metric),
        ))
    }

    fn user_metric_cte(
        &self,
        metric: &MetricDefinition,
        exposure_base: &str,
    ) -> CompileResult<(String, CompiledMetric)> {
        let day = self.options.day_granularity;
        // Unbounded windows still need a per-day bound for the day buckets
        let time_filter = if self.options.use_conversion_windows
            && (metric.window.is_bounded() || !day)
        {
            self.filter.case_when("m.value", metric, true, day)?
        } else {
            self.filter.case_when_analysis_end("m.value", day)
        };

        let mut aggregate = AggregateColumn::new(self.dialect, metric)
            .value_column(&self.options.value_column);
        if let Some(cap) = self.options.percentile_caps.get(&metric.id) {
            aggregate = aggregate.percentile_cap(*cap);
        }
        let aggregate = aggregate.build()?;

        let uid = self.uid();
        let name = user_metric_cte_name(metric);
        let (inner_day, date_join, outer_day, group_day) = if day {
            (", dr.day AS day", "\nCROSS JOIN __dateRange dr", ", f.day AS day", ", f.day")
        } else {
            ("", "", "", "")
        };
        let having = if metric.ignore_nulls {
            format!("\nHAVING COUNT(f.{}) > 0", self.options.value_column)
        } else {
            String::new()
        };

        let cte = format!(
            "{name} AS (\nSELECT f.{uid} AS {uid}{outer_day}, {metric_id} AS metric_id, {aggregate} AS value\n\
             FROM (\n\
             SELECT d.{uid} AS {uid}{inner_day}, {time_filter} AS {val}\n\
             FROM {exposures}{date_join}\n\
             LEFT JOIN {source} m ON (m.{uid} = d.{uid})\n\
             ) f\n\
             GROUP BY f.{uid}{group_day}{having}\n)",
            metric_id = self.dialect.quote_string_literal(&metric.id),
            val = self.options.value_column,
            exposures = self.exposures(metric, exposure_base)?,
            source = source_cte_name(metric),
        );

        Ok((
            cte,
            CompiledMetric {
                metric_id: metric.id.clone(),
                cte_name: name,
                time_filter,
                aggregate,
            },
        ))
    }

    fn final_select(&self, set: &MetricSet, compiled: &[CompiledMetric]) -> String {
        let uid = self.uid();
        let day = self.options.day_granularity;
        let numerator = &compiled[0];
        let mut columns = vec![format!("u.{uid} AS {uid}")];
        if day {
            columns.push("u.day AS day".to_string());
        }
        columns.push("u.value AS main_value".to_string());

        let mut from = format!("FROM {} u", numerator.cte_name);
        if let (Some(_), Some(denominator)) = (&set.denominator, compiled.get(1)) {
            columns.push("dn.value AS denominator_value".to_string());
            let day_join = if day { " AND dn.day = u.day" } else { "" };
            from.push_str(&format!(
                "\nLEFT JOIN {} dn ON (dn.{uid} = u.{uid}{day_join})",
                denominator.cte_name
            ));
        }
        format!("SELECT\n  {}\n{}", columns.join(",\n  "), from)
    }
}

fn sanitize(id: &str) -> String {
    NON_IDENT.replace_all(id, "_").into_owned()
}

fn source_cte_name(metric: &MetricDefinition) -> String {
    format!("__metric_{}", sanitize(&metric.id))
}

fn user_metric_cte_name(metric: &MetricDefinition) -> String {
    format!("__userMetric_{}", sanitize(&metric.id))
}
