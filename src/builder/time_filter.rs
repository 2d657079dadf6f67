//! Conversion-window time filters.
//!
//! Produces `(CASE WHEN <cond> THEN <value> ELSE NULL END)` where `<cond>`
//! keeps only observations (`m.timestamp`) made after exposure
//! (`d.timestamp`) and, for bounded windows, before the window closes.
//!
//! `d.timestamp` is the exposure time already shifted by the metric's delay;
//! see [`exposure_start`].

use chrono::{DateTime, Utc};

use crate::error::SqlGenResult;
use crate::model::MetricDefinition;
use crate::sql::{DateUnit, Dialect, SqlDialect};

/// Delay-adjusted exposure timestamp column.
pub const EXPOSURE_TIMESTAMP: &str = "d.timestamp";
/// Observation timestamp column.
pub const METRIC_TIMESTAMP: &str = "m.timestamp";
/// Calendar-day column of the surrounding date range.
pub const DAY_REFERENCE: &str = "dr.day";

/// Time filter builder for one dialect and analysis clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFilter {
    dialect: Dialect,
    now: DateTime<Utc>,
}

impl TimeFilter {
    /// `now` is the analysis end, used by [`TimeFilter::case_when_analysis_end`].
    pub fn new(dialect: Dialect, now: DateTime<Utc>) -> Self {
        Self { dialect, now }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Null out `value_expr` outside the metric's conversion window.
    ///
    /// The lower bound is always emitted. The upper bound (and the optional
    /// day cap) is only emitted when `use_conversion_window_end` is set and
    /// the window is bounded.
    pub fn case_when(
        &self,
        value_expr: &str,
        metric: &MetricDefinition,
        use_conversion_window_end: bool,
        cap_window_to_day_granularity: bool,
    ) -> SqlGenResult<String> {
        let condition =
            self.condition(metric, use_conversion_window_end, cap_window_to_day_granularity)?;
        Ok(render_case(&condition, value_expr))
    }

    /// The bare predicate behind [`TimeFilter::case_when`], for `WHERE` clauses.
    pub fn condition(
        &self,
        metric: &MetricDefinition,
        use_conversion_window_end: bool,
        cap_window_to_day_granularity: bool,
    ) -> SqlGenResult<String> {
        metric.validate()?;

        let mut conditions = vec![lower_bound()];
        if use_conversion_window_end {
            if let Some(window_hours) = metric.window.window_hours() {
                conditions.push(format!(
                    "{} <= {}",
                    METRIC_TIMESTAMP,
                    self.dialect.date_add_hours(EXPOSURE_TIMESTAMP, window_hours)
                ));
                if cap_window_to_day_granularity {
                    conditions.push(self.day_cap());
                }
            }
        }
        Ok(conditions.join(" AND "))
    }

    /// Null out `value_expr` for observations after the analysis end.
    ///
    /// Used when the analysis overrides conversion windows: every metric is
    /// observed from exposure up to `now`.
    pub fn case_when_analysis_end(
        &self,
        value_expr: &str,
        cap_window_to_day_granularity: bool,
    ) -> String {
        render_case(
            &self.analysis_end_condition(cap_window_to_day_granularity),
            value_expr,
        )
    }

    /// The bare predicate behind [`TimeFilter::case_when_analysis_end`].
    pub fn analysis_end_condition(&self, cap_window_to_day_granularity: bool) -> String {
        let mut conditions = vec![
            lower_bound(),
            format!(
                "{} <= {}",
                METRIC_TIMESTAMP,
                self.dialect.timestamp_literal(&self.now)
            ),
        ];
        if cap_window_to_day_granularity {
            conditions.push(self.day_cap());
        }
        conditions.join(" AND ")
    }

    fn day_cap(&self) -> String {
        format!(
            "{} <= {}",
            self.dialect.date_trunc(METRIC_TIMESTAMP, DateUnit::Day),
            DAY_REFERENCE
        )
    }
}

/// Free-function form of [`TimeFilter::case_when`].
pub fn case_when_time_filter(
    dialect: Dialect,
    value_expr: &str,
    metric: &MetricDefinition,
    use_conversion_window_end: bool,
    now: DateTime<Utc>,
    cap_window_to_day_granularity: bool,
) -> SqlGenResult<String> {
    TimeFilter::new(dialect, now).case_when(
        value_expr,
        metric,
        use_conversion_window_end,
        cap_window_to_day_granularity,
    )
}

/// Exposure timestamp shifted by the metric's delay, i.e. the value the
/// surrounding query exposes as `d.timestamp`.
pub fn exposure_start(
    dialect: Dialect,
    exposure_column: &str,
    metric: &MetricDefinition,
) -> SqlGenResult<String> {
    metric.validate()?;
    Ok(dialect.date_add_hours(exposure_column, metric.window.delay_hours()))
}

fn lower_bound() -> String {
    format!("{} >= {}", METRIC_TIMESTAMP, EXPOSURE_TIMESTAMP)
}

fn render_case(condition: &str, value_expr: &str) -> String {
    format!("(CASE WHEN {} THEN {} ELSE NULL END)", condition, value_expr)
}
