//! Per-user aggregate columns.
//!
//! Decision order:
//!
//! 1. Numeric literal formula: fixed reward per converting user.
//! 2. Any other formula: `COUNT(*)` placeholders become `COUNT(<value column>)`.
//! 3. No formula: `MAX(COALESCE(..))` for binomial, `SUM(COALESCE(..))` otherwise.
//!
//! Capping wraps the value column before substitution.

use crate::error::{SqlGenError, SqlGenResult};
use crate::model::{format_number, AggregationFormula, CappingType, MetricDefinition, MetricKind};
use crate::sql::{Dialect, SqlDialect};

pub const DEFAULT_VALUE_COLUMN: &str = "value";

/// Builder for a metric's aggregate column.
#[derive(Debug, Clone)]
pub struct AggregateColumn<'a> {
    dialect: Dialect,
    metric: &'a MetricDefinition,
    value_column: &'a str,
    percentile_cap: Option<f64>,
}

impl<'a> AggregateColumn<'a> {
    pub fn new(dialect: Dialect, metric: &'a MetricDefinition) -> Self {
        Self {
            dialect,
            metric,
            value_column: DEFAULT_VALUE_COLUMN,
            percentile_cap: None,
        }
    }

    pub fn value_column(mut self, value_column: &'a str) -> Self {
        self.value_column = value_column;
        self
    }

    /// Resolved cap for percentile capping (e.g. the 99th percentile value).
    pub fn percentile_cap(mut self, cap: f64) -> Self {
        self.percentile_cap = Some(cap);
        self
    }

    pub fn build(&self) -> SqlGenResult<String> {
        self.metric.validate()?;

        let formula = self
            .metric
            .aggregation
            .as_deref()
            .map(AggregationFormula::classify)
            .transpose()?;

        match formula {
            // The reward does not depend on the value, so capping is moot.
            Some(literal @ AggregationFormula::NumericLiteral(_)) => {
                Ok(literal.render(self.value_column))
            }
            Some(expr @ AggregationFormula::RawExpression(_)) => {
                Ok(expr.render(&self.capped_column()?))
            }
            None => match self.metric.kind {
                MetricKind::Binomial => Ok(format!("MAX(COALESCE({}, 0))", self.value_column)),
                MetricKind::Count | MetricKind::Custom => {
                    Ok(format!("SUM(COALESCE({}, 0))", self.capped_column()?))
                }
            },
        }
    }

    fn capped_column(&self) -> SqlGenResult<String> {
        let capping = &self.metric.capping;
        if !capping.is_active() {
            return Ok(self.value_column.to_string());
        }
        let cap = match capping.capping_type {
            CappingType::Absolute => capping.value,
            CappingType::Percentile => self.percentile_cap.ok_or_else(|| {
                SqlGenError::invalid(format!(
                    "metric '{}' uses percentile capping but no cap value was resolved",
                    self.metric.id
                ))
            })?,
            CappingType::None => return Ok(self.value_column.to_string()),
        };
        if !cap.is_finite() || cap < 0.0 {
            return Err(SqlGenError::invalid(format!(
                "metric '{}': cap must be a non-negative number, got {}",
                self.metric.id, cap
            )));
        }
        Ok(self.dialect.least(self.value_column, &format_number(cap)))
    }
}

/// Aggregate column for `metric` over `value_column`.
///
/// Percentile-capped metrics need [`AggregateColumn::percentile_cap`].
pub fn aggregate_metric_column(
    dialect: Dialect,
    metric: &MetricDefinition,
    value_column: &str,
) -> SqlGenResult<String> {
    AggregateColumn::new(dialect, metric)
        .value_column(value_column)
        .build()
}
