// src/model/metric.rs
use serde::{Deserialize, Serialize};

use crate::error::{SqlGenError, SqlGenResult};
use crate::sql::interval::DateUnit;

/// Metric kind; determines the default aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Converted / did not convert.
    Binomial,
    /// Numeric value summed per user.
    Count,
    /// Custom SQL aggregation.
    #[serde(alias = "sql")]
    Custom,
}

/// Whether a metric's observations are bounded after exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    #[default]
    #[serde(alias = "")]
    None,
    Conversion,
}

/// Conversion window and delay.
///
/// `window_value` is in `window_unit`, `delay_value` in `delay_unit`. A
/// negative delay starts the window before exposure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub window_type: WindowType,
    pub window_unit: DateUnit,
    pub window_value: f64,
    pub delay_unit: DateUnit,
    pub delay_value: f64,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            window_type: WindowType::None,
            window_unit: DateUnit::Hour,
            window_value: 0.0,
            delay_unit: DateUnit::Hour,
            delay_value: 0.0,
        }
    }
}

impl WindowSettings {
    /// A bounded conversion window with no delay.
    pub fn conversion(value: f64, unit: DateUnit) -> Self {
        Self {
            window_type: WindowType::Conversion,
            window_unit: unit,
            window_value: value,
            ..Self::default()
        }
    }

    /// An unbounded window.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, value: f64, unit: DateUnit) -> Self {
        self.delay_value = value;
        self.delay_unit = unit;
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.window_type == WindowType::Conversion
    }

    /// Window length in hours, `None` when unbounded.
    pub fn window_hours(&self) -> Option<f64> {
        self.is_bounded()
            .then(|| self.window_unit.to_hours(self.window_value))
    }

    /// Delay in hours; may be negative.
    pub fn delay_hours(&self) -> f64 {
        self.delay_unit.to_hours(self.delay_value)
    }

    pub fn validate(&self) -> SqlGenResult<()> {
        if !self.window_value.is_finite() || self.window_value < 0.0 {
            return Err(SqlGenError::invalid(format!(
                "window value must be a non-negative number, got {}",
                self.window_value
            )));
        }
        if !self.delay_value.is_finite() {
            return Err(SqlGenError::invalid(format!(
                "delay value must be finite, got {}",
                self.delay_value
            )));
        }
        Ok(())
    }
}

/// How per-user values are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CappingType {
    #[default]
    #[serde(alias = "")]
    None,
    Absolute,
    Percentile,
}

/// Capping rule. For percentile capping `value` is the percentile (0, 1];
/// the cap itself is resolved by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CappingSettings {
    #[serde(rename = "type")]
    pub capping_type: CappingType,
    pub value: f64,
}

impl CappingSettings {
    pub fn absolute(value: f64) -> Self {
        Self {
            capping_type: CappingType::Absolute,
            value,
        }
    }

    pub fn percentile(value: f64) -> Self {
        Self {
            capping_type: CappingType::Percentile,
            value,
        }
    }

    /// A zero value disables capping.
    pub fn is_active(&self) -> bool {
        self.capping_type != CappingType::None && self.value > 0.0
    }

    pub fn validate(&self) -> SqlGenResult<()> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(SqlGenError::invalid(format!(
                "capping value must be a non-negative number, got {}",
                self.value
            )));
        }
        if self.capping_type == CappingType::Percentile && self.value > 1.0 {
            return Err(SqlGenError::invalid(format!(
                "percentile capping value must be at most 1, got {}",
                self.value
            )));
        }
        Ok(())
    }
}

/// A dialect-neutral metric definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub kind: MetricKind,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub capping: CappingSettings,
    /// Custom aggregation; `COUNT(*)` refers to the per-row value.
    #[serde(default)]
    pub aggregation: Option<String>,
    /// Exclude rows without a conversion instead of counting them as zero.
    #[serde(default)]
    pub ignore_nulls: bool,
    /// Lower values are better.
    #[serde(default)]
    pub inverse: bool,
}

impl MetricDefinition {
    pub fn new(id: impl Into<String>, kind: MetricKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            window: WindowSettings::default(),
            capping: CappingSettings::default(),
            aggregation: None,
            ignore_nulls: false,
            inverse: false,
        }
    }

    pub fn binomial(id: impl Into<String>) -> Self {
        Self::new(id, MetricKind::Binomial)
    }

    pub fn count(id: impl Into<String>) -> Self {
        Self::new(id, MetricKind::Count)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_window(mut self, window: WindowSettings) -> Self {
        self.window = window;
        self
    }

    pub fn with_capping(mut self, capping: CappingSettings) -> Self {
        self.capping = capping;
        self
    }

    pub fn with_aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = Some(aggregation.into());
        self
    }

    pub fn with_ignore_nulls(mut self, ignore_nulls: bool) -> Self {
        self.ignore_nulls = ignore_nulls;
        self
    }

    pub fn with_inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    /// Total hours from exposure to the end of the window, `None` when unbounded.
    pub fn hours_to_convert(&self) -> Option<f64> {
        self.window
            .window_hours()
            .map(|window| window + self.window.delay_hours())
    }

    pub fn validate(&self) -> SqlGenResult<()> {
        self.window
            .validate()
            .and_then(|_| self.capping.validate())
            .map_err(|e| match e {
                SqlGenError::InvalidInput(msg) => {
                    SqlGenError::InvalidInput(format!("metric '{}': {}", self.id, msg))
                }
                other => other,
            })
    }
}

/// The metrics taking part in one computation.
///
/// Denominator and activation metrics extend the scanned range beyond the
/// numerator's own window.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSet {
    pub numerator: MetricDefinition,
    pub denominator: Option<MetricDefinition>,
    pub activation: Option<MetricDefinition>,
}

impl MetricSet {
    pub fn new(numerator: MetricDefinition) -> Self {
        Self {
            numerator,
            denominator: None,
            activation: None,
        }
    }

    pub fn with_denominator(mut self, denominator: MetricDefinition) -> Self {
        self.denominator = Some(denominator);
        self
    }

    pub fn with_activation(mut self, activation: MetricDefinition) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn is_ratio(&self) -> bool {
        self.denominator.is_some()
    }

    /// Denominator first, then numerator: the order funnel stages complete in.
    pub fn ordered_metrics(&self) -> Vec<&MetricDefinition> {
        self.denominator
            .iter()
            .chain(std::iter::once(&self.numerator))
            .collect()
    }

    pub fn validate(&self) -> SqlGenResult<()> {
        self.ordered_metrics()
            .into_iter()
            .chain(self.activation.iter())
            .try_for_each(MetricDefinition::validate)
    }
}
