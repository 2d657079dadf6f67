//! Conversion window calculator.
//!
//! Computes how far past the exposure period metric rows must be scanned so
//! every exposed user's window can complete.
//!
//! Composition rules:
//!
//! - Funnel: stages complete one after another, so `window + delay` is summed
//!   in stage order.
//! - Ratio / standard: members run side by side, so the maximum is taken.
//! - Activation: always added on top, for either shape.

use chrono::{DateTime, Duration, Utc};

use crate::error::{SqlGenError, SqlGenResult};
use crate::model::{MetricDefinition, MetricSet};

/// Tolerance applied before rounding up, so `1/3 + 1/3 + 1/3` hours stays 1.
const HOURS_EPSILON: f64 = 1e-9;

/// Hours needed for every window to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowHours {
    Bounded(u64),
    /// At least one metric has no upper time bound.
    Unbounded,
}

impl WindowHours {
    /// Whole hours, `None` when unbounded.
    pub fn hours(&self) -> Option<u64> {
        match self {
            WindowHours::Bounded(h) => Some(*h),
            WindowHours::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, WindowHours::Unbounded)
    }
}

/// Running total while folding over metrics.
#[derive(Debug, Clone, Copy, Default)]
struct WindowAccumulator {
    hours: f64,
    unbounded: bool,
}

impl WindowAccumulator {
    /// Fold one metric's `window + delay` in, either summing or taking the max.
    fn absorb(self, metric_hours: Option<f64>, additive: bool) -> Self {
        match metric_hours {
            None => Self {
                unbounded: true,
                ..self
            },
            Some(h) if additive => Self {
                hours: self.hours + h,
                ..self
            },
            Some(h) => Self {
                hours: self.hours.max(h),
                ..self
            },
        }
    }

    fn finish(self) -> SqlGenResult<WindowHours> {
        if self.unbounded {
            return Ok(WindowHours::Unbounded);
        }
        let hours = (self.hours - HOURS_EPSILON).ceil().max(0.0);
        if !hours.is_finite() || hours >= u64::MAX as f64 {
            return Err(SqlGenError::invalid(format!(
                "window of {} hours is too large",
                self.hours
            )));
        }
        Ok(WindowHours::Bounded(hours as u64))
    }
}

/// Maximum hours after exposure needed to evaluate `metrics` (and the
/// optional activation metric).
///
/// `metrics` must be in stage order when `is_funnel` is set.
pub fn max_hours_to_convert(
    is_funnel: bool,
    metrics: &[MetricDefinition],
    activation: Option<&MetricDefinition>,
) -> SqlGenResult<WindowHours> {
    fold_hours(is_funnel, metrics.iter(), activation)
}

/// [`max_hours_to_convert`] over a [`MetricSet`], denominator first.
pub fn max_hours_for_set(is_funnel: bool, set: &MetricSet) -> SqlGenResult<WindowHours> {
    fold_hours(is_funnel, set.ordered_metrics(), set.activation.as_ref())
}

fn fold_hours<'a>(
    is_funnel: bool,
    metrics: impl IntoIterator<Item = &'a MetricDefinition>,
    activation: Option<&MetricDefinition>,
) -> SqlGenResult<WindowHours> {
    let metrics: Vec<&MetricDefinition> = metrics.into_iter().collect();
    if metrics.is_empty() {
        return Err(SqlGenError::invalid(
            "at least one metric is required to size the conversion window",
        ));
    }
    for metric in metrics.iter().copied().chain(activation) {
        metric.validate()?;
    }

    let acc = metrics
        .iter()
        .fold(WindowAccumulator::default(), |acc, metric| {
            acc.absorb(metric.hours_to_convert(), is_funnel)
        });
    let acc = match activation {
        Some(metric) => acc.absorb(metric.hours_to_convert(), true),
        None => acc,
    };
    acc.finish()
}

/// End of the metric scan: the analysis end pushed out by `hours`.
///
/// Returns `None` for unbounded windows, where observations run to the
/// analysis end itself.
pub fn scan_end(end: DateTime<Utc>, hours: WindowHours) -> SqlGenResult<Option<DateTime<Utc>>> {
    let Some(h) = hours.hours() else {
        return Ok(None);
    };
    let offset = i64::try_from(h)
        .ok()
        .and_then(Duration::try_hours)
        .ok_or_else(|| SqlGenError::invalid(format!("window of {} hours is too large", h)))?;
    end.checked_add_signed(offset)
        .map(Some)
        .ok_or_else(|| SqlGenError::invalid(format!("window of {} hours overflows {}", h, end)))
}

/// Start of the metric scan: the exposure start pulled back by the most
/// negative delay among `metrics`.
pub fn scan_start<'a>(
    start: DateTime<Utc>,
    metrics: impl IntoIterator<Item = &'a MetricDefinition>,
) -> SqlGenResult<DateTime<Utc>> {
    let min_delay = metrics
        .into_iter()
        .map(|m| m.window.delay_hours())
        .fold(0.0_f64, f64::min);
    if !min_delay.is_finite() {
        return Err(SqlGenError::invalid("delay must be finite"));
    }
    let minutes = (min_delay * 60.0).floor() as i64;
    Duration::try_minutes(minutes)
        .and_then(|offset| start.checked_add_signed(offset))
        .ok_or_else(|| SqlGenError::invalid(format!("delay of {} hours overflows {}", min_delay, start)))
}
