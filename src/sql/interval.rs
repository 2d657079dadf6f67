//! Dialect-neutral date units and intervals.
//!
//! Window math is done in hours; this module turns a (possibly fractional,
//! possibly negative) number of hours into the `(amount, unit)` pair that the
//! dialect primitives render.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SqlGenError;

/// A calendar unit used for window lengths, delays and date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateUnit {
    Minute,
    #[default]
    Hour,
    Day,
    Week,
}

impl DateUnit {
    /// Uppercase SQL keyword (`HOUR`, `DAY`, ...).
    pub fn keyword(&self) -> &'static str {
        match self {
            DateUnit::Minute => "MINUTE",
            DateUnit::Hour => "HOUR",
            DateUnit::Day => "DAY",
            DateUnit::Week => "WEEK",
        }
    }

    /// Lowercase singular name (`hour`, `day`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            DateUnit::Minute => "minute",
            DateUnit::Hour => "hour",
            DateUnit::Day => "day",
            DateUnit::Week => "week",
        }
    }

    /// Length of one unit in hours.
    pub fn hours(&self) -> f64 {
        match self {
            DateUnit::Minute => 1.0 / 60.0,
            DateUnit::Hour => 1.0,
            DateUnit::Day => 24.0,
            DateUnit::Week => 168.0,
        }
    }

    /// Length of one unit in minutes.
    pub fn minutes(&self) -> i64 {
        match self {
            DateUnit::Minute => 1,
            DateUnit::Hour => 60,
            DateUnit::Day => 1_440,
            DateUnit::Week => 10_080,
        }
    }

    /// Convert `value` of this unit to hours.
    pub fn to_hours(&self, value: f64) -> f64 {
        match self {
            // Divide rather than multiply by 1/60 to keep whole-hour minute counts exact.
            DateUnit::Minute => value / 60.0,
            _ => value * self.hours(),
        }
    }
}

impl fmt::Display for DateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.name())
    }
}

impl FromStr for DateUnit {
    type Err = SqlGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" | "minutes" => Ok(DateUnit::Minute),
            "hour" | "hours" => Ok(DateUnit::Hour),
            "day" | "days" => Ok(DateUnit::Day),
            "week" | "weeks" => Ok(DateUnit::Week),
            other => Err(SqlGenError::invalid(format!(
                "malformed window unit '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for DateUnit {
    type Error = SqlGenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateUnit> for String {
    fn from(unit: DateUnit) -> Self {
        unit.to_string()
    }
}

/// A signed offset expressed in a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub amount: i64,
    pub unit: DateUnit,
}

impl Interval {
    pub fn new(amount: i64, unit: DateUnit) -> Self {
        Self { amount, unit }
    }

    /// Build an interval from a number of hours.
    ///
    /// Whole hours render as `HOUR`; anything else is rounded to the nearest
    /// minute. Returns `None` when the offset rounds to zero, in which case
    /// callers emit the base expression unchanged.
    pub fn from_hours(hours: f64) -> Option<Self> {
        if !hours.is_finite() {
            return None;
        }
        let minutes = (hours * 60.0).round() as i64;
        if minutes == 0 {
            None
        } else if minutes % 60 == 0 {
            Some(Self::new(minutes / 60, DateUnit::Hour))
        } else {
            Some(Self::new(minutes, DateUnit::Minute))
        }
    }

    /// Total length in minutes, keeping the sign.
    pub fn total_minutes(&self) -> i64 {
        self.amount.saturating_mul(self.unit.minutes())
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }
}
