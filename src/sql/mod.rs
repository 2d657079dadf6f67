//! SQL generation primitives.
//!
//! - [`dialect`] - per-warehouse date arithmetic, truncation, literals and escaping
//! - [`interval`] - hour offsets converted to `(amount, unit)` intervals

pub mod dialect;
pub mod interval;

#[cfg(test)]
pub mod test_utils;

pub use dialect::{Dialect, SqlDialect};
pub use interval::{DateUnit, Interval};
