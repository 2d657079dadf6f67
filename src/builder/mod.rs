//! SQL fragment builders.
//!
//! - [`window`] - how many hours after exposure must be scanned
//! - [`time_filter`] - `CASE WHEN` expressions that null out observations outside the window
//! - [`aggregate`] - per-user aggregation columns with formulas and capping
//!
//! Every fragment is a self-contained scalar expression that can be dropped
//! into a larger `SELECT`.

pub mod aggregate;
pub mod time_filter;
pub mod window;

pub use aggregate::{aggregate_metric_column, AggregateColumn, DEFAULT_VALUE_COLUMN};
pub use time_filter::{case_when_time_filter, exposure_start, TimeFilter};
pub use window::{max_hours_for_set, max_hours_to_convert, scan_end, scan_start, WindowHours};
