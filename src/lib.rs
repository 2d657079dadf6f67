//! # metricsql
//!
//! Dialect-aware SQL generation for experiment metrics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          MetricDefinition / MetricSet (model)            │
//! │   (kind, conversion window, delay, capping, formula)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder::window]
//! ┌─────────────────────────────────────────────────────────┐
//! │            WindowHours (scan range sizing)               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder::time_filter, builder::aggregate]
//! ┌─────────────────────────────────────────────────────────┐
//! │     SQL fragments (CASE WHEN filters, aggregates)        │
//! │          rendered through sql::dialect                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │               Per-user metric query                      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod builder;
pub mod compile;
pub mod config;
pub mod error;
pub mod model;
pub mod sql;

pub use error::{SqlGenError, SqlGenResult};
pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::builder::{
        aggregate_metric_column, case_when_time_filter, max_hours_to_convert, AggregateColumn,
        TimeFilter, WindowHours,
    };
    pub use crate::compile::{compile_metric_set, CompileInput, CompileOptions};
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::error::{SqlGenError, SqlGenResult};
    pub use crate::model::{
        CappingSettings, MetricDefinition, MetricKind, MetricSet, WindowSettings,
    };
    pub use crate::sql::DateUnit;
}
