//! Dialect-neutral metric model.

pub mod formula;
pub mod metric;

pub use formula::{format_number, AggregationFormula};
pub use metric::{
    CappingSettings, CappingType, MetricDefinition, MetricKind, MetricSet, WindowSettings,
    WindowType,
};
