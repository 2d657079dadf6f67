//! Configuration module.
//!
//! Loads generation settings, the analysis period and metric definitions
//! from a TOML file.

mod settings;

pub use settings::{
    expand_env_vars, AnalysisSettings, GenerationSettings, MetricConfig, MetricSetSettings,
    Settings, SettingsError,
};
