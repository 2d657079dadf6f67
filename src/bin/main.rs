//! metricsql CLI - Compile experiment metric definitions to SQL
//!
//! Usage:
//!   metricsql compile <settings.toml> [--dialect <dialect>] [--metric <id>] [--output sql|json]
//!   metricsql window <settings.toml> [--funnel]
//!   metricsql validate <settings.toml>
//!
//! Examples:
//!   metricsql compile metrics.toml --dialect snowflake
//!   metricsql compile metrics.toml --metric purchases --output json
//!   metricsql window metrics.toml --funnel

use clap::{Parser, Subcommand, ValueEnum};
use metricsql::builder::{max_hours_for_set, scan_end, WindowHours};
use metricsql::compile::compile_metric_set;
use metricsql::config::Settings;
use metricsql::model::MetricSet;
use metricsql::sql::Dialect;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "metricsql")]
#[command(about = "metricsql - Dialect-aware SQL generation for experiment metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the configured metric set to SQL
    Compile {
        /// Path to the settings file
        file: PathBuf,

        /// SQL dialect to generate (overrides [generation].dialect)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Compile a single metric instead of the configured metric set
        #[arg(short, long)]
        metric: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Show how many hours past the analysis end metric rows are scanned
    Window {
        /// Path to the settings file
        file: PathBuf,

        /// Treat the metric set as sequential funnel stages
        #[arg(long)]
        funnel: bool,
    },

    /// Validate a settings file without generating SQL
    Validate {
        /// Path to the settings file
        file: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Bigquery,
    Snowflake,
    Postgres,
    Redshift,
    Mysql,
    Tsql,
    Databricks,
    Duckdb,
    Clickhouse,
    Presto,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Bigquery => Dialect::BigQuery,
            DialectArg::Snowflake => Dialect::Snowflake,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Redshift => Dialect::Redshift,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Tsql => Dialect::TSql,
            DialectArg::Databricks => Dialect::Databricks,
            DialectArg::Duckdb => Dialect::DuckDb,
            DialectArg::Clickhouse => Dialect::ClickHouse,
            DialectArg::Presto => Dialect::Presto,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL, scan range and per-metric fragments as JSON
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            file,
            dialect,
            metric,
            output,
        } => cmd_compile(file, dialect, metric, output),
        Commands::Window { file, funnel } => cmd_window(file, funnel),
        Commands::Validate { file } => cmd_validate(file),
    }
}

fn load_settings(file: &Path) -> Option<Settings> {
    match Settings::from_file(file) {
        Ok(settings) => Some(settings),
        Err(e) => {
            eprintln!("Error loading '{}': {}", file.display(), e);
            None
        }
    }
}

fn cmd_compile(
    file: PathBuf,
    dialect: Option<DialectArg>,
    metric: Option<String>,
    output: OutputFormat,
) -> ExitCode {
    let Some(settings) = load_settings(&file) else {
        return ExitCode::FAILURE;
    };

    let set = match &metric {
        Some(id) => settings
            .metric(id)
            .map(|m| MetricSet::new(m.definition.clone())),
        None => settings.metric_set(),
    };
    let input = match set.and_then(|set| settings.compile_input(set)) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut options = settings.compile_options();
    if let Some(dialect) = dialect {
        options = options.with_dialect(dialect.into());
    }

    match compile_metric_set(&input, &options) {
        Ok(compiled) => {
            match output {
                OutputFormat::Sql => {
                    println!("{}", compiled.sql);
                }
                OutputFormat::Json => {
                    let metrics: Vec<_> = compiled
                        .metrics
                        .iter()
                        .map(|m| {
                            serde_json::json!({
                                "metric_id": m.metric_id,
                                "cte_name": m.cte_name,
                                "time_filter": m.time_filter,
                                "aggregate": m.aggregate,
                            })
                        })
                        .collect();
                    let doc = serde_json::json!({
                        "dialect": compiled.dialect,
                        "max_hours": compiled.max_hours.hours(),
                        "scan_start": compiled.scan_start.to_rfc3339(),
                        "scan_end": compiled.scan_end.to_rfc3339(),
                        "metrics": metrics,
                        "sql": compiled.sql,
                    });
                    match serde_json::to_string_pretty(&doc) {
                        Ok(json) => println!("{}", json),
                        Err(e) => {
                            eprintln!("Error serializing output: {}", e);
                            return ExitCode::FAILURE;
                        }
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_window(file: PathBuf, funnel: bool) -> ExitCode {
    let Some(settings) = load_settings(&file) else {
        return ExitCode::FAILURE;
    };

    let set = match settings.metric_set() {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let is_funnel = funnel || settings.generation.funnel;
    let hours = match max_hours_for_set(is_funnel, &set) {
        Ok(hours) => hours,
        Err(e) => {
            eprintln!("Window error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Metrics:");
    for metric in set.ordered_metrics() {
        match metric.hours_to_convert() {
            Some(h) => println!("  - {} ({} hours)", metric.id, h),
            None => println!("  - {} (unbounded)", metric.id),
        }
    }
    if let Some(activation) = &set.activation {
        println!("Activation: {}", activation.id);
    }
    println!();

    match hours {
        WindowHours::Bounded(h) => println!("Max hours to convert: {}", h),
        WindowHours::Unbounded => println!("Max hours to convert: unbounded"),
    }

    if let Some(analysis) = &settings.analysis {
        match scan_end(analysis.end, hours) {
            Ok(Some(end)) => println!("Scan end: {}", end.to_rfc3339()),
            Ok(None) => println!("Scan end: {} (analysis end)", analysis.end.to_rfc3339()),
            Err(e) => {
                eprintln!("Window error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn cmd_validate(file: PathBuf) -> ExitCode {
    let Some(settings) = load_settings(&file) else {
        return ExitCode::FAILURE;
    };

    if let Err(e) = settings.metric_set() {
        eprintln!("Validation errors:");
        eprintln!("  {}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "OK: {} is valid ({} metrics, dialect {})",
        file.display(),
        settings.metrics.len(),
        settings.generation.dialect
    );
    ExitCode::SUCCESS
}
