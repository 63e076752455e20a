//! Sleep Flux CLI - Command-line interface for Sleep Flux
//!
//! Commands:
//! - api: Build the API projection from saved vendor responses
//! - chart: Build the chart projection
//! - combined: Heart-rate samples annotated with their sleep stage
//! - resting: List resting heart rate per day
//! - endpoints: Print the vendor resource paths for a window

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sleep_flux::source::{daily_heart_rate_path, intraday_heart_rate_path, sleep_log_paths};
use sleep_flux::{
    AggregatorConfig, ComputeError, JsonFileSource, SleepDataProcessor, TimeWindow, FLUX_VERSION,
};

/// Sleep Flux - Align sleep stages with intraday heart rate
#[derive(Parser)]
#[command(name = "sleepflux")]
#[command(version = FLUX_VERSION)]
#[command(about = "Align wearable sleep stages with intraday heart rate", long_about = None)]
struct Cli {
    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the API projection (metadata, stages, heart rate, resting heart rate)
    Api {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        settings: SettingsArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build the chart projection (per-stage segments and smoothed heart rate)
    Chart {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        settings: SettingsArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Annotate each heart-rate sample with the stage it falls in
    Combined {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List resting heart rate for every day in the daily summary
    /// (default window: the trailing 7 days)
    Resting {
        /// Daily heart-rate summary response
        #[arg(long)]
        daily: PathBuf,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the vendor resource paths covering a window
    Endpoints {
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Sleep response file (repeat once per date)
    #[arg(long = "sleep")]
    sleep: Vec<PathBuf>,

    /// Intraday heart-rate response file
    #[arg(long)]
    heart_rate: Option<PathBuf>,

    /// Daily heart-rate summary response file
    #[arg(long)]
    daily: Option<PathBuf>,
}

#[derive(Args)]
struct WindowArgs {
    /// Window start (e.g. 2024-01-15T22:00 or RFC 3339)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Window end, exclusive
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Use the trailing N hours from now (ignored when --start/--end are given)
    #[arg(long, env = "SLEEPFLUX_TRAILING")]
    trailing: Option<i64>,
}

#[derive(Args)]
struct SettingsArgs {
    /// Aggregator settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Points in the heart-rate moving average
    #[arg(long, env = "SLEEPFLUX_SMOOTHING_WINDOW")]
    smoothing_window: Option<usize>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Output format
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// Which default look-back applies when no window is given
#[derive(Clone, Copy)]
enum Projection {
    Api,
    Chart,
    Resting,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FluxCliError> {
    match cli.command {
        Commands::Api {
            input,
            window,
            settings,
            output,
        } => {
            let config = load_config(&settings)?;
            let window = resolve_window(&window, &config, Projection::Api)?;
            let processor = SleepDataProcessor::with_config(file_source(input), config)?;
            write_output(&processor.api_payload(Some(&window))?, &output)
        }

        Commands::Chart {
            input,
            window,
            settings,
            output,
        } => {
            let config = load_config(&settings)?;
            let window = resolve_window(&window, &config, Projection::Chart)?;
            let processor = SleepDataProcessor::with_config(file_source(input), config)?;
            write_output(&processor.chart_series(Some(&window))?, &output)
        }

        Commands::Combined {
            input,
            window,
            output,
        } => {
            let window = resolve_window(&window, &AggregatorConfig::default(), Projection::Api)?;
            let processor = SleepDataProcessor::new(file_source(input));
            write_output(&processor.combined_points(Some(&window))?, &output)
        }

        Commands::Resting {
            daily,
            window,
            output,
        } => {
            let window =
                resolve_window(&window, &AggregatorConfig::default(), Projection::Resting)?;
            let processor = SleepDataProcessor::new(JsonFileSource::new().with_daily(daily));
            write_output(&processor.resting_heart_rates(Some(&window))?, &output)
        }

        Commands::Endpoints { window, output } => {
            let window = resolve_window(&window, &AggregatorConfig::default(), Projection::Chart)?;
            let endpoints = Endpoints {
                intraday_heart_rate: intraday_heart_rate_path(&window),
                daily_heart_rate: daily_heart_rate_path(&window),
                sleep: sleep_log_paths(&window),
            };
            write_output(&endpoints, &output)
        }
    }
}

// Helper functions

fn file_source(input: InputArgs) -> JsonFileSource {
    JsonFileSource {
        heart_rate: input.heart_rate,
        sleep: input.sleep,
        daily: input.daily,
    }
}

fn load_config(settings: &SettingsArgs) -> Result<AggregatorConfig, FluxCliError> {
    let mut config = match &settings.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => AggregatorConfig::default(),
    };
    if let Some(size) = settings.smoothing_window {
        config.smoothing_window = size;
    }
    Ok(config)
}

fn resolve_window(
    args: &WindowArgs,
    config: &AggregatorConfig,
    projection: Projection,
) -> Result<TimeWindow, FluxCliError> {
    let now = chrono::Utc::now();
    let window = match (&args.start, &args.end, args.trailing) {
        (Some(start), Some(end), _) => TimeWindow::parse(start, end)?,
        (None, None, Some(hours)) => TimeWindow::trailing(now, hours)?,
        (None, None, None) => match projection {
            Projection::Api => config.default_api_window(now)?,
            Projection::Chart => config.default_chart_window(now)?,
            Projection::Resting => config.default_resting_window(now)?,
        },
        _ => return Err(FluxCliError::IncompleteWindow),
    };
    log::debug!("window {} .. {}", window.start, window.end);
    Ok(window)
}

fn write_output<T: Serialize>(value: &T, args: &OutputArgs) -> Result<(), FluxCliError> {
    let mut data = match args.format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    data.push('\n');

    if is_stdio(&args.output) {
        print!("{}", data);
    } else {
        fs::write(&args.output, data)?;
    }
    Ok(())
}

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

#[derive(Serialize)]
struct Endpoints {
    intraday_heart_rate: String,
    daily_heart_rate: String,
    sleep: Vec<String>,
}

// Error types

#[derive(Debug)]
enum FluxCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    IncompleteWindow,
}

impl From<io::Error> for FluxCliError {
    fn from(e: io::Error) -> Self {
        FluxCliError::Io(e)
    }
}

impl From<ComputeError> for FluxCliError {
    fn from(e: ComputeError) -> Self {
        FluxCliError::Compute(e)
    }
}

impl From<serde_json::Error> for FluxCliError {
    fn from(e: serde_json::Error) -> Self {
        FluxCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FluxCliError> for CliError {
    fn from(e: FluxCliError) -> Self {
        match e {
            FluxCliError::Io(e) | FluxCliError::Compute(ComputeError::Io(e)) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FluxCliError::Json(e) | FluxCliError::Compute(ComputeError::JsonError(e)) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax of the input files".to_string()),
            },
            FluxCliError::Compute(e @ ComputeError::TimestampParse { .. }) => CliError {
                code: "TIMESTAMP_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Input files must be unmodified vendor responses".to_string()),
            },
            FluxCliError::Compute(e @ ComputeError::InvalidWindow { .. }) => CliError {
                code: "INVALID_WINDOW".to_string(),
                message: e.to_string(),
                hint: Some("--start must not be after --end".to_string()),
            },
            FluxCliError::Compute(e @ ComputeError::InvalidSmoothingWindow { .. }) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: e.to_string(),
                hint: Some("Use a positive, odd smoothing window when centered".to_string()),
            },
            FluxCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            FluxCliError::IncompleteWindow => CliError {
                code: "INVALID_WINDOW".to_string(),
                message: "Window needs both --start and --end, or --trailing".to_string(),
                hint: Some("Omit all three to use the default look-back".to_string()),
            },
        }
    }
}
