//! Rollout CLI - autoregressive weather forecast runner.
//!
//! Loads a two-state input window, steps it forward for a number of base
//! intervals and writes one labeled record per step.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rollout::driver::{self, RunConfig};
use rollout::stepper::{ForecastSlice, StepperConfig};

/// Autoregressive multi-step weather forecast runner.
#[derive(Parser)]
#[command(name = "rollout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a forecast from the input window in `data_dir`.
    Run {
        /// Directory holding input.raw and input.json.
        #[arg(long)]
        data_dir: PathBuf,

        /// Where to save the per-step records.
        #[arg(long, default_value = "./output")]
        save_dir: PathBuf,

        /// Number of forecast steps.
        #[arg(long, default_value = "1")]
        total_step: usize,

        /// Hours between steps.
        #[arg(long, default_value = "6")]
        interval_hours: u32,

        /// Report interpolated sub-steps instead of the nominal forecast.
        #[arg(long)]
        use_interp: bool,

        /// Sub-steps reconstructed per interval when interpolating.
        #[arg(long, default_value = "6")]
        interp_steps: usize,

        /// Output slice reported when not interpolating.
        #[arg(long, default_value = "penultimate")]
        forecast_slice: SliceArg,
    },

    /// Display the metadata of an input window.
    Info {
        /// Directory holding input.json.
        #[arg(long)]
        data_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SliceArg {
    /// Second-to-last slice of the predictor output.
    Penultimate,
    /// Last slice of the predictor output.
    Last,
}

impl From<SliceArg> for ForecastSlice {
    fn from(arg: SliceArg) -> Self {
        match arg {
            SliceArg::Penultimate => ForecastSlice::Penultimate,
            SliceArg::Last => ForecastSlice::Last,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data_dir,
            save_dir,
            total_step,
            interval_hours,
            use_interp,
            interp_steps,
            forecast_slice,
        } => {
            let config = RunConfig {
                data_dir,
                save_dir,
                interp_steps,
                stepper: StepperConfig {
                    total_steps: total_step,
                    interval_hours,
                    use_refiner: use_interp,
                    forecast_slice: forecast_slice.into(),
                    ..Default::default()
                },
            };
            run_forecast(&config);
        }
        Commands::Info { data_dir } => {
            run_info(&data_dir);
        }
    }
}

fn run_forecast(config: &RunConfig) {
    info!(
        data_dir = %config.data_dir.display(),
        save_dir = %config.save_dir.display(),
        total_steps = config.stepper.total_steps,
        use_interp = config.stepper.use_refiner,
        "Starting forecast"
    );

    match driver::run(config) {
        Ok(summary) => {
            info!(
                steps = summary.steps,
                final_lead_time = summary.final_lead_time,
                "Forecast complete"
            );
        }
        Err(e) => {
            error!("Error during forecast: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_info(data_dir: &std::path::Path) {
    let meta = driver::inspect(data_dir).unwrap_or_else(|e| {
        error!("Error reading input: {}", e);
        std::process::exit(1);
    });

    println!("Input window");
    println!("============");
    println!("Times: {} -> {}", meta.times[0], meta.times[1]);
    println!("Channels ({}): {}", meta.channel.len(), meta.channel.join(", "));
    if let (Some(first), Some(last)) = (meta.lat.first(), meta.lat.last()) {
        println!("Latitude: {} points, {} .. {}", meta.lat.len(), first, last);
    }
    if let (Some(first), Some(last)) = (meta.lon.first(), meta.lon.last()) {
        println!("Longitude: {} points, {} .. {}", meta.lon.len(), first, last);
    }
}
