//! Command-line arguments of the `pv-battery-sim` binary.

use std::path::PathBuf;

use clap::Parser;

/// PV + battery what-if simulator.
///
/// Replays a merged solar/grid-meter timeline with a simulated home battery
/// and reports grid exchange, self-consumption, and tiered-tariff cost
/// before and after. With `--sweep`, repeats the run for every candidate
/// capacity and prints the cost-benefit curve.
#[derive(Debug, Clone, Parser)]
#[command(name = "pv-battery-sim", version, about, long_about = None)]
pub struct Cli {
    /// Load scenario from TOML config file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, symmetric, eur)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Merged timeline CSV; a synthetic timeline is generated when omitted
    #[arg(long, value_name = "PATH")]
    pub timeline: Option<PathBuf>,

    /// Override the synthetic generator seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the battery capacity (kWh)
    #[arg(long, value_name = "KWH")]
    pub capacity: Option<f64>,

    /// Run the capacity sweep after the single simulation
    #[arg(long)]
    pub sweep: bool,

    /// Evaluate sweep candidates on parallel threads
    #[arg(long, requires = "sweep")]
    pub parallel: bool,

    /// Export the sweep curve to CSV
    #[arg(long, value_name = "PATH", requires = "sweep")]
    pub curve_out: Option<PathBuf>,

    /// Export the simulated timeline to CSV
    #[arg(long, value_name = "PATH")]
    pub timeline_out: Option<PathBuf>,

    /// Print the full report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Only log warnings and errors
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    /// Preset used when neither `--scenario` nor `--preset` is given.
    pub const DEFAULT_PRESET: &str = "baseline";

    pub fn preset_name(&self) -> &str {
        self.preset.as_deref().unwrap_or(Self::DEFAULT_PRESET)
    }
}
