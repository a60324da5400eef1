//! One end-to-end run: dispatch, before/after metrics, improvements, and cost.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::sim::battery::BatteryConfig;
use crate::sim::dispatch::simulate;
use crate::sim::metrics::{Improvements, MetricsSnapshot};
use crate::sim::tariff::{FinancialSummary, Pricing};
use crate::sim::types::{IntervalReading, SimulatedInterval};

/// Everything one simulation run produces for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// The configuration the run used.
    pub config: BatteryConfig,
    /// Per-interval energy flows and SOC.
    pub simulated: Vec<SimulatedInterval>,
    /// Totals of the raw timeline.
    pub before: MetricsSnapshot,
    /// Totals with the battery.
    pub after: MetricsSnapshot,
    pub improvements: Improvements,
    pub financials: FinancialSummary,
}

/// Runs dispatch, aggregation, and pricing over `timeline` with `config`.
///
/// # Arguments
///
/// * `timeline` - Time-ordered merged readings
/// * `config` - Battery parameters for this run
/// * `pricing` - Price tables; the one matching `config.currency` is used
///
/// # Errors
///
/// Returns the first error of [`simulate`] or [`FinancialSummary::compute`].
pub fn run(
    timeline: &[IntervalReading],
    config: &BatteryConfig,
    pricing: &Pricing,
) -> Result<SimulationReport> {
    let simulated = simulate(timeline, config)?;
    let before = MetricsSnapshot::baseline(timeline, config.slot_hours);
    let after = MetricsSnapshot::simulated(&simulated, &before, config.slot_hours);
    let improvements = Improvements::between(&before, &after);
    let financials = FinancialSummary::compute(&simulated, pricing, config.currency)?;

    debug!(
        capacity_kwh = config.capacity_kwh,
        savings = financials.total_savings,
        import_reduction_kwh = improvements.grid_import_reduction_kwh,
        "simulation finished"
    );

    Ok(SimulationReport {
        config: *config,
        simulated,
        before,
        after,
        improvements,
        financials,
    })
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Battery {:.1} kWh, {:?} inverter ---",
            self.config.capacity_kwh, self.config.inverter_mode
        )?;
        writeln!(f, "[without battery]")?;
        writeln!(f, "{}", self.before)?;
        writeln!(f, "[with battery]")?;
        writeln!(f, "{}", self.after)?;
        writeln!(f, "[improvements]")?;
        writeln!(f, "{}", self.improvements)?;
        write!(f, "{}", self.financials)
    }
}
