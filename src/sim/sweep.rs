//! Capacity sweep: the same pipeline once per candidate capacity.

use std::num::NonZeroUsize;
use std::thread;

use serde::Serialize;
use tracing::{debug, info};

use super::battery::BatteryConfig;
use super::tariff::{Currency, Pricing};
use super::types::IntervalReading;
use crate::error::{Result, SimError};
use crate::runner::{SimulationReport, run};

/// Ordered, deduplicated list of capacities to evaluate (kWh).
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityCandidates(Vec<f64>);

impl CapacityCandidates {
    pub const DEFAULT_KWH: [f64; 11] = [
        0.0, 1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 40.0, 50.0, 100.0, 200.0,
    ];

    /// Builds a candidate list, keeping the first occurrence of each value.
    ///
    /// # Errors
    ///
    /// [`SimError::Configuration`] when the list is empty or holds a negative
    /// or non-finite capacity.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self> {
        let mut out: Vec<f64> = Vec::new();
        for value in values {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::config(
                    "sweep.capacities",
                    format!("capacity {value} must be finite and >= 0"),
                ));
            }
            if !out.contains(&value) {
                out.push(value);
            }
        }
        if out.is_empty() {
            return Err(SimError::config("sweep.capacities", "must not be empty"));
        }
        Ok(Self(out))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CapacityCandidates {
    fn default() -> Self {
        Self(Self::DEFAULT_KWH.to_vec())
    }
}

/// Outcome of one candidate capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub capacity_kwh: f64,
    pub grid_import_reduction_kwh: f64,
    pub grid_import_reduction_percent: f64,
    pub grid_export_reduction_kwh: f64,
    pub grid_export_reduction_percent: f64,
    pub total_savings: f64,
    pub savings_percent: f64,
    pub currency: Currency,
    pub baseline_cost: f64,
    pub scenario_cost: f64,
}

impl From<&SimulationReport> for CurvePoint {
    fn from(report: &SimulationReport) -> Self {
        let imp = &report.improvements;
        let fin = &report.financials;
        Self {
            capacity_kwh: report.config.capacity_kwh,
            grid_import_reduction_kwh: imp.grid_import_reduction_kwh,
            grid_import_reduction_percent: imp.grid_import_reduction_percent,
            grid_export_reduction_kwh: imp.grid_export_reduction_kwh,
            grid_export_reduction_percent: imp.grid_export_reduction_percent,
            total_savings: fin.total_savings,
            savings_percent: fin.savings_percent,
            currency: fin.currency,
            baseline_cost: fin.baseline_cost,
            scenario_cost: fin.scenario_cost,
        }
    }
}

fn curve_point(
    timeline: &[IntervalReading],
    config: BatteryConfig,
    pricing: &Pricing,
) -> Result<CurvePoint> {
    let report = run(timeline, &config, pricing)?;
    let point = CurvePoint::from(&report);
    debug!(
        capacity_kwh = point.capacity_kwh,
        savings_percent = point.savings_percent,
        "sweep candidate done"
    );
    Ok(point)
}

/// Runs the full pipeline for every candidate, one after another.
///
/// Only the capacity differs between runs; every other field comes from `fixed`.
///
/// # Errors
///
/// Returns the first failing candidate's error.
pub fn sweep(
    timeline: &[IntervalReading],
    fixed: &BatteryConfig,
    pricing: &Pricing,
    candidates: &CapacityCandidates,
) -> Result<Vec<CurvePoint>> {
    info!(candidates = candidates.len(), "running capacity sweep");
    candidates
        .as_slice()
        .iter()
        .map(|&capacity| curve_point(timeline, fixed.with_capacity(capacity), pricing))
        .collect()
}

/// Same as [`sweep`], spread over at most one scoped thread per available core.
///
/// The output is identical to [`sweep`] and ordered like `candidates`.
///
/// # Errors
///
/// Returns the error of the first failing candidate in candidate order.
pub fn sweep_parallel(
    timeline: &[IntervalReading],
    fixed: &BatteryConfig,
    pricing: &Pricing,
    candidates: &CapacityCandidates,
) -> Result<Vec<CurvePoint>> {
    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    sweep_with_workers(timeline, fixed, pricing, candidates, workers)
}

fn sweep_with_workers(
    timeline: &[IntervalReading],
    fixed: &BatteryConfig,
    pricing: &Pricing,
    candidates: &CapacityCandidates,
    workers: usize,
) -> Result<Vec<CurvePoint>> {
    let capacities = candidates.as_slice();
    let workers = workers.clamp(1, capacities.len().max(1));
    info!(
        candidates = capacities.len(),
        workers, "running capacity sweep in parallel"
    );
    let fixed = *fixed;
    // contiguous chunks keep candidate order when joined in spawn order
    let chunk_len = capacities.len().div_ceil(workers).max(1);
    let results: Vec<Result<CurvePoint>> = thread::scope(|scope| {
        let handles: Vec<_> = capacities
            .chunks(chunk_len)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|&capacity| {
                            curve_point(timeline, fixed.with_capacity(capacity), pricing)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });
    results.into_iter().collect()
}
