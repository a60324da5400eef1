//! Per-interval battery dispatch.
//!
//! A run is a fold over the timeline with a single accumulator, the stored
//! energy `soc_kwh`. Each step is a pure function of the previous SOC and one
//! reading, so two runs over the same input are bit-identical.

use tracing::{debug, warn};

use super::battery::{BatteryConfig, InverterMode};
use super::types::{IntervalReading, SimulatedInterval, soc_percent};
use crate::error::{Result, SimError};

/// Dispatch policy, fixed for the whole run by the inverter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// Import and export are netted first; the battery then serves the remainder.
    NetMetered,
    /// Export charges and import discharges, judged on the raw reading without netting.
    Independent,
}

impl From<InverterMode> for DispatchStrategy {
    fn from(mode: InverterMode) -> Self {
        match mode {
            InverterMode::Asymmetric => Self::NetMetered,
            InverterMode::Symmetric => Self::Independent,
        }
    }
}

/// Energy moved across the battery terminals during one interval.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Transfer {
    /// Energy taken in from the grid-facing side (kWh).
    charged_kwh: f64,
    /// Energy withdrawn from the cells (kWh).
    discharged_kwh: f64,
    /// Part of the charged or discharged energy lost in conversion (kWh).
    loss_kwh: f64,
}

/// Per-run constants derived from the configuration.
#[derive(Debug, Clone, Copy)]
struct Limits {
    min_soc_kwh: f64,
    max_soc_kwh: f64,
    charge_per_slot_kwh: f64,
    discharge_per_slot_kwh: f64,
    charge_efficiency: f64,
    discharge_efficiency: f64,
    capacity_kwh: f64,
    slot_hours: f64,
}

impl From<&BatteryConfig> for Limits {
    fn from(cfg: &BatteryConfig) -> Self {
        Self {
            min_soc_kwh: cfg.min_soc_kwh(),
            max_soc_kwh: cfg.max_soc_kwh(),
            charge_per_slot_kwh: cfg.max_charge_per_slot_kwh(),
            discharge_per_slot_kwh: cfg.max_discharge_per_slot_kwh(),
            charge_efficiency: cfg.charge_efficiency,
            discharge_efficiency: cfg.discharge_efficiency,
            capacity_kwh: cfg.capacity_kwh,
            slot_hours: cfg.slot_hours,
        }
    }
}

impl Limits {
    /// Absorbs up to `available_kwh` of surplus. Returns the new SOC and the transfer.
    fn charge(&self, soc_kwh: f64, available_kwh: f64) -> (f64, Transfer) {
        let headroom = (self.max_soc_kwh - soc_kwh).max(0.0);
        let charged = available_kwh.min(self.charge_per_slot_kwh).min(headroom);
        if charged <= 0.0 {
            return (soc_kwh, Transfer::default());
        }
        let stored = charged * self.charge_efficiency;
        (
            soc_kwh + stored,
            Transfer {
                charged_kwh: charged,
                discharged_kwh: 0.0,
                loss_kwh: charged - stored,
            },
        )
    }

    /// Withdraws up to `needed_kwh` to cover a deficit. Returns the new SOC and the transfer.
    fn discharge(&self, soc_kwh: f64, needed_kwh: f64) -> (f64, Transfer) {
        let available = (soc_kwh - self.min_soc_kwh).max(0.0);
        let discharged = needed_kwh.min(self.discharge_per_slot_kwh).min(available);
        if discharged <= 0.0 {
            return (soc_kwh, Transfer::default());
        }
        let delivered = discharged * self.discharge_efficiency;
        (
            soc_kwh - discharged,
            Transfer {
                charged_kwh: 0.0,
                discharged_kwh: discharged,
                loss_kwh: discharged - delivered,
            },
        )
    }

    fn delivered_kwh(&self, transfer: &Transfer) -> f64 {
        transfer.discharged_kwh * self.discharge_efficiency
    }

    fn interval(
        &self,
        reading: &IntervalReading,
        soc_kwh: f64,
        transfer: Transfer,
        import_kwh: f64,
        export_kwh: f64,
    ) -> SimulatedInterval {
        SimulatedInterval {
            reading: *reading,
            battery_soc_kwh: soc_kwh,
            battery_soc_percent: soc_percent(soc_kwh, self.capacity_kwh),
            battery_charge_kw: transfer.charged_kwh / self.slot_hours,
            battery_discharge_kw: transfer.discharged_kwh / self.slot_hours,
            battery_loss_kw: transfer.loss_kwh / self.slot_hours,
            grid_import_with_battery: import_kwh,
            grid_export_with_battery: export_kwh,
        }
    }
}

impl DispatchStrategy {
    /// Advances the battery by one interval.
    fn step(
        self,
        limits: &Limits,
        soc_kwh: f64,
        reading: &IntervalReading,
    ) -> (f64, SimulatedInterval) {
        match self {
            Self::NetMetered => {
                let net = reading.net_balance_kwh();
                let netted_import = (-net).max(0.0);
                let netted_export = net.max(0.0);
                if net > 0.0 {
                    let (soc, t) = limits.charge(soc_kwh, net);
                    let export = net - t.charged_kwh;
                    (soc, limits.interval(reading, soc, t, 0.0, export))
                } else if net < 0.0 {
                    let (soc, t) = limits.discharge(soc_kwh, -net);
                    let import = -net - limits.delivered_kwh(&t);
                    (soc, limits.interval(reading, soc, t, import, 0.0))
                } else {
                    let interval = SimulatedInterval::passthrough(
                        *reading,
                        soc_kwh,
                        limits.capacity_kwh,
                        netted_import,
                        netted_export,
                    );
                    (soc_kwh, interval)
                }
            }
            Self::Independent => {
                if reading.export_kwh > 0.0 {
                    let (soc, t) = limits.charge(soc_kwh, reading.export_kwh);
                    let export = reading.export_kwh - t.charged_kwh;
                    (soc, limits.interval(reading, soc, t, reading.import_kwh, export))
                } else if reading.import_kwh > 0.0 {
                    let (soc, t) = limits.discharge(soc_kwh, reading.import_kwh);
                    let import = reading.import_kwh - limits.delivered_kwh(&t);
                    (soc, limits.interval(reading, soc, t, import, reading.export_kwh))
                } else {
                    let interval = SimulatedInterval::passthrough(
                        *reading,
                        soc_kwh,
                        limits.capacity_kwh,
                        reading.import_kwh,
                        reading.export_kwh,
                    );
                    (soc_kwh, interval)
                }
            }
        }
    }
}

/// Simulates the battery over `timeline` and returns one [`SimulatedInterval`] per reading.
///
/// SOC starts at the lower bound. Requests are truncated to the rate limit and
/// the SOC headroom; a zero transfer is a normal outcome. Readings with
/// negative fields are simulated as given.
///
/// # Errors
///
/// [`SimError::EmptyTimeline`] for an empty timeline and
/// [`SimError::Configuration`] when `config` fails [`BatteryConfig::validate`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use pv_battery_sim::sim::battery::BatteryConfig;
/// use pv_battery_sim::sim::dispatch::simulate;
/// use pv_battery_sim::sim::types::IntervalReading;
///
/// let ts = NaiveDate::from_ymd_opt(2024, 6, 1)
///     .and_then(|d| d.and_hms_opt(12, 0, 0))
///     .unwrap();
/// let timeline = [IntervalReading::new(ts, 4.0, 0.0, 1.0)];
/// let out = simulate(&timeline, &BatteryConfig::default()).unwrap();
/// assert_eq!(out[0].grid_export_with_battery, 0.0);
/// ```
pub fn simulate(
    timeline: &[IntervalReading],
    config: &BatteryConfig,
) -> Result<Vec<SimulatedInterval>> {
    if timeline.is_empty() {
        return Err(SimError::EmptyTimeline);
    }
    config.validate()?;

    let negative = timeline.iter().filter(|r| r.has_negative_field()).count();
    if negative > 0 {
        warn!(
            intervals = negative,
            "timeline contains negative readings, simulating them as given"
        );
    }

    let strategy = DispatchStrategy::from(config.inverter_mode);
    let limits = Limits::from(config);
    debug!(
        ?strategy,
        intervals = timeline.len(),
        capacity_kwh = config.capacity_kwh,
        "simulating battery dispatch"
    );

    let mut soc_kwh = limits.min_soc_kwh;
    let mut simulated = Vec::with_capacity(timeline.len());
    for reading in timeline {
        let (next_soc, interval) = strategy.step(&limits, soc_kwh, reading);
        soc_kwh = next_soc;
        simulated.push(interval);
    }
    Ok(simulated)
}
