//! Before/after energy totals and the improvements between them.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::types::{IntervalReading, SimulatedInterval};

/// Aggregate energy totals over one timeline.
///
/// Computed post-hoc from the raw or simulated timeline so that reported
/// totals always match the interval data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Solar energy produced (kWh).
    pub solar_production_kwh: f64,
    /// Energy drawn from the grid (kWh).
    pub grid_import_kwh: f64,
    /// Energy pushed to the grid (kWh).
    pub grid_export_kwh: f64,
    /// Solar energy that was not exported (kWh).
    pub solar_self_consumption_kwh: f64,
    /// Self-consumption as a share of production; 0 without production.
    pub self_consumption_rate_percent: f64,
    /// Extra self-consumption attributable to the battery (kWh). Not clamped.
    pub battery_self_consumption_kwh: f64,
    /// Conversion losses inside the battery (kWh).
    pub battery_losses_kwh: f64,
}

impl MetricsSnapshot {
    /// Totals of the raw timeline, i.e. the installation without a battery.
    ///
    /// # Arguments
    ///
    /// * `timeline` - Raw readings
    /// * `slot_hours` - Slot length used to turn production power into energy
    pub fn baseline(timeline: &[IntervalReading], slot_hours: f64) -> Self {
        let (production, import, export) = timeline.iter().fold((0.0, 0.0, 0.0), |(p, i, e), r| {
            (
                p + r.production_kw * slot_hours,
                i + r.import_kwh,
                e + r.export_kwh,
            )
        });
        let self_consumption = production - export;

        Self {
            solar_production_kwh: production,
            grid_import_kwh: import,
            grid_export_kwh: export,
            solar_self_consumption_kwh: self_consumption,
            self_consumption_rate_percent: percent_of(self_consumption, production),
            battery_self_consumption_kwh: 0.0,
            battery_losses_kwh: 0.0,
        }
    }

    /// Totals of the simulated timeline, compared against `baseline` for the battery share.
    ///
    /// # Arguments
    ///
    /// * `simulated` - Dispatch output
    /// * `baseline` - Snapshot of the raw timeline the simulation ran on
    /// * `slot_hours` - Slot length used to turn power into energy
    pub fn simulated(simulated: &[SimulatedInterval], baseline: &Self, slot_hours: f64) -> Self {
        let mut production = 0.0;
        let mut import = 0.0;
        let mut export = 0.0;
        let mut losses = 0.0;
        for s in simulated {
            production += s.reading.production_kw * slot_hours;
            import += s.grid_import_with_battery;
            export += s.grid_export_with_battery;
            losses += s.battery_loss_kw * slot_hours;
        }

        let self_consumption = production - export;
        let battery_self_consumption = self_consumption - baseline.solar_self_consumption_kwh;
        if battery_self_consumption < 0.0 {
            warn!(
                battery_self_consumption_kwh = battery_self_consumption,
                "battery lowered self-consumption below baseline"
            );
        }

        Self {
            solar_production_kwh: production,
            grid_import_kwh: import,
            grid_export_kwh: export,
            solar_self_consumption_kwh: self_consumption,
            self_consumption_rate_percent: percent_of(self_consumption, production),
            battery_self_consumption_kwh: battery_self_consumption,
            battery_losses_kwh: losses,
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solar production:      {:.1} kWh", self.solar_production_kwh)?;
        writeln!(f, "Grid import:           {:.1} kWh", self.grid_import_kwh)?;
        writeln!(f, "Grid export:           {:.1} kWh", self.grid_export_kwh)?;
        writeln!(
            f,
            "Self-consumption:      {:.1} kWh ({:.1}%)",
            self.solar_self_consumption_kwh, self.self_consumption_rate_percent
        )?;
        writeln!(
            f,
            "Battery self-use:      {:.1} kWh",
            self.battery_self_consumption_kwh
        )?;
        write!(f, "Battery losses:        {:.1} kWh", self.battery_losses_kwh)
    }
}

/// Change from a baseline snapshot to a simulated one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Improvements {
    pub grid_import_reduction_kwh: f64,
    /// Relative to the baseline import; 0 when the baseline import is 0.
    pub grid_import_reduction_percent: f64,
    pub grid_export_reduction_kwh: f64,
    /// Relative to the baseline export; 0 when the baseline export is 0.
    pub grid_export_reduction_percent: f64,
    pub self_consumption_improvement_kwh: f64,
    /// Difference of the two self-consumption rates, in percentage points.
    pub self_consumption_rate_change_pp: f64,
}

impl Improvements {
    pub fn between(before: &MetricsSnapshot, after: &MetricsSnapshot) -> Self {
        let import_reduction = before.grid_import_kwh - after.grid_import_kwh;
        let export_reduction = before.grid_export_kwh - after.grid_export_kwh;

        Self {
            grid_import_reduction_kwh: import_reduction,
            grid_import_reduction_percent: percent_of(import_reduction, before.grid_import_kwh),
            grid_export_reduction_kwh: export_reduction,
            grid_export_reduction_percent: percent_of(export_reduction, before.grid_export_kwh),
            self_consumption_improvement_kwh: after.solar_self_consumption_kwh
                - before.solar_self_consumption_kwh,
            self_consumption_rate_change_pp: after.self_consumption_rate_percent
                - before.self_consumption_rate_percent,
        }
    }
}

impl fmt::Display for Improvements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Import reduction:      {:.1} kWh ({:.1}%)",
            self.grid_import_reduction_kwh, self.grid_import_reduction_percent
        )?;
        writeln!(
            f,
            "Export reduction:      {:.1} kWh ({:.1}%)",
            self.grid_export_reduction_kwh, self.grid_export_reduction_percent
        )?;
        write!(
            f,
            "Self-consumption gain: {:+.1} kWh ({:+.1} pp)",
            self.self_consumption_improvement_kwh, self.self_consumption_rate_change_pp
        )
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;

    fn reading(production_kw: f64, import_kwh: f64, export_kwh: f64) -> IntervalReading {
        let ts = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        IntervalReading::new(ts, production_kw, import_kwh, export_kwh)
    }

    fn with_battery(
        r: IntervalReading,
        import: f64,
        export: f64,
        loss_kw: f64,
    ) -> SimulatedInterval {
        SimulatedInterval {
            battery_loss_kw: loss_kw,
            ..SimulatedInterval::passthrough(r, 0.0, 1.0, import, export)
        }
    }

    #[test]
    fn baseline_totals() {
        // 4 kW for 0.25 h = 1 kWh per slot
        let timeline = [reading(4.0, 0.0, 0.5), reading(4.0, 0.2, 0.3)];
        let m = MetricsSnapshot::baseline(&timeline, 0.25);
        assert_relative_eq!(m.solar_production_kwh, 2.0, epsilon = 1e-12);
        assert_relative_eq!(m.grid_import_kwh, 0.2, epsilon = 1e-12);
        assert_relative_eq!(m.grid_export_kwh, 0.8, epsilon = 1e-12);
        assert_relative_eq!(m.solar_self_consumption_kwh, 1.2, epsilon = 1e-12);
        assert_relative_eq!(m.self_consumption_rate_percent, 60.0, epsilon = 1e-9);
        assert_eq!(m.battery_self_consumption_kwh, 0.0);
    }

    #[test]
    fn zero_production_gives_zero_rate() {
        let m = MetricsSnapshot::baseline(&[reading(0.0, 1.0, 0.0)], 0.25);
        assert_eq!(m.self_consumption_rate_percent, 0.0);
        assert!(!m.self_consumption_rate_percent.is_nan());
    }

    #[test]
    fn simulated_totals_and_battery_share() {
        let raw = [reading(4.0, 0.0, 1.0), reading(0.0, 1.0, 0.0)];
        let before = MetricsSnapshot::baseline(&raw, 0.25);
        let sim = [
            with_battery(raw[0], 0.0, 0.0, 0.16),
            with_battery(raw[1], 0.08, 0.0, 0.32),
        ];
        let after = MetricsSnapshot::simulated(&sim, &before, 0.25);
        assert_relative_eq!(after.grid_import_kwh, 0.08, epsilon = 1e-12);
        assert_eq!(after.grid_export_kwh, 0.0);
        assert_relative_eq!(after.solar_self_consumption_kwh, 1.0, epsilon = 1e-12);
        assert_relative_eq!(after.battery_self_consumption_kwh, 1.0, epsilon = 1e-12);
        assert_relative_eq!(after.battery_losses_kwh, 0.12, epsilon = 1e-12);
        assert_relative_eq!(after.self_consumption_rate_percent, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn negative_battery_share_is_not_clamped() {
        let raw = [reading(4.0, 0.0, 0.5)];
        let before = MetricsSnapshot::baseline(&raw, 0.25);
        let sim = [with_battery(raw[0], 0.0, 0.7, 0.0)];
        let after = MetricsSnapshot::simulated(&sim, &before, 0.25);
        assert_relative_eq!(after.battery_self_consumption_kwh, -0.2, epsilon = 1e-12);
    }

    #[test]
    fn improvements_between_snapshots() {
        let before = MetricsSnapshot {
            grid_import_kwh: 10.0,
            grid_export_kwh: 8.0,
            solar_self_consumption_kwh: 12.0,
            self_consumption_rate_percent: 60.0,
            ..MetricsSnapshot::default()
        };
        let after = MetricsSnapshot {
            grid_import_kwh: 6.0,
            grid_export_kwh: 2.0,
            solar_self_consumption_kwh: 18.0,
            self_consumption_rate_percent: 90.0,
            ..MetricsSnapshot::default()
        };
        let imp = Improvements::between(&before, &after);
        assert_eq!(imp.grid_import_reduction_kwh, 4.0);
        assert_eq!(imp.grid_import_reduction_percent, 40.0);
        assert_eq!(imp.grid_export_reduction_kwh, 6.0);
        assert_eq!(imp.grid_export_reduction_percent, 75.0);
        assert_eq!(imp.self_consumption_improvement_kwh, 6.0);
        assert_eq!(imp.self_consumption_rate_change_pp, 30.0);
    }

    #[test]
    fn improvements_guard_zero_denominators() {
        let zero = MetricsSnapshot::default();
        let imp = Improvements::between(&zero, &zero);
        assert_eq!(imp.grid_import_reduction_percent, 0.0);
        assert_eq!(imp.grid_export_reduction_percent, 0.0);
    }

    #[test]
    fn display_does_not_panic() {
        let m = MetricsSnapshot::baseline(&[reading(1.0, 0.1, 0.1)], 0.25);
        assert!(format!("{m}").contains("Solar production"));
        let imp = Improvements::between(&m, &m);
        assert!(format!("{imp}").contains("Import reduction"));
    }
}
