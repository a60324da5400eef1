//! Core timeline types: raw interval readings and their simulated counterparts.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One fixed-duration slot of merged solar and grid-meter data.
///
/// The slot length is not stored per reading; it is a run-level constant
/// ([`BatteryConfig::slot_hours`](super::battery::BatteryConfig::slot_hours)).
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use pv_battery_sim::sim::types::IntervalReading;
///
/// let ts = NaiveDate::from_ymd_opt(2024, 6, 1)
///     .and_then(|d| d.and_hms_opt(12, 0, 0))
///     .unwrap();
/// let r = IntervalReading::new(ts, 4.0, 0.0, 0.8);
/// assert!(r.is_surplus());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalReading {
    /// Start of the slot.
    pub timestamp: NaiveDateTime,
    /// Instantaneous solar production (kW).
    pub production_kw: f64,
    /// Energy drawn from the grid during the slot (kWh).
    pub import_kwh: f64,
    /// Energy pushed to the grid during the slot (kWh).
    pub export_kwh: f64,
}

impl IntervalReading {
    pub const fn new(
        timestamp: NaiveDateTime,
        production_kw: f64,
        import_kwh: f64,
        export_kwh: f64,
    ) -> Self {
        Self {
            timestamp,
            production_kw,
            import_kwh,
            export_kwh,
        }
    }

    /// Net grid balance of the slot: positive when more was exported than imported.
    pub fn net_balance_kwh(&self) -> f64 {
        self.export_kwh - self.import_kwh
    }

    pub fn is_surplus(&self) -> bool {
        self.net_balance_kwh() > 0.0
    }

    /// Whether any field is negative. Such readings are simulated as-is.
    pub fn has_negative_field(&self) -> bool {
        self.production_kw < 0.0 || self.import_kwh < 0.0 || self.export_kwh < 0.0
    }
}

/// A reading after battery dispatch.
///
/// Battery rates are slot-average power (kWh moved divided by the slot length).
/// `battery_charge_kw` and `battery_discharge_kw` are never both nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulatedInterval {
    /// The raw reading this interval was simulated from.
    #[serde(flatten)]
    pub reading: IntervalReading,
    /// Stored energy after this interval (kWh).
    pub battery_soc_kwh: f64,
    /// Stored energy after this interval as a share of capacity (0 when capacity is 0).
    pub battery_soc_percent: f64,
    /// Energy taken from the grid-facing side into the battery, as power (kW).
    pub battery_charge_kw: f64,
    /// Energy withdrawn from the cells, as power (kW).
    pub battery_discharge_kw: f64,
    /// Conversion losses of this interval, as power (kW).
    pub battery_loss_kw: f64,
    /// Grid import after the battery acted (kWh).
    pub grid_import_with_battery: f64,
    /// Grid export after the battery acted (kWh).
    pub grid_export_with_battery: f64,
}

impl SimulatedInterval {
    /// An interval where the battery did nothing and the grid sees `import`/`export`.
    pub fn passthrough(
        reading: IntervalReading,
        soc_kwh: f64,
        capacity_kwh: f64,
        import_kwh: f64,
        export_kwh: f64,
    ) -> Self {
        Self {
            reading,
            battery_soc_kwh: soc_kwh,
            battery_soc_percent: soc_percent(soc_kwh, capacity_kwh),
            battery_charge_kw: 0.0,
            battery_discharge_kw: 0.0,
            battery_loss_kw: 0.0,
            grid_import_with_battery: import_kwh,
            grid_export_with_battery: export_kwh,
        }
    }
}

pub(crate) fn soc_percent(soc_kwh: f64, capacity_kwh: f64) -> f64 {
    if capacity_kwh > 0.0 {
        soc_kwh / capacity_kwh * 100.0
    } else {
        0.0
    }
}

impl fmt::Display for SimulatedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | pv={:>6.2} kW | import={:.3}->{:.3} kWh  export={:.3}->{:.3} kWh | \
             chg={:.2} dis={:.2} loss={:.2} kW (SoC={:.2} kWh, {:.1}%)",
            self.reading.timestamp.format("%Y-%m-%d %H:%M"),
            self.reading.production_kw,
            self.reading.import_kwh,
            self.grid_import_with_battery,
            self.reading.export_kwh,
            self.grid_export_with_battery,
            self.battery_charge_kw,
            self.battery_discharge_kw,
            self.battery_loss_kw,
            self.battery_soc_kwh,
            self.battery_soc_percent,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn net_balance_sign() {
        assert!(IntervalReading::new(ts(), 0.0, 0.2, 1.0).is_surplus());
        assert!(!IntervalReading::new(ts(), 0.0, 1.0, 0.2).is_surplus());
        assert!(!IntervalReading::new(ts(), 0.0, 0.5, 0.5).is_surplus());
    }

    #[test]
    fn negative_field_detection() {
        assert!(IntervalReading::new(ts(), -0.1, 0.0, 0.0).has_negative_field());
        assert!(!IntervalReading::new(ts(), 0.0, 0.0, 0.0).has_negative_field());
    }

    #[test]
    fn soc_percent_guards_zero_capacity() {
        assert_eq!(soc_percent(0.0, 0.0), 0.0);
        assert_eq!(soc_percent(1.0, 4.0), 25.0);
    }

    #[test]
    fn display_does_not_panic() {
        let r = IntervalReading::new(ts(), 3.0, 0.0, 0.5);
        let s = SimulatedInterval::passthrough(r, 1.0, 10.0, 0.0, 0.5);
        assert!(!format!("{s}").is_empty());
    }
}
