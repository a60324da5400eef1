//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use pv_battery_sim::sim::battery::{BatteryConfig, InverterMode};
use pv_battery_sim::sim::types::IntervalReading;
use pv_battery_sim::synthetic::SyntheticProfile;

/// Start of every hand-built fixture timeline.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .and_then(|d| d.and_hms_opt(11, 0, 0))
        .unwrap()
}

/// Quarter-hour readings from `(production_kw, import_kwh, export_kwh)` tuples.
pub fn timeline(rows: &[(f64, f64, f64)]) -> Vec<IntervalReading> {
    rows.iter()
        .enumerate()
        .map(|(i, &(p, imp, exp))| {
            IntervalReading::new(start() + TimeDelta::minutes(15 * i as i64), p, imp, exp)
        })
        .collect()
}

/// Two surplus slots followed by two deficit slots, 1 kWh each.
pub fn four_interval_timeline() -> Vec<IntervalReading> {
    timeline(&[
        (4.0, 0.0, 1.0),
        (4.0, 0.0, 1.0),
        (0.0, 1.0, 0.0),
        (0.0, 1.0, 0.0),
    ])
}

/// 2 kWh asymmetric battery (0.96/0.92, 10-90 %, 5 kW) used by the concrete scenario.
pub fn small_battery() -> BatteryConfig {
    BatteryConfig::default().with_capacity(2.0)
}

pub fn battery(mode: InverterMode) -> BatteryConfig {
    BatteryConfig {
        inverter_mode: mode,
        ..BatteryConfig::default()
    }
}

/// One synthetic week with the default household profile.
pub fn synthetic_week(seed: u64) -> Vec<IntervalReading> {
    SyntheticProfile {
        days: 7,
        seed,
        ..SyntheticProfile::default()
    }
    .generate()
}

/// Synthetic readings with simultaneous import and export in some slots.
pub fn mixed_timeline() -> Vec<IntervalReading> {
    timeline(&[
        (3.0, 0.2, 0.6),
        (2.0, 0.5, 0.1),
        (0.0, 0.9, 0.0),
        (5.0, 0.0, 1.2),
        (1.0, 0.3, 0.3),
        (0.0, 0.8, 0.0),
        (0.5, 0.4, 0.05),
        (0.0, 0.0, 0.0),
    ])
}
