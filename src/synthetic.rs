//! Seeded synthetic household timelines for demos and tests.

use std::f64::consts::PI;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::sim::battery::QUARTER_HOUR;
use crate::sim::types::IntervalReading;

/// Parameters of a synthetic PV + household-load timeline.
///
/// Production follows a half-cosine between sunrise and sunset with
/// multiplicative Gaussian noise. Household load is a daily sinusoid with
/// additive Gaussian noise. Each slot then either imports the deficit or
/// exports the surplus, never both.
///
/// # Examples
///
/// ```
/// use pv_battery_sim::synthetic::SyntheticProfile;
///
/// let profile = SyntheticProfile { days: 2, ..SyntheticProfile::default() };
/// let timeline = profile.generate();
/// assert_eq!(timeline.len(), 2 * 96);
/// assert_eq!(timeline, profile.generate());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticProfile {
    /// Number of simulated days.
    pub days: usize,
    /// Slot length in hours; must divide a day evenly to keep days aligned.
    pub slot_hours: f64,
    /// Timestamp of the first slot.
    pub start: NaiveDateTime,
    /// Peak PV output under clear sky (kW).
    pub pv_peak_kw: f64,
    /// Hour of day production starts.
    pub sunrise_hour: f64,
    /// Hour of day production ends.
    pub sunset_hour: f64,
    /// Relative standard deviation of PV output.
    pub pv_noise_std: f64,
    /// Mean household load (kW).
    pub base_load_kw: f64,
    /// Amplitude of the daily load swing (kW).
    pub load_amplitude_kw: f64,
    /// Phase offset of the load sinusoid (radians).
    pub load_phase_rad: f64,
    /// Standard deviation of the load noise (kW).
    pub load_noise_std: f64,
    pub seed: u64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            days: 7,
            slot_hours: QUARTER_HOUR,
            start,
            pv_peak_kw: 5.0,
            sunrise_hour: 6.0,
            sunset_hour: 20.0,
            pv_noise_std: 0.1,
            base_load_kw: 0.8,
            load_amplitude_kw: 0.6,
            load_phase_rad: 1.2,
            load_noise_std: 0.1,
            seed: 42,
        }
    }
}

impl SyntheticProfile {
    /// Number of slots in one day, 0 for a non-positive slot length.
    pub fn slots_per_day(&self) -> usize {
        if self.slot_hours > 0.0 && self.slot_hours.is_finite() {
            (24.0 / self.slot_hours).round() as usize
        } else {
            0
        }
    }

    /// Clear-sky fraction of peak output at `hour` of the day.
    fn daylight_frac(&self, hour: f64) -> f64 {
        if hour < self.sunrise_hour || hour >= self.sunset_hour {
            return 0.0;
        }
        let span = self.sunset_hour - self.sunrise_hour;
        (PI * (hour - self.sunrise_hour) / span).sin()
    }

    /// Generates `days * slots_per_day` readings.
    ///
    /// The same profile, seed included, always yields the same timeline.
    pub fn generate(&self) -> Vec<IntervalReading> {
        let slots = self.days * self.slots_per_day();
        let step = TimeDelta::seconds((self.slot_hours * 3600.0).round() as i64);
        let mut rng = StdRng::seed_from_u64(self.seed);

        (0..slots)
            .map(|i| {
                let timestamp = self.start + step * i as i32;
                let hour = f64::from(timestamp.hour()) + f64::from(timestamp.minute()) / 60.0;

                let frac = self.daylight_frac(hour);
                let pv_kw = if frac > 0.0 {
                    let noise = gaussian_noise(&mut rng, self.pv_noise_std);
                    (self.pv_peak_kw * frac * (1.0 + noise)).max(0.0)
                } else {
                    0.0
                };

                let angle = 2.0 * PI * hour / 24.0 + self.load_phase_rad;
                let noise = gaussian_noise(&mut rng, self.load_noise_std);
                let load_kw = (self.base_load_kw + self.load_amplitude_kw * angle.sin() + noise)
                    .max(0.0);

                let net_kwh = (pv_kw - load_kw) * self.slot_hours;
                IntervalReading::new(timestamp, pv_kw, (-net_kwh).max(0.0), net_kwh.max(0.0))
            })
            .collect()
    }
}

/// Zero-mean Gaussian sample via Box-Muller.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev
}
