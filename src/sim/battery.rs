use serde::{Deserialize, Serialize};
use tracing::warn;

use super::tariff::Currency;
use crate::config::ConfigError;
use crate::error::{Result, SimError};

/// Charge efficiency substituted when a scenario file carries an out-of-range value.
pub const DEFAULT_CHARGE_EFFICIENCY: f64 = 0.96;
/// Discharge efficiency substituted when a scenario file carries an out-of-range value.
pub const DEFAULT_DISCHARGE_EFFICIENCY: f64 = 0.92;
/// Slot length of 15-minute meter data, in hours.
pub const QUARTER_HOUR: f64 = 0.25;

/// How the inverter combines import and export with battery dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InverterMode {
    /// Net-metering inverter: import and export are netted before the battery acts.
    #[default]
    Asymmetric,
    /// Charge from export and discharge against import independently, no netting.
    Symmetric,
}

/// Immutable parameters of one battery simulation run.
///
/// The value is `Copy`; sweeps derive per-candidate configs with
/// [`BatteryConfig::with_capacity`] instead of mutating a shared instance.
///
/// # Examples
///
/// ```
/// use pv_battery_sim::sim::battery::BatteryConfig;
///
/// let cfg = BatteryConfig::default().with_capacity(5.0);
/// assert_eq!(cfg.capacity_kwh, 5.0);
/// assert_eq!(cfg.min_soc_kwh(), 0.5);
/// assert_eq!(cfg.max_charge_per_slot_kwh(), 1.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable capacity (kWh, >= 0).
    pub capacity_kwh: f64,
    /// Fraction of charged energy that ends up stored (0..=1, exclusive of 0).
    pub charge_efficiency: f64,
    /// Fraction of withdrawn energy that reaches the household (0..=1, exclusive of 0).
    pub discharge_efficiency: f64,
    /// Maximum charging power (kW).
    pub max_charge_rate_kw: f64,
    /// Maximum discharging power (kW).
    pub max_discharge_rate_kw: f64,
    /// Lower SOC bound in percent of capacity; also the initial SOC.
    pub min_soc_percent: f64,
    /// Upper SOC bound in percent of capacity.
    pub max_soc_percent: f64,
    pub inverter_mode: InverterMode,
    /// Selects the price table used for the financial summary.
    pub currency: Currency,
    /// Length of one timeline slot in hours.
    pub slot_hours: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 10.0,
            charge_efficiency: DEFAULT_CHARGE_EFFICIENCY,
            discharge_efficiency: DEFAULT_DISCHARGE_EFFICIENCY,
            max_charge_rate_kw: 5.0,
            max_discharge_rate_kw: 5.0,
            min_soc_percent: 10.0,
            max_soc_percent: 90.0,
            inverter_mode: InverterMode::Asymmetric,
            currency: Currency::Huf,
            slot_hours: QUARTER_HOUR,
        }
    }
}

impl BatteryConfig {
    /// Returns a copy with only the capacity replaced.
    #[must_use]
    pub const fn with_capacity(self, capacity_kwh: f64) -> Self {
        Self {
            capacity_kwh,
            ..self
        }
    }

    pub fn min_soc_kwh(&self) -> f64 {
        self.min_soc_percent / 100.0 * self.capacity_kwh
    }

    pub fn max_soc_kwh(&self) -> f64 {
        self.max_soc_percent / 100.0 * self.capacity_kwh
    }

    /// Charge rate limit converted to energy per slot (kWh).
    pub fn max_charge_per_slot_kwh(&self) -> f64 {
        self.max_charge_rate_kw * self.slot_hours
    }

    /// Discharge rate limit converted to energy per slot (kWh).
    pub fn max_discharge_per_slot_kwh(&self) -> f64 {
        self.max_discharge_rate_kw * self.slot_hours
    }

    /// Checks every bound and returns the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        match self.errors().into_iter().next() {
            Some(e) => Err(SimError::Configuration(e)),
            None => Ok(()),
        }
    }

    /// Checks every bound and returns all violations, in field order.
    pub fn errors(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: &str| {
            errors.push(ConfigError::new(format!("battery.{field}"), message));
        };

        if !self.capacity_kwh.is_finite() || self.capacity_kwh < 0.0 {
            push("capacity_kwh", "must be >= 0");
        }
        if !is_efficiency(self.charge_efficiency) {
            push("charge_efficiency", "must be in (0, 1]");
        }
        if !is_efficiency(self.discharge_efficiency) {
            push("discharge_efficiency", "must be in (0, 1]");
        }
        if !is_non_negative(self.max_charge_rate_kw) {
            push("max_charge_rate_kw", "must be >= 0");
        }
        if !is_non_negative(self.max_discharge_rate_kw) {
            push("max_discharge_rate_kw", "must be >= 0");
        }
        let min_in_range = (0.0..=100.0).contains(&self.min_soc_percent);
        let max_in_range = (0.0..=100.0).contains(&self.max_soc_percent);
        if !min_in_range {
            push("min_soc_percent", "must be in [0, 100]");
        }
        if !max_in_range {
            push("max_soc_percent", "must be in [0, 100]");
        }
        if min_in_range && max_in_range && self.min_soc_percent >= self.max_soc_percent {
            push("min_soc_percent", "must be < battery.max_soc_percent");
        }
        if !(self.slot_hours > 0.0 && self.slot_hours.is_finite()) {
            push("slot_hours", "must be > 0");
        }
        errors
    }

    /// Replaces out-of-range efficiencies with the documented defaults, logging each substitution.
    #[must_use]
    pub fn with_efficiency_fallback(mut self) -> Self {
        if !is_efficiency(self.charge_efficiency) {
            warn!(
                given = self.charge_efficiency,
                fallback = DEFAULT_CHARGE_EFFICIENCY,
                "charge efficiency must be in (0, 1], using default"
            );
            self.charge_efficiency = DEFAULT_CHARGE_EFFICIENCY;
        }
        if !is_efficiency(self.discharge_efficiency) {
            warn!(
                given = self.discharge_efficiency,
                fallback = DEFAULT_DISCHARGE_EFFICIENCY,
                "discharge efficiency must be in (0, 1], using default"
            );
            self.discharge_efficiency = DEFAULT_DISCHARGE_EFFICIENCY;
        }
        self
    }
}

fn is_efficiency(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

/// False for NaN as well as negative values.
fn is_non_negative(value: f64) -> bool {
    value >= 0.0
}
