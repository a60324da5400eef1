//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::error::{Result as SimResult, SimError};
use crate::sim::battery::{BatteryConfig, InverterMode};
use crate::sim::sweep::CapacityCandidates;
use crate::sim::tariff::{Currency, PriceTable, Pricing};
use crate::synthetic::SyntheticProfile;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Battery and inverter parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Price tables for both currencies.
    #[serde(default)]
    pub pricing: Pricing,
    /// Capacity sweep parameters.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Synthetic timeline used when no CSV timeline is given.
    #[serde(default)]
    pub synthetic: SyntheticProfile,
}

/// Capacity sweep parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Candidate capacities (kWh), evaluated in order.
    pub capacities: Vec<f64>,
    /// Evaluate candidates on scoped threads.
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            capacities: CapacityCandidates::DEFAULT_KWH.to_vec(),
            parallel: false,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: 10 kWh asymmetric battery priced in HUF.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the symmetric-inverter preset.
    pub fn symmetric() -> Self {
        Self {
            battery: BatteryConfig {
                inverter_mode: InverterMode::Symmetric,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the baseline scenario priced in EUR.
    pub fn eur() -> Self {
        Self {
            battery: BatteryConfig {
                currency: Currency::Eur,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "symmetric", "eur"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "symmetric" => Ok(Self::symmetric()),
            "eur" => Ok(Self::eur()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Battery parameters with out-of-range efficiencies replaced by defaults.
    pub fn battery_config(&self) -> BatteryConfig {
        self.battery.with_efficiency_fallback()
    }

    /// Sweep candidates, deduplicated in order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for empty, negative, or non-finite candidates.
    pub fn candidates(&self) -> SimResult<CapacityCandidates> {
        CapacityCandidates::new(self.sweep.capacities.iter().copied())
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Efficiencies are checked after the fallback of [`Self::battery_config`].
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let battery = self.battery_config();
        errors.extend(battery.errors());

        validate_prices("pricing.huf", &self.pricing.huf, &mut errors);
        validate_prices("pricing.eur", &self.pricing.eur, &mut errors);

        if let Err(SimError::Configuration(e)) = self.candidates() {
            errors.push(e);
        }

        let syn = &self.synthetic;
        if syn.days == 0 {
            errors.push(ConfigError::new("synthetic.days", "must be > 0"));
        }
        if syn.slot_hours != battery.slot_hours {
            errors.push(ConfigError::new(
                "synthetic.slot_hours",
                format!("must equal battery.slot_hours ({})", battery.slot_hours),
            ));
        }
        if !(0.0..=24.0).contains(&syn.sunrise_hour)
            || !(0.0..=24.0).contains(&syn.sunset_hour)
            || syn.sunrise_hour >= syn.sunset_hour
        {
            errors.push(ConfigError::new(
                "synthetic.sunrise_hour",
                "must be < synthetic.sunset_hour, both within [0, 24]",
            ));
        }
        if syn.pv_peak_kw < 0.0 || syn.base_load_kw < 0.0 {
            errors.push(ConfigError::new(
                "synthetic.pv_peak_kw",
                "peak PV and base load must be >= 0",
            ));
        }
        if syn.pv_noise_std < 0.0 || syn.load_noise_std < 0.0 {
            errors.push(ConfigError::new(
                "synthetic.pv_noise_std",
                "noise standard deviations must be >= 0",
            ));
        }

        errors
    }
}

fn validate_prices(section: &str, table: &PriceTable, errors: &mut Vec<ConfigError>) {
    let prices = [
        ("tier1_import_price", table.tier1_import_price),
        ("tier2_import_price", table.tier2_import_price),
        ("export_price", table.export_price),
        ("annual_tier1_limit_kwh", table.annual_tier1_limit_kwh),
    ];
    for (name, value) in prices {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::new(
                format!("{section}.{name}"),
                "must be finite and >= 0",
            ));
        }
    }
}
