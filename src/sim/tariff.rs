//! Two-tier progressive import tariff with a flat export price.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{IntervalReading, SimulatedInterval};
use crate::error::{Result, SimError};

const DAYS_PER_YEAR: f64 = 365.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Currency of a price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Huf,
    Eur,
}

impl Currency {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Huf => "HUF",
            Self::Eur => "EUR",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Huf => "Ft",
            Self::Eur => "€",
        }
    }

    /// Decimal places used when money in this currency is printed or exported.
    pub const fn decimal_places(self) -> usize {
        match self {
            Self::Huf => 0,
            Self::Eur => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Prices of one currency, all per kWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceTable {
    /// Import price up to the tier-1 limit.
    pub tier1_import_price: f64,
    /// Import price above the tier-1 limit.
    pub tier2_import_price: f64,
    /// Flat compensation for exported energy.
    pub export_price: f64,
    /// Tier-1 allowance for a full year (kWh); prorated to the simulated window.
    pub annual_tier1_limit_kwh: f64,
}

impl PriceTable {
    pub const HUF: Self = Self {
        tier1_import_price: 36.0,
        tier2_import_price: 70.0,
        export_price: 5.0,
        annual_tier1_limit_kwh: 2523.0,
    };

    pub const EUR: Self = Self {
        tier1_import_price: 0.09,
        tier2_import_price: 0.18,
        export_price: 0.01,
        annual_tier1_limit_kwh: 2523.0,
    };

    /// Tier-1 allowance scaled to a window of `window_days`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pv_battery_sim::sim::tariff::PriceTable;
    ///
    /// assert_eq!(PriceTable::HUF.prorated_tier1_limit(365.0), 2523.0);
    /// ```
    pub fn prorated_tier1_limit(&self, window_days: f64) -> f64 {
        self.annual_tier1_limit_kwh * (window_days / DAYS_PER_YEAR)
    }

    /// Import cost of `import_kwh` given `imported_so_far` kWh already billed.
    fn import_cost(&self, imported_so_far: f64, import_kwh: f64, tier1_limit: f64) -> f64 {
        let after = imported_so_far + import_kwh;
        if after <= tier1_limit {
            import_kwh * self.tier1_import_price
        } else if imported_so_far >= tier1_limit {
            import_kwh * self.tier2_import_price
        } else {
            let tier1_kwh = tier1_limit - imported_so_far;
            let tier2_kwh = import_kwh - tier1_kwh;
            tier1_kwh * self.tier1_import_price + tier2_kwh * self.tier2_import_price
        }
    }

    /// Total cost of a per-interval import/export series over a window of `window_days`.
    ///
    /// Intervals are billed in order; an interval whose import crosses the
    /// prorated tier-1 limit is split between the two rates. Export is credited
    /// at the flat export price. The cumulative import counter is local to the call.
    ///
    /// # Errors
    ///
    /// [`SimError::EmptyTimeline`] when there are no intervals and
    /// [`SimError::LengthMismatch`] when the two series differ in length.
    pub fn cost(&self, imports: &[f64], exports: &[f64], window_days: f64) -> Result<f64> {
        if imports.len() != exports.len() {
            return Err(SimError::LengthMismatch {
                imports: imports.len(),
                exports: exports.len(),
            });
        }
        if imports.is_empty() {
            return Err(SimError::EmptyTimeline);
        }

        let tier1_limit = self.prorated_tier1_limit(window_days);
        let (total, _) = imports.iter().zip(exports).fold(
            (0.0, 0.0),
            |(total, imported_so_far), (&import_kwh, &export_kwh)| {
                let import_cost = self.import_cost(imported_so_far, import_kwh, tier1_limit);
                let export_revenue = export_kwh * self.export_price;
                (
                    total + import_cost - export_revenue,
                    imported_so_far + import_kwh,
                )
            },
        );
        Ok(total)
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::HUF
    }
}

/// One price table per supported currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pricing {
    pub huf: PriceTable,
    pub eur: PriceTable,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            huf: PriceTable::HUF,
            eur: PriceTable::EUR,
        }
    }
}

impl Pricing {
    pub const fn table(&self, currency: Currency) -> &PriceTable {
        match currency {
            Currency::Huf => &self.huf,
            Currency::Eur => &self.eur,
        }
    }
}

/// Length of the window spanned by the timeline, first to last timestamp, in days.
///
/// Returns 0 for an empty or single-reading timeline.
pub fn window_days(timeline: &[IntervalReading]) -> f64 {
    match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) => span_days(first, last),
        _ => 0.0,
    }
}

fn span_days(first: &IntervalReading, last: &IntervalReading) -> f64 {
    let span = last.timestamp - first.timestamp;
    span.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Cost comparison between the raw timeline and the battery scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub baseline_cost: f64,
    pub scenario_cost: f64,
    /// `baseline_cost - scenario_cost`.
    pub total_savings: f64,
    /// Savings relative to the baseline cost; 0 when the baseline cost is not positive.
    pub savings_percent: f64,
    pub currency: Currency,
    pub window_days: f64,
    pub annual_tier1_limit_kwh: f64,
    pub prorated_tier1_limit_kwh: f64,
}

impl FinancialSummary {
    /// Prices the raw and simulated import/export series with the table for `currency`.
    ///
    /// # Errors
    ///
    /// Propagates [`PriceTable::cost`] errors, e.g. for an empty timeline.
    pub fn compute(
        simulated: &[SimulatedInterval],
        pricing: &Pricing,
        currency: Currency,
    ) -> Result<Self> {
        let table = pricing.table(currency);
        let window_days = match (simulated.first(), simulated.last()) {
            (Some(first), Some(last)) => span_days(&first.reading, &last.reading),
            _ => 0.0,
        };

        let baseline_imports: Vec<f64> =
            simulated.iter().map(|s| s.reading.import_kwh).collect();
        let baseline_exports: Vec<f64> =
            simulated.iter().map(|s| s.reading.export_kwh).collect();
        let scenario_imports: Vec<f64> =
            simulated.iter().map(|s| s.grid_import_with_battery).collect();
        let scenario_exports: Vec<f64> =
            simulated.iter().map(|s| s.grid_export_with_battery).collect();

        let baseline_cost = table.cost(&baseline_imports, &baseline_exports, window_days)?;
        let scenario_cost = table.cost(&scenario_imports, &scenario_exports, window_days)?;
        let total_savings = baseline_cost - scenario_cost;
        let savings_percent = if baseline_cost > 0.0 {
            total_savings / baseline_cost * 100.0
        } else {
            0.0
        };

        Ok(Self {
            baseline_cost,
            scenario_cost,
            total_savings,
            savings_percent,
            currency,
            window_days,
            annual_tier1_limit_kwh: table.annual_tier1_limit_kwh,
            prorated_tier1_limit_kwh: table.prorated_tier1_limit(window_days),
        })
    }
}

impl fmt::Display for FinancialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        let sym = self.currency.symbol();
        writeln!(f, "--- Financials ({}) ---", self.currency)?;
        writeln!(
            f,
            "Window:                {:.1} days (tier-1 limit {:.1} of {:.0} kWh/yr)",
            self.window_days, self.prorated_tier1_limit_kwh, self.annual_tier1_limit_kwh
        )?;
        writeln!(f, "Baseline cost:         {:.dp$} {sym}", self.baseline_cost)?;
        writeln!(f, "Battery cost:          {:.dp$} {sym}", self.scenario_cost)?;
        write!(
            f,
            "Savings:               {:.dp$} {sym} ({:.1}%)",
            self.total_savings, self.savings_percent
        )
    }
}
