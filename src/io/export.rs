//! CSV export for sweep curves and simulated timelines.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::sim::sweep::CurvePoint;
use crate::sim::tariff::Currency;
use crate::sim::types::SimulatedInterval;

/// Column header of the per-interval timeline export.
const TIMELINE_HEADER: &str = "timestamp,production_kw,import_kwh,export_kwh,\
                               battery_soc_kwh,battery_soc_percent,battery_charge_kw,\
                               battery_discharge_kw,battery_loss_kw,\
                               grid_import_with_battery,grid_export_with_battery";

/// Timestamp layout shared with the timeline reader.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn curve_header(currency: Currency) -> [String; 9] {
    let sym = currency.symbol();
    [
        "Battery Capacity (kWh)".to_string(),
        "Grid Import Reduction (%)".to_string(),
        "Grid Import Reduction (kWh)".to_string(),
        "Grid Export Reduction (%)".to_string(),
        "Grid Export Reduction (kWh)".to_string(),
        format!("Total Savings ({sym})"),
        "Savings (%)".to_string(),
        format!("Baseline Cost ({sym})"),
        format!("Battery Cost ({sym})"),
    ]
}

/// Exports a capacity sweep to a CSV file at the given path.
///
/// # Errors
///
/// Returns [`SimError::Io`](crate::error::SimError::Io) if the file cannot be
/// created and [`SimError::Csv`](crate::error::SimError::Csv) if writing fails.
pub fn export_curve_csv(points: &[CurvePoint], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_curve_csv(points, io::BufWriter::new(file))
}

/// Writes a capacity sweep as CSV to any writer, one row per candidate.
///
/// Percent and kWh columns carry 2 decimals; cost columns carry the
/// currency's decimal places. The symbol in the header follows the currency
/// of the points (HUF for an empty sweep).
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_curve_csv(points: &[CurvePoint], writer: impl Write) -> Result<()> {
    let currency = points.first().map_or(Currency::Huf, |p| p.currency);
    let dp = currency.decimal_places();
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(curve_header(currency))?;

    for p in points {
        wtr.write_record(&[
            format!("{:.2}", p.capacity_kwh),
            format!("{:.2}", p.grid_import_reduction_percent),
            format!("{:.2}", p.grid_import_reduction_kwh),
            format!("{:.2}", p.grid_export_reduction_percent),
            format!("{:.2}", p.grid_export_reduction_kwh),
            format!("{:.dp$}", p.total_savings),
            format!("{:.2}", p.savings_percent),
            format!("{:.dp$}", p.baseline_cost),
            format!("{:.dp$}", p.scenario_cost),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a simulated timeline to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_timeline_csv(simulated: &[SimulatedInterval], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_timeline_csv(simulated, io::BufWriter::new(file))
}

/// Writes a simulated timeline as CSV to any writer.
///
/// The first four columns match the input timeline layout, so the file can be
/// read back with [`read_timeline`](super::timeline::read_timeline).
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_timeline_csv(simulated: &[SimulatedInterval], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(TIMELINE_HEADER.split(',').map(str::trim))?;

    for s in simulated {
        let r = &s.reading;
        wtr.write_record(&[
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", r.production_kw),
            format!("{:.4}", r.import_kwh),
            format!("{:.4}", r.export_kwh),
            format!("{:.4}", s.battery_soc_kwh),
            format!("{:.4}", s.battery_soc_percent),
            format!("{:.4}", s.battery_charge_kw),
            format!("{:.4}", s.battery_discharge_kw),
            format!("{:.4}", s.battery_loss_kw),
            format!("{:.4}", s.grid_import_with_battery),
            format!("{:.4}", s.grid_export_with_battery),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
