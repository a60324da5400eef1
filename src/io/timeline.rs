//! CSV import of the merged `timestamp,production_kw,import_kwh,export_kwh` timeline.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, SimError};
use crate::sim::types::IntervalReading;

/// Reads a merged timeline from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row fails to parse.
pub fn read_timeline(path: &Path) -> Result<Vec<IntervalReading>> {
    let file = File::open(path)?;
    let timeline = read_timeline_from(io::BufReader::new(file))?;
    debug!(path = %path.display(), intervals = timeline.len(), "timeline loaded");
    Ok(timeline)
}

/// Reads a merged timeline from any reader.
///
/// Columns are matched by header name, extra columns are ignored, and
/// timestamps use ISO-8601 (`2024-06-01T12:00:00`). Out-of-order rows are
/// sorted by timestamp.
///
/// # Errors
///
/// Returns [`SimError::Csv`](crate::error::SimError::Csv) for a malformed row.
pub fn read_timeline_from(reader: impl Read) -> Result<Vec<IntervalReading>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut timeline = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<IntervalReading>, _>>()?;

    if !timeline.is_sorted_by_key(|r| r.timestamp) {
        warn!("timeline rows are out of order, sorting by timestamp");
        timeline.sort_by_key(|r| r.timestamp);
    }
    Ok(timeline)
}

/// Checks that consecutive rows are `slot_hours` apart.
///
/// Dispatch converts rate limits and energies with the configured slot
/// length, so the smallest row spacing must match it. Larger spacings are
/// gaps in the data and only logged.
///
/// # Errors
///
/// Returns [`SimError::Configuration`] for duplicate timestamps or when the
/// row spacing differs from `slot_hours`.
pub fn check_slot_spacing(timeline: &[IntervalReading], slot_hours: f64) -> Result<()> {
    let expected = slot_hours * 3600.0;
    let steps: Vec<f64> = timeline
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_seconds() as f64)
        .collect();
    let Some(smallest) = steps.iter().copied().reduce(f64::min) else {
        return Ok(());
    };

    if smallest <= 0.0 {
        return Err(SimError::config("timeline", "duplicate timestamps"));
    }
    // one second of slack for exported timestamps that drift
    if (smallest - expected).abs() > 1.0 {
        return Err(SimError::config(
            "timeline",
            format!(
                "rows are {} h apart but battery.slot_hours is {slot_hours}",
                smallest / 3600.0
            ),
        ));
    }

    let gaps = steps.iter().filter(|&&s| (s - expected).abs() > 1.0).count();
    if gaps > 0 {
        warn!(gaps, slot_hours, "timeline has gaps between slots");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
timestamp,production_kw,import_kwh,export_kwh
2024-06-01T11:00:00,4.0,0.0,1.0
2024-06-01T11:15:00,4.0,0.0,1.0
2024-06-01T11:30:00,0.0,1.0,0.0
";

    #[test]
    fn parses_rows_in_order() {
        let t = read_timeline_from(CSV.as_bytes()).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t[0].production_kw, 4.0);
        assert_eq!(t[2].import_kwh, 1.0);
        assert_eq!(t[1].timestamp.to_string(), "2024-06-01 11:15:00");
    }

    #[test]
    fn out_of_order_rows_are_sorted() {
        let csv = "\
timestamp,production_kw,import_kwh,export_kwh
2024-06-01T11:15:00,1.0,0.0,0.0
2024-06-01T11:00:00,2.0,0.0,0.0
";
        let t = read_timeline_from(csv.as_bytes()).unwrap();
        assert_eq!(t[0].production_kw, 2.0);
        assert_eq!(t[1].production_kw, 1.0);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "\
timestamp,production_kw,import_kwh,export_kwh,battery_soc_kwh
2024-06-01T11:00:00,4.0,0.0,1.0,0.2
";
        let t = read_timeline_from(csv.as_bytes()).unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn header_only_is_empty() {
        let t = read_timeline_from("timestamp,production_kw,import_kwh,export_kwh\n".as_bytes());
        assert!(t.unwrap().is_empty());
    }

    #[test]
    fn malformed_number_is_a_csv_error() {
        let csv = "\
timestamp,production_kw,import_kwh,export_kwh
2024-06-01T11:00:00,four,0.0,1.0
";
        assert!(matches!(
            read_timeline_from(csv.as_bytes()),
            Err(SimError::Csv(_))
        ));
    }

    const HOURLY: &str = "\
timestamp,production_kw,import_kwh,export_kwh
2024-06-01T11:00:00,4.0,0.0,4.0
2024-06-01T12:00:00,4.0,0.0,4.0
";

    #[test]
    fn hourly_rows_rejected_for_quarter_hour_slots() {
        let t = read_timeline_from(HOURLY.as_bytes()).unwrap();
        match check_slot_spacing(&t, 0.25) {
            Err(SimError::Configuration(e)) => {
                assert_eq!(e.field, "timeline");
                assert!(e.message.contains("slot_hours"), "{}", e.message);
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn hourly_rows_accepted_for_hour_slots() {
        let t = read_timeline_from(HOURLY.as_bytes()).unwrap();
        assert!(check_slot_spacing(&t, 1.0).is_ok());
    }

    #[test]
    fn quarter_hour_rows_match_default_slot() {
        let t = read_timeline_from(CSV.as_bytes()).unwrap();
        assert!(check_slot_spacing(&t, 0.25).is_ok());
    }

    #[test]
    fn gaps_between_slots_are_allowed() {
        let csv = "\
timestamp,production_kw,import_kwh,export_kwh
2024-06-01T11:00:00,0.0,0.0,0.0
2024-06-01T11:15:00,0.0,0.0,0.0
2024-06-01T13:00:00,0.0,0.0,0.0
";
        let t = read_timeline_from(csv.as_bytes()).unwrap();
        assert!(check_slot_spacing(&t, 0.25).is_ok());
    }

    #[test]
    fn duplicate_timestamps_rejected() {
        let csv = "\
timestamp,production_kw,import_kwh,export_kwh
2024-06-01T11:00:00,0.0,0.0,0.0
2024-06-01T11:00:00,0.0,0.0,0.0
";
        let t = read_timeline_from(csv.as_bytes()).unwrap();
        assert!(matches!(
            check_slot_spacing(&t, 0.25),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn short_timelines_have_no_spacing() {
        assert!(check_slot_spacing(&[], 0.25).is_ok());
        let t = read_timeline_from(HOURLY.as_bytes()).unwrap();
        assert!(check_slot_spacing(&t[..1], 0.25).is_ok());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_timeline(Path::new("/nonexistent/timeline.csv"));
        assert!(matches!(err, Err(SimError::Io(_))));
    }
}
