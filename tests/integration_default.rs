//! Integration tests for single-run dispatch, metrics, and cost.

mod common;

use approx::assert_relative_eq;
use pv_battery_sim::runner::run;
use pv_battery_sim::sim::battery::InverterMode;
use pv_battery_sim::sim::dispatch::simulate;
use pv_battery_sim::sim::metrics::MetricsSnapshot;
use pv_battery_sim::sim::tariff::Pricing;

const EPS: f64 = 1e-9;

#[test]
fn concrete_scenario_soc_trace() {
    let out = simulate(&common::four_interval_timeline(), &common::small_battery()).unwrap();
    let soc: Vec<f64> = out.iter().map(|s| s.battery_soc_kwh).collect();
    let expected = [1.16, 1.7744, 0.7744, 0.2];
    for (got, want) in soc.iter().zip(expected) {
        assert_relative_eq!(*got, want, epsilon = EPS);
    }
}

#[test]
fn concrete_scenario_flows() {
    let out = simulate(&common::four_interval_timeline(), &common::small_battery()).unwrap();

    // headroom-bounded charge: 1.0 kWh then 0.64 kWh
    assert_relative_eq!(out[0].battery_charge_kw, 4.0, epsilon = EPS);
    assert_relative_eq!(out[1].battery_charge_kw, 2.56, epsilon = EPS);
    assert_relative_eq!(out[0].grid_export_with_battery, 0.0, epsilon = EPS);
    assert_relative_eq!(out[1].grid_export_with_battery, 0.36, epsilon = EPS);

    // min-SOC-bounded discharge: 1.0 kWh then 0.5744 kWh
    assert_relative_eq!(out[2].battery_discharge_kw, 4.0, epsilon = EPS);
    assert_relative_eq!(out[3].battery_discharge_kw, 2.2976, epsilon = EPS);
    assert_relative_eq!(out[2].grid_import_with_battery, 0.08, epsilon = EPS);
    assert_relative_eq!(out[3].grid_import_with_battery, 0.471552, epsilon = EPS);

    let losses: Vec<f64> = out.iter().map(|s| s.battery_loss_kw).collect();
    for (got, want) in losses.iter().zip([0.16, 0.1024, 0.32, 0.183808]) {
        assert_relative_eq!(*got, want, epsilon = EPS);
    }
    assert_relative_eq!(out[1].battery_soc_percent, 88.72, epsilon = 1e-7);
}

#[test]
fn runs_are_bit_identical() {
    let timeline = common::synthetic_week(42);
    for mode in [InverterMode::Asymmetric, InverterMode::Symmetric] {
        let cfg = common::battery(mode);
        let a = run(&timeline, &cfg, &Pricing::default()).unwrap();
        let b = run(&timeline, &cfg, &Pricing::default()).unwrap();
        assert_eq!(a.simulated, b.simulated);
        assert_eq!(a.after, b.after);
        assert_eq!(a.financials, b.financials);
    }
}

#[test]
fn never_charges_and_discharges_together() {
    for timeline in [common::synthetic_week(1), common::mixed_timeline()] {
        for mode in [InverterMode::Asymmetric, InverterMode::Symmetric] {
            for s in simulate(&timeline, &common::battery(mode)).unwrap() {
                assert!(
                    s.battery_charge_kw == 0.0 || s.battery_discharge_kw == 0.0,
                    "{mode:?} at {}: charge {} discharge {}",
                    s.reading.timestamp,
                    s.battery_charge_kw,
                    s.battery_discharge_kw
                );
            }
        }
    }
}

#[test]
fn soc_stays_within_bounds() {
    for mode in [InverterMode::Asymmetric, InverterMode::Symmetric] {
        let cfg = common::battery(mode);
        let (lo, hi) = (cfg.min_soc_kwh(), cfg.max_soc_kwh());
        for s in simulate(&common::synthetic_week(3), &cfg).unwrap() {
            assert!(s.battery_soc_kwh >= lo - EPS && s.battery_soc_kwh <= hi + EPS);
        }
    }
}

#[test]
fn energy_is_conserved_per_interval() {
    for timeline in [common::synthetic_week(5), common::mixed_timeline()] {
        for mode in [InverterMode::Asymmetric, InverterMode::Symmetric] {
            let cfg = common::battery(mode);
            for s in simulate(&timeline, &cfg).unwrap() {
                let charged = s.battery_charge_kw * cfg.slot_hours;
                let delivered =
                    s.battery_discharge_kw * cfg.slot_hours * cfg.discharge_efficiency;
                let lhs = s.grid_import_with_battery - s.grid_export_with_battery;
                let rhs = s.reading.import_kwh - s.reading.export_kwh + charged - delivered;
                assert_relative_eq!(lhs, rhs, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn asymmetric_mode_never_imports_and_exports_together() {
    let cfg = common::battery(InverterMode::Asymmetric);
    for s in simulate(&common::mixed_timeline(), &cfg).unwrap() {
        assert!(s.grid_import_with_battery == 0.0 || s.grid_export_with_battery == 0.0);
    }
}

#[test]
fn zero_capacity_reproduces_baseline() {
    let timeline = common::synthetic_week(11);
    for mode in [InverterMode::Asymmetric, InverterMode::Symmetric] {
        let cfg = common::battery(mode).with_capacity(0.0);
        let report = run(&timeline, &cfg, &Pricing::default()).unwrap();
        let baseline = MetricsSnapshot::baseline(&timeline, cfg.slot_hours);
        assert_relative_eq!(report.after.grid_import_kwh, baseline.grid_import_kwh, epsilon = EPS);
        assert_relative_eq!(report.after.grid_export_kwh, baseline.grid_export_kwh, epsilon = EPS);
        assert_relative_eq!(report.after.battery_losses_kwh, 0.0);
        assert_relative_eq!(report.financials.total_savings, 0.0, epsilon = 1e-6);
        assert!(report.simulated.iter().all(|s| s.battery_soc_percent == 0.0));
    }
}

#[test]
fn battery_reduces_cost_on_a_sunny_week() {
    let report = run(
        &common::synthetic_week(42),
        &common::battery(InverterMode::Asymmetric),
        &Pricing::default(),
    )
    .unwrap();
    assert!(report.improvements.grid_import_reduction_kwh > 0.0);
    assert!(report.improvements.grid_export_reduction_kwh > 0.0);
    assert!(report.after.battery_self_consumption_kwh > 0.0);
    assert!(report.financials.scenario_cost < report.financials.baseline_cost);
    assert!(report.financials.savings_percent > 0.0);
}

#[test]
fn window_spans_first_to_last_timestamp() {
    let report = run(
        &common::synthetic_week(42),
        &common::battery(InverterMode::Asymmetric),
        &Pricing::default(),
    )
    .unwrap();
    // 7 days of quarter-hours: last slot starts 15 minutes before the end
    let expected = 7.0 - 0.25 / 24.0;
    assert_relative_eq!(report.financials.window_days, expected, epsilon = 1e-9);
    assert_relative_eq!(
        report.financials.prorated_tier1_limit_kwh,
        2523.0 * expected / 365.0,
        epsilon = 1e-9
    );
}

#[test]
fn negative_readings_run_to_completion() {
    let timeline = common::timeline(&[(-0.2, 0.0, -0.5), (3.0, 0.0, 0.8), (0.0, -0.1, 0.0)]);
    for mode in [InverterMode::Asymmetric, InverterMode::Symmetric] {
        let report = run(&timeline, &common::battery(mode), &Pricing::default()).unwrap();
        assert_eq!(report.simulated.len(), 3);
        assert!(report.financials.total_savings.is_finite());
    }
}
