//! PV + battery simulator entry point: CLI wiring and config-driven runs.

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pv_battery_sim::cli::Cli;
use pv_battery_sim::config::ScenarioConfig;
use pv_battery_sim::io::export::{export_curve_csv, export_timeline_csv};
use pv_battery_sim::io::timeline::{check_slot_spacing, read_timeline};
use pv_battery_sim::runner::run;
use pv_battery_sim::sim::sweep::{sweep, sweep_parallel};

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_scenario(cli: &Cli) -> anyhow::Result<ScenarioConfig> {
    // --scenario takes priority, then --preset, then baseline default
    let mut scenario = match cli.scenario {
        Some(ref path) => ScenarioConfig::from_toml_file(path)?,
        None => ScenarioConfig::from_preset(cli.preset_name())?,
    };

    if let Some(seed) = cli.seed {
        scenario.synthetic.seed = seed;
    }
    if let Some(capacity) = cli.capacity {
        scenario.battery.capacity_kwh = capacity;
    }
    if cli.parallel {
        scenario.sweep.parallel = true;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("scenario has {} invalid field(s)", errors.len());
    }
    Ok(scenario)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let scenario = load_scenario(&cli)?;
    let battery = scenario.battery_config();

    let timeline = match cli.timeline {
        Some(ref path) => {
            let timeline = read_timeline(path)
                .with_context(|| format!("failed to read timeline {}", path.display()))?;
            check_slot_spacing(&timeline, battery.slot_hours).with_context(|| {
                format!("timeline {} does not match the slot length", path.display())
            })?;
            timeline
        }
        None => {
            info!(
                days = scenario.synthetic.days,
                seed = scenario.synthetic.seed,
                "no timeline given, generating synthetic data"
            );
            scenario.synthetic.generate()
        }
    };

    let report = run(&timeline, &battery, &scenario.pricing)?;

    if let Some(ref path) = cli.timeline_out {
        export_timeline_csv(&report.simulated, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "simulated timeline written");
    }

    let curve = if cli.sweep {
        let candidates = scenario.candidates()?;
        let points = if scenario.sweep.parallel {
            sweep_parallel(&timeline, &battery, &scenario.pricing, &candidates)?
        } else {
            sweep(&timeline, &battery, &scenario.pricing, &candidates)?
        };
        if let Some(ref path) = cli.curve_out {
            export_curve_csv(&points, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "sweep curve written");
        }
        Some(points)
    } else {
        None
    };

    if cli.json {
        let json = serde_json::json!({ "report": report, "curve": curve });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{report}");
    if let Some(points) = curve {
        let sym = battery.currency.symbol();
        let dp = battery.currency.decimal_places();
        println!("\n--- Capacity sweep ---");
        for p in &points {
            println!(
                "{:>7.1} kWh  import -{:>5.1}%  export -{:>5.1}%  savings {:>10.dp$} {sym} ({:.1}%)",
                p.capacity_kwh,
                p.grid_import_reduction_percent,
                p.grid_export_reduction_percent,
                p.total_savings,
                p.savings_percent,
            );
        }
    }
    Ok(())
}
