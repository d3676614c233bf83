//! Command-line driver for the ambulance dispatch simulation.
//!
//! Loads a city (the built-in sample or a JSON file), feeds it the
//! emergencies given on the command line, advances the clock and prints a
//! summary of the fleet, hospitals and recent activity.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dispatch_core::emergency::EmergencyReport;
use dispatch_core::priority::{Criticality, Disease};
use dispatch_core::scenario::{CityConfig, DispatchParams};
use dispatch_core::DispatchSimulation;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "dispatch",
    about = "Simulate ambulance dispatch over a city road network"
)]
struct Cli {
    /// City definition as JSON; defaults to the built-in ten-location sample city
    #[arg(long)]
    city: Option<PathBuf>,

    /// Dispatch parameters as JSON; unset fields keep their defaults
    #[arg(long)]
    params: Option<PathBuf>,

    /// Simulated minutes to run
    #[arg(long, default_value_t = 60)]
    minutes: u64,

    /// Seed for on-scene service times
    #[arg(long, env = "DISPATCH_SEED")]
    seed: Option<u64>,

    /// Emergency as caller:location:disease:age[:criticality][@minute], repeatable
    #[arg(long = "emergency", short = 'e', value_parser = parse_emergency)]
    emergencies: Vec<ScheduledReport>,

    /// Print the final state as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone)]
struct ScheduledReport {
    at: u64,
    report: EmergencyReport,
}

fn parse_emergency(raw: &str) -> Result<ScheduledReport, String> {
    // A trailing `@<digits>` is the report minute; any other '@' belongs to the caller.
    let (body, at) = match raw.rsplit_once('@') {
        Some((body, minute)) if !minute.is_empty() && minute.bytes().all(|b| b.is_ascii_digit()) => (
            body,
            minute
                .parse::<u64>()
                .map_err(|_| format!("invalid report minute '{minute}'"))?,
        ),
        _ => (raw, 0),
    };
    let fields: Vec<&str> = body.split(':').collect();
    if !(4..=5).contains(&fields.len()) {
        return Err(format!(
            "expected caller:location:disease:age[:criticality], got '{body}'"
        ));
    }
    let location = fields[1]
        .parse::<usize>()
        .map_err(|_| format!("invalid location index '{}'", fields[1]))?;
    let disease = fields[2].parse::<Disease>().map_err(|e| e.to_string())?;
    let age = fields[3]
        .parse::<u32>()
        .map_err(|_| format!("invalid age '{}'", fields[3]))?;
    let mut report = EmergencyReport::new(fields[0], location, disease, age);
    if let Some(level) = fields.get(4) {
        report = report.with_criticality(level.parse::<Criticality>().map_err(|e| e.to_string())?);
    }
    Ok(ScheduledReport { at, report })
}

fn load_city(path: Option<&PathBuf>) -> Result<CityConfig> {
    let Some(path) = path else {
        return Ok(CityConfig::sample());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read city file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid city file {}", path.display()))
}

fn load_params(path: Option<&PathBuf>, seed: Option<u64>) -> Result<DispatchParams> {
    let mut params = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read params file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid params file {}", path.display()))?
        }
        None => DispatchParams::default(),
    };
    if let Some(seed) = seed {
        params = params.with_seed(seed);
    }
    Ok(params)
}

fn print_tables(sim: &DispatchSimulation) {
    let locations = sim.locations();
    let place = |index: usize| {
        locations
            .get(index)
            .map_or("?", |location| location.name.as_str())
    };

    let stats = sim.statistics();
    println!("== t = {} min ==", stats.now);
    println!(
        "handled {} | dispatched {} | reassigned {} | pending {} | active {}",
        stats.handled, stats.dispatches, stats.reassignments, stats.pending, stats.active
    );
    match stats.average_response_minutes {
        Some(average) => println!("average response: {average:.1} min"),
        None => println!("average response: n/a"),
    }

    println!("\n-- fleet ({}/{} available) --", stats.idle_ambulances, stats.total_ambulances);
    for unit in sim.fleet_snapshot() {
        let job = unit
            .emergency
            .map(|id| format!(" case {id}"))
            .unwrap_or_default();
        println!(
            "{:<8} {:<18} at {:<16}{}",
            unit.id.to_string(),
            unit.state.label(),
            place(unit.location.0),
            job
        );
    }

    println!("\n-- hospitals ({}/{} beds used) --", stats.used_beds, stats.total_beds);
    for hospital in sim.hospital_occupancy() {
        println!(
            "{:<22} {:>2}/{:<2} {:<12} at {}",
            hospital.name,
            hospital.occupied,
            hospital.capacity,
            hospital.specialty.label(),
            place(hospital.location.0)
        );
    }

    let pending = sim.pending_queue();
    if !pending.is_empty() {
        println!("\n-- pending --");
        for emergency in pending {
            println!(
                "{} {:<12} {:<12} priority {}",
                emergency.id,
                emergency.caller,
                emergency.disease.label(),
                emergency.priority
            );
        }
    }

    println!("\n-- recent activity --");
    for entry in sim.activity_log().take(15) {
        println!("{entry}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let city = load_city(cli.city.as_ref())?;
    let params = load_params(cli.params.as_ref(), cli.seed)?;
    let mut sim = DispatchSimulation::new(city, params).context("invalid city configuration")?;

    let mut schedule = cli.emergencies;
    schedule.sort_by_key(|scheduled| scheduled.at);
    if let Some(late) = schedule.iter().find(|scheduled| scheduled.at > cli.minutes) {
        bail!(
            "emergency for '{}' is scheduled at minute {}, after the run ends at {}",
            late.report.caller,
            late.at,
            cli.minutes
        );
    }
    info!(
        minutes = cli.minutes,
        emergencies = schedule.len(),
        "starting dispatch run"
    );

    let mut upcoming = schedule.into_iter().peekable();
    for minute in 0..=cli.minutes {
        while let Some(scheduled) = upcoming.next_if(|scheduled| scheduled.at == minute) {
            let caller = scheduled.report.caller.clone();
            if let Err(err) = sim.report(scheduled.report) {
                warn!(caller = %caller, error = %err, "emergency rejected");
            }
        }
        if minute < cli.minutes {
            sim.advance_time(1);
        }
    }

    if cli.json {
        let summary = json!({
            "statistics": sim.statistics(),
            "fleet": sim.fleet_snapshot(),
            "hospitals": sim.hospital_occupancy(),
            "active": sim.active_emergencies(),
            "pending": sim.pending_queue(),
            "activity": sim.activity_log().collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_tables(&sim);
    }
    Ok(())
}
