use std::path::PathBuf;

use ascent_simulation::*;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-stage launch vehicle ascent simulator")]
struct Cli {
    /// TOML file overriding the reference vehicle and mission.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search for the pitchover angle before flying.
    #[arg(long)]
    optimize: bool,

    /// Track the spent booster and fairing down to the ground.
    #[arg(long)]
    recover: bool,

    /// Coast to apogee and circularize after cutoff.
    #[arg(long)]
    circularize: bool,

    /// Find the largest payload that still reaches orbit.
    #[arg(long)]
    size_payload: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut params = match &cli.config {
        Some(path) => Params::load(path)?,
        None => Params::default(),
    };
    params.simulation.recover |= cli.recover;
    params.simulation.circularize |= cli.circularize;

    let environment = Environment::default();

    if cli.size_payload {
        let report = size_payload(&params, &environment)?;
        info!(
            payload = report.payload,
            feasible = report.feasible,
            margin = report.margin,
            "payload sizing finished"
        );
        params.vehicle.payload = report.payload;
        params.trajectory.pitchover_angle = report.pitchover_angle;
    }

    let mut vehicle = Vehicle::new(&params, &environment)?;

    if cli.optimize {
        let report = PitchoverOptimizer::new(&params, &environment).optimize(&vehicle)?;
        info!(
            angle = report.angle,
            error = report.error,
            converged = report.converged,
            "pitchover optimized"
        );
        params.trajectory.pitchover_angle = report.angle;
    }

    let mut telemetry = Telemetry::new();
    let outcome = Simulation::new(&mut vehicle, &params, &environment)?
        .with_recorder(&mut telemetry)
        .run()?;

    info!(
        orbit = outcome.orbit_achieved,
        perigee = outcome.perigee_altitude,
        apogee = outcome.apogee_altitude,
        margin = outcome.final_stage_margin,
        fitness = outcome.fitness,
        phase = ?outcome.final_phase,
        "simulation complete"
    );
    if let Some(downrange) = outcome.booster_downrange {
        info!(downrange, "booster downrange");
    }
    println!("{}", telemetry.summary());

    Ok(())
}
