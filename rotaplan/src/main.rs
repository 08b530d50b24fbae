/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use rotaplan::config::RosterConfig;
use rotaplan::entity::EntityModel;
use rotaplan::planner::Planner;
use rotaplan::report::{summary_lines, ScheduleDocument};
use rotaplan::schedule::PlanOutcome;
use rotaplan::simulation::{DiscreteEventDriver, StepResult};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Rotaplan work/break roster optimiser.
///
/// Example:
///   rotaplan -c configs/roster.yaml -o schedule.json -t 60 -g 0.02
#[derive(Debug, Parser)]
#[command(
    name = "rotaplan",
    about = "Rotaplan – work/break roster optimiser",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML roster (planner settings, skills matrix, events).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Write the schedule document (JSON) to this path.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Solver wall-clock limit in seconds (overrides the roster file).
    #[arg(short = 't', long = "time-limit")]
    time_limit: Option<f64>,

    /// Relative optimality gap tolerance in [0, 1] (overrides the roster file).
    #[arg(short = 'g', long = "gap")]
    gap: Option<f64>,

    /// Disable capacity cut generation.
    #[arg(long = "no-cuts", default_value_t = false)]
    no_cuts: bool,

    /// Replay the roster's events through the discrete-event driver.
    #[arg(short = 's', long = "simulate", default_value_t = false)]
    simulate: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Rotaplan starting up...");

    let cli = Cli::parse();
    info!(
        config     = ?cli.config,
        output     = ?cli.output,
        time_limit = ?cli.time_limit,
        gap        = ?cli.gap,
        no_cuts    = cli.no_cuts,
        simulate   = cli.simulate,
        "Configuration"
    );

    match run(&cli) {
        Ok(outcome) if outcome.is_feasible() => process::exit(0),
        Ok(_) => process::exit(2),
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<PlanOutcome> {
    // ── Load roster ───────────────────────────────────────────────────────────
    let mut roster = match &cli.config {
        Some(path) => RosterConfig::load_from_file(path)?,
        None => {
            warn!("No roster file provided, using the built-in five-employee roster");
            RosterConfig::default_roster()
        }
    };

    if let Some(limit) = cli.time_limit {
        roster.solver.time_limit_seconds = limit;
    }
    if let Some(gap) = cli.gap {
        roster.solver.gap_tolerance = gap;
    }
    if cli.no_cuts {
        roster.solver.enable_cuts = false;
    }

    let entities = EntityModel::build(&roster.employees, &roster.planner)
        .context("Roster validation failed")?;
    let planner = Planner::new(roster.solver).context("Invalid solver settings")?;

    info!(
        employees = entities.employees.len(),
        skills = entities.skills.len(),
        slots = entities.num_slots(),
        "Entity model ready"
    );

    // ── Plan ──────────────────────────────────────────────────────────────────
    let outcome = if cli.simulate {
        let mut driver = DiscreteEventDriver::new(planner, entities.clone());
        for event in &roster.events {
            driver
                .schedule_event(event.clone())
                .with_context(|| format!("Rejected event at slot {}", event.at))?;
        }
        let report = driver.run()?;
        for step in &report.steps {
            match &step.result {
                StepResult::Committed { objective, quality } => info!(
                    at = step.at,
                    kind = step.event.label(),
                    objective,
                    quality = quality.label(),
                    "step committed"
                ),
                StepResult::Infeasible(r) => warn!(
                    at = step.at,
                    kind = step.event.label(),
                    "step rejected: {}",
                    r.detail
                ),
            }
        }
        report.into_outcome()
    } else {
        if !roster.events.is_empty() {
            info!(
                events = roster.events.len(),
                "Roster lists events; pass --simulate to replay them"
            );
        }
        planner.plan(&entities)?
    };

    for line in summary_lines(&outcome) {
        info!("{line}");
    }

    // ── Export ────────────────────────────────────────────────────────────────
    if let Some(path) = &cli.output {
        ScheduleDocument::from_outcome(&outcome, &entities).write_to(path)?;
    }

    Ok(outcome)
}
