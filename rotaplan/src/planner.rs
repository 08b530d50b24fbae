/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Planning pipeline: entities → model → solver → breaks → schedule.
//!
//! ```text
//! EntityModel ─► Model::build ─► SolverDriver::solve ─┬─ Infeasible ─► PlanOutcome::Infeasible
//!                                                     └─ Solved ─► BreakPlanner::plan
//!                                                                   └─ re-check rows ─► PlanOutcome::Scheduled
//! ```
//!
//! The final `(x, b)` assignment is checked against every model row before a
//! schedule is returned; a broken break row is a [`PlanError::BreakInfeasible`],
//! a broken work row is a [`PlanError::ModelViolation`].

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::breaks::{BreakError, BreakPlanner, CommittedBreaks};
use crate::config::{RosterConfig, SolverSettings};
use crate::entity::EntityModel;
use crate::error::{PlanError, ValidationError};
use crate::model::{ConstraintFamily, Model};
use crate::schedule::{PlanOutcome, Schedule, SolveQuality};
use crate::solver::{SolveOutcome, SolverDriver, Termination};

#[derive(Debug, Clone)]
pub struct Planner {
    driver: SolverDriver,
}

impl Planner {
    /// # Errors
    /// [`ValidationError::OutOfRange`] for a non-positive time limit or a gap
    /// tolerance outside `[0, 1]`.
    pub fn new(settings: SolverSettings) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self {
            driver: SolverDriver::new(settings),
        })
    }

    pub fn settings(&self) -> &SolverSettings {
        self.driver.settings()
    }

    pub fn plan(&self, entities: &EntityModel) -> Result<PlanOutcome, PlanError> {
        self.plan_with_history(entities, None)
    }

    /// Plans `entities`, keeping `committed` breaks that lie before their
    /// boundary (used by the event driver).
    pub fn plan_with_history(
        &self,
        entities: &EntityModel,
        committed: Option<CommittedBreaks<'_>>,
    ) -> Result<PlanOutcome, PlanError> {
        let model = Model::build(entities);

        let solution = match self.driver.solve(&model)? {
            SolveOutcome::Solved(solution) => solution,
            SolveOutcome::Infeasible(report) => {
                warn!(cause = ?report.cause, "no schedule: {}", report.detail);
                return Ok(PlanOutcome::Infeasible(report));
            }
        };

        let work = model.work_assignment(&solution.values);
        let planner = committed.map_or_else(BreakPlanner::new, BreakPlanner::with_committed);
        let breaks = planner.plan(&work)?;

        let violated = model.violations(&model.values_from(&work, &breaks));
        if !violated.is_empty() {
            let families: Vec<ConstraintFamily> = violated
                .iter()
                .map(|&r| model.row(r).family)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            if families.iter().all(|f| f.is_break()) {
                return Err(BreakError::ConstraintViolated { families }.into());
            }
            return Err(PlanError::ModelViolation { families });
        }

        let gap = solution.gap();
        let quality = match solution.termination {
            Termination::Optimal => SolveQuality::Optimal,
            Termination::GapReached => SolveQuality::FeasibleWithinGap {
                gap,
                timed_out: false,
            },
            Termination::TimeLimit => SolveQuality::FeasibleWithinGap {
                gap,
                timed_out: true,
            },
        };

        info!(
            quality = quality.label(),
            worked_slots = solution.objective,
            gap,
            breaks = breaks.total(),
            "schedule ready"
        );

        Ok(PlanOutcome::Scheduled(Schedule {
            horizon: entities.horizon,
            employee_ids: entities.employees.iter().map(|e| e.id.clone()).collect(),
            work,
            breaks,
            quality,
            objective: solution.objective,
            best_bound: solution.best_bound,
            stats: solution.stats,
        }))
    }
}

/// Validates `roster` and plans it once with its own solver settings.
pub fn plan_roster(roster: &RosterConfig) -> Result<PlanOutcome, PlanError> {
    let entities = EntityModel::build(&roster.employees, &roster.planner)?;
    Planner::new(roster.solver)?.plan(&entities)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
