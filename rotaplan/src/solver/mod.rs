/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! MILP solve of the roster program through `good_lp` and HiGHS.
//!
//! ```text
//! pins (availability, frozen) ── contradiction ──► Infeasible(root_propagation)
//!   └─ row bounds ── unsatisfiable row ──────────► Infeasible(root_propagation)
//!       └─ capacity cuts (enable_cuts) ── short ─► Infeasible(capacity_cut)
//!           └─ HiGHS (time_limit, mip_rel_gap)
//!                 proven infeasible             → Infeasible(search_exhausted)
//!                 budget spent, no incumbent    → Infeasible(time_limit)
//!                 incumbent                     → Solved
//! ```
//!
//! Every model column becomes a binary `good_lp` variable and every row one
//! constraint, so HiGHS sees exactly the rows the schedule is re-checked
//! against.  HiGHS separates its own cutting planes; `enable_cuts` governs
//! the aggregated capacity cuts in [`cuts`], which prove infeasibility and
//! name the families involved before the backend is called.
//!
//! # Outcomes
//!
//! | Termination | Meaning |
//! |---|---|
//! | `Optimal` | incumbent equals a proven bound |
//! | `GapReached` | HiGHS stopped on `mip_rel_gap = gap_tolerance` |
//! | `TimeLimit` | the time budget ran out with an incumbent |
//!
//! `good_lp` hands back the primal assignment only.  The reported bound is
//! the larger of the covering bound from [`root`] and the one implied by the
//! relative gap HiGHS stopped on, `⌈(1 − gap_tolerance) · objective⌉`.  A run
//! that spends its whole budget is never reported as optimal.

pub(crate) mod cuts;
pub(crate) mod root;

use std::time::Instant;

use good_lp::solvers::highs::highs;
use good_lp::Solution as _;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, SolverModel, Variable,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SolverSettings;
use crate::error::SolverError;
use crate::model::{ConstraintFamily, Model, Sense};
use cuts::generate_capacity_cuts;
use root::Fixings;

// ── Public result types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Optimal,
    GapReached,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InfeasibilityCause {
    /// A row cannot be satisfied once availability and frozen cells are pinned.
    RootPropagation,
    /// A capacity cut is violated before the backend runs.
    CapacityCut,
    /// The MILP backend proved that no feasible assignment exists.
    SearchExhausted,
    /// The time limit expired before any feasible assignment was found.
    TimeLimit,
}

/// Why no schedule was produced, and which constraint families are involved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfeasibilityReport {
    pub cause: InfeasibilityCause,
    /// Empty when the failure cannot be attributed to specific rows.
    pub families: Vec<ConstraintFamily>,
    pub detail: String,
}

impl InfeasibilityReport {
    /// `true` when infeasibility was proven rather than inferred from a timeout.
    pub fn is_proven(&self) -> bool {
        self.cause != InfeasibilityCause::TimeLimit
    }

    fn out_of_time() -> Self {
        Self {
            cause: InfeasibilityCause::TimeLimit,
            families: Vec::new(),
            detail: "time limit reached before any feasible assignment was found".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SolveStats {
    pub columns: usize,
    pub rows: usize,
    /// Work cells pinned by availability or frozen rows.
    pub pinned: usize,
    pub cuts: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub values: Vec<bool>,
    pub objective: i64,
    /// Proven lower bound on the optimum, never above `objective`.
    pub best_bound: i64,
    pub termination: Termination,
    pub stats: SolveStats,
}

impl Solution {
    pub fn gap(&self) -> f64 {
        relative_gap(self.objective, self.best_bound)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(Solution),
    Infeasible(InfeasibilityReport),
}

/// `(incumbent − bound) / incumbent`, and 0 for a zero incumbent.
pub fn relative_gap(incumbent: i64, bound: i64) -> f64 {
    if incumbent <= 0 {
        return 0.0;
    }
    (incumbent - bound).max(0) as f64 / incumbent as f64
}

// ── SolverDriver ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SolverDriver {
    settings: SolverSettings,
}

impl SolverDriver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solves `model` within the configured time limit and gap.
    ///
    /// # Errors
    /// [`SolverError::Backend`] when HiGHS fails for a reason other than
    /// infeasibility or the time limit.
    pub fn solve(&self, model: &Model) -> Result<SolveOutcome, SolverError> {
        let started = Instant::now();
        info!(
            vars = model.var_count(),
            rows = model.row_count(),
            time_limit_s = self.settings.time_limit_seconds,
            gap_tolerance = self.settings.gap_tolerance,
            cuts = self.settings.enable_cuts,
            "solver start"
        );

        let mut stats = SolveStats {
            columns: model.var_count(),
            rows: model.row_count(),
            ..SolveStats::default()
        };
        let mut outcome = match self.root_checks(model, &mut stats) {
            Err(report) => SolveOutcome::Infeasible(report),
            Ok(root_bound) => self.run_backend(model, root_bound, started)?,
        };

        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        match &mut outcome {
            SolveOutcome::Solved(solution) => {
                info!(
                    termination = ?solution.termination,
                    objective = solution.objective,
                    bound = solution.best_bound,
                    gap = solution.gap(),
                    elapsed_ms = stats.elapsed_ms,
                    "solver finished"
                );
                if solution.termination == Termination::TimeLimit {
                    warn!(
                        gap = solution.gap(),
                        "time limit reached; returning best incumbent"
                    );
                }
                solution.stats = stats;
            }
            SolveOutcome::Infeasible(report) => {
                warn!(
                    cause = ?report.cause,
                    families = ?report.families,
                    elapsed_ms = stats.elapsed_ms,
                    "solver found no feasible assignment: {}",
                    report.detail
                );
            }
        }
        Ok(outcome)
    }

    /// Pins, row bounds and capacity cuts; returns the covering bound.
    fn root_checks(
        &self,
        model: &Model,
        stats: &mut SolveStats,
    ) -> Result<i64, InfeasibilityReport> {
        let fixings = Fixings::collect(model)?;
        stats.pinned = fixings.pinned();
        fixings.check_rows(model)?;

        if self.settings.enable_cuts {
            let cuts = generate_capacity_cuts(model);
            stats.cuts = cuts.len();
            for cut in &cuts {
                let shortfall = cut.shortfall(model, &fixings);
                if shortfall > 0 {
                    return Err(InfeasibilityReport {
                        cause: InfeasibilityCause::CapacityCut,
                        families: cut.families(),
                        detail: cut.describe(model, shortfall),
                    });
                }
            }
        }

        let bound = fixings.covering_bound(model);
        debug!(bound, pinned = stats.pinned, cuts = stats.cuts, "root checks passed");
        Ok(bound)
    }

    fn run_backend(
        &self,
        model: &Model,
        root_bound: i64,
        started: Instant,
    ) -> Result<SolveOutcome, SolverError> {
        let mut vars = ProblemVariables::new();
        let columns: Vec<Variable> = (0..model.var_count())
            .map(|_| vars.add(variable().binary()))
            .collect();

        let objective = columns
            .iter()
            .zip(model.costs())
            .filter(|&(_, &cost)| cost != 0)
            .fold(Expression::from(0.0), |acc, (&var, &cost)| {
                acc + cost as f64 * var
            });

        let mut problem = vars.minimise(objective).using(highs);
        for row in model.rows() {
            let lhs = row
                .terms
                .iter()
                .fold(Expression::from(0.0), |acc, t| acc + t.coef as f64 * columns[t.var]);
            let rhs = row.rhs as f64;
            problem = problem.with(match row.sense {
                Sense::Le => constraint!(lhs <= rhs),
                Sense::Ge => constraint!(lhs >= rhs),
                Sense::Eq => constraint!(lhs == rhs),
            });
        }

        // The budget covers model translation too.
        let budget = self.settings.time_limit_seconds - started.elapsed().as_secs_f64();
        if budget <= 0.0 {
            return Ok(SolveOutcome::Infeasible(InfeasibilityReport::out_of_time()));
        }
        debug!(budget_s = budget, "handing model to HiGHS");

        let problem = problem
            .set_option("output_flag", false)
            .set_option("time_limit", budget)
            .set_option("mip_rel_gap", self.settings.gap_tolerance);

        let call = Instant::now();
        let result = problem.solve();
        let timed_out = call.elapsed().as_secs_f64() >= budget;

        let lp = match result {
            Ok(lp) => lp,
            Err(ResolutionError::Infeasible) => {
                return Ok(SolveOutcome::Infeasible(InfeasibilityReport {
                    cause: InfeasibilityCause::SearchExhausted,
                    families: Vec::new(),
                    detail: "HiGHS proved the model infeasible".to_string(),
                }));
            }
            Err(err) => return Err(SolverError::Backend(err.to_string())),
        };

        let values: Vec<bool> = columns.iter().map(|&var| lp.value(var) > 0.5).collect();
        let violated = model.violations(&values).len();
        if violated > 0 {
            if timed_out {
                return Ok(SolveOutcome::Infeasible(InfeasibilityReport::out_of_time()));
            }
            return Err(SolverError::Backend(format!(
                "assignment returned by HiGHS violates {violated} row(s)"
            )));
        }

        let objective = model.objective(&values);
        let (termination, best_bound) = if timed_out {
            (Termination::TimeLimit, root_bound.min(objective))
        } else {
            let within_gap =
                (objective as f64 * (1.0 - self.settings.gap_tolerance) - 1e-9).ceil() as i64;
            let bound = root_bound.max(within_gap).min(objective);
            if bound >= objective {
                (Termination::Optimal, objective)
            } else {
                (Termination::GapReached, bound)
            }
        };

        Ok(SolveOutcome::Solved(Solution {
            values,
            objective,
            best_bound,
            termination,
            stats: SolveStats::default(),
        }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
