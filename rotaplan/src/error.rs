/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the roster planner.
//!
//! Three enums model the failure layers of a planning run:
//!
//! * [`ValidationError`]: the inputs (skills matrix, planner settings,
//!   solver tuning) are malformed.  Raised before any model is built.
//! * [`SolverError`]: the MILP backend failed outright.
//! * [`PlanError`]: top-level failure returned from
//!   [`Planner::plan()`](crate::planner::Planner::plan).
//!
//! Proven infeasibility and solver timeouts are **not** errors: they are
//! returned as [`PlanOutcome::Infeasible`](crate::schedule::PlanOutcome) and
//! as a `FeasibleWithinGap { timed_out: true }` quality respectively, so the
//! caller always receives an explicit, inspectable result.

use thiserror::Error;

use crate::breaks::BreakError;
use crate::model::ConstraintFamily;

// ── Input validation ──────────────────────────────────────────────────────────

/// Why the planner refused its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `horizon_days` is zero.
    #[error("planning horizon must contain at least one day")]
    EmptyHorizon,

    /// The skills matrix has no rows.
    #[error("skills matrix contains no employees")]
    NoEmployees,

    /// An employee entry carries an empty skill set.
    #[error("employee '{0}' has no skills")]
    EmployeeWithoutSkills(String),

    /// A coverage target or event names a skill no employee holds.
    #[error("unknown skill '{0}' (no employee holds it)")]
    UnknownSkill(String),

    /// A numeric setting is outside its accepted range.
    #[error("{field} must be {expected} (got {value})")]
    OutOfRange {
        field: String,
        expected: &'static str,
        value: String,
    },

    /// An unavailability window is empty or reaches past the horizon.
    #[error(
        "employee '{employee}': slot range {from}..{until} is empty or exceeds \
         the {slots}-slot horizon"
    )]
    InvalidSlotRange {
        employee: String,
        from: usize,
        until: usize,
        slots: usize,
    },
}

impl ValidationError {
    pub(crate) fn out_of_range(
        field: impl Into<String>,
        expected: &'static str,
        value: impl ToString,
    ) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            expected,
            value: value.to_string(),
        }
    }
}

// ── Backend failures ──────────────────────────────────────────────────────────

/// HiGHS stopped for a reason other than infeasibility or the time limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("MILP backend failed: {0}")]
    Backend(String),
}

// ── Top-level planning errors ─────────────────────────────────────────────────

/// Top-level error type returned by the planning pipeline.
///
/// | Variant | Meaning |
/// |---|---|
/// | `Validation` | inputs rejected before modelling |
/// | `Solver` | the MILP backend failed |
/// | `BreakInfeasible` | the work pattern admits no valid break placement |
/// | `ModelViolation` | the solver's assignment breaks a work-side row (internal fault) |
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid planner input: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("break placement failed: {0}")]
    BreakInfeasible(#[from] BreakError),

    #[error("solver assignment violates constraint families {families:?}")]
    ModelViolation { families: Vec<ConstraintFamily> },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
