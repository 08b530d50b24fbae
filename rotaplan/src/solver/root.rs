/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Checks on the model before it is handed to the MILP backend.
//!
//! Availability and frozen rows pin single work cells.  [`Fixings`] collects
//! those pins and the activity they contribute to every row, so each row can
//! be bounded without a solver call:
//!
//! ```text
//! min activity = fixed + Σ negative coefficients of free terms
//! max activity = fixed + Σ positive coefficients of free terms
//! ```
//!
//! A row whose activity range misses its right-hand side makes the model
//! infeasible, and the families of the row and of the pins on its terms are
//! what gets reported.  HiGHS only answers "infeasible", so these checks run
//! first.

use std::collections::BTreeSet;

use tracing::debug;

use crate::model::{ConstraintFamily, Model, Row, RowId, Sense, VarId};

use super::{InfeasibilityCause, InfeasibilityReport};

/// Work cells pinned by single-term `=` rows.
#[derive(Debug)]
pub(crate) struct Fixings {
    values: Vec<Option<bool>>,
    /// Row that pinned each cell.
    reasons: Vec<Option<RowId>>,
    /// Per row: activity of the terms pinned to 1.
    fixed: Vec<i64>,
    pinned: usize,
}

fn pin_of(row: &Row) -> Option<(VarId, i64)> {
    match row.terms.as_slice() {
        [term] if row.sense == Sense::Eq && term.coef == 1 => Some((term.var, row.rhs)),
        _ => None,
    }
}

impl Fixings {
    /// Collects every pin; two rows pinning one cell to different values
    /// is a root conflict.
    pub fn collect(model: &Model) -> Result<Self, InfeasibilityReport> {
        let mut values = vec![None; model.var_count()];
        let mut reasons = vec![None; model.var_count()];
        let mut pinned = 0;

        for (r, row) in model.rows().iter().enumerate() {
            let Some((var, rhs)) = pin_of(row) else {
                continue;
            };
            if !(0..=1).contains(&rhs) {
                return Err(root_conflict(model, r, BTreeSet::from([row.family])));
            }
            let value = rhs == 1;
            match values[var] {
                Some(prev) if prev != value => {
                    let mut families = BTreeSet::from([row.family]);
                    families.extend(reasons[var].map(|other| model.row(other).family));
                    return Err(root_conflict(model, r, families));
                }
                Some(_) => {}
                None => {
                    values[var] = Some(value);
                    reasons[var] = Some(r);
                    pinned += 1;
                }
            }
        }

        let fixed = model
            .rows()
            .iter()
            .map(|row| {
                row.terms
                    .iter()
                    .filter(|t| values[t.var] == Some(true))
                    .map(|t| t.coef)
                    .sum()
            })
            .collect();

        Ok(Self {
            values,
            reasons,
            fixed,
            pinned,
        })
    }

    pub fn is_free(&self, var: VarId) -> bool {
        self.values[var].is_none()
    }

    pub fn reason(&self, var: VarId) -> Option<RowId> {
        self.reasons[var]
    }

    pub fn fixed_activity(&self, row: RowId) -> i64 {
        self.fixed[row]
    }

    pub fn pinned(&self) -> usize {
        self.pinned
    }

    pub fn fixed_cost(&self, model: &Model) -> i64 {
        self.values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == Some(true))
            .map(|(var, _)| model.cost(var))
            .sum()
    }

    /// Bounds every row under the pins and reports the first one that can
    /// no longer be satisfied.
    pub fn check_rows(&self, model: &Model) -> Result<(), InfeasibilityReport> {
        for (r, row) in model.rows().iter().enumerate() {
            let (mut lo, mut hi) = (self.fixed[r], self.fixed[r]);
            for term in row.terms.iter().filter(|t| self.is_free(t.var)) {
                if term.coef > 0 {
                    hi += term.coef;
                } else {
                    lo += term.coef;
                }
            }
            let satisfiable = match row.sense {
                Sense::Le => lo <= row.rhs,
                Sense::Ge => hi >= row.rhs,
                Sense::Eq => lo <= row.rhs && row.rhs <= hi,
            };
            if !satisfiable {
                let mut families = BTreeSet::from([row.family]);
                families.extend(
                    row.terms
                        .iter()
                        .filter_map(|t| self.reason(t.var))
                        .map(|reason| model.row(reason).family),
                );
                return Err(root_conflict(model, r, families));
            }
        }
        Ok(())
    }

    /// Lower bound on the objective from disjoint covering rows.
    ///
    /// Unsatisfied `≥` rows with positive coefficients are taken greedily by
    /// residual demand, skipping rows that share a free variable with one
    /// already taken.  Each contributes `residual · min(cost / coef)`.
    pub fn covering_bound(&self, model: &Model) -> i64 {
        let mut candidates: Vec<(i64, RowId)> = model
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                matches!(row.sense, Sense::Ge | Sense::Eq)
                    && !row.terms.is_empty()
                    && row.terms.iter().all(|t| t.coef > 0)
            })
            .map(|(r, row)| (row.rhs - self.fixed[r], r))
            .filter(|&(residual, _)| residual > 0)
            .collect();
        candidates.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut taken = vec![false; model.var_count()];
        let mut extra = 0.0_f64;
        for (residual, r) in candidates {
            let free: Vec<_> = model
                .row(r)
                .terms
                .iter()
                .filter(|t| self.is_free(t.var))
                .collect();
            if free.is_empty() || free.iter().any(|t| taken[t.var]) {
                continue;
            }
            let ratio = free
                .iter()
                .map(|t| model.cost(t.var) as f64 / t.coef as f64)
                .fold(f64::INFINITY, f64::min);
            for t in &free {
                taken[t.var] = true;
            }
            extra += residual as f64 * ratio.max(0.0);
        }

        let bound = self.fixed_cost(model) + (extra - 1e-9).ceil().max(0.0) as i64;
        debug!(bound, pinned = self.pinned, "covering bound");
        bound
    }
}

fn root_conflict(
    model: &Model,
    row: RowId,
    families: BTreeSet<ConstraintFamily>,
) -> InfeasibilityReport {
    InfeasibilityReport {
        cause: InfeasibilityCause::RootPropagation,
        families: families.into_iter().collect(),
        detail: format!("{} cannot be satisfied", model.describe_row(row)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
