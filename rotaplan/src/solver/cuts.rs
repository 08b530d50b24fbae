/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Aggregated capacity cuts.
//!
//! Bounding one row at a time sees one coverage row and one cap row.  It
//! cannot see that a whole window of demand exceeds what the staff can
//! give inside that window.  A capacity cut pairs
//!
//! * a **coverage group**: the `min_staff` rows, or the `skill_coverage`
//!   rows of one skill, and
//! * a **capacity window**: one slot range `W` of a cap family
//!   (`daily_hours`, `weekly_hours`, `rest_window`, `consecutive_hours`),
//!
//! and checks
//!
//! $$\sum_{t \in W} \max(0,\ rhs_t - fixed_t) \;\le\; \sum_e \min(room_e(W),\ free_e(W))$$
//!
//! where `room_e(W)` is what is left of employee `e`'s cap on `W` and
//! `free_e(W)` counts `e`'s unpinned coverage variables in `W`.  Each
//! staffed slot of one employee fills one unit of one coverage row, so the
//! inequality holds for every feasible assignment.  A violated cut proves
//! infeasibility before the MILP backend runs and names both families.

use std::collections::BTreeMap;
use std::ops::Range;

use tracing::debug;

use super::root::Fixings;
use crate::model::{ConstraintFamily, Model, RowId, Sense, VarId, VarKind};

#[derive(Debug, Clone)]
struct EmployeeCap {
    /// `None` when the employee has no cap row on this window.
    row: Option<RowId>,
    vars: Vec<VarId>,
}

#[derive(Debug, Clone)]
pub(crate) struct CapacityCut {
    pub cover_family: ConstraintFamily,
    pub cap_family: ConstraintFamily,
    pub skill: Option<usize>,
    pub slots: Range<usize>,
    cover_rows: Vec<RowId>,
    caps: Vec<EmployeeCap>,
}

impl CapacityCut {
    /// Residual demand minus remaining supply; positive means violated.
    pub fn shortfall(&self, model: &Model, fixings: &Fixings) -> i64 {
        let demand: i64 = self
            .cover_rows
            .iter()
            .map(|&r| (model.row(r).rhs - fixings.fixed_activity(r)).max(0))
            .sum();
        if demand == 0 {
            return 0;
        }

        let mut supply = 0_i64;
        for cap in &self.caps {
            let free = cap.vars.iter().filter(|&&v| fixings.is_free(v)).count() as i64;
            let room = match cap.row {
                Some(r) => (model.row(r).rhs - fixings.fixed_activity(r)).max(0),
                None => free,
            };
            supply += free.min(room);
            if supply >= demand {
                return 0;
            }
        }
        demand - supply
    }

    pub fn families(&self) -> Vec<ConstraintFamily> {
        vec![self.cover_family, self.cap_family]
    }

    pub fn describe(&self, model: &Model, shortfall: i64) -> String {
        let who = match self.skill {
            Some(k) => format!("skill '{}'", model.skill_id(k)),
            None => "minimum staffing".to_string(),
        };
        format!(
            "{who} over slots {}..{} is short by {shortfall} staff-slot(s) once {} limits are applied",
            self.slots.start, self.slots.end, self.cap_family,
        )
    }
}

/// Builds one cut per (coverage group, capacity window) pair in which at
/// least one employee's cap is tighter than their coverage slots.
pub(crate) fn generate_capacity_cuts(model: &Model) -> Vec<CapacityCut> {
    let mut cover: BTreeMap<(ConstraintFamily, Option<usize>), BTreeMap<usize, RowId>> =
        BTreeMap::new();
    let mut caps: BTreeMap<(ConstraintFamily, usize, usize), BTreeMap<usize, RowId>> =
        BTreeMap::new();

    for (r, row) in model.rows().iter().enumerate() {
        if !row.is_unit() {
            continue;
        }
        if row.family.is_coverage() && row.sense == Sense::Ge && row.scope.slots.len() == 1 {
            cover
                .entry((row.family, row.scope.skill))
                .or_default()
                .insert(row.scope.slots.start, r);
        } else if row.family.is_capacity() && row.sense == Sense::Le {
            if let Some(e) = row.scope.employee {
                caps.entry((row.family, row.scope.slots.start, row.scope.slots.end))
                    .or_default()
                    .insert(e, r);
            }
        }
    }

    let mut cuts = Vec::new();
    for (&(cover_family, skill), by_slot) in &cover {
        for (&(cap_family, start, end), cap_rows) in &caps {
            let cover_rows: Vec<RowId> = by_slot.range(start..end).map(|(_, &r)| r).collect();
            if cover_rows.is_empty() {
                continue;
            }

            let mut support: BTreeMap<usize, Vec<VarId>> = BTreeMap::new();
            for &r in &cover_rows {
                for term in &model.row(r).terms {
                    let (kind, e, _) = model.decode(term.var);
                    if kind == VarKind::Work {
                        support.entry(e).or_default().push(term.var);
                    }
                }
            }

            let mut binding = false;
            let mut employee_caps = Vec::with_capacity(support.len());
            for (e, vars) in support {
                let row = cap_rows.get(&e).copied();
                if let Some(r) = row {
                    binding |= model.row(r).rhs < vars.len() as i64;
                }
                employee_caps.push(EmployeeCap { row, vars });
            }
            if !binding {
                continue;
            }

            cuts.push(CapacityCut {
                cover_family,
                cap_family,
                skill,
                slots: start..end,
                cover_rows,
                caps: employee_caps,
            });
        }
    }

    debug!(cuts = cuts.len(), "capacity cuts generated");
    cuts
}

// ── Tests ─────────────────────────────────────────────────────────────────────
