/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Break placement over a solved work pattern.
//!
//! Every shift (maximal run of worked slots) gets exactly one break slot.
//! The preferred slot is the shift midpoint (`start + len / 2`); when it is
//! not eligible the closest eligible slot wins, the earlier one on ties.
//!
//! A slot is eligible when it is worked, not adjacent to another break of the
//! same employee, and, during re-optimisation, not before the commit
//! boundary.  A break already committed before the boundary is kept as is.

use thiserror::Error;
use tracing::debug;

use crate::entity::{BreakAssignment, Shift, SlotGrid, WorkAssignment};
use crate::model::ConstraintFamily;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreakError {
    /// The shift has no eligible slot left (all of it lies before the
    /// commit boundary and no break was committed there).
    #[error("employee #{employee}: shift {start}..{end} has no slot eligible for a break")]
    NoEligibleSlot {
        employee: usize,
        start: usize,
        end: usize,
    },

    /// The placed breaks fail the model's break rows.
    #[error("break placement violates {families:?}")]
    ConstraintViolated { families: Vec<ConstraintFamily> },
}

/// Breaks fixed by an earlier commit; slots before `until` are history.
#[derive(Debug, Clone, Copy)]
pub struct CommittedBreaks<'a> {
    pub breaks: &'a BreakAssignment,
    pub until: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BreakPlanner<'a> {
    committed: Option<CommittedBreaks<'a>>,
}

impl<'a> BreakPlanner<'a> {
    pub fn new() -> Self {
        Self { committed: None }
    }

    pub fn with_committed(committed: CommittedBreaks<'a>) -> Self {
        Self {
            committed: Some(committed),
        }
    }

    /// Places one break in every shift of `work`.
    ///
    /// # Errors
    /// [`BreakError::NoEligibleSlot`] when a shift admits no break.
    pub fn plan(&self, work: &WorkAssignment) -> Result<BreakAssignment, BreakError> {
        let mut breaks = SlotGrid::new(work.num_employees(), work.num_slots());
        for employee in 0..work.num_employees() {
            for shift in work.shifts(employee) {
                let slot = self.place(&shift, &breaks)?;
                breaks.set(employee, slot, true);
                debug!(
                    employee,
                    shift_start = shift.start,
                    shift_end = shift.end,
                    break_slot = slot,
                    "break placed"
                );
            }
        }
        Ok(breaks)
    }

    fn place(&self, shift: &Shift, placed: &BreakAssignment) -> Result<usize, BreakError> {
        let boundary = self.committed.map_or(0, |c| c.until);

        if let Some(committed) = self.committed {
            let kept = shift
                .slots()
                .take_while(|&t| t < committed.until)
                .find(|&t| committed.breaks.get(shift.employee, t));
            if let Some(slot) = kept {
                return Ok(slot);
            }
        }

        let eligible = |t: usize| {
            t >= boundary
                && shift.contains(t)
                && !(t > 0 && placed.get(shift.employee, t - 1))
                && !placed.get(shift.employee, t + 1)
        };

        let ideal = shift.ideal_break_slot();
        (0..shift.len())
            .flat_map(|d| [ideal.checked_sub(d), ideal.checked_add(d)])
            .flatten()
            .find(|&t| eligible(t))
            .ok_or(BreakError::NoEligibleSlot {
                employee: shift.employee,
                start: shift.start,
                end: shift.end,
            })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
