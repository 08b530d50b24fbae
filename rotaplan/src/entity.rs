/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core roster data structures.
//!
//! ```text
//! RosterConfig ──(EntityModel::build)──► EntityModel ──(Model::build)──► binary program
//!                 validated, indexed         ↑ immutable per solve
//!                                            snapshots are cloned and
//!                                            patched by the event driver
//! ```
//!
//! Employees and skills are addressed by dense indices (`0..n`) in ascending
//! id order, so two builds from the same configuration always number them the
//! same way.  Work and break decisions live in a [`SlotGrid`], a row-major
//! `employees × slots` bitmap.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use crate::config::{check_caps, EmployeeProfile, PlannerConfig, SkillsMatrix};
use crate::error::ValidationError;

pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_WEEK: usize = 7;

// ── Horizon / time slots ──────────────────────────────────────────────────────

/// The planning horizon: `days` whole days cut into equal slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Horizon {
    pub days: u32,
    pub slots_per_hour: u32,
}

impl Horizon {
    pub fn slots_per_day(&self) -> usize {
        (HOURS_PER_DAY * self.slots_per_hour) as usize
    }

    pub fn num_slots(&self) -> usize {
        self.days as usize * self.slots_per_day()
    }

    /// Weeks touched by the horizon; the last one may be partial.
    pub fn num_weeks(&self) -> usize {
        (self.days as usize).div_ceil(DAYS_PER_WEEK)
    }

    pub fn hours_to_slots(&self, hours: u32) -> usize {
        hours as usize * self.slots_per_hour as usize
    }

    pub fn day_range(&self, day: usize) -> Range<usize> {
        let spd = self.slots_per_day();
        let start = (day * spd).min(self.num_slots());
        start..(start + spd).min(self.num_slots())
    }

    pub fn week_range(&self, week: usize) -> Range<usize> {
        let span = DAYS_PER_WEEK * self.slots_per_day();
        let start = (week * span).min(self.num_slots());
        start..(start + span).min(self.num_slots())
    }

    pub fn slot(&self, index: usize) -> TimeSlot {
        let spd = self.slots_per_day();
        let within = index % spd;
        TimeSlot {
            index,
            day: index / spd,
            week: index / (spd * DAYS_PER_WEEK),
            minute_of_day: (within * 60 / self.slots_per_hour as usize) as u32,
        }
    }
}

/// One slot of the horizon with its calendar coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub index: usize,
    pub day: usize,
    pub week: usize,
    pub minute_of_day: u32,
}

impl TimeSlot {
    /// `HH:MM` of the slot start.
    pub fn clock(&self) -> String {
        format!("{:02}:{:02}", self.minute_of_day / 60, self.minute_of_day % 60)
    }
}

// ── Employees / skills ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub id: String,
    pub skills: BTreeSet<String>,
    pub max_hours_per_day: u32,
    pub max_hours_per_week: u32,
    pub min_rest_hours: u32,
    /// One flag per slot; `false` means the employee cannot be scheduled.
    #[serde(skip)]
    available: Vec<bool>,
}

impl Employee {
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }

    pub fn is_available(&self, slot: usize) -> bool {
        self.available.get(slot).copied().unwrap_or(false)
    }

    pub fn unavailable_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.available
            .iter()
            .enumerate()
            .filter(|&(_, &ok)| !ok)
            .map(|(t, _)| t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub id: String,
    /// Baseline holders required on duty in every slot (`c_k`).
    pub min_coverage: u32,
}

/// Extra demand for a skill over a slot range, added by task arrivals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraDemand {
    pub skill: usize,
    pub slots: Range<usize>,
    pub staff: u32,
}

/// Work already committed; employee `e`'s cells before `until[e]` are fixed
/// on re-solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenPrefix {
    pub until: Vec<usize>,
    pub work: WorkAssignment,
}

impl FrozenPrefix {
    pub fn until(&self, employee: usize) -> usize {
        self.until.get(employee).copied().unwrap_or(0)
    }
}

// ── Slot grids / shifts ───────────────────────────────────────────────────────

/// Row-major `employees × slots` bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    num_employees: usize,
    num_slots: usize,
    cells: Vec<bool>,
}

/// `x[e,t]`: employee `e` works slot `t`.
pub type WorkAssignment = SlotGrid;
/// `b[e,t]`: employee `e` is on break in slot `t`.
pub type BreakAssignment = SlotGrid;

impl SlotGrid {
    pub fn new(num_employees: usize, num_slots: usize) -> Self {
        Self {
            num_employees,
            num_slots,
            cells: vec![false; num_employees * num_slots],
        }
    }

    pub fn from_fn(
        num_employees: usize,
        num_slots: usize,
        mut f: impl FnMut(usize, usize) -> bool,
    ) -> Self {
        let mut grid = Self::new(num_employees, num_slots);
        for e in 0..num_employees {
            for t in 0..num_slots {
                grid.cells[e * num_slots + t] = f(e, t);
            }
        }
        grid
    }

    pub fn num_employees(&self) -> usize {
        self.num_employees
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Out-of-range cells read as `false`.
    pub fn get(&self, employee: usize, slot: usize) -> bool {
        employee < self.num_employees
            && slot < self.num_slots
            && self.cells[employee * self.num_slots + slot]
    }

    pub fn set(&mut self, employee: usize, slot: usize, value: bool) {
        if employee < self.num_employees && slot < self.num_slots {
            self.cells[employee * self.num_slots + slot] = value;
        }
    }

    pub fn row(&self, employee: usize) -> &[bool] {
        let start = employee * self.num_slots;
        &self.cells[start..start + self.num_slots]
    }

    pub fn count_in(&self, employee: usize, slots: Range<usize>) -> usize {
        slots.filter(|&t| self.get(employee, t)).count()
    }

    pub fn total(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Number of employees set in `slot`.
    pub fn column_count(&self, slot: usize) -> usize {
        (0..self.num_employees).filter(|&e| self.get(e, slot)).count()
    }

    /// Maximal runs of set cells for `employee`, in slot order.
    pub fn shifts(&self, employee: usize) -> Vec<Shift> {
        let mut shifts = Vec::new();
        let mut start: Option<usize> = None;
        for t in 0..=self.num_slots {
            let on = t < self.num_slots && self.get(employee, t);
            match (start, on) {
                (None, true) => start = Some(t),
                (Some(s), false) => {
                    shifts.push(Shift {
                        employee,
                        start: s,
                        end: t,
                    });
                    start = None;
                }
                _ => {}
            }
        }
        shifts
    }
}

/// A maximal contiguous run of worked slots `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shift {
    pub employee: usize,
    pub start: usize,
    pub end: usize,
}

impl Shift {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn slots(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.slots().contains(&slot)
    }

    /// Midpoint of the shift; for an even length the later of the two middles.
    pub fn ideal_break_slot(&self) -> usize {
        self.start + self.len() / 2
    }
}

// ── EntityModel ───────────────────────────────────────────────────────────────

/// Validated, indexed view of one planning problem.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityModel {
    pub horizon: Horizon,
    /// Sorted by id.
    pub employees: Vec<Employee>,
    /// Sorted by id; only skills held by at least one employee.
    pub skills: Vec<Skill>,
    pub min_staff: u32,
    pub rest_window_slots: usize,
    pub rest_stride_slots: usize,
    pub max_consecutive_slots: Option<usize>,
    extra_demand: Vec<ExtraDemand>,
    frozen: Option<FrozenPrefix>,
}

impl EntityModel {
    /// Validates the roster and resolves every reference to a dense index.
    ///
    /// # Errors
    /// See [`ValidationError`]: empty horizon or roster, employees without
    /// skills, coverage for unknown skills, caps out of range, unavailable
    /// windows outside the horizon.
    pub fn build(
        roster: &BTreeMap<String, EmployeeProfile>,
        config: &PlannerConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        if roster.is_empty() {
            return Err(ValidationError::NoEmployees);
        }

        let horizon = Horizon {
            days: config.horizon_days,
            slots_per_hour: config.slots_per_hour,
        };
        let num_slots = horizon.num_slots();

        let mut employees = Vec::with_capacity(roster.len());
        for (id, profile) in roster {
            if profile.skills.is_empty() || profile.skills.iter().all(|s| s.trim().is_empty()) {
                return Err(ValidationError::EmployeeWithoutSkills(id.clone()));
            }
            let daily = profile.max_hours_per_day.unwrap_or(config.max_hours_per_day);
            let weekly = profile.max_hours_per_week.unwrap_or(config.max_hours_per_week);
            let rest = profile.min_rest_hours.unwrap_or(config.min_rest_hours);
            check_caps(
                &format!("employees.{id}"),
                daily,
                weekly,
                rest,
                config.rest_window_hours,
            )?;

            let mut available = vec![true; num_slots];
            for window in &profile.unavailable {
                if window.from >= window.until || window.until > num_slots {
                    return Err(ValidationError::InvalidSlotRange {
                        employee: id.clone(),
                        from: window.from,
                        until: window.until,
                        slots: num_slots,
                    });
                }
                available[window.from..window.until].fill(false);
            }

            employees.push(Employee {
                id: id.clone(),
                skills: profile.skills.clone(),
                max_hours_per_day: daily,
                max_hours_per_week: weekly,
                min_rest_hours: rest,
                available,
            });
        }

        let held: BTreeSet<&String> = employees.iter().flat_map(|e| e.skills.iter()).collect();
        if let Some(unknown) = config
            .skill_coverage
            .keys()
            .find(|skill| !held.contains(skill))
        {
            return Err(ValidationError::UnknownSkill(unknown.clone()));
        }
        let skills: Vec<Skill> = held
            .into_iter()
            .map(|id| Skill {
                id: id.clone(),
                min_coverage: config.skill_coverage.get(id).copied().unwrap_or(0),
            })
            .collect();

        debug!(
            employees = employees.len(),
            skills = skills.len(),
            slots = num_slots,
            "entity model built"
        );

        Ok(Self {
            horizon,
            employees,
            skills,
            min_staff: config.min_staff_per_shift,
            rest_window_slots: horizon.hours_to_slots(config.rest_window_hours),
            rest_stride_slots: config.rest_window_stride_slots as usize,
            max_consecutive_slots: config
                .max_consecutive_hours
                .map(|h| horizon.hours_to_slots(h)),
            extra_demand: Vec::new(),
            frozen: None,
        })
    }

    /// Convenience constructor over a bare skills matrix.
    pub fn from_skills_matrix(
        matrix: &SkillsMatrix,
        config: &PlannerConfig,
    ) -> Result<Self, ValidationError> {
        let roster: BTreeMap<String, EmployeeProfile> = matrix
            .iter()
            .map(|(id, skills)| (id.clone(), EmployeeProfile::from(skills.clone())))
            .collect();
        Self::build(&roster, config)
    }

    pub fn num_slots(&self) -> usize {
        self.horizon.num_slots()
    }

    pub fn employee_index(&self, id: &str) -> Option<usize> {
        self.employees.iter().position(|e| e.id == id)
    }

    pub fn skill_index(&self, id: &str) -> Option<usize> {
        self.skills.iter().position(|s| s.id == id)
    }

    /// Indices of the employees holding `skill`.
    pub fn holders(&self, skill: usize) -> Vec<usize> {
        let Some(skill) = self.skills.get(skill) else {
            return Vec::new();
        };
        self.employees
            .iter()
            .enumerate()
            .filter(|(_, e)| e.has_skill(&skill.id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Required holders of `skill` on duty in `slot`: baseline plus task demand.
    pub fn demand(&self, skill: usize, slot: usize) -> u32 {
        let base = self.skills.get(skill).map_or(0, |s| s.min_coverage);
        self.extra_demand
            .iter()
            .filter(|d| d.skill == skill && d.slots.contains(&slot))
            .fold(base, |acc, d| acc.saturating_add(d.staff))
    }

    /// Head count required in `slot`.
    ///
    /// Task staff come on top of the minimum: whoever already covers the
    /// slot keeps doing so while the task is worked.
    pub fn staff_demand(&self, slot: usize) -> u32 {
        self.extra_demand
            .iter()
            .filter(|d| d.slots.contains(&slot))
            .fold(self.min_staff, |acc, d| acc.saturating_add(d.staff))
    }

    pub fn extra_demand(&self) -> &[ExtraDemand] {
        &self.extra_demand
    }

    pub fn frozen(&self) -> Option<&FrozenPrefix> {
        self.frozen.as_ref()
    }

    /// Adds `staff` holders of `skill` over `slots` (clipped to the horizon).
    pub fn add_demand(&mut self, skill: usize, slots: Range<usize>, staff: u32) {
        let slots = clip(slots, self.num_slots());
        if slots.is_empty() || staff == 0 || skill >= self.skills.len() {
            return;
        }
        self.extra_demand.push(ExtraDemand { skill, slots, staff });
    }

    /// Marks `employee` (un)available over `slots` (clipped to the horizon).
    pub fn set_availability(&mut self, employee: usize, slots: Range<usize>, available: bool) {
        let slots = clip(slots, self.num_slots());
        if let Some(emp) = self.employees.get_mut(employee) {
            emp.available[slots].fill(available);
        }
    }

    /// Fixes every work cell before `until` to its value in `work`.
    pub fn freeze_prefix(&mut self, until: usize, work: &WorkAssignment) {
        let until = until.min(self.num_slots());
        self.frozen = Some(FrozenPrefix {
            until: vec![until; self.employees.len()],
            work: work.clone(),
        });
    }

    /// Moves `employee`'s frozen boundary out to `until`; never shrinks it.
    pub fn extend_freeze(&mut self, employee: usize, until: usize) {
        let until = until.min(self.num_slots());
        if let Some(boundary) = self
            .frozen
            .as_mut()
            .and_then(|f| f.until.get_mut(employee))
        {
            *boundary = (*boundary).max(until);
        }
    }
}

fn clip(slots: Range<usize>, len: usize) -> Range<usize> {
    let end = slots.end.min(len);
    slots.start.min(end)..end
}

// ── Tests ─────────────────────────────────────────────────────────────────────
