/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Discrete-event driver (dynamic mode).
//!
//! ```text
//!   Idle ──start()──► AwaitingEvent ──event dequeued──► Reoptimizing
//!                          ▲                                 │
//!                          └─────────── Committed ◄──────────┘
//!                                           │
//!                    queue drained / event at horizon end (terminal)
//! ```
//!
//! The driver owns the only mutable state: the entity snapshot and the
//! running schedule.  Each event is applied to a copy of the snapshot, the
//! slots before the event time are frozen to the running schedule (work and
//! breaks), and the planner runs again.  One event is processed at a time.

pub mod event;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::breaks::CommittedBreaks;
use crate::entity::EntityModel;
use crate::error::PlanError;
use crate::planner::Planner;
use crate::schedule::{PlanOutcome, Schedule, SolveQuality};
use crate::solver::InfeasibilityReport;
use event::{EventKind, EventQueue, SimEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    Idle,
    AwaitingEvent,
    Reoptimizing,
    Committed,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriverState::Idle => "idle",
            DriverState::AwaitingEvent => "awaiting_event",
            DriverState::Reoptimizing => "reoptimizing",
            DriverState::Committed => "committed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("event references unknown employee '{0}'")]
    UnknownEmployee(String),

    #[error("event references skill '{0}' that no employee holds")]
    UnknownSkill(String),

    #[error("event at slot {at} is before the simulated clock ({clock})")]
    EventInPast { at: usize, clock: usize },

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: DriverState,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepResult {
    Committed {
        objective: i64,
        quality: SolveQuality,
    },
    /// The re-plan failed; the previous schedule stays in force and the
    /// event's delta is discarded.
    Infeasible(InfeasibilityReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub at: usize,
    pub event: SimEvent,
    pub result: StepResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub steps: Vec<StepRecord>,
    /// The running schedule at the end of the run, or the baseline
    /// infeasibility if no schedule was ever committed.
    pub outcome: PlanOutcome,
}

impl SimulationReport {
    pub fn into_outcome(self) -> PlanOutcome {
        self.outcome
    }

    pub fn rejected_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.result, StepResult::Infeasible(_)))
            .count()
    }
}

// ── DiscreteEventDriver ───────────────────────────────────────────────────────

pub struct DiscreteEventDriver {
    planner: Planner,
    entities: EntityModel,
    queue: EventQueue,
    state: DriverState,
    finished: bool,
    clock: usize,
    schedule: Option<Schedule>,
    baseline_failure: Option<InfeasibilityReport>,
    history: Vec<StepRecord>,
}

impl DiscreteEventDriver {
    pub fn new(planner: Planner, entities: EntityModel) -> Self {
        Self {
            planner,
            entities,
            queue: EventQueue::new(),
            state: DriverState::Idle,
            finished: false,
            clock: 0,
            schedule: None,
            baseline_failure: None,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn clock(&self) -> usize {
        self.clock
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn entities(&self) -> &EntityModel {
        &self.entities
    }

    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queues `event` after checking its references and time.
    pub fn schedule_event(&mut self, event: SimEvent) -> Result<(), SimulationError> {
        if self.finished {
            return Err(SimulationError::InvalidTransition {
                action: "schedule an event",
                state: self.state,
            });
        }
        if event.at < self.clock {
            return Err(SimulationError::EventInPast {
                at: event.at,
                clock: self.clock,
            });
        }
        self.check_references(&event)?;
        debug!(at = event.at, kind = event.label(), "event queued");
        self.queue.push(event);
        Ok(())
    }

    /// Plans the baseline schedule and starts awaiting events.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        if self.state != DriverState::Idle {
            return Err(SimulationError::InvalidTransition {
                action: "start",
                state: self.state,
            });
        }

        match self.planner.plan(&self.entities)? {
            PlanOutcome::Scheduled(schedule) => {
                info!(
                    objective = schedule.objective,
                    quality = schedule.quality.label(),
                    "baseline schedule committed"
                );
                self.schedule = Some(schedule);
            }
            PlanOutcome::Infeasible(report) => {
                warn!("baseline schedule infeasible: {}", report.detail);
                self.baseline_failure = Some(report);
            }
        }
        self.transition(DriverState::AwaitingEvent);
        Ok(())
    }

    /// Processes the next queued event.
    ///
    /// Returns `Ok(None)` once the run is over: the queue is drained or the
    /// next event lies at or beyond the horizon end.
    pub fn step(&mut self) -> Result<Option<StepRecord>, SimulationError> {
        if self.finished {
            return Ok(None);
        }
        if self.state != DriverState::AwaitingEvent {
            return Err(SimulationError::InvalidTransition {
                action: "step",
                state: self.state,
            });
        }

        let horizon_end = self.entities.num_slots();
        let Some(event) = self.queue.pop_next() else {
            self.finish(horizon_end);
            return Ok(None);
        };
        if event.at >= horizon_end {
            info!(at = event.at, "event beyond the horizon ends the run");
            self.finish(horizon_end);
            return Ok(None);
        }

        self.clock = self.clock.max(event.at);
        self.transition(DriverState::Reoptimizing);

        let mut snapshot = self.entities.clone();
        if let Some(current) = &self.schedule {
            freeze_history(&mut snapshot, current, self.clock);
        }
        self.apply(&mut snapshot, &event)?;

        let committed = self.schedule.as_ref().map(|s| CommittedBreaks {
            breaks: &s.breaks,
            until: self.clock,
        });
        let outcome = self.planner.plan_with_history(&snapshot, committed)?;

        let result = match outcome {
            PlanOutcome::Scheduled(schedule) => {
                let result = StepResult::Committed {
                    objective: schedule.objective,
                    quality: schedule.quality,
                };
                info!(
                    at = event.at,
                    kind = event.label(),
                    objective = schedule.objective,
                    quality = schedule.quality.label(),
                    "re-plan committed"
                );
                self.entities = snapshot;
                self.schedule = Some(schedule);
                result
            }
            PlanOutcome::Infeasible(report) => {
                warn!(
                    at = event.at,
                    kind = event.label(),
                    "re-plan infeasible, keeping the running schedule: {}",
                    report.detail
                );
                StepResult::Infeasible(report)
            }
        };

        self.transition(DriverState::Committed);
        let record = StepRecord {
            at: event.at,
            event,
            result,
        };
        self.history.push(record.clone());
        self.transition(DriverState::AwaitingEvent);
        Ok(Some(record))
    }

    /// Starts (if needed) and processes every event.
    pub fn run(mut self) -> Result<SimulationReport, SimulationError> {
        if self.state == DriverState::Idle {
            self.start()?;
        }
        while self.step()?.is_some() {}

        let outcome = match (self.schedule, self.baseline_failure) {
            (Some(schedule), _) => PlanOutcome::Scheduled(schedule),
            (None, Some(report)) => PlanOutcome::Infeasible(report),
            (None, None) => {
                return Err(SimulationError::InvalidTransition {
                    action: "report",
                    state: self.state,
                })
            }
        };
        Ok(SimulationReport {
            steps: self.history,
            outcome,
        })
    }

    fn transition(&mut self, next: DriverState) {
        debug!(from = %self.state, to = %next, clock = self.clock, "driver transition");
        self.state = next;
    }

    fn finish(&mut self, horizon_end: usize) {
        self.transition(DriverState::Committed);
        self.finished = true;
        info!(
            steps = self.history.len(),
            dropped_events = self.queue.len(),
            horizon_end,
            "simulation finished"
        );
    }

    fn check_references(&self, event: &SimEvent) -> Result<(), SimulationError> {
        match &event.kind {
            EventKind::TaskArrival { skill, .. } => {
                if self.entities.skill_index(skill).is_none() {
                    return Err(SimulationError::UnknownSkill(skill.clone()));
                }
            }
            EventKind::AvailabilityChange { employee, .. } => {
                if self.entities.employee_index(employee).is_none() {
                    return Err(SimulationError::UnknownEmployee(employee.clone()));
                }
            }
        }
        Ok(())
    }

    /// Applies the event's delta to `snapshot`, never before the clock or an
    /// employee's frozen boundary.
    fn apply(&self, snapshot: &mut EntityModel, event: &SimEvent) -> Result<(), SimulationError> {
        let from = event.at.max(self.clock);
        match &event.kind {
            EventKind::TaskArrival {
                skill,
                duration,
                staff,
            } => {
                let k = snapshot
                    .skill_index(skill)
                    .ok_or_else(|| SimulationError::UnknownSkill(skill.clone()))?;
                snapshot.add_demand(k, from..from.saturating_add(*duration), *staff);
            }
            EventKind::AvailabilityChange {
                employee,
                available,
                until,
            } => {
                let e = snapshot
                    .employee_index(employee)
                    .ok_or_else(|| SimulationError::UnknownEmployee(employee.clone()))?;
                let from = snapshot.frozen().map_or(from, |f| from.max(f.until(e)));
                let until = until.unwrap_or(snapshot.num_slots());
                snapshot.set_availability(e, from..until, *available);
            }
        }
        Ok(())
    }
}

/// Freezes the work before `clock`.  A shift running across `clock` whose
/// break is still ahead also keeps slot `clock`, so the break can still be
/// placed inside it.
fn freeze_history(snapshot: &mut EntityModel, current: &Schedule, clock: usize) {
    snapshot.freeze_prefix(clock, &current.work);
    for e in 0..current.work.num_employees() {
        for shift in current.shifts(e) {
            if shift.start < clock && shift.contains(clock) {
                let pending = current.break_in(&shift).map_or(true, |b| b >= clock);
                if pending {
                    debug!(employee = e, clock, "shift in progress keeps its current slot");
                    snapshot.extend_freeze(e, clock + 1);
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
