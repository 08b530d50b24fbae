/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulated events and their queue.
//!
//! Events are keyed by `(at, seq)` where `seq` is the insertion counter, so
//! the queue yields them in non-decreasing time and FIFO within one
//! timestamp.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One simulated event; `at` is a slot index on the planning horizon.
///
/// YAML form:
/// ```yaml
/// - { at: 10, kind: task_arrival, skill: operator, duration: 4, staff: 2 }
/// - { at: 20, kind: availability_change, employee: alice, available: false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimEvent {
    pub at: usize,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// `staff` more holders of `skill` are needed on `[at, at + duration)`.
    TaskArrival {
        skill: String,
        duration: usize,
        #[serde(default = "default_staff")]
        staff: u32,
    },
    /// `employee` becomes (un)available on `[at, until)`, or until the
    /// horizon ends.
    AvailabilityChange {
        employee: String,
        available: bool,
        #[serde(default)]
        until: Option<usize>,
    },
}

fn default_staff() -> u32 {
    1
}

impl SimEvent {
    pub fn task_arrival(at: usize, skill: impl Into<String>, duration: usize, staff: u32) -> Self {
        Self {
            at,
            kind: EventKind::TaskArrival {
                skill: skill.into(),
                duration,
                staff,
            },
        }
    }

    pub fn availability_change(
        at: usize,
        employee: impl Into<String>,
        available: bool,
        until: Option<usize>,
    ) -> Self {
        Self {
            at,
            kind: EventKind::AvailabilityChange {
                employee: employee.into(),
                available,
                until,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            EventKind::TaskArrival { .. } => "task_arrival",
            EventKind::AvailabilityChange { .. } => "availability_change",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: BTreeMap<(usize, u64), SimEvent>,
    seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.insert((event.at, self.seq), event);
        self.seq += 1;
    }

    /// Removes the earliest event; ties leave in insertion order.
    pub fn pop_next(&mut self) -> Option<SimEvent> {
        self.events.pop_first().map(|(_, event)| event)
    }

    pub fn peek_time(&self) -> Option<usize> {
        self.events.keys().next().map(|&(at, _)| at)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Extend<SimEvent> for EventQueue {
    fn extend<I: IntoIterator<Item = SimEvent>>(&mut self, iter: I) {
        for event in iter {
            self.push(event);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
