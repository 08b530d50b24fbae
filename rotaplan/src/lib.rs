/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Rotaplan – work/break roster optimiser
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/       – YAML roster: planner settings, solver tuning, skills matrix, events
//! ├── entity        – validated employees, skills, horizon and slot grids
//! ├── model/        – 0/1 program: variables, rows, rolling windows
//! ├── solver/       – root checks and capacity cuts, then HiGHS via good_lp
//! ├── breaks        – one break per shift, closest to the midpoint
//! ├── planner       – entities → model → solver → breaks → schedule
//! ├── schedule      – Schedule / PlanOutcome / SolveQuality
//! ├── simulation/   – discrete-event driver and event queue
//! ├── report        – JSON document, text summary, coverage views
//! └── error         – ValidationError / SolverError / PlanError
//! ```

pub mod breaks;
pub mod config;
pub mod entity;
pub mod error;
pub mod model;
pub mod planner;
pub mod report;
pub mod schedule;
pub mod simulation;
pub mod solver;
