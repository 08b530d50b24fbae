/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! End-to-end planning scenarios and randomized invariant checks.
//!
//! Every returned schedule is re-checked here from the raw slot grids, without
//! going through the model's own row evaluation.

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use rotaplan::breaks::BreakPlanner;
use rotaplan::config::{
    EmployeeProfile, PlannerConfig, RosterConfig, SkillsMatrix, SlotRange, SolverSettings,
};
use rotaplan::entity::{EntityModel, SlotGrid};
use rotaplan::model::Model;
use rotaplan::planner::{plan_roster, Planner};
use rotaplan::schedule::{PlanOutcome, Schedule};
use rotaplan::simulation::event::SimEvent;
use rotaplan::simulation::DiscreteEventDriver;
use rotaplan::solver::InfeasibilityCause;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn matrix(rows: &[(&str, &[&str])]) -> SkillsMatrix {
    rows.iter()
        .map(|(id, skills)| {
            (
                id.to_string(),
                skills.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            )
        })
        .collect()
}

fn planner(time_limit_seconds: f64) -> Planner {
    Planner::new(SolverSettings {
        time_limit_seconds,
        ..SolverSettings::default()
    })
    .unwrap()
}

fn one_day() -> PlannerConfig {
    PlannerConfig {
        horizon_days: 1,
        ..PlannerConfig::default()
    }
}

/// Checks every hard rule of a returned schedule against the entities.
fn assert_invariants(schedule: &Schedule, ent: &EntityModel, cfg: &PlannerConfig) {
    let horizon = ent.horizon;
    let sph = horizon.slots_per_hour as usize;
    let slots_per_day = horizon.slots_per_day();
    let num_slots = horizon.num_slots();
    let work = &schedule.work;
    let breaks = &schedule.breaks;
    assert_eq!(work.num_slots(), num_slots);

    let worked = |e: usize, from: usize, to: usize| (from..to).filter(|&t| work.get(e, t)).count();

    // Rest windows start every `stride` slots, plus the one ending the horizon.
    let window = cfg.rest_window_hours as usize * sph;
    let len = window.min(num_slots);
    let mut rest_starts: Vec<usize> = (0..=num_slots - len)
        .step_by(cfg.rest_window_stride_slots as usize)
        .collect();
    rest_starts.push(num_slots - len);

    for (e, emp) in ent.employees.iter().enumerate() {
        let daily = emp.max_hours_per_day as usize * sph;
        for day_start in (0..num_slots).step_by(slots_per_day) {
            let end = (day_start + slots_per_day).min(num_slots);
            assert!(worked(e, day_start, end) <= daily, "{}: daily cap", emp.id);
        }

        let weekly = emp.max_hours_per_week as usize * sph;
        for week_start in (0..num_slots).step_by(7 * slots_per_day) {
            let end = (week_start + 7 * slots_per_day).min(num_slots);
            assert!(worked(e, week_start, end) <= weekly, "{}: weekly cap", emp.id);
        }

        let cap = window - emp.min_rest_hours as usize * sph;
        for &start in &rest_starts {
            assert!(
                worked(e, start, start + len) <= cap,
                "{}: rest window at {start}",
                emp.id
            );
        }

        for t in 0..num_slots {
            if work.get(e, t) {
                assert!(emp.is_available(t), "{}: works unavailable slot {t}", emp.id);
            }
        }

        // One break per shift, inside work, never two in a row; shifts no
        // longer than the consecutive-hours cap.
        let streak_cap = cfg.max_consecutive_hours.map(|h| h as usize * sph);
        let mut t = 0;
        while t < num_slots {
            if !work.get(e, t) {
                assert!(!breaks.get(e, t), "{}: break off shift at {t}", emp.id);
                t += 1;
                continue;
            }
            let start = t;
            while t < num_slots && work.get(e, t) {
                t += 1;
            }
            let in_shift = (start..t).filter(|&s| breaks.get(e, s)).count();
            assert_eq!(in_shift, 1, "{}: shift {start}..{t}", emp.id);
            if let Some(max) = streak_cap {
                assert!(t - start <= max, "{}: {} slots in a row from {start}", emp.id, t - start);
            }
        }
        for t in 1..num_slots {
            assert!(
                !(breaks.get(e, t - 1) && breaks.get(e, t)),
                "{}: adjacent breaks at {t}",
                emp.id
            );
        }
    }

    for t in 0..num_slots {
        let on_duty: Vec<usize> = (0..ent.employees.len()).filter(|&e| work.get(e, t)).collect();
        assert!(
            on_duty.len() >= ent.staff_demand(t) as usize,
            "head count at {t}"
        );
        for (k, skill) in ent.skills.iter().enumerate() {
            let holders = on_duty
                .iter()
                .filter(|&&e| ent.employees[e].skills.contains(&skill.id))
                .count();
            assert!(
                holders >= ent.demand(k, t) as usize,
                "skill {} at {t}",
                skill.id
            );
        }
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn scenario_a_three_shared_employees_cover_a_day() {
    let cfg = one_day();
    let ent = EntityModel::from_skills_matrix(
        &matrix(&[("a", &["op"]), ("b", &["op"]), ("c", &["op"])]),
        &cfg,
    )
    .unwrap();
    let outcome = planner(20.0).plan(&ent).unwrap();

    let schedule = outcome.schedule().expect("scenario A is feasible");
    assert!((24..=72).contains(&schedule.total_worked()));
    assert_invariants(schedule, &ent, &cfg);
}

#[test]
fn scenario_b_single_holder_cannot_meet_double_coverage() {
    let mut cfg = one_day();
    cfg.skill_coverage.insert("k".into(), 2);
    let ent =
        EntityModel::from_skills_matrix(&matrix(&[("a", &["op", "k"]), ("b", &["op"])]), &cfg)
            .unwrap();
    let outcome = planner(5.0).plan(&ent).unwrap();

    let report = outcome.infeasibility().expect("scenario B is infeasible");
    assert!(report.is_proven());
    assert_eq!(outcome.quality_label(), "infeasible");
}

#[test]
fn scenario_c_tiny_time_limit_is_never_optimal() {
    let rows: Vec<(String, Vec<&str>)> = (0..40).map(|i| (format!("e{i:02}"), vec!["op"])).collect();
    let rows: Vec<(&str, &[&str])> = rows.iter().map(|(id, s)| (id.as_str(), s.as_slice())).collect();
    let cfg = PlannerConfig {
        horizon_days: 14,
        ..PlannerConfig::default()
    };
    let ent = EntityModel::from_skills_matrix(&matrix(&rows), &cfg).unwrap();
    let outcome = planner(0.01).plan(&ent).unwrap();

    match &outcome {
        PlanOutcome::Scheduled(schedule) => {
            assert!(!schedule.quality.is_optimal());
            assert!(schedule.quality.timed_out());
            assert!(schedule.total_worked() > 0);
            assert_invariants(schedule, &ent, &cfg);
        }
        PlanOutcome::Infeasible(report) => {
            assert_eq!(report.cause, InfeasibilityCause::TimeLimit);
            assert!(!report.is_proven());
        }
    }
    assert_ne!(outcome.quality_label(), "optimal");
}

#[test]
fn scenario_d_single_shift_breaks_at_midpoint() {
    let work = SlotGrid::from_fn(1, 24, |_, t| (2..10).contains(&t));
    let breaks = BreakPlanner::new().plan(&work).unwrap();
    let placed: Vec<usize> = (0..24).filter(|&t| breaks.get(0, t)).collect();
    assert_eq!(placed, vec![6]);
}

// ── Structural properties ─────────────────────────────────────────────────────

#[test]
fn model_build_is_idempotent() {
    let mut cfg = PlannerConfig::default();
    cfg.skill_coverage.insert("qa".into(), 1);
    cfg.max_consecutive_hours = Some(6);
    let ent = EntityModel::from_skills_matrix(
        &matrix(&[("a", &["op", "qa"]), ("b", &["qa"]), ("c", &["op"])]),
        &cfg,
    )
    .unwrap();

    let first = Model::build(&ent);
    let second = Model::build(&ent);
    assert_eq!(first.var_count(), second.var_count());
    assert_eq!(first.row_count(), second.row_count());
    assert_eq!(first.family_counts(), second.family_counts());
    assert_eq!(first, second);
}

#[test]
fn short_horizon_rest_window_builds() {
    let cfg = PlannerConfig {
        horizon_days: 1,
        rest_window_hours: 36,
        ..PlannerConfig::default()
    };
    let ent = EntityModel::from_skills_matrix(&matrix(&[("a", &["op"])]), &cfg).unwrap();
    let model = Model::build(&ent);
    assert_eq!(model.var_count(), 2 * 24);
    assert!(model.row_count() > 0);
}

#[test]
fn raising_min_staff_never_lowers_the_objective() {
    let rows = [
        ("a", &["op"][..]),
        ("b", &["op"][..]),
        ("c", &["op"][..]),
        ("d", &["op"][..]),
        ("e", &["op"][..]),
    ];
    let objective = |min_staff: u32| {
        let cfg = PlannerConfig {
            horizon_days: 1,
            max_hours_per_day: 12,
            min_rest_hours: 8,
            min_staff_per_shift: min_staff,
            ..PlannerConfig::default()
        };
        let ent = EntityModel::from_skills_matrix(&matrix(&rows), &cfg).unwrap();
        let outcome = planner(20.0).plan(&ent).unwrap();
        let schedule = outcome.schedule().expect("feasible").clone();
        assert!(schedule.quality.is_optimal());
        assert_invariants(&schedule, &ent, &cfg);
        schedule.objective
    };

    let one = objective(1);
    let two = objective(2);
    assert_eq!(one, 24);
    assert!(two >= one);
    assert_eq!(two, 48);
}

#[test]
fn default_roster_plans_within_limits() {
    let mut roster = RosterConfig::default_roster();
    roster.planner.horizon_days = 1;
    roster.solver.time_limit_seconds = 20.0;
    let outcome = plan_roster(&roster).unwrap();
    let ent = EntityModel::build(&roster.employees, &roster.planner).unwrap();
    let schedule = outcome.schedule().expect("five employees cover one day");
    assert_invariants(schedule, &ent, &roster.planner);
}

#[test]
fn simulated_events_keep_every_invariant() {
    let roster = RosterConfig::from_yaml_str(
        r#"
planner:
  horizon_days: 1
solver:
  time_limit_seconds: 20
employees:
  a: [op, qa]
  b: [op]
  c: [op, qa]
  d: [op]
events:
  - { at: 5, kind: task_arrival, skill: qa, duration: 3 }
  - { at: 12, kind: task_arrival, skill: op, duration: 2, staff: 1 }
"#,
    )
    .unwrap();
    let ent = EntityModel::build(&roster.employees, &roster.planner).unwrap();
    let mut driver = DiscreteEventDriver::new(Planner::new(roster.solver).unwrap(), ent);
    for event in &roster.events {
        driver.schedule_event(event.clone()).unwrap();
    }
    driver
        .schedule_event(SimEvent::availability_change(20, "b", false, None))
        .unwrap();

    driver.start().unwrap();
    let mut steps = 0;
    while driver.step().unwrap().is_some() {
        steps += 1;
    }
    assert_eq!(steps, 3);
    assert!(driver.is_finished());

    let schedule = driver.schedule().expect("running schedule");
    assert_invariants(schedule, driver.entities(), &roster.planner);
}

// ── Randomized rosters ────────────────────────────────────────────────────────

const SKILLS: [&str; 3] = ["op", "maint", "qa"];

fn random_case(rng: &mut Pcg64Mcg) -> (BTreeMap<String, EmployeeProfile>, PlannerConfig) {
    let horizon_days: u32 = rng.gen_range(2..=9);
    let slots_per_hour: u32 = if rng.gen_bool(0.5) { 1 } else { 2 };
    let num_slots = (horizon_days * 24 * slots_per_hour) as usize;

    let employees = rng.gen_range(2..=6);
    let mut roster = BTreeMap::new();
    for i in 0..employees {
        let mut skills = BTreeSet::new();
        skills.insert(SKILLS[rng.gen_range(0..SKILLS.len())].to_string());
        if rng.gen_bool(0.4) {
            skills.insert(SKILLS[rng.gen_range(0..SKILLS.len())].to_string());
        }
        let mut profile = EmployeeProfile::with_skills(skills);
        if rng.gen_bool(0.3) {
            let from = rng.gen_range(0..num_slots);
            let len = rng.gen_range(1..=6 * slots_per_hour as usize);
            profile.unavailable.push(SlotRange {
                from,
                until: (from + len).min(num_slots),
            });
        }
        roster.insert(format!("emp{i}"), profile);
    }

    let held: BTreeSet<String> = roster.values().flat_map(|p| p.skills.iter().cloned()).collect();
    let mut cfg = PlannerConfig {
        horizon_days,
        slots_per_hour,
        max_hours_per_day: rng.gen_range(4..=12),
        max_hours_per_week: rng.gen_range(24..=48),
        min_rest_hours: rng.gen_range(8..=14),
        rest_window_stride_slots: rng.gen_range(1..=4),
        max_consecutive_hours: rng.gen_bool(0.4).then(|| rng.gen_range(3..=8)),
        min_staff_per_shift: rng.gen_range(0..=2),
        ..PlannerConfig::default()
    };
    for skill in held {
        if rng.gen_bool(0.3) {
            cfg.skill_coverage.insert(skill, 1);
        }
    }
    (roster, cfg)
}

#[test]
fn random_rosters_never_yield_invalid_schedules() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x5eed_2026);
    let mut feasible = 0;

    for case in 0..24 {
        let (roster, cfg) = random_case(&mut rng);
        let ent = EntityModel::build(&roster, &cfg).unwrap();
        let outcome = planner(3.0).plan(&ent).unwrap();

        match &outcome {
            PlanOutcome::Scheduled(schedule) => {
                feasible += 1;
                assert!(
                    schedule.best_bound <= schedule.objective,
                    "case {case}: bound above objective"
                );
                if schedule.quality.is_optimal() {
                    assert_eq!(schedule.best_bound, schedule.objective, "case {case}");
                }
                assert_invariants(schedule, &ent, &cfg);
            }
            PlanOutcome::Infeasible(report) => {
                assert!(!report.detail.is_empty(), "case {case}");
            }
        }
    }
    assert!(feasible > 0, "generator produced no feasible roster");
}

#[test]
fn random_cases_cover_the_configuration_space() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x5eed_2026);
    let cases: Vec<_> = (0..24).map(|_| random_case(&mut rng)).collect();

    assert!(cases.iter().any(|(_, cfg)| cfg.horizon_days > 7), "partial weeks");
    assert!(cases.iter().any(|(_, cfg)| cfg.slots_per_hour == 2));
    assert!(cases.iter().any(|(_, cfg)| cfg.max_consecutive_hours.is_some()));
    assert!(cases.iter().any(|(_, cfg)| cfg.rest_window_stride_slots > 1));
    assert!(cases
        .iter()
        .any(|(roster, _)| roster.values().any(|p| !p.unavailable.is_empty())));
}

#[test]
fn consecutive_cap_splits_long_days() {
    let cfg = PlannerConfig {
        horizon_days: 2,
        slots_per_hour: 2,
        max_hours_per_day: 10,
        max_consecutive_hours: Some(4),
        ..PlannerConfig::default()
    };
    let ent = EntityModel::from_skills_matrix(
        &matrix(&[
            ("a", &["op"]),
            ("b", &["op"]),
            ("c", &["op"]),
            ("d", &["op"]),
        ]),
        &cfg,
    )
    .unwrap();
    let outcome = planner(20.0).plan(&ent).unwrap();

    let schedule = outcome.schedule().expect("four operators cover two days");
    assert_invariants(schedule, &ent, &cfg);
    for e in 0..4 {
        assert!(schedule.shifts(e).iter().all(|s| s.end - s.start <= 8));
    }
}
