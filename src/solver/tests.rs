// Copyright 2026 by the cfsao developers
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with
// the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

use crate::calendar::{Families, NUM_SLOTS};
use crate::verify::{verify, wish_rank_usage};
use crate::{
    ObjectiveWeights, Room, SchedulingError, SolveStatus, SolverConfig, Student,
};

fn student(index: usize, wishes: [usize; 5], arrival_code: u8) -> Student {
    Student {
        index,
        dbid: index as u64,
        name: format!("Student {}", index),
        wishes,
        arrival_code,
    }
}

fn room(index: usize, capacity: usize) -> Room {
    Room {
        index,
        name: format!("Room {}", index),
        capacity,
    }
}

/// Three conferences (0..3), one round table (3), one flash job (4)
fn small_families() -> Families {
    Families::new(3, 1, 1)
}

fn config() -> SolverConfig {
    SolverConfig {
        num_workers: 1,
        ..SolverConfig::default()
    }
}

#[test]
fn test_trivially_feasible_cohort() {
    // Four identical early-arrival students; plenty of room. The cheapest schedule honors
    // wishes 1..=4 and skips wish 5, at penalty 1 + 5 per student.
    let families = small_families();
    let students: Vec<Student> = (0..4).map(|e| student(e, [0, 1, 2, 3, 4], 0)).collect();
    let rooms: Vec<Room> = (0..3).map(|s| room(s, 10)).collect();

    let solution = super::solve(&students, &rooms, &families, &config()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.objective, 4 * (1 + 5));

    let report = verify(
        &solution,
        &students,
        &rooms,
        &families,
        &ObjectiveWeights::default(),
    );
    assert!(report.all_passed(), "{}", report);
    assert_eq!(report.compositions.three_conferences_one_round_table, 4);
    assert_eq!(wish_rank_usage(&solution, &students), [4, 4, 4, 4, 0]);
}

#[test]
fn test_capacity_crunch_is_infeasible() {
    // Two students share the early slots but the single one-seat room can serve only one of
    // them per slot.
    let families = small_families();
    let students = vec![
        student(0, [0, 1, 2, 3, 4], 0),
        student(1, [0, 1, 2, 3, 4], 0),
    ];
    let rooms = vec![room(0, 1)];

    let solution = super::solve(&students, &rooms, &families, &config()).unwrap();

    assert_eq!(solution.status, SolveStatus::Infeasible);
    assert_eq!(solution.objective, 0);
    assert_eq!(solution.attendance.sum(), 0);
    assert_eq!(solution.occupancy.sum(), 0);
}

#[test]
fn test_duplicate_mandatory_wish_is_model_invalid() {
    let families = small_families();
    let students = vec![student(0, [0, 0, 1, 3, 4], 0)];
    let rooms = vec![room(0, 10)];

    let solution = super::solve(&students, &rooms, &families, &config()).unwrap();

    assert_eq!(solution.status, SolveStatus::ModelInvalid);
    assert_eq!(solution.attendance.sum(), 0);
}

#[test]
fn test_short_wish_list_is_model_invalid() {
    // Deduplication leaves only three distinct wishes
    let families = small_families();
    let students = vec![student(0, [0, 1, 0, 3, 3], 0)];
    let rooms = vec![room(0, 10)];

    let solution = super::solve(&students, &rooms, &families, &config()).unwrap();

    assert_eq!(solution.status, SolveStatus::ModelInvalid);
    assert_eq!(solution.attendance.sum(), 0);
}

#[test]
fn test_structural_errors_abort_the_half_day() {
    let families = small_families();
    let rooms = vec![room(0, 10)];

    let students = vec![student(0, [0, 1, 2, 3, 4], 9)];
    assert_eq!(
        super::solve(&students, &rooms, &families, &config()).err(),
        Some(SchedulingError::InvalidArrivalCode { code: 9 })
    );

    let students = vec![student(0, [3, 1, 2, 3, 4], 0)];
    assert_eq!(
        super::solve(&students, &rooms, &families, &config()).err(),
        Some(SchedulingError::WishTypeMismatch {
            student: 0,
            rank: 0,
            presentation: 3
        })
    );
}

#[test]
fn test_arrival_window_mix_splits_popular_conference() {
    // Four early and four late students all name conference 0 as their top wish, but the
    // rooms hold four students each, so conference 0 must run at two different slots.
    let families = small_families();
    let mut students: Vec<Student> = (0..4).map(|e| student(e, [0, 1, 2, 3, 4], 0)).collect();
    students.extend((4..8).map(|e| student(e, [0, 1, 2, 3, 4], 1)));
    let rooms = vec![room(0, 4), room(1, 4)];

    let solution = super::solve(&students, &rooms, &families, &config()).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.objective, 8 * (1 + 5));

    let report = verify(
        &solution,
        &students,
        &rooms,
        &families,
        &ObjectiveWeights::default(),
    );
    assert!(report.all_passed(), "{}", report);

    let conference_slots = (0..NUM_SLOTS)
        .filter(|&t| (0..rooms.len()).any(|s| solution.occupancy[[0, s, t]] != 0))
        .count();
    assert!(
        conference_slots >= 2,
        "conference 0 must be held at two or more slots, got {}",
        conference_slots
    );
}

#[test]
fn test_objective_weights_are_configuration() {
    // Same cohort as the trivially feasible case; doubling the rank-3 weight shifts the
    // optimum accordingly.
    let families = small_families();
    let students: Vec<Student> = (0..4).map(|e| student(e, [0, 1, 2, 3, 4], 0)).collect();
    let rooms: Vec<Room> = (0..3).map(|s| room(s, 10)).collect();
    let config = SolverConfig {
        num_workers: 1,
        weights: ObjectiveWeights {
            wish3: 2,
            wish4: 5,
            wish5: 10,
        },
        ..SolverConfig::default()
    };

    let solution = super::solve(&students, &rooms, &families, &config).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.objective, 4 * (2 + 5));

    let report = verify(&solution, &students, &rooms, &families, &config.weights);
    assert!(report.all_passed(), "{}", report);
}

#[test]
fn test_rerun_reproduces_the_objective() {
    let families = small_families();
    let students: Vec<Student> = (0..6).map(|e| student(e, [0, 1, 2, 3, 4], (e % 2) as u8)).collect();
    let rooms = vec![room(0, 6), room(1, 6)];

    let first = super::solve(&students, &rooms, &families, &config()).unwrap();
    let second = super::solve(&students, &rooms, &families, &config()).unwrap();

    assert_eq!(first.status, SolveStatus::Optimal);
    assert_eq!(second.status, SolveStatus::Optimal);
    assert_eq!(first.objective, second.objective);
}
