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

//! Independent re-validation of a solved assignment.
//!
//! Every contract of the model is re-derived directly from the dense attendance and occupancy
//! tables, on purpose without reusing the model builder or the reducer: a builder bug must not
//! be able to vouch for its own output. The result is an ordered list of named checks with the
//! first violation as a human-readable witness, plus a classification of every student's
//! attendance composition.

use std::fmt;

use crate::calendar::{Families, ATTENDANCES_PER_STUDENT, NUM_SLOTS};
use crate::{ObjectiveWeights, Room, Solution, Student};

/// Outcome of one re-checked contract
#[derive(Debug, Clone)]
pub struct Check {
    /// Name of the contract
    pub name: &'static str,
    pub passed: bool,
    /// First violation found, if any
    pub witness: Option<String>,
}

/// Tally of the students' attendance compositions (conferences, round tables, flash jobs)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionCounts {
    /// (4, 0, 0) — unreachable with schema-conforming wish lists, counted defensively
    pub four_conferences: usize,
    /// (3, 1, 0)
    pub three_conferences_one_round_table: usize,
    /// (3, 0, 1)
    pub three_conferences_one_flash_job: usize,
    /// (2, 1, 1)
    pub two_conferences_one_each: usize,
    /// Anything else
    pub invalid: usize,
}

/// Re-validation result of one half-day's solution
#[derive(Debug, Clone)]
pub struct Report {
    /// All re-checked contracts, in a fixed order
    pub checks: Vec<Check>,
    pub compositions: CompositionCounts,
}

impl Report {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Result of the named check, if it exists
    pub fn passed(&self, name: &str) -> Option<bool> {
        self.checks
            .iter()
            .find(|check| check.name == name)
            .map(|check| check.passed)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in self.checks.iter() {
            match &check.witness {
                Some(witness) if !check.passed => {
                    writeln!(f, "FAIL {} ({})", check.name, witness)?
                }
                _ => writeln!(f, "  ok {}", check.name)?,
            }
        }
        write!(
            f,
            "compositions: 4C: {}, 3C+1TR: {}, 3C+1FM: {}, 2C+1TR+1FM: {}, invalid: {}",
            self.compositions.four_conferences,
            self.compositions.three_conferences_one_round_table,
            self.compositions.three_conferences_one_flash_job,
            self.compositions.two_conferences_one_each,
            self.compositions.invalid
        )
    }
}

/// Slot attendability of an arrival code, derived locally from the parity rule
fn slot_mask(arrival_code: u8) -> [bool; NUM_SLOTS] {
    if arrival_code % 2 == 0 {
        [true, true, true, true, false]
    } else {
        [false, true, true, true, true]
    }
}

/// Distinct wishes of a student, derived locally
fn wish_set(student: &Student) -> Vec<usize> {
    let mut wishes = student.wishes.to_vec();
    wishes.sort_unstable();
    wishes.dedup();
    wishes
}

/// Re-check every contract of the assignment model against the solution tables.
///
/// Meaningful for solutions whose status carries tables (`Optimal`/`Feasible`); an all-zero
/// solution fails the mandatory-wish and count checks by construction.
pub fn verify(
    solution: &Solution,
    students: &[Student],
    rooms: &[Room],
    families: &Families,
    weights: &ObjectiveWeights,
) -> Report {
    let attendance = &solution.attendance;
    let occupancy = &solution.occupancy;
    let num_presentations = families.total();

    let mut checks = Vec::new();

    // Mandatory wishes 1 and 2, honored exactly once each
    for (name, rank) in [("mandatory_wish_1", 0usize), ("mandatory_wish_2", 1usize)] {
        let mut witness = None;
        for (e, student) in students.iter().enumerate() {
            let wish = student.wishes[rank];
            let count: u32 = (0..NUM_SLOTS)
                .map(|t| attendance[[e, wish, t]] as u32)
                .sum();
            if count != 1 {
                witness = Some(format!(
                    "student {} attends wish {} (presentation {}) {} times",
                    e,
                    rank + 1,
                    wish,
                    count
                ));
                break;
            }
        }
        checks.push(Check {
            name,
            passed: witness.is_none(),
            witness,
        });
    }

    // Exactly four attendances per student
    let mut witness = None;
    for e in 0..students.len() {
        let total: u32 = (0..num_presentations)
            .flat_map(|p| (0..NUM_SLOTS).map(move |t| (p, t)))
            .map(|(p, t)| attendance[[e, p, t]] as u32)
            .sum();
        if total != ATTENDANCES_PER_STUDENT as u32 {
            witness = Some(format!("student {} attends {} presentations", e, total));
            break;
        }
    }
    checks.push(Check {
        name: "attendance_count",
        passed: witness.is_none(),
        witness,
    });

    // No presentation attended twice by the same student
    let mut witness = None;
    'repeat: for e in 0..students.len() {
        for p in 0..num_presentations {
            let count: u32 = (0..NUM_SLOTS).map(|t| attendance[[e, p, t]] as u32).sum();
            if count > 1 {
                witness = Some(format!(
                    "student {} attends presentation {} {} times",
                    e, p, count
                ));
                break 'repeat;
            }
        }
    }
    checks.push(Check {
        name: "no_repeat",
        passed: witness.is_none(),
        witness,
    });

    // Exactly one presentation per attendable slot, none outside
    let mut valid_witness = None;
    let mut invalid_witness = None;
    for (e, student) in students.iter().enumerate() {
        let mask = slot_mask(student.arrival_code);
        for (t, attendable) in mask.iter().enumerate() {
            let count: u32 = (0..num_presentations)
                .map(|p| attendance[[e, p, t]] as u32)
                .sum();
            if *attendable && count != 1 && valid_witness.is_none() {
                valid_witness = Some(format!(
                    "student {} attends {} presentations at slot {}",
                    e, count, t
                ));
            }
            if !*attendable && count != 0 && invalid_witness.is_none() {
                invalid_witness = Some(format!(
                    "student {} attends slot {} outside their arrival window",
                    e, t
                ));
            }
        }
    }
    checks.push(Check {
        name: "one_per_valid_slot",
        passed: valid_witness.is_none(),
        witness: valid_witness,
    });
    checks.push(Check {
        name: "outside_valid_slots",
        passed: invalid_witness.is_none(),
        witness: invalid_witness,
    });

    // No attendance outside the student's own wish set
    let mut witness = None;
    'wished: for (e, student) in students.iter().enumerate() {
        let wishes = wish_set(student);
        for p in 0..num_presentations {
            if wishes.binary_search(&p).is_ok() {
                continue;
            }
            for t in 0..NUM_SLOTS {
                if attendance[[e, p, t]] != 0 {
                    witness = Some(format!(
                        "student {} attends unwished presentation {} at slot {}",
                        e, p, t
                    ));
                    break 'wished;
                }
            }
        }
    }
    checks.push(Check {
        name: "only_wished",
        passed: witness.is_none(),
        witness,
    });

    // At most one presentation per room and slot
    let mut witness = None;
    'rooms: for s in 0..rooms.len() {
        for t in 0..NUM_SLOTS {
            let count: u32 = (0..num_presentations)
                .map(|p| occupancy[[p, s, t]] as u32)
                .sum();
            if count > 1 {
                witness = Some(format!(
                    "room {} hosts {} presentations at slot {}",
                    s, count, t
                ));
                break 'rooms;
            }
        }
    }
    checks.push(Check {
        name: "room_exclusive",
        passed: witness.is_none(),
        witness,
    });

    // At most one room per presentation and slot
    let mut witness = None;
    'single: for p in 0..num_presentations {
        for t in 0..NUM_SLOTS {
            let count: u32 = (0..rooms.len()).map(|s| occupancy[[p, s, t]] as u32).sum();
            if count > 1 {
                witness = Some(format!(
                    "presentation {} runs in {} rooms at slot {}",
                    p, count, t
                ));
                break 'single;
            }
        }
    }
    checks.push(Check {
        name: "single_room",
        passed: witness.is_none(),
        witness,
    });

    // Attendees fit into the capacity of the assigned room(s)
    let mut witness = None;
    'capacity: for p in 0..num_presentations {
        for t in 0..NUM_SLOTS {
            let attendees: usize = (0..students.len())
                .map(|e| attendance[[e, p, t]] as usize)
                .sum();
            let capacity: usize = rooms
                .iter()
                .enumerate()
                .filter(|(s, _)| occupancy[[p, *s, t]] != 0)
                .map(|(_, room)| room.capacity)
                .sum();
            if attendees > capacity {
                witness = Some(format!(
                    "presentation {} at slot {} has {} attendees for {} seats",
                    p, t, attendees, capacity
                ));
                break 'capacity;
            }
        }
    }
    checks.push(Check {
        name: "room_capacity",
        passed: witness.is_none(),
        witness,
    });

    // Family quotas and composition classification
    let mut round_table_witness = None;
    let mut flash_job_witness = None;
    let mut composition_witness = None;
    let mut compositions = CompositionCounts::default();
    for e in 0..students.len() {
        let mut num_conferences = 0usize;
        let mut num_round_tables = 0usize;
        let mut num_flash_jobs = 0usize;
        for p in 0..num_presentations {
            let count: usize = (0..NUM_SLOTS).map(|t| attendance[[e, p, t]] as usize).sum();
            if families.is_conference(p) {
                num_conferences += count;
            } else if families.is_round_table(p) {
                num_round_tables += count;
            } else {
                num_flash_jobs += count;
            }
        }
        if num_round_tables > 1 && round_table_witness.is_none() {
            round_table_witness = Some(format!(
                "student {} attends {} round tables",
                e, num_round_tables
            ));
        }
        if num_flash_jobs > 1 && flash_job_witness.is_none() {
            flash_job_witness =
                Some(format!("student {} attends {} flash jobs", e, num_flash_jobs));
        }
        match (num_conferences, num_round_tables, num_flash_jobs) {
            (4, 0, 0) => compositions.four_conferences += 1,
            (3, 1, 0) => compositions.three_conferences_one_round_table += 1,
            (3, 0, 1) => compositions.three_conferences_one_flash_job += 1,
            (2, 1, 1) => compositions.two_conferences_one_each += 1,
            other => {
                compositions.invalid += 1;
                if composition_witness.is_none() {
                    composition_witness =
                        Some(format!("student {} has composition {:?}", e, other));
                }
            }
        }
    }
    checks.push(Check {
        name: "round_table_quota",
        passed: round_table_witness.is_none(),
        witness: round_table_witness,
    });
    checks.push(Check {
        name: "flash_job_quota",
        passed: flash_job_witness.is_none(),
        witness: flash_job_witness,
    });
    checks.push(Check {
        name: "composition",
        passed: composition_witness.is_none(),
        witness: composition_witness,
    });

    // The reported objective matches the penalty recomputed from the tables
    let mut recomputed = 0i64;
    for (e, student) in students.iter().enumerate() {
        for rank in 2..5 {
            let wish = student.wishes[rank];
            let count: i64 = (0..NUM_SLOTS).map(|t| attendance[[e, wish, t]] as i64).sum();
            recomputed += weights.penalty(rank) * count;
        }
    }
    let witness = if recomputed == solution.objective {
        None
    } else {
        Some(format!(
            "reported objective {} but recomputed penalty {}",
            solution.objective, recomputed
        ))
    };
    checks.push(Check {
        name: "objective_consistency",
        passed: witness.is_none(),
        witness,
    });

    Report {
        checks,
        compositions,
    }
}

/// Number of students whose rank-k wish (k = 1..=5) was honored, recomputed from the
/// attendance table. A wish duplicating a higher-ranked one counts for both ranks.
pub fn wish_rank_usage(solution: &Solution, students: &[Student]) -> [usize; 5] {
    let mut usage = [0usize; 5];
    for (e, student) in students.iter().enumerate() {
        for (rank, &wish) in student.wishes.iter().enumerate() {
            let honored = (0..NUM_SLOTS).any(|t| solution.attendance[[e, wish, t]] != 0);
            if honored {
                usage[rank] += 1;
            }
        }
    }
    usage
}
