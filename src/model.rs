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

//! Construction of the boolean assignment model of one half-day.
//!
//! Two variable families are emitted into the backend: attendance variables `X[e,p,t]` (student
//! e attends presentation p at slot t), created only for the candidate triples of the
//! [ReducedProblem], and room-occupancy variables `Y[p,s,t]` (presentation p is held in room s
//! at slot t), created densely. Every triple outside the candidate set is an implicit zero,
//! which is exactly what the attendance constraints would force anyway.
//!
//! The constraints restrict each student's four attendances to their own wishes and slots, make
//! the two top wishes mandatory, cap round tables and flash jobs at one each, keep rooms and
//! presentations exclusive per slot, and link attendance to assigned room capacity. The
//! objective charges each honored wish beyond the top two with its rank's penalty weight.

use std::collections::HashMap;

use log::debug;
use ndarray::Array3;

use crate::backend::{MilpBackend, VarId};
use crate::calendar::{Families, ATTENDANCES_PER_STUDENT, NUM_SLOTS};
use crate::reducer::ReducedProblem;
use crate::{ObjectiveWeights, Room, SchedulingError, Student};

/// Handle maps from semantic tuples to backend variables, kept for solution extraction
pub struct ModelHandles {
    /// Attendance variable per candidate (student, presentation, slot) triple
    pub attendance: HashMap<(usize, usize, usize), VarId>,
    /// Room-occupancy variable per (presentation, room, slot)
    pub occupancy: Array3<VarId>,
}

/// Emit the complete model of one half-day into the backend.
///
/// Fails without touching the backend when a student's wish list cannot satisfy the constraint
/// set: fewer than four distinct wishes, or a duplicated mandatory pair. The caller surfaces
/// such a rejection as a `ModelInvalid` solution instead of solving.
pub fn build<B: MilpBackend>(
    backend: &mut B,
    students: &[Student],
    rooms: &[Room],
    families: &Families,
    reduced: &ReducedProblem,
    weights: &ObjectiveWeights,
) -> Result<ModelHandles, SchedulingError> {
    for (e, student) in students.iter().enumerate() {
        let distinct = reduced.wish_sets[e].len();
        if distinct < ATTENDANCES_PER_STUDENT {
            return Err(SchedulingError::WishListTooShort {
                student: e,
                distinct,
            });
        }
        if student.wishes[0] == student.wishes[1] {
            return Err(SchedulingError::DuplicateMandatoryWish {
                student: e,
                presentation: student.wishes[0],
            });
        }
    }

    let num_presentations = families.total();

    let mut attendance: HashMap<(usize, usize, usize), VarId> = HashMap::new();
    for e in 0..students.len() {
        for &p in reduced.wish_sets[e].iter() {
            for &t in reduced.valid_slots[e].iter() {
                attendance.insert((e, p, t), backend.add_bool_var());
            }
        }
    }
    debug!(
        "Created {} attendance variables (dense formulation would need {})",
        attendance.len(),
        reduced.dense_triples(num_presentations)
    );

    let occupancy = Array3::from_shape_fn((num_presentations, rooms.len(), NUM_SLOTS), |_| {
        backend.add_bool_var()
    });
    debug!("Created {} room-occupancy variables", occupancy.len());

    // Per-student constraints: mandatory top wishes, exact attendance count, no repeats, one
    // presentation per attendable slot, family quotas.
    for (e, student) in students.iter().enumerate() {
        for &wish in student.wishes[..2].iter() {
            let terms: Vec<(VarId, i64)> = reduced.valid_slots[e]
                .iter()
                .map(|&t| (attendance[&(e, wish, t)], 1))
                .collect();
            backend.add_linear_eq(&terms, 1);
        }

        let all_terms: Vec<(VarId, i64)> = reduced.wish_sets[e]
            .iter()
            .flat_map(|&p| {
                reduced.valid_slots[e]
                    .iter()
                    .map(move |&t| (p, t))
            })
            .map(|(p, t)| (attendance[&(e, p, t)], 1))
            .collect();
        backend.add_linear_eq(&all_terms, ATTENDANCES_PER_STUDENT as i64);

        for &p in reduced.wish_sets[e].iter() {
            let terms: Vec<(VarId, i64)> = reduced.valid_slots[e]
                .iter()
                .map(|&t| (attendance[&(e, p, t)], 1))
                .collect();
            backend.add_linear_le(&terms, 1);
        }

        for &t in reduced.valid_slots[e].iter() {
            let terms: Vec<(VarId, i64)> = reduced.wish_sets[e]
                .iter()
                .map(|&p| (attendance[&(e, p, t)], 1))
                .collect();
            backend.add_linear_eq(&terms, 1);
        }

        let round_table_terms: Vec<(VarId, i64)> = reduced.wish_sets[e]
            .iter()
            .filter(|&&p| families.is_round_table(p))
            .flat_map(|&p| reduced.valid_slots[e].iter().map(move |&t| (p, t)))
            .map(|(p, t)| (attendance[&(e, p, t)], 1))
            .collect();
        if !round_table_terms.is_empty() {
            backend.add_linear_le(&round_table_terms, 1);
        }

        let flash_job_terms: Vec<(VarId, i64)> = reduced.wish_sets[e]
            .iter()
            .filter(|&&p| families.is_flash_job(p))
            .flat_map(|&p| reduced.valid_slots[e].iter().map(move |&t| (p, t)))
            .map(|(p, t)| (attendance[&(e, p, t)], 1))
            .collect();
        if !flash_job_terms.is_empty() {
            backend.add_linear_le(&flash_job_terms, 1);
        }
    }

    // Room exclusivity: at most one presentation per room and slot, at most one room per
    // presentation and slot (a presentation spread over two rooms would double its capacity).
    for s in 0..rooms.len() {
        for t in 0..NUM_SLOTS {
            let terms: Vec<(VarId, i64)> = (0..num_presentations)
                .map(|p| (occupancy[[p, s, t]], 1))
                .collect();
            backend.add_linear_le(&terms, 1);
        }
    }
    for p in 0..num_presentations {
        for t in 0..NUM_SLOTS {
            let terms: Vec<(VarId, i64)> = (0..rooms.len())
                .map(|s| (occupancy[[p, s, t]], 1))
                .collect();
            backend.add_linear_le(&terms, 1);
        }
    }

    // Linked capacity: attendees of (p, t) fit into the capacity of the room assigned to
    // (p, t); with no room assigned, nobody can attend. The inner sum only visits students
    // that wished p and may attend slot t.
    for p in 0..num_presentations {
        for t in 0..NUM_SLOTS {
            let mut terms: Vec<(VarId, i64)> = reduced.interested[p]
                .iter()
                .filter(|&&e| reduced.valid_slots[e].contains(&t))
                .map(|&e| (attendance[&(e, p, t)], 1))
                .collect();
            if terms.is_empty() {
                continue;
            }
            for (s, room) in rooms.iter().enumerate() {
                terms.push((occupancy[[p, s, t]], -(room.capacity as i64)));
            }
            backend.add_linear_le(&terms, 0);
        }
    }

    // Objective: penalize honored wishes beyond the top two by rank. A wish duplicating a
    // mandatory one charges the same variable, shifting the objective by a constant.
    let mut objective: Vec<(VarId, i64)> = Vec::new();
    for (e, student) in students.iter().enumerate() {
        for rank in 2..5 {
            let weight = weights.penalty(rank);
            if weight == 0 {
                continue;
            }
            let wish = student.wishes[rank];
            for &t in reduced.valid_slots[e].iter() {
                objective.push((attendance[&(e, wish, t)], weight));
            }
        }
    }
    backend.set_minimize(&objective);

    Ok(ModelHandles {
        attendance,
        occupancy,
    })
}

// =============================================================================
// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendStatus, SolveParams};
    use crate::calendar::Families;
    use crate::reducer::ReducedProblem;

    /// Test double that records the emitted model instead of solving it
    #[derive(Default)]
    struct RecordingBackend {
        num_vars: usize,
        eq_constraints: Vec<(usize, i64)>,
        le_constraints: Vec<(usize, i64)>,
        objective_terms: usize,
    }

    impl MilpBackend for RecordingBackend {
        fn add_bool_var(&mut self) -> VarId {
            self.num_vars += 1;
            VarId(self.num_vars - 1)
        }

        fn add_linear_eq(&mut self, terms: &[(VarId, i64)], rhs: i64) {
            self.eq_constraints.push((terms.len(), rhs));
        }

        fn add_linear_le(&mut self, terms: &[(VarId, i64)], rhs: i64) {
            self.le_constraints.push((terms.len(), rhs));
        }

        fn set_minimize(&mut self, terms: &[(VarId, i64)]) {
            self.objective_terms = terms.len();
        }

        fn solve(&mut self, _params: &SolveParams) -> BackendStatus {
            BackendStatus::Unknown
        }

        fn read_bool(&self, _var: VarId) -> bool {
            false
        }

        fn objective_value(&self) -> i64 {
            0
        }
    }

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

    #[test]
    fn test_model_dimensions() {
        let families = Families::default();
        let students = vec![
            student(0, [0, 1, 2, 19, 25], 0),
            student(1, [0, 1, 2, 19, 25], 1),
        ];
        let rooms = vec![room(0, 20), room(1, 10)];
        let reduced = ReducedProblem::new(&students, &families).unwrap();
        let mut backend = RecordingBackend::default();

        build(
            &mut backend,
            &students,
            &rooms,
            &families,
            &reduced,
            &ObjectiveWeights::default(),
        )
        .unwrap();

        // 2 students * 5 distinct wishes * 4 valid slots attendance variables, plus the dense
        // occupancy grid of 31 presentations * 2 rooms * 5 slots
        assert_eq!(backend.num_vars, 40 + 31 * 2 * 5);

        // Equalities: 2 mandatory wishes + 1 attendance count + 4 one-per-slot, per student
        assert_eq!(backend.eq_constraints.len(), 2 * 7);
        assert_eq!(
            backend
                .eq_constraints
                .iter()
                .filter(|(_, rhs)| *rhs == ATTENDANCES_PER_STUDENT as i64)
                .count(),
            2
        );

        // Inequalities: per student 5 no-repeat + 1 round-table quota + 1 flash-job quota;
        // 2*5 room exclusivity; 31*5 single-room; capacity links only where an interested
        // student can attend: 5 wished presentations * 5 slots (slot 0 early only, slot 4
        // late only, but never empty)
        assert_eq!(
            backend.le_constraints.len(),
            2 * (5 + 1 + 1) + 2 * 5 + 31 * 5 + 5 * 5
        );

        // Capacity rows carry one extra term per room
        assert_eq!(
            backend
                .le_constraints
                .iter()
                .filter(|(len, rhs)| *rhs == 0 && *len >= rooms.len())
                .count(),
            5 * 5
        );

        // Objective: 3 penalized ranks * 4 slots per student
        assert_eq!(backend.objective_terms, 2 * 3 * 4);
    }

    #[test]
    fn test_capacity_terms_respect_arrival_windows() {
        let families = Families::new(3, 1, 1);
        let students = vec![
            student(0, [0, 1, 2, 3, 4], 0),
            student(1, [0, 1, 2, 3, 4], 1),
        ];
        let rooms = vec![room(0, 10)];
        let reduced = ReducedProblem::new(&students, &families).unwrap();
        let mut backend = RecordingBackend::default();

        build(
            &mut backend,
            &students,
            &rooms,
            &families,
            &reduced,
            &ObjectiveWeights::default(),
        )
        .unwrap();

        // Capacity rows at the exclusive slots 0 and 4 see one student plus the room term,
        // at the shared slots both students plus the room term.
        let capacity_rows: Vec<usize> = backend
            .le_constraints
            .iter()
            .filter(|(_, rhs)| *rhs == 0)
            .map(|(len, _)| *len)
            .collect();
        assert_eq!(capacity_rows.len(), 5 * 5);
        assert_eq!(capacity_rows.iter().filter(|&&len| len == 2).count(), 10);
        assert_eq!(capacity_rows.iter().filter(|&&len| len == 3).count(), 15);
    }

    #[test]
    fn test_short_wish_list_rejected() {
        let families = Families::new(3, 1, 1);
        // Distinct wishes collapse to {0, 1, 3}
        let students = vec![student(0, [0, 1, 0, 3, 3], 0)];
        let rooms = vec![room(0, 10)];
        let reduced = ReducedProblem::new(&students, &families).unwrap();
        let mut backend = RecordingBackend::default();

        let result = build(
            &mut backend,
            &students,
            &rooms,
            &families,
            &reduced,
            &ObjectiveWeights::default(),
        );
        assert_eq!(
            result.err(),
            Some(SchedulingError::WishListTooShort {
                student: 0,
                distinct: 3
            })
        );
        assert_eq!(backend.num_vars, 0);
    }

    #[test]
    fn test_duplicate_mandatory_pair_rejected() {
        let families = Families::new(3, 1, 1);
        let students = vec![student(0, [0, 0, 1, 3, 4], 0)];
        let rooms = vec![room(0, 10)];
        let reduced = ReducedProblem::new(&students, &families).unwrap();
        let mut backend = RecordingBackend::default();

        let result = build(
            &mut backend,
            &students,
            &rooms,
            &families,
            &reduced,
            &ObjectiveWeights::default(),
        );
        assert_eq!(
            result.err(),
            Some(SchedulingError::DuplicateMandatoryWish {
                student: 0,
                presentation: 0
            })
        );
        assert_eq!(backend.num_vars, 0);
    }
}
