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

pub mod simple;

use std::fmt::Write;

use crate::calendar::{Families, NUM_SLOTS};
use crate::{Room, Solution, Student};

/// Format a solved half-day into a human readable String (e.g. to print it to stdout).
///
/// The output format will look like
/// ```text
/// ===== Conf1 =====
/// slot 1: Main Hall (23 attendees)
/// slot 2: Main Hall (19 attendees)
///
/// ===== TR1 =====
/// slot 3: Meeting Room (8 attendees)
/// …
/// ```
pub fn format_solution(
    solution: &Solution,
    students: &[Student],
    rooms: &[Room],
    families: &Families,
) -> String {
    let mut result = String::new();
    for p in 0..families.total() {
        let mut sessions = Vec::new();
        for t in 0..NUM_SLOTS {
            for (s, current_room) in rooms.iter().enumerate() {
                if solution.occupancy[[p, s, t]] != 0 {
                    let attendees: usize = (0..students.len())
                        .map(|e| solution.attendance[[e, p, t]] as usize)
                        .sum();
                    sessions.push((t, current_room, attendees));
                }
            }
        }
        if sessions.is_empty() {
            continue;
        }
        write!(result, "\n===== {} =====\n", families.name_of(p)).unwrap();
        for (t, current_room, attendees) in sessions {
            writeln!(
                result,
                "slot {}: {} ({} attendees)",
                t, current_room.name, attendees
            )
            .unwrap();
        }
    }
    result
}

/// Format the per-student schedules of a solved half-day into a human readable String.
///
/// The output format will look like
/// ```text
/// ----- Anton Admin (17) -----
/// slot 0: Conf1 @ Main Hall
/// slot 1: Conf3 @ Main Hall
/// slot 2: TR1 @ Meeting Room
/// slot 3: Conf2 @ Main Hall
/// …
/// ```
pub fn format_student_schedules(
    solution: &Solution,
    students: &[Student],
    rooms: &[Room],
    families: &Families,
) -> String {
    let mut result = String::new();
    for (e, student) in students.iter().enumerate() {
        write!(result, "\n----- {} ({}) -----\n", student.name, student.dbid).unwrap();
        for t in 0..NUM_SLOTS {
            for p in 0..families.total() {
                if solution.attendance[[e, p, t]] == 0 {
                    continue;
                }
                let hosting_room = rooms
                    .iter()
                    .enumerate()
                    .find(|(s, _)| solution.occupancy[[p, *s, t]] != 0)
                    .map(|(_, room)| room.name.as_str())
                    .unwrap_or("no room");
                writeln!(
                    result,
                    "slot {}: {} @ {}",
                    t,
                    families.name_of(p),
                    hosting_room
                )
                .unwrap();
            }
        }
    }
    result
}

pub fn debug_list_of_rooms(rooms: &[Room]) -> String {
    rooms
        .iter()
        .map(|r| format!("{:02} {} ({} seats)", r.index, r.name, r.capacity))
        .collect::<Vec<String>>()
        .join("\n")
}

/// Assert that a given students/rooms data structure is consistent (in terms of object's
/// indexes and cross referencing indexes)
pub fn assert_data_consistency(students: &[Student], rooms: &[Room], families: &Families) {
    for (i, student) in students.iter().enumerate() {
        assert_eq!(
            i, student.index,
            "Index of {}. student is {}",
            i, student.index
        );
        for &wish in student.wishes.iter() {
            assert!(
                wish < families.total(),
                "Wish {} of {}. student is invalid",
                wish,
                i
            );
        }
    }
    for (i, room) in rooms.iter().enumerate() {
        assert_eq!(i, room.index, "Index of {}. room is {}", i, room.index);
        assert!(room.capacity >= 1, "Room {} has no seats", i);
    }
}
