

use serde::Deserialize;
use serde_json::json;

use crate::calendar::{self, Families, NUM_SLOTS};
use crate::{Room, Solution, Student};

/// Sizes of the three presentation families in the input document
#[derive(Deserialize, Debug, PartialEq)]
struct PresentationCounts {
    conferences: usize,
    round_tables: usize,
    flash_jobs: usize,
}

/// Read students, rooms and the presentation-family sizes from the simple JSON representation
/// (canonical serde_json serialization of `Student` and `Room` objects under the keys
/// "students", "rooms" and "presentations").
///
/// Room capacities are inflated by the given absorption buffer here; the solver treats the
/// inflated value as the hard cap.
pub fn read<R: std::io::Read>(
    reader: R,
    capacity_buffer: f64,
) -> Result<(Vec<Student>, Vec<Room>, Families), String> {
    let mut data: serde_json::Value =
        serde_json::from_reader(reader).map_err(|err| err.to_string())?;

    let mut students: Vec<Student> =
        serde_json::from_value(data["students"].take()).map_err(|e| format!("{}", e))?;
    for (i, student) in students.iter_mut().enumerate() {
        student.index = i;
    }

    let mut rooms: Vec<Room> =
        serde_json::from_value(data["rooms"].take()).map_err(|e| format!("{}", e))?;
    for (i, room) in rooms.iter_mut().enumerate() {
        room.index = i;
        room.capacity = (room.capacity as f64 * capacity_buffer).floor() as usize;
    }

    let families: PresentationCounts =
        serde_json::from_value(data["presentations"].take()).map_err(|e| format!("{}", e))?;

    Ok((
        students,
        rooms,
        Families::new(
            families.conferences,
            families.round_tables,
            families.flash_jobs,
        ),
    ))
}

/// Render the solved half-day into its JSON representation: status and objective, one
/// assignment record per honored (student, presentation, slot) with the hosting room, and one
/// session record per held (presentation, room, slot) with its attendee count.
pub fn solution_to_json(
    half_day: u8,
    solution: &Solution,
    students: &[Student],
    rooms: &[Room],
    families: &Families,
    constraints_ok: Option<bool>,
) -> serde_json::Value {
    let mut assignments = Vec::new();
    for (e, student) in students.iter().enumerate() {
        for p in 0..families.total() {
            for t in 0..NUM_SLOTS {
                if solution.attendance[[e, p, t]] == 0 {
                    continue;
                }
                let hosting_room = (0..rooms.len())
                    .find(|&s| solution.occupancy[[p, s, t]] != 0)
                    .map(|s| rooms[s].name.as_str());
                assignments.push(json!({
                    "student": student.dbid,
                    "name": student.name,
                    "presentation": families.name_of(p),
                    "slot": t,
                    "room": hosting_room,
                }));
            }
        }
    }

    let mut sessions = Vec::new();
    for p in 0..families.total() {
        for (s, room) in rooms.iter().enumerate() {
            for t in 0..NUM_SLOTS {
                if solution.occupancy[[p, s, t]] == 0 {
                    continue;
                }
                let attendees: usize = (0..students.len())
                    .map(|e| solution.attendance[[e, p, t]] as usize)
                    .sum();
                sessions.push(json!({
                    "presentation": families.name_of(p),
                    "room": room.name,
                    "slot": t,
                    "attendees": attendees,
                }));
            }
        }
    }

    json!({
        "half_day": half_day,
        "label": calendar::half_day_label(half_day),
        "status": solution.status.to_string(),
        "objective": solution.objective,
        "solve_seconds": solution.solve_time.as_secs_f64(),
        "constraints_ok": constraints_ok,
        "assignments": assignments,
        "sessions": sessions,
    })
}

/// Write the calculated assignments of all half-days as simple JSON representation to a Writer
/// (e.g. an output file).
pub fn write<W: std::io::Write>(
    writer: W,
    half_days: Vec<serde_json::Value>,
) -> Result<(), String> {
    let data = json!({
        "format": "X-sessionassignment-simple",
        "version": "1.0",
        "half_days": half_days,
    });
    serde_json::to_writer(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}

// =============================================================================
// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SolveStatus, Solution};
    use std::time::Duration;

    const INPUT: &str = r#"{
        "students": [
            {"dbid": 17, "name": "Anton", "wishes": [0, 1, 2, 3, 4], "arrival_code": 0},
            {"dbid": 23, "name": "Berta", "wishes": [2, 1, 0, 4, 3], "arrival_code": 1}
        ],
        "rooms": [
            {"name": "Main Hall", "capacity": 100},
            {"name": "Meeting Room", "capacity": 10}
        ],
        "presentations": {"conferences": 3, "round_tables": 1, "flash_jobs": 1}
    }"#;

    #[test]
    fn test_read_simple_format() {
        let (students, rooms, families) = read(INPUT.as_bytes(), 1.2).unwrap();

        assert_eq!(students.len(), 2);
        assert_eq!(students[0].index, 0);
        assert_eq!(students[0].dbid, 17);
        assert_eq!(students[1].index, 1);
        assert_eq!(students[1].wishes, [2, 1, 0, 4, 3]);
        assert_eq!(students[1].arrival_code, 1);

        // Capacities come back inflated by the absorption buffer
        assert_eq!(rooms[0].capacity, 120);
        assert_eq!(rooms[1].capacity, 12);

        assert_eq!(families, Families::new(3, 1, 1));
    }

    #[test]
    fn test_read_rejects_malformed_documents() {
        assert!(read("not json".as_bytes(), 1.0).is_err());
        assert!(read(r#"{"students": 7}"#.as_bytes(), 1.0).is_err());
    }

    #[test]
    fn test_written_document_round_trips_as_json() {
        let (students, rooms, families) = read(INPUT.as_bytes(), 1.0).unwrap();
        let mut solution = Solution::empty(
            students.len(),
            families.total(),
            rooms.len(),
            SolveStatus::Optimal,
            Duration::from_millis(125),
        );
        solution.attendance[[0, 0, 0]] = 1;
        solution.occupancy[[0, 0, 0]] = 1;

        let value = solution_to_json(2, &solution, &students, &rooms, &families, Some(true));
        assert_eq!(value["status"], "OPTIMAL");
        assert_eq!(value["half_day"], 2);
        assert_eq!(value["assignments"][0]["student"], 17);
        assert_eq!(value["assignments"][0]["presentation"], "Conf1");
        assert_eq!(value["assignments"][0]["room"], "Main Hall");
        assert_eq!(value["sessions"][0]["attendees"], 1);

        let mut buffer = Vec::new();
        write(&mut buffer, vec![value]).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["format"], "X-sessionassignment-simple");
        assert_eq!(parsed["half_days"][0]["label"], "day 2, morning");
    }
}
