
pub mod backend;
pub mod calendar;
pub mod io;
pub mod model;
pub mod reducer;
pub mod solver;
pub mod verify;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Representation of a student and their ranked presentation wishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// id/index of the student in the list of students of one half-day
    #[serde(default)]
    pub index: usize,
    /// Student's id in the external registration database
    pub dbid: u64,
    /// Student's name. Mainly used for info/debug output
    pub name: String,
    /// The five wished presentations as indexes into the presentation space, ordered by
    /// preference (entry 0 = most wanted). Entries 0..3 must refer to conferences, entries 3..5
    /// to round tables or flash jobs.
    pub wishes: [usize; 5],
    /// Check-in window code (0..8). Even codes arrive early and may attend slots 0..4, odd codes
    /// arrive late and may attend slots 1..5.
    pub arrival_code: u8,
}

/// Representation of a presentation room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// id/index of the room in the list of rooms
    #[serde(default)]
    pub index: usize,
    /// Room's name. Mainly used for info/debug output
    pub name: String,
    /// Number of seats. The ingestion layer has already inflated this by the absorption buffer,
    /// so the solver treats it as a hard cap.
    pub capacity: usize,
}

/// Terminal state of one half-day solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The engine proved the returned solution optimal
    Optimal,
    /// A solution was found, but optimality was not proven (e.g. deadline expiry)
    Feasible,
    /// The constraint set admits no solution
    Infeasible,
    /// The model was rejected before solving (e.g. a wish list the constraints cannot satisfy)
    ModelInvalid,
    /// The engine failed or gave up without a solution
    Unknown,
}

impl SolveStatus {
    /// Whether the attendance/occupancy tables of the solution carry meaningful values
    pub fn is_success(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::ModelInvalid => "MODEL_INVALID",
            SolveStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Result of solving the assignment problem of one half-day.
///
/// The two tables are written once during extraction and read-only afterwards. They are all-zero
/// unless `status.is_success()`.
#[derive(Debug, Clone)]
pub struct Solution {
    /// attendance[[e, p, t]] == 1 iff student e attends presentation p at slot t
    pub attendance: ndarray::Array3<u8>,
    /// occupancy[[p, s, t]] == 1 iff presentation p is held in room s at slot t
    pub occupancy: ndarray::Array3<u8>,
    /// Terminal solver state
    pub status: SolveStatus,
    /// Total penalty of the honored low-ranked wishes (0 unless `status.is_success()`)
    pub objective: i64,
    /// Wall-clock time of building and solving the model
    pub solve_time: Duration,
}

impl Solution {
    /// Create an all-zero solution with the given terminal status
    pub fn empty(
        num_students: usize,
        num_presentations: usize,
        num_rooms: usize,
        status: SolveStatus,
        solve_time: Duration,
    ) -> Solution {
        Solution {
            attendance: ndarray::Array3::zeros((
                num_students,
                num_presentations,
                calendar::NUM_SLOTS,
            )),
            occupancy: ndarray::Array3::zeros((num_presentations, num_rooms, calendar::NUM_SLOTS)),
            status,
            objective: 0,
            solve_time,
        }
    }
}

/// Penalty weights of the minimization objective, by wish rank.
///
/// Ranks 1 and 2 are mandatory and never penalized. The default gap (1/5/10) leaves one honored
/// rank-5 wish and two honored rank-4 wishes at equal cost; pass a larger rank-5 weight to make
/// rank-5 avoidance strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveWeights {
    /// Penalty for honoring a student's third wish
    pub wish3: i64,
    /// Penalty for honoring a student's fourth wish
    pub wish4: i64,
    /// Penalty for honoring a student's fifth wish
    pub wish5: i64,
}

impl Default for ObjectiveWeights {
    fn default() -> ObjectiveWeights {
        ObjectiveWeights {
            wish3: 1,
            wish4: 5,
            wish5: 10,
        }
    }
}

impl ObjectiveWeights {
    /// Penalty for honoring the wish at the given 0-based rank index
    pub fn penalty(&self, rank: usize) -> i64 {
        match rank {
            2 => self.wish3,
            3 => self.wish4,
            4 => self.wish5,
            _ => 0,
        }
    }
}

/// Configuration of the solver driver, passed at construction of each half-day solve
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Number of parallel workers of the backend engine
    pub num_workers: u32,
    /// Aggressiveness of the engine's model simplification (0..=2)
    pub linearization_level: u8,
    /// Optional wall-clock deadline in seconds. On expiry the engine returns its best-known
    /// solution (`Feasible`) or `Unknown` if it has none.
    pub max_wall_seconds: Option<f64>,
    /// Whether the engine emits its search log
    pub log_progress: bool,
    /// Wish-rank penalty weights of the objective
    pub weights: ObjectiveWeights,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            num_workers: 8,
            linearization_level: 2,
            max_wall_seconds: None,
            log_progress: false,
            weights: ObjectiveWeights::default(),
        }
    }
}

/// Structural problems in the input data, detected before the engine is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// A student's arrival code is outside the eight known check-in windows
    InvalidArrivalCode { code: u8 },
    /// A wish refers to a presentation of the wrong family for its rank (or to no presentation
    /// at all)
    WishTypeMismatch {
        student: usize,
        rank: usize,
        presentation: usize,
    },
    /// Fewer than four distinct presentations remain after deduplicating a wish list, so the
    /// student cannot attend four presentations
    WishListTooShort { student: usize, distinct: usize },
    /// The two mandatory wishes name the same presentation, so they cannot both be honored
    DuplicateMandatoryWish { student: usize, presentation: usize },
}

impl fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingError::InvalidArrivalCode { code } => {
                write!(f, "invalid arrival code {} (expected 0..=7)", code)
            }
            SchedulingError::WishTypeMismatch {
                student,
                rank,
                presentation,
            } => write!(
                f,
                "wish {} of student {} refers to presentation {} of the wrong family",
                rank + 1,
                student,
                presentation
            ),
            SchedulingError::WishListTooShort { student, distinct } => write!(
                f,
                "student {} has only {} distinct wishes, but must attend 4 presentations",
                student, distinct
            ),
            SchedulingError::DuplicateMandatoryWish {
                student,
                presentation,
            } => write!(
                f,
                "wishes 1 and 2 of student {} both name presentation {}",
                student, presentation
            ),
        }
    }
}

impl std::error::Error for SchedulingError {}
