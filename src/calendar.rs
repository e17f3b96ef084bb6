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

//! The slot calendar of the career fair: mapping of arrival codes to attendable slots and
//! half-days, and the partition of the presentation index space into the three families.
//!
//! All functions in this module are pure; the only possible error is an out-of-range arrival
//! code.

use crate::SchedulingError;

/// Number of physical time slots in one half-day
pub const NUM_SLOTS: usize = 5;
/// Number of presentations each student attends (one of the five valid-slot/wish combinations
/// is skipped)
pub const ATTENDANCES_PER_STUDENT: usize = 4;
/// Number of check-in windows over the whole fair (two per half-day)
pub const NUM_ARRIVAL_CODES: u8 = 8;

/// The four slot indexes a student with the given arrival code may attend.
///
/// Students with an even code check in early and use slots 0..4; students with an odd code
/// check in late and use slots 1..5. Slots 1, 2 and 3 are shared between both populations.
pub fn valid_slots(arrival_code: u8) -> Result<[usize; 4], SchedulingError> {
    if arrival_code >= NUM_ARRIVAL_CODES {
        return Err(SchedulingError::InvalidArrivalCode { code: arrival_code });
    }
    if arrival_code % 2 == 0 {
        Ok([0, 1, 2, 3])
    } else {
        Ok([1, 2, 3, 4])
    }
}

/// Whether the given arrival code belongs to the early check-in window of its half-day
pub fn is_early_arrival(arrival_code: u8) -> bool {
    arrival_code % 2 == 0
}

/// The half-day (0..4) a given arrival code belongs to. Two consecutive codes (one early, one
/// late) share one half-day.
pub fn half_day(arrival_code: u8) -> u8 {
    arrival_code / 2
}

/// Human-readable label of a half-day, for logs and reports
pub fn half_day_label(half_day: u8) -> &'static str {
    match half_day {
        0 => "day 1, morning",
        1 => "day 1, afternoon",
        2 => "day 2, morning",
        3 => "day 2, afternoon",
        _ => "unknown half-day",
    }
}

/// The three disjoint presentation families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationKind {
    Conference,
    RoundTable,
    FlashJob,
}

impl std::fmt::Display for PresentationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PresentationKind::Conference => "conference",
            PresentationKind::RoundTable => "round table",
            PresentationKind::FlashJob => "flash job",
        };
        write!(f, "{}", name)
    }
}

/// Partition of the presentation index space into three contiguous ranges:
/// `[0, nC)` conferences, `[nC, nC+nR)` round tables, `[nC+nR, P)` flash jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Families {
    /// Number of conferences (wish ranks 1..=3)
    pub num_conferences: usize,
    /// Number of round tables (wish ranks 4..=5)
    pub num_round_tables: usize,
    /// Number of flash jobs (wish ranks 4..=5)
    pub num_flash_jobs: usize,
}

impl Default for Families {
    fn default() -> Families {
        Families::new(19, 6, 6)
    }
}

impl Families {
    pub fn new(num_conferences: usize, num_round_tables: usize, num_flash_jobs: usize) -> Families {
        Families {
            num_conferences,
            num_round_tables,
            num_flash_jobs,
        }
    }

    /// Total number of presentations
    pub fn total(&self) -> usize {
        self.num_conferences + self.num_round_tables + self.num_flash_jobs
    }

    /// Family of the given presentation index
    pub fn kind_of(&self, presentation: usize) -> PresentationKind {
        debug_assert!(
            presentation < self.total(),
            "Presentation index {} out of range",
            presentation
        );
        if presentation < self.num_conferences {
            PresentationKind::Conference
        } else if presentation < self.num_conferences + self.num_round_tables {
            PresentationKind::RoundTable
        } else {
            PresentationKind::FlashJob
        }
    }

    pub fn is_conference(&self, presentation: usize) -> bool {
        presentation < self.num_conferences
    }

    pub fn is_round_table(&self, presentation: usize) -> bool {
        presentation >= self.num_conferences
            && presentation < self.num_conferences + self.num_round_tables
    }

    pub fn is_flash_job(&self, presentation: usize) -> bool {
        presentation >= self.num_conferences + self.num_round_tables
            && presentation < self.total()
    }

    /// Display name of a presentation ("Conf7", "TR2", "FM3"), numbered from 1 within its family
    pub fn name_of(&self, presentation: usize) -> String {
        match self.kind_of(presentation) {
            PresentationKind::Conference => format!("Conf{}", presentation + 1),
            PresentationKind::RoundTable => {
                format!("TR{}", presentation - self.num_conferences + 1)
            }
            PresentationKind::FlashJob => format!(
                "FM{}",
                presentation - self.num_conferences - self.num_round_tables + 1
            ),
        }
    }
}
