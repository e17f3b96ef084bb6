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

//! The solver driver of one half-day: reduce, build, solve, extract.
//!
//! The driver is single-threaded; only the backend engine parallelizes internally during its
//! blocking solve call. A half-day run moves through building and solving into exactly one
//! terminal status, which is stored immutably in the returned [Solution]. Structural errors in
//! the input (invalid arrival code, wish of the wrong family) abort the half-day with an error;
//! a wish list the constraint set cannot satisfy yields a zero `ModelInvalid` solution without
//! invoking the engine, and engine-side failure yields `Unknown`. The caller is expected to
//! carry on with the remaining half-days either way.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use ndarray::Array3;

use crate::backend::{BackendStatus, HighsBackend, MilpBackend, SolveParams};
use crate::calendar::NUM_SLOTS;
use crate::model::{self, ModelHandles};
use crate::reducer::ReducedProblem;
use crate::{
    calendar::Families, Room, SchedulingError, Solution, SolveStatus, SolverConfig, Student,
};

/// Solve the assignment problem of one half-day with the bundled HiGHS engine
pub fn solve(
    students: &[Student],
    rooms: &[Room],
    families: &Families,
    config: &SolverConfig,
) -> Result<Solution, SchedulingError> {
    let mut backend = HighsBackend::new();
    solve_with_backend(&mut backend, students, rooms, families, config)
}

/// Solve the assignment problem of one half-day on the given backend engine
pub fn solve_with_backend<B: MilpBackend>(
    backend: &mut B,
    students: &[Student],
    rooms: &[Room],
    families: &Families,
    config: &SolverConfig,
) -> Result<Solution, SchedulingError> {
    let tic = Instant::now();
    info!(
        "Building assignment model for {} students, {} presentations, {} rooms ...",
        students.len(),
        families.total(),
        rooms.len()
    );

    let reduced = ReducedProblem::new(students, families)?;
    let candidates = reduced.candidate_triples();
    let dense = reduced.dense_triples(families.total());
    debug!(
        "Candidate attendance triples: {} of {} dense ({:.1}% removed)",
        candidates,
        dense,
        100.0 * (1.0 - candidates as f64 / dense.max(1) as f64)
    );
    if log::log_enabled!(log::Level::Debug) {
        for (p, interested) in reduced.interested.iter().enumerate() {
            if !interested.is_empty() {
                debug!(
                    "Demand for {}: {} interested students",
                    families.name_of(p),
                    interested.len()
                );
            }
        }
    }

    let handles = match model::build(backend, students, rooms, families, &reduced, &config.weights)
    {
        Ok(handles) => handles,
        Err(
            err @ SchedulingError::WishListTooShort { .. }
            | err @ SchedulingError::DuplicateMandatoryWish { .. },
        ) => {
            warn!("Model rejected without solving: {}", err);
            return Ok(Solution::empty(
                students.len(),
                families.total(),
                rooms.len(),
                SolveStatus::ModelInvalid,
                tic.elapsed(),
            ));
        }
        Err(err) => return Err(err),
    };

    let params = SolveParams {
        num_workers: config.num_workers,
        linearization_level: config.linearization_level,
        max_wall_seconds: config.max_wall_seconds,
        log_progress: config.log_progress,
    };
    match config.max_wall_seconds {
        Some(limit) => info!(
            "Invoking the MILP engine ({} workers, {}s deadline) ...",
            params.num_workers, limit
        ),
        None => info!("Invoking the MILP engine ({} workers) ...", params.num_workers),
    }
    let status = backend.solve(&params);
    let solve_time = tic.elapsed();

    match status {
        BackendStatus::Infeasible => {
            warn!("The assignment problem is infeasible.");
            Ok(Solution::empty(
                students.len(),
                families.total(),
                rooms.len(),
                SolveStatus::Infeasible,
                solve_time,
            ))
        }
        BackendStatus::Unknown => {
            warn!("The MILP engine returned no solution.");
            Ok(Solution::empty(
                students.len(),
                families.total(),
                rooms.len(),
                SolveStatus::Unknown,
                solve_time,
            ))
        }
        BackendStatus::Optimal | BackendStatus::Feasible => {
            let solve_status = if status == BackendStatus::Optimal {
                SolveStatus::Optimal
            } else {
                SolveStatus::Feasible
            };
            let solution = extract(
                backend,
                &handles,
                students.len(),
                families.total(),
                rooms.len(),
                solve_status,
                solve_time,
            );
            info!(
                "Solved with status {} and total penalty {} in {:.3}s.",
                solution.status,
                solution.objective,
                solve_time.as_secs_f64()
            );
            Ok(solution)
        }
    }
}

/// Read every created variable back from the backend into the dense solution tables. Variables
/// that were never created stay zero.
fn extract<B: MilpBackend>(
    backend: &B,
    handles: &ModelHandles,
    num_students: usize,
    num_presentations: usize,
    num_rooms: usize,
    status: SolveStatus,
    solve_time: Duration,
) -> Solution {
    let mut attendance = Array3::<u8>::zeros((num_students, num_presentations, NUM_SLOTS));
    for (&(e, p, t), &var) in handles.attendance.iter() {
        if backend.read_bool(var) {
            attendance[[e, p, t]] = 1;
        }
    }

    let mut occupancy = Array3::<u8>::zeros((num_presentations, num_rooms, NUM_SLOTS));
    for ((p, s, t), &var) in handles.occupancy.indexed_iter() {
        if backend.read_bool(var) {
            occupancy[[p, s, t]] = 1;
        }
    }

    Solution {
        attendance,
        occupancy,
        status,
        objective: backend.objective_value(),
        solve_time,
    }
}

#[cfg(test)]
mod tests;
