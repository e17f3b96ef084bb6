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

//! Narrow interface between the model builder and the underlying MILP engine, plus the HiGHS
//! implementation of it (via the `good_lp` modelling crate).
//!
//! The builder only ever needs boolean variables, linear equality/inequality constraints over
//! them with integer coefficients, and a linear minimization objective. Keeping that surface as
//! a trait keeps the engine swappable and lets tests record the emitted model instead of
//! solving it.

use std::time::Instant;

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use log::{debug, warn};

/// Opaque handle of a boolean decision variable of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub(crate) usize);

/// Outcome of one engine invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    /// Proven optimal solution available
    Optimal,
    /// Solution available, optimality not proven (deadline expiry)
    Feasible,
    /// The model admits no solution
    Infeasible,
    /// Engine failure or deadline expiry without any solution
    Unknown,
}

/// Engine parameters of one solve call
#[derive(Debug, Clone)]
pub struct SolveParams {
    /// Number of parallel workers
    pub num_workers: u32,
    /// Model simplification aggressiveness (0..=2)
    pub linearization_level: u8,
    /// Optional wall-clock deadline in seconds
    pub max_wall_seconds: Option<f64>,
    /// Whether the engine emits its search log
    pub log_progress: bool,
}

/// The engine interface used by the model builder and the solver driver.
///
/// `read_bool` and `objective_value` are only meaningful after `solve` returned `Optimal` or
/// `Feasible`; before that they report everything as unset.
pub trait MilpBackend {
    /// Create a new boolean decision variable
    fn add_bool_var(&mut self) -> VarId;
    /// Add the constraint `Σ weight·var == rhs`
    fn add_linear_eq(&mut self, terms: &[(VarId, i64)], rhs: i64);
    /// Add the constraint `Σ weight·var <= rhs`
    fn add_linear_le(&mut self, terms: &[(VarId, i64)], rhs: i64);
    /// Set the objective to minimize `Σ weight·var`. Repeated variables accumulate.
    fn set_minimize(&mut self, terms: &[(VarId, i64)]);
    /// Run the engine on the buffered model
    fn solve(&mut self, params: &SolveParams) -> BackendStatus;
    /// Value of a variable in the found solution
    fn read_bool(&self, var: VarId) -> bool;
    /// Objective value of the found solution
    fn objective_value(&self) -> i64;
}

enum Comparator {
    Eq,
    Le,
}

struct BufferedConstraint {
    terms: Vec<(usize, i64)>,
    comparator: Comparator,
    rhs: i64,
}

/// MILP backend on top of the bundled HiGHS engine.
///
/// Variables, constraints and the objective are buffered as plain index/weight lists and only
/// assembled into a `good_lp` model when `solve` is called, since the modelling crate consumes
/// the variable collection at that point.
pub struct HighsBackend {
    variables: ProblemVariables,
    handles: Vec<Variable>,
    constraints: Vec<BufferedConstraint>,
    objective: Vec<(usize, i64)>,
    values: Vec<f64>,
}

impl HighsBackend {
    pub fn new() -> HighsBackend {
        HighsBackend {
            variables: ProblemVariables::new(),
            handles: Vec::new(),
            constraints: Vec::new(),
            objective: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl Default for HighsBackend {
    fn default() -> HighsBackend {
        HighsBackend::new()
    }
}

fn linear_expression(handles: &[Variable], terms: &[(usize, i64)]) -> Expression {
    terms
        .iter()
        .map(|(index, weight)| *weight as f64 * handles[*index])
        .sum()
}

impl MilpBackend for HighsBackend {
    fn add_bool_var(&mut self) -> VarId {
        let handle = self.variables.add(variable().binary());
        self.handles.push(handle);
        VarId(self.handles.len() - 1)
    }

    fn add_linear_eq(&mut self, terms: &[(VarId, i64)], rhs: i64) {
        self.constraints.push(BufferedConstraint {
            terms: terms.iter().map(|(var, weight)| (var.0, *weight)).collect(),
            comparator: Comparator::Eq,
            rhs,
        });
    }

    fn add_linear_le(&mut self, terms: &[(VarId, i64)], rhs: i64) {
        self.constraints.push(BufferedConstraint {
            terms: terms.iter().map(|(var, weight)| (var.0, *weight)).collect(),
            comparator: Comparator::Le,
            rhs,
        });
    }

    fn set_minimize(&mut self, terms: &[(VarId, i64)]) {
        self.objective = terms.iter().map(|(var, weight)| (var.0, *weight)).collect();
    }

    fn solve(&mut self, params: &SolveParams) -> BackendStatus {
        debug!(
            "Assembling HiGHS model with {} variables and {} constraints",
            self.handles.len(),
            self.constraints.len()
        );
        let variables = std::mem::replace(&mut self.variables, ProblemVariables::new());
        let objective = linear_expression(&self.handles, &self.objective);

        let mut model = variables
            .minimise(objective)
            .using(default_solver)
            .set_option("threads", params.num_workers as i32)
            .set_option("output_flag", params.log_progress)
            .set_option(
                "presolve",
                match params.linearization_level {
                    0 => "off",
                    1 => "choose",
                    _ => "on",
                },
            );
        if let Some(seconds) = params.max_wall_seconds {
            model = model.set_option("time_limit", seconds);
        }

        for buffered in self.constraints.iter() {
            let expression = linear_expression(&self.handles, &buffered.terms);
            match buffered.comparator {
                Comparator::Eq => {
                    model.add_constraint(constraint!(expression == buffered.rhs as f64));
                }
                Comparator::Le => {
                    model.add_constraint(constraint!(expression <= buffered.rhs as f64));
                }
            }
        }

        let tic = Instant::now();
        match model.solve() {
            Ok(solution) => {
                self.values = self
                    .handles
                    .iter()
                    .map(|handle| solution.value(*handle))
                    .collect();
                // With a deadline in place a returned solution may be the best-known incumbent
                // rather than a proven optimum.
                match params.max_wall_seconds {
                    Some(limit) if tic.elapsed().as_secs_f64() >= limit => BackendStatus::Feasible,
                    _ => BackendStatus::Optimal,
                }
            }
            Err(ResolutionError::Infeasible) => BackendStatus::Infeasible,
            Err(err) => {
                warn!("MILP engine failed: {}", err);
                BackendStatus::Unknown
            }
        }
    }

    fn read_bool(&self, var: VarId) -> bool {
        self.values.get(var.0).map_or(false, |value| *value > 0.9)
    }

    fn objective_value(&self) -> i64 {
        self.objective
            .iter()
            .map(|(index, weight)| {
                if self.values.get(*index).map_or(false, |value| *value > 0.9) {
                    *weight
                } else {
                    0
                }
            })
            .sum()
    }
}

// =============================================================================
// Tests
#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SolveParams {
        SolveParams {
            num_workers: 1,
            linearization_level: 2,
            max_wall_seconds: None,
            log_progress: false,
        }
    }

    #[test]
    fn test_solve_tiny_model() {
        // Pick exactly two of three booleans, avoiding the penalized one
        let mut backend = HighsBackend::new();
        let x = backend.add_bool_var();
        let y = backend.add_bool_var();
        let z = backend.add_bool_var();
        backend.add_linear_eq(&[(x, 1), (y, 1), (z, 1)], 2);
        backend.set_minimize(&[(x, 1), (y, 3), (z, 1)]);

        assert_eq!(backend.solve(&params()), BackendStatus::Optimal);
        assert!(backend.read_bool(x));
        assert!(!backend.read_bool(y));
        assert!(backend.read_bool(z));
        assert_eq!(backend.objective_value(), 2);
    }

    #[test]
    fn test_infeasible_model() {
        let mut backend = HighsBackend::new();
        let x = backend.add_bool_var();
        let y = backend.add_bool_var();
        backend.add_linear_eq(&[(x, 1), (y, 1)], 3);
        backend.set_minimize(&[]);

        assert_eq!(backend.solve(&params()), BackendStatus::Infeasible);
        assert!(!backend.read_bool(x));
        assert_eq!(backend.objective_value(), 0);
    }

    #[test]
    fn test_le_constraint_binds() {
        // Without the bound the minimizer of -x-y would set both
        let mut backend = HighsBackend::new();
        let x = backend.add_bool_var();
        let y = backend.add_bool_var();
        backend.add_linear_le(&[(x, 1), (y, 1)], 1);
        backend.set_minimize(&[(x, -1), (y, -1)]);

        assert_eq!(backend.solve(&params()), BackendStatus::Optimal);
        let chosen = backend.read_bool(x) as usize + backend.read_bool(y) as usize;
        assert_eq!(chosen, 1);
        assert_eq!(backend.objective_value(), -1);
    }
}
