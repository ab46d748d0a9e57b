// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Solver termination reports and the backend trait.

use canopy_model::linear::ConstraintModel;
use canopy_model::variable::Assignment;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// How a solver run terminated.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SolverStatus {
    /// Proven optimal solution.
    Optimal,
    /// Stopped early (time or work limit) with an incumbent solution.
    Aborted,
    /// The model was proven infeasible.
    Infeasible,
    /// Any other backend-specific terminal state, carried verbatim.
    Other(String),
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverStatus::Optimal => write!(f, "optimal"),
            SolverStatus::Aborted => write!(f, "aborted"),
            SolverStatus::Infeasible => write!(f, "infeasible"),
            SolverStatus::Other(status) => write!(f, "other({})", status),
        }
    }
}

/// Termination report of a single solver run.
///
/// Bounds are reported as the backend saw them; either may be absent when
/// the run produced no incumbent or no dual bound.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SolveReport {
    pub status: SolverStatus,
    /// Best proven lower bound on the objective.
    pub lower_bound: Option<f64>,
    /// Objective value of the incumbent solution.
    pub upper_bound: Option<f64>,
}

impl SolveReport {
    /// A report for a proven-optimal run with the given objective value.
    #[inline]
    pub fn optimal(objective: f64) -> Self {
        Self {
            status: SolverStatus::Optimal,
            lower_bound: Some(objective),
            upper_bound: Some(objective),
        }
    }

    /// The relative optimality gap `(upper - lower) / upper`.
    ///
    /// Returns 0.0 when either bound is missing or the upper bound is
    /// zero; a donor-count objective of zero leaves nothing to improve.
    pub fn gap(&self) -> f64 {
        match (self.lower_bound, self.upper_bound) {
            (Some(lower), Some(upper)) if upper != 0.0 => (upper - lower) / upper,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for SolveReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SolveReport(status: {}, bounds: [{:?}, {:?}])",
            self.status, self.lower_bound, self.upper_bound
        )
    }
}

/// The error type for backend failures that are not a solver status.
///
/// Statuses like infeasibility are data in the [`SolveReport`]; this error
/// covers the backend itself breaking (process death, protocol errors,
/// models it cannot express).
#[derive(Debug, Error)]
pub enum SolverBackendError {
    /// The backend cannot express a construct of the model.
    #[error("the backend does not support the model construct: {0}")]
    UnsupportedModel(String),
    /// The backend failed while running.
    #[error("the solver backend failed: {0}")]
    Backend(String),
    /// Communication with an external solver process failed.
    #[error("solver i/o failed")]
    Io(#[from] std::io::Error),
}

/// An engine that can solve a [`ConstraintModel`].
///
/// Implementations translate the declarative model into their native
/// form, run, and map their native termination state onto
/// [`SolverStatus`]. A `time_limit` of `None` lets the backend run to
/// proven optimality or infeasibility.
pub trait SolverBackend {
    fn solve(
        &mut self,
        model: &ConstraintModel,
        time_limit: Option<Duration>,
    ) -> Result<(Assignment, SolveReport), SolverBackendError>;
}
