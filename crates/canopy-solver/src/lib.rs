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

//! # Solver Contract
//!
//! The boundary between the declarative model and whatever MILP engine
//! actually solves it. This crate deliberately contains no solving logic:
//! a backend implements [`SolverBackend`], consumes a
//! [`ConstraintModel`](canopy_model::linear::ConstraintModel) and hands
//! back an assignment plus a [`SolveReport`] describing how the run ended.
//!
//! The verifier in `canopy-verify` keys its behavior off the report: an
//! optimal run is checked strictly, an aborted run is checked with the
//! optimality gap recorded, and everything else is treated as a failed
//! solve.

pub mod report;

pub use report::{SolveReport, SolverBackend, SolverBackendError, SolverStatus};
