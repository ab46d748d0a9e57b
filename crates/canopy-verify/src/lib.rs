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

//! # Solution Verification
//!
//! Post-solve validation of donor-tree solutions. The solver's assignment
//! is float data with rounding noise; this crate reconstructs the discrete
//! topology from it ([`topology`]), re-checks every structural property
//! against the original graph and parameters ([`verify`]), and exports the
//! labeled result as JSON ([`export`]).
//!
//! Verification never trusts the model: a proven-optimal solution that
//! fails a structural check is evidence of a bug in the constraint
//! formulation, and the report flags it as such.

pub mod export;
pub mod topology;
pub mod verify;

pub use topology::{EdgeLabel, LabeledEdge, LabeledTopology, NodeRole, TopologyReconstructor};
pub use verify::{SolutionVerifier, StructuralViolation, VerificationReport, VerifyError};
