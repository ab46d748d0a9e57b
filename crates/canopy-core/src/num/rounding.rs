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

//! Tolerance-based interpretation of solver output.
//!
//! MILP solvers return binary variables as floats with noise near 0 and 1.
//! Nothing in the workspace may compare a solver value to 0 or 1 with exact
//! equality; these predicates are the single place the thresholds live.

/// Slack applied to every "is this binary variable set" comparison during
/// verification. Linearized models accumulate this much float error.
pub const ROUNDING_TOLERANCE: f64 = 0.0005;

/// Threshold used when reconstructing a topology from an assignment: any
/// value at or above it counts as selected.
pub const SELECTION_THRESHOLD: f64 = 0.5;

/// Returns `true` if a solver-reported binary variable should be treated as
/// set for verification purposes.
///
/// The comparison is strict, so a value exactly at the tolerance does not
/// count as set.
///
/// # Examples
///
/// ```rust
/// use canopy_core::num::rounding::{is_active, ROUNDING_TOLERANCE};
///
/// assert!(is_active(1.0));
/// assert!(is_active(0.9997));
/// assert!(!is_active(ROUNDING_TOLERANCE));
/// assert!(!is_active(0.0));
/// ```
#[inline(always)]
pub fn is_active(value: f64) -> bool {
    value > ROUNDING_TOLERANCE
}

/// Returns `true` if a solver-reported binary variable should be treated as
/// selected when rebuilding the topology. A value of exactly 0.5 counts.
#[inline(always)]
pub fn is_selected(value: f64) -> bool {
    value >= SELECTION_THRESHOLD
}
