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

//! # Canopy Model
//!
//! **The constraint model of the donor-tree topology problem.**
//!
//! This crate defines the data the optimization revolves around: the
//! connectivity graph the topology is selected from, the decision-variable
//! schema, the declarative linear constraint model, and the builder that
//! emits it in its three variants (single tree, single tree + flow, dual
//! tree).
//!
//! ## Architecture
//!
//! Construction and solving are strictly separated:
//!
//! * **`graph`**: The immutable input `ConnectivityGraph` (dense adjacency,
//!   optional node weights and coordinates).
//! * **`variable`**: `VarKey` addressing for every decision variable and
//!   the solved `Assignment` with its rounding-tolerance predicates.
//! * **`linear`**: Plain-data expressions, constraints and the
//!   `ConstraintModel` a solver backend consumes.
//! * **`params`**: Diameter and degree bounds, flow capacities/demands.
//! * **`builder`**: Turns graph + parameters into the model.
//!
//! No solving happens in this crate; the backend contract lives in
//! `canopy-solver` and post-solve validation in `canopy-verify`.

pub mod builder;
pub mod graph;
pub mod index;
pub mod linear;
pub mod params;
pub mod variable;
