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

//! Builder and verifier parameters: diameter bound, out-degree bound and
//! the flow extension's per-node capacities and demands.

use crate::builder::ModelBuildError;
use crate::graph::ConnectivityGraph;
use num_traits::{PrimInt, Signed, ToPrimitive};

/// The out-degree bound applied to every node's active outgoing edges.
///
/// Carries the sign convention used throughout the toolchain: a positive
/// parameter is a constant cap, a negative one starts at its absolute value
/// and decreases by one per tree level, zero leaves the fan-out unbounded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DegreeBound {
    /// No fan-out restriction.
    Unbounded,
    /// At most `k` active outgoing edges, independent of level.
    Constant(u64),
    /// At most `k` at the root, one less per level below it.
    Decreasing(u64),
}

impl DegreeBound {
    /// Decodes the signed convention: `deg > 0` constant, `deg < 0`
    /// decreasing from `|deg|`, `deg == 0` unbounded.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canopy_model::params::DegreeBound;
    ///
    /// assert_eq!(DegreeBound::from_signed(3), DegreeBound::Constant(3));
    /// assert_eq!(DegreeBound::from_signed(-2), DegreeBound::Decreasing(2));
    /// assert_eq!(DegreeBound::from_signed(0), DegreeBound::Unbounded);
    /// ```
    #[inline]
    pub fn from_signed(deg: i64) -> Self {
        match deg {
            0 => DegreeBound::Unbounded,
            d if d > 0 => DegreeBound::Constant(d as u64),
            d => DegreeBound::Decreasing(d.unsigned_abs()),
        }
    }

    /// Re-encodes the bound into the signed convention consumed by the
    /// tree-size calculator.
    #[inline]
    pub fn as_signed(&self) -> i64 {
        match self {
            DegreeBound::Unbounded => 0,
            DegreeBound::Constant(k) => *k as i64,
            DegreeBound::Decreasing(k) => -(*k as i64),
        }
    }

    /// Returns `true` unless the bound is [`DegreeBound::Unbounded`].
    #[inline]
    pub fn is_bounded(&self) -> bool {
        !matches!(self, DegreeBound::Unbounded)
    }
}

impl std::fmt::Display for DegreeBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegreeBound::Unbounded => write!(f, "unbounded"),
            DegreeBound::Constant(k) => write!(f, "<= {}", k),
            DegreeBound::Decreasing(k) => write!(f, "<= {} - level", k),
        }
    }
}

/// Structural parameters shared by the model builder and the verifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TopologyParams {
    /// Maximum allowed tree depth D; levels range over `0..=max_diameter`.
    pub max_diameter: usize,
    /// Out-degree bound applied per node.
    pub degree_bound: DegreeBound,
}

impl TopologyParams {
    #[inline]
    pub fn new(max_diameter: usize, degree_bound: DegreeBound) -> Self {
        Self {
            max_diameter,
            degree_bound,
        }
    }
}

/// Per-node capacities and demands for the flow extension.
///
/// Both vectors are indexed by node. Capacities must be positive, demands
/// non-negative; the constructors enforce this so the builder and verifier
/// can rely on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowParams<T> {
    capacities: Vec<T>,
    demands: Vec<T>,
}

impl<T> FlowParams<T>
where
    T: PrimInt + Signed,
{
    /// Creates flow parameters from explicit per-node vectors.
    pub fn new(capacities: Vec<T>, demands: Vec<T>) -> Result<Self, ModelBuildError> {
        if capacities.len() != demands.len() {
            return Err(ModelBuildError::FlowParamsMismatch {
                expected: capacities.len(),
                provided: demands.len(),
            });
        }
        for (node, capacity) in capacities.iter().enumerate() {
            if *capacity <= T::zero() {
                return Err(ModelBuildError::InvalidCapacity { node });
            }
        }
        for (node, demand) in demands.iter().enumerate() {
            if *demand < T::zero() {
                return Err(ModelBuildError::InvalidDemand { node });
            }
        }
        Ok(Self {
            capacities,
            demands,
        })
    }

    /// Creates uniform parameters: the same capacity and demand everywhere.
    pub fn uniform(num_nodes: usize, capacity: T, demand: T) -> Result<Self, ModelBuildError> {
        Self::new(vec![capacity; num_nodes], vec![demand; num_nodes])
    }

    /// Weighted-demand mode: demands are seeded from the graph's node
    /// weights (nodes without a weight fall back to a demand of one).
    ///
    /// A node whose weight exceeds the uniform capacity makes the model
    /// trivially infeasible, so it is rejected up front.
    pub fn from_graph_weights(
        graph: &ConnectivityGraph<T>,
        capacity: T,
    ) -> Result<Self, ModelBuildError> {
        let mut demands = Vec::with_capacity(graph.num_nodes());
        for node in graph.nodes() {
            let demand = graph.weight(node).unwrap_or_else(T::one);
            if demand > capacity {
                return Err(ModelBuildError::DemandExceedsCapacity {
                    node: node.get(),
                    demand: demand.to_f64().unwrap_or(f64::NAN),
                    capacity: capacity.to_f64().unwrap_or(f64::NAN),
                });
            }
            demands.push(demand);
        }
        Self::new(vec![capacity; graph.num_nodes()], demands)
    }

    /// Returns the per-node capacities.
    #[inline]
    pub fn capacities(&self) -> &[T] {
        &self.capacities
    }

    /// Returns the per-node demands.
    #[inline]
    pub fn demands(&self) -> &[T] {
        &self.demands
    }

    /// Number of nodes covered by these parameters.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.capacities.len()
    }
}

impl FlowParams<i64> {
    /// The defaults of the original formulation: capacity 10, demand 1.
    pub fn with_defaults(num_nodes: usize) -> Self {
        // Positive constants, the validation cannot fail.
        match Self::uniform(num_nodes, 10, 1) {
            Ok(params) => params,
            Err(_) => unreachable!("uniform(10, 1) is always valid"),
        }
    }
}
