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

//! The directed connectivity graph the topology is selected from.
//!
//! Nodes are `0..num_nodes`; the directed edge set is a dense n×n bit
//! matrix, which keeps the edge-existence test the model builder performs
//! O(n²·D) times a single bit probe. Per-node weights (used as demand in
//! the weighted-flow mode) and 2-D coordinates (validation context only)
//! are optional.

use crate::index::NodeIndex;
use fixedbitset::FixedBitSet;
use num_traits::{PrimInt, Signed};

/// An immutable-once-built directed connectivity graph.
///
/// Candidate links are directed edges; an undirected physical link is
/// represented by a pair of antiparallel edges (see [`add_link`]).
///
/// [`add_link`]: ConnectivityGraph::add_link
///
/// # Examples
///
/// ```rust
/// use canopy_model::graph::ConnectivityGraph;
/// use canopy_model::index::NodeIndex;
///
/// let mut graph = ConnectivityGraph::<i64>::new(3);
/// graph.add_link(NodeIndex::new(0), NodeIndex::new(1));
/// graph.add_edge(NodeIndex::new(1), NodeIndex::new(2));
///
/// assert!(graph.has_edge(NodeIndex::new(0), NodeIndex::new(1)));
/// assert!(graph.has_edge(NodeIndex::new(1), NodeIndex::new(0)));
/// assert!(!graph.has_edge(NodeIndex::new(2), NodeIndex::new(1)));
/// assert_eq!(graph.num_edges(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct ConnectivityGraph<T> {
    num_nodes: usize,
    adjacency: FixedBitSet,
    weights: Vec<Option<T>>,
    coords: Vec<Option<(f64, f64)>>,
}

impl<T> ConnectivityGraph<T>
where
    T: PrimInt + Signed,
{
    /// Creates an edgeless graph with `num_nodes` nodes.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            adjacency: FixedBitSet::with_capacity(num_nodes * num_nodes),
            weights: vec![None; num_nodes],
            coords: vec![None; num_nodes],
        }
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Returns the number of directed edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.adjacency.count_ones(..)
    }

    #[inline(always)]
    fn flatten(&self, from: NodeIndex, to: NodeIndex) -> usize {
        debug_assert!(
            from.get() < self.num_nodes && to.get() < self.num_nodes,
            "called `ConnectivityGraph` edge access with node index out of bounds: the graph has {} nodes but the edge is ({}, {})",
            self.num_nodes,
            from.get(),
            to.get()
        );

        from.get() * self.num_nodes + to.get()
    }

    /// Adds the directed edge `from -> to`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if either index is out of bounds.
    #[inline]
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) -> &mut Self {
        let index = self.flatten(from, to);
        self.adjacency.insert(index);
        self
    }

    /// Adds both directions of an undirected candidate link.
    #[inline]
    pub fn add_link(&mut self, a: NodeIndex, b: NodeIndex) -> &mut Self {
        self.add_edge(a, b);
        self.add_edge(b, a)
    }

    /// Returns `true` if the directed edge `from -> to` exists.
    #[inline]
    pub fn has_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.adjacency.contains(self.flatten(from, to))
    }

    /// Iterates over all nodes.
    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.num_nodes).map(NodeIndex::new)
    }

    /// Iterates over all directed edges.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.adjacency.ones().map(move |flat| {
            (
                NodeIndex::new(flat / self.num_nodes),
                NodeIndex::new(flat % self.num_nodes),
            )
        })
    }

    /// Sets the scalar weight of a node (used as demand in weighted mode).
    #[inline]
    pub fn set_weight(&mut self, node: NodeIndex, weight: T) -> &mut Self {
        debug_assert!(
            node.get() < self.num_nodes,
            "called `ConnectivityGraph::set_weight` with node index out of bounds: the len is {} but the index is {}",
            self.num_nodes,
            node.get()
        );

        self.weights[node.get()] = Some(weight);
        self
    }

    /// Returns the weight of a node, if one was set.
    #[inline]
    pub fn weight(&self, node: NodeIndex) -> Option<T> {
        debug_assert!(
            node.get() < self.num_nodes,
            "called `ConnectivityGraph::weight` with node index out of bounds: the len is {} but the index is {}",
            self.num_nodes,
            node.get()
        );

        self.weights[node.get()]
    }

    /// Sets the 2-D coordinates of a node.
    #[inline]
    pub fn set_coords(&mut self, node: NodeIndex, x: f64, y: f64) -> &mut Self {
        debug_assert!(
            node.get() < self.num_nodes,
            "called `ConnectivityGraph::set_coords` with node index out of bounds: the len is {} but the index is {}",
            self.num_nodes,
            node.get()
        );

        self.coords[node.get()] = Some((x, y));
        self
    }

    /// Returns the coordinates of a node, if they were set.
    #[inline]
    pub fn coords(&self, node: NodeIndex) -> Option<(f64, f64)> {
        debug_assert!(
            node.get() < self.num_nodes,
            "called `ConnectivityGraph::coords` with node index out of bounds: the len is {} but the index is {}",
            self.num_nodes,
            node.get()
        );

        self.coords[node.get()]
    }
}

impl<T> std::fmt::Display for ConnectivityGraph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnectivityGraph(num_nodes: {}, num_edges: {})",
            self.num_nodes,
            self.adjacency.count_ones(..)
        )
    }
}
