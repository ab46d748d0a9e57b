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

//! Discrete topology reconstruction from a solved assignment.
//!
//! The solver reports floats; reconstruction snaps them to a labeled
//! topology using the 0.5 selection threshold. The result is plain data:
//! one role per node, one labeled edge per candidate link, suitable for
//! reporting and JSON export.

use canopy_model::graph::ConnectivityGraph;
use canopy_model::index::NodeIndex;
use canopy_model::variable::{Assignment, VarKey};
use num_traits::{PrimInt, Signed};
use serde::{Deserialize, Serialize};

/// The role a node plays in the reconstructed topology.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NodeRole {
    /// Root of the single tree.
    Donor,
    /// Root of the main tree (dual mode).
    DonorMain,
    /// Root of the backup tree (dual mode).
    DonorBackup,
    /// Any non-root node.
    Relay,
}

impl NodeRole {
    /// Returns `true` for any of the donor roles.
    #[inline]
    pub fn is_donor(&self) -> bool {
        !matches!(self, NodeRole::Relay)
    }
}

/// The label of a candidate link after reconstruction.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum EdgeLabel {
    /// Candidate link not selected by any tree.
    Off,
    /// Selected by the single tree (topology-only model).
    On,
    /// Selected by the main tree (dual mode).
    OnMain,
    /// Selected by the backup tree (dual mode).
    OnBackup,
    /// Selected and carrying this many flow units (summed over
    /// destinations).
    Flow(f64),
}

impl EdgeLabel {
    /// Returns `true` unless the label is [`EdgeLabel::Off`].
    #[inline]
    pub fn is_on(&self) -> bool {
        !matches!(self, EdgeLabel::Off)
    }
}

/// A directed candidate link with its reconstructed label.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct LabeledEdge {
    pub from: usize,
    pub to: usize,
    pub label: EdgeLabel,
}

/// The reconstructed topology: one role per node, labeled edges.
///
/// Reconstruction is a pure function of the assignment, so rebuilding
/// from the same assignment yields an equal topology.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LabeledTopology {
    roles: Vec<NodeRole>,
    edges: Vec<LabeledEdge>,
}

impl LabeledTopology {
    /// Returns the number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.roles.len()
    }

    /// Returns the role of a node.
    #[inline]
    pub fn role(&self, node: NodeIndex) -> NodeRole {
        debug_assert!(
            node.get() < self.roles.len(),
            "called `LabeledTopology::role` with node index out of bounds: the len is {} but the index is {}",
            self.roles.len(),
            node.get()
        );

        self.roles[node.get()]
    }

    /// Returns all node roles, indexed by node.
    #[inline]
    pub fn roles(&self) -> &[NodeRole] {
        &self.roles
    }

    /// Returns all labeled edges.
    #[inline]
    pub fn edges(&self) -> &[LabeledEdge] {
        &self.edges
    }

    /// Iterates over the nodes holding a donor role.
    pub fn donors(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.roles
            .iter()
            .enumerate()
            .filter(|(_, role)| role.is_donor())
            .map(|(index, _)| NodeIndex::new(index))
    }

    /// Iterates over the edges that are part of a tree.
    pub fn active_edges(&self) -> impl Iterator<Item = &LabeledEdge> {
        self.edges.iter().filter(|edge| edge.label.is_on())
    }
}

/// Rebuilds the discrete topology from a solved assignment.
pub struct TopologyReconstructor<'g, T> {
    graph: &'g ConnectivityGraph<T>,
}

impl<'g, T> TopologyReconstructor<'g, T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn new(graph: &'g ConnectivityGraph<T>) -> Self {
        Self { graph }
    }

    /// Reconstructs a single-tree solution.
    ///
    /// Every node becomes [`NodeRole::Donor`] or [`NodeRole::Relay`];
    /// every directed candidate link is labeled. When the assignment
    /// carries flow variables, selected edges carry their total flow.
    pub fn reconstruct_single(&self, assignment: &Assignment) -> LabeledTopology {
        let carries_flow = assignment.has_flow();

        let roles = self
            .graph
            .nodes()
            .map(|i| {
                if assignment.is_selected(VarKey::Level(i, 0)) {
                    NodeRole::Donor
                } else {
                    NodeRole::Relay
                }
            })
            .collect();

        let edges = self
            .graph
            .edges()
            .map(|(i, j)| {
                let label = if assignment.is_selected(VarKey::Parent(i, j)) {
                    if carries_flow {
                        EdgeLabel::Flow(self.edge_flow(assignment, i, j))
                    } else {
                        EdgeLabel::On
                    }
                } else {
                    EdgeLabel::Off
                };
                LabeledEdge {
                    from: i.get(),
                    to: j.get(),
                    label,
                }
            })
            .collect();

        LabeledTopology { roles, edges }
    }

    /// Reconstructs a dual-tree solution.
    ///
    /// Selected edges are labeled per tree and direction; unselected
    /// candidate links collapse to a single off edge per unordered pair.
    pub fn reconstruct_dual(&self, assignment: &Assignment) -> LabeledTopology {
        let roles = self
            .graph
            .nodes()
            .map(|i| {
                if assignment.is_selected(VarKey::Level(i, 0)) {
                    NodeRole::DonorMain
                } else if assignment.is_selected(VarKey::BackupLevel(i, 0)) {
                    NodeRole::DonorBackup
                } else {
                    NodeRole::Relay
                }
            })
            .collect();

        let mut edges = Vec::new();
        for (i, j) in self.graph.edges() {
            if assignment.is_selected(VarKey::Parent(i, j)) {
                edges.push(LabeledEdge {
                    from: i.get(),
                    to: j.get(),
                    label: EdgeLabel::OnMain,
                });
            }
            if assignment.is_selected(VarKey::BackupParent(i, j)) {
                edges.push(LabeledEdge {
                    from: i.get(),
                    to: j.get(),
                    label: EdgeLabel::OnBackup,
                });
            }
        }

        // One off edge per unselected unordered pair.
        for (i, j) in self.graph.edges() {
            if i.get() > j.get() && self.graph.has_edge(j, i) {
                // The (j, i) iteration covers this pair.
                continue;
            }
            let pair_selected = [
                VarKey::Parent(i, j),
                VarKey::Parent(j, i),
                VarKey::BackupParent(i, j),
                VarKey::BackupParent(j, i),
            ]
            .into_iter()
            .any(|key| assignment.is_selected(key));
            if !pair_selected {
                edges.push(LabeledEdge {
                    from: i.get(),
                    to: j.get(),
                    label: EdgeLabel::Off,
                });
            }
        }

        LabeledTopology { roles, edges }
    }

    fn edge_flow(&self, assignment: &Assignment, from: NodeIndex, to: NodeIndex) -> f64 {
        self.graph
            .nodes()
            .map(|h| assignment.value(VarKey::Flow(from, to, h)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ni(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn triangle() -> ConnectivityGraph<i64> {
        let mut graph = ConnectivityGraph::new(3);
        graph.add_link(ni(0), ni(1));
        graph.add_link(ni(1), ni(2));
        graph.add_link(ni(2), ni(0));
        graph
    }

    #[test]
    fn test_single_tree_roles_are_total_and_exclusive() {
        let graph = triangle();
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::Level(ni(1), 1), 1.0);
        assignment.set(VarKey::Level(ni(2), 1), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(2)), 1.0);

        let topology = TopologyReconstructor::new(&graph).reconstruct_single(&assignment);
        assert_eq!(topology.num_nodes(), 3);
        assert_eq!(topology.role(ni(0)), NodeRole::Donor);
        assert_eq!(topology.role(ni(1)), NodeRole::Relay);
        assert_eq!(topology.role(ni(2)), NodeRole::Relay);
        assert_eq!(topology.donors().count(), 1);

        // Every candidate link gets a label.
        assert_eq!(topology.edges().len(), graph.num_edges());
        assert_eq!(topology.active_edges().count(), 2);
    }

    #[test]
    fn test_selection_threshold() {
        let graph = triangle();
        let mut assignment = Assignment::new();
        // 0.5 rounds up to selected, 0.49 does not.
        assignment.set(VarKey::Level(ni(0), 0), 0.5);
        assignment.set(VarKey::Level(ni(1), 0), 0.49);

        let topology = TopologyReconstructor::new(&graph).reconstruct_single(&assignment);
        assert_eq!(topology.role(ni(0)), NodeRole::Donor);
        assert_eq!(topology.role(ni(1)), NodeRole::Relay);
    }

    #[test]
    fn test_flow_edges_carry_summed_flow() {
        let graph = triangle();
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 1.0);
        assignment.set(VarKey::Flow(ni(0), ni(1), ni(1)), 1.0);
        assignment.set(VarKey::Flow(ni(0), ni(1), ni(2)), 2.0);

        let topology = TopologyReconstructor::new(&graph).reconstruct_single(&assignment);
        let edge = topology
            .edges()
            .iter()
            .find(|e| e.from == 0 && e.to == 1)
            .unwrap();
        assert_eq!(edge.label, EdgeLabel::Flow(3.0));
        // Unselected edges stay off even in flow mode.
        let off = topology
            .edges()
            .iter()
            .find(|e| e.from == 1 && e.to == 2)
            .unwrap();
        assert_eq!(off.label, EdgeLabel::Off);
    }

    #[test]
    fn test_dual_tree_roles_and_pairwise_off_edges() {
        let graph = triangle();
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::BackupLevel(ni(1), 0), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(2)), 1.0);
        assignment.set(VarKey::BackupParent(ni(1), ni(2)), 1.0);

        let topology = TopologyReconstructor::new(&graph).reconstruct_dual(&assignment);
        assert_eq!(topology.role(ni(0)), NodeRole::DonorMain);
        assert_eq!(topology.role(ni(1)), NodeRole::DonorBackup);
        assert_eq!(topology.role(ni(2)), NodeRole::Relay);

        let labels: Vec<EdgeLabel> = topology.edges().iter().map(|e| e.label).collect();
        assert!(labels.contains(&EdgeLabel::OnMain));
        assert!(labels.contains(&EdgeLabel::OnBackup));
        // The untouched link 0-1 collapses to one off edge, so the
        // triangle yields exactly three labeled edges.
        assert_eq!(topology.edges().len(), 3);
        assert_eq!(labels.iter().filter(|l| **l == EdgeLabel::Off).count(), 1);
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let graph = triangle();
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 0.999);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 0.501);

        let reconstructor = TopologyReconstructor::new(&graph);
        let first = reconstructor.reconstruct_single(&assignment);
        let second = reconstructor.reconstruct_single(&assignment);
        assert_eq!(first, second);
    }
}
