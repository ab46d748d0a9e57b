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

//! # Topology Model Builder
//!
//! Turns a connectivity graph plus parameters into the declarative
//! constraint model of the donor-tree selection problem, in one of three
//! variants:
//!
//! - single tree, topology only (requires an out-degree bound),
//! - single tree with the integer-flow extension,
//! - dual tree (main + backup), topology only.
//!
//! Hop distance is encoded as one-hot binary level indicators `u[i,l]`
//! rather than an integer variable; every constraint stays linear and the
//! verifier's per-level aggregation checks assume exactly this shape.
//!
//! ## Usage
//!
//! ```rust
//! use canopy_model::builder::ModelBuilder;
//! use canopy_model::graph::ConnectivityGraph;
//! use canopy_model::index::NodeIndex;
//! use canopy_model::params::{DegreeBound, TopologyParams};
//!
//! let mut graph = ConnectivityGraph::<i64>::new(3);
//! graph.add_link(NodeIndex::new(0), NodeIndex::new(1));
//! graph.add_link(NodeIndex::new(1), NodeIndex::new(2));
//!
//! let params = TopologyParams::new(2, DegreeBound::Constant(1));
//! let model = ModelBuilder::new(&graph, params)
//!     .build_single_tree()
//!     .expect("a degree-bounded model");
//! assert!(model.num_constraints() > 0);
//! ```

use crate::graph::ConnectivityGraph;
use crate::index::NodeIndex;
use crate::linear::{Comparison, ConstraintModel, LinearConstraint, LinearExpr};
use crate::params::{DegreeBound, FlowParams, TopologyParams};
use crate::variable::{VarDomain, VarKey};
use num_traits::{PrimInt, Signed, ToPrimitive};
use thiserror::Error;
use tracing::debug;

/// The error type for model construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelBuildError {
    /// A topology-only single-tree model without a degree bound admits the
    /// degenerate star solution; the formulation requires a bound.
    #[error("the topology-only single-tree model requires an out-degree bound")]
    MissingDegreeBound,
    /// The flow extension is only defined for the single-tree variant.
    #[error("the flow extension cannot be combined with the dual-tree model")]
    FlowWithDualTree,
    /// Flow parameter vectors do not match the node count.
    #[error("flow parameters cover {provided} nodes but {expected} were expected")]
    FlowParamsMismatch { expected: usize, provided: usize },
    /// Capacities must be positive integers.
    #[error("node {node} has a non-positive capacity")]
    InvalidCapacity { node: usize },
    /// Demands must be non-negative integers.
    #[error("node {node} has a negative demand")]
    InvalidDemand { node: usize },
    /// A node demands more than its own capacity; the model could never
    /// route that much through a single node.
    #[error("node {node} has demand {demand} exceeding its capacity {capacity}")]
    DemandExceedsCapacity {
        node: usize,
        demand: f64,
        capacity: f64,
    },
    /// A capacity or demand did not survive conversion to f64 coefficients.
    #[error("node {node} has a capacity or demand not representable as f64")]
    UnrepresentableValue { node: usize },
}

/// Selects which tree's variables a constraint family is emitted for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tree {
    Main,
    Backup,
}

impl Tree {
    #[inline]
    fn level(self, node: NodeIndex, level: usize) -> VarKey {
        match self {
            Tree::Main => VarKey::Level(node, level),
            Tree::Backup => VarKey::BackupLevel(node, level),
        }
    }

    #[inline]
    fn parent(self, from: NodeIndex, to: NodeIndex) -> VarKey {
        match self {
            Tree::Main => VarKey::Parent(from, to),
            Tree::Backup => VarKey::BackupParent(from, to),
        }
    }

    #[inline]
    fn other(self) -> Tree {
        match self {
            Tree::Main => Tree::Backup,
            Tree::Backup => Tree::Main,
        }
    }

    #[inline]
    fn tag(self, main: &'static str, backup: &'static str) -> &'static str {
        match self {
            Tree::Main => main,
            Tree::Backup => backup,
        }
    }
}

/// Builds the donor-tree constraint model from an immutable input graph.
///
/// The builder borrows the graph; the produced [`ConstraintModel`] is
/// self-contained data handed to a solver backend.
pub struct ModelBuilder<'g, T> {
    graph: &'g ConnectivityGraph<T>,
    params: TopologyParams,
    flow: Option<FlowParams<T>>,
}

impl<'g, T> ModelBuilder<'g, T>
where
    T: PrimInt + Signed,
{
    /// Creates a builder for the given graph and structural parameters.
    #[inline]
    pub fn new(graph: &'g ConnectivityGraph<T>, params: TopologyParams) -> Self {
        Self {
            graph,
            params,
            flow: None,
        }
    }

    /// Enables the integer-flow extension with the given parameters.
    #[inline]
    pub fn with_flow(mut self, flow: FlowParams<T>) -> Self {
        self.flow = Some(flow);
        self
    }

    /// Returns the structural parameters this builder was created with.
    #[inline]
    pub fn params(&self) -> &TopologyParams {
        &self.params
    }

    /// Builds the single-tree model, with the flow extension if one was
    /// configured via [`ModelBuilder::with_flow`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelBuildError::MissingDegreeBound`] for a topology-only
    /// model without a degree bound, or a flow-parameter validation error.
    pub fn build_single_tree(&self) -> Result<ConstraintModel, ModelBuildError> {
        if self.flow.is_none() && !self.params.degree_bound.is_bounded() {
            return Err(ModelBuildError::MissingDegreeBound);
        }

        let mut model = ConstraintModel::new();
        self.declare_tree_variables(&mut model, Tree::Main);
        self.emit_tree_constraints(&mut model, Tree::Main, false);

        let mut objective = LinearExpr::new();
        for i in self.graph.nodes() {
            objective.push(1.0, VarKey::Level(i, 0));
        }
        model.minimize(objective);

        if let Some(flow) = &self.flow {
            self.emit_flow_extension(&mut model, flow)?;
        }

        debug!(
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            flow = self.flow.is_some(),
            "built single-tree topology model"
        );
        Ok(model)
    }

    /// Builds the dual-tree (main + backup) topology model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelBuildError::FlowWithDualTree`] if the flow extension
    /// was configured; the combination is not defined.
    pub fn build_dual_tree(&self) -> Result<ConstraintModel, ModelBuildError> {
        if self.flow.is_some() {
            return Err(ModelBuildError::FlowWithDualTree);
        }

        let mut model = ConstraintModel::new();
        self.declare_tree_variables(&mut model, Tree::Main);
        self.declare_tree_variables(&mut model, Tree::Backup);
        self.emit_tree_constraints(&mut model, Tree::Main, true);
        self.emit_tree_constraints(&mut model, Tree::Backup, true);
        self.emit_tree_separation(&mut model);

        let mut objective = LinearExpr::new();
        for i in self.graph.nodes() {
            objective.push(1.0, VarKey::Level(i, 0));
            objective.push(1.0, VarKey::BackupLevel(i, 0));
        }
        model.minimize(objective);

        debug!(
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            "built dual-tree topology model"
        );
        Ok(model)
    }

    fn declare_tree_variables(&self, model: &mut ConstraintModel, tree: Tree) {
        let diameter = self.params.max_diameter;
        for i in self.graph.nodes() {
            for l in 0..=diameter {
                model.declare(tree.level(i, l), VarDomain::Binary);
            }
        }
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                model.declare(tree.parent(i, j), VarDomain::Binary);
            }
        }
    }

    /// Emits the structural constraint families for one tree.
    ///
    /// In dual mode the level-assignment and unique-parent equalities
    /// subtract the other tree's donor indicator, so that every node
    /// belongs to exactly one of the two trees.
    fn emit_tree_constraints(&self, model: &mut ConstraintModel, tree: Tree, dual: bool) {
        let diameter = self.params.max_diameter;

        // Exactly one level per node (minus the other tree's donor slot).
        for i in self.graph.nodes() {
            let mut expr = LinearExpr::new();
            for l in 0..=diameter {
                expr.push(1.0, tree.level(i, l));
            }
            if dual {
                expr.push(1.0, tree.other().level(i, 0));
            }
            model.constrain(LinearConstraint::new(
                tree.tag("single_level", "single_level_backup"),
                expr,
                Comparison::Equal,
                1.0,
            ));
        }

        // A non-donor has exactly one incoming active edge, a donor none.
        for j in self.graph.nodes() {
            let mut expr = LinearExpr::new();
            for i in self.graph.nodes() {
                expr.push(1.0, tree.parent(i, j));
            }
            expr.push(1.0, tree.level(j, 0));
            if dual {
                expr.push(1.0, tree.other().level(j, 0));
            }
            model.constrain(LinearConstraint::new(
                tree.tag("unique_parent", "unique_parent_backup"),
                expr,
                Comparison::Equal,
                1.0,
            ));
        }

        // Out-degree bound: constant, or decreasing with the node's level.
        match self.params.degree_bound {
            DegreeBound::Unbounded => {}
            DegreeBound::Constant(cap) => {
                for i in self.graph.nodes() {
                    let mut expr = LinearExpr::new();
                    for j in self.graph.nodes() {
                        expr.push(1.0, tree.parent(i, j));
                    }
                    model.constrain(LinearConstraint::new(
                        tree.tag("max_out_degree", "max_out_degree_backup"),
                        expr,
                        Comparison::LessOrEqual,
                        cap as f64,
                    ));
                }
            }
            DegreeBound::Decreasing(cap) => {
                // One constraint per (node, level): fan-out shrinks by the
                // node's own distance from the root.
                for i in self.graph.nodes() {
                    for l in 0..=diameter {
                        let mut expr = LinearExpr::new();
                        for j in self.graph.nodes() {
                            expr.push(1.0, tree.parent(i, j));
                        }
                        expr.push(l as f64, tree.level(i, l));
                        model.constrain(LinearConstraint::new(
                            tree.tag(
                                "max_out_degree_decreasing",
                                "max_out_degree_decreasing_backup",
                            ),
                            expr,
                            Comparison::LessOrEqual,
                            cap as f64,
                        ));
                    }
                }
            }
        }

        // An active edge connects a parent at level l-1 to a child at l.
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                for l in 1..=diameter {
                    let expr = LinearExpr::new()
                        .term(1.0, tree.parent(i, j))
                        .term(1.0, tree.level(j, l))
                        .term(-1.0, tree.level(i, l - 1));
                    model.constrain(LinearConstraint::new(
                        tree.tag("incremental_distance", "incremental_distance_backup"),
                        expr,
                        Comparison::LessOrEqual,
                        1.0,
                    ));
                }
            }
        }

        // A nonzero level implies at least one incoming active edge; keeps
        // "assigned a level but orphaned" states out of the polytope.
        for j in self.graph.nodes() {
            let mut expr = LinearExpr::new();
            for l in 1..=diameter {
                expr.push(1.0, tree.level(j, l));
            }
            for i in self.graph.nodes() {
                expr.push(-1.0, tree.parent(i, j));
            }
            model.constrain(LinearConstraint::new(
                tree.tag("level_implies_parent", "level_implies_parent_backup"),
                expr,
                Comparison::LessOrEqual,
                0.0,
            ));
        }

        // Edges absent from the input graph can never be selected. Only
        // the binding half of p[i,j] <= E[i,j] is emitted.
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                if !self.graph.has_edge(i, j) {
                    model.constrain(LinearConstraint::new(
                        tree.tag("edge_legality", "edge_legality_backup"),
                        LinearExpr::new().term(1.0, tree.parent(i, j)),
                        Comparison::LessOrEqual,
                        0.0,
                    ));
                }
            }
        }

        // A candidate link serves one tree in at most one direction.
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                if i.get() < j.get() {
                    let expr = LinearExpr::new()
                        .term(1.0, tree.parent(i, j))
                        .term(1.0, tree.parent(j, i));
                    model.constrain(LinearConstraint::new(
                        tree.tag("antiparallel", "antiparallel_backup"),
                        expr,
                        Comparison::LessOrEqual,
                        1.0,
                    ));
                }
            }
        }
    }

    /// The same physical link cannot serve both trees in either direction.
    fn emit_tree_separation(&self, model: &mut ConstraintModel) {
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                if i.get() < j.get() {
                    let expr = LinearExpr::new()
                        .term(1.0, VarKey::Parent(i, j))
                        .term(1.0, VarKey::Parent(j, i))
                        .term(1.0, VarKey::BackupParent(i, j))
                        .term(1.0, VarKey::BackupParent(j, i));
                    model.constrain(LinearConstraint::new(
                        "tree_separation",
                        expr,
                        Comparison::LessOrEqual,
                        1.0,
                    ));
                }
            }
        }
    }

    fn emit_flow_extension(
        &self,
        model: &mut ConstraintModel,
        flow: &FlowParams<T>,
    ) -> Result<(), ModelBuildError> {
        let n = self.graph.num_nodes();
        if flow.num_nodes() != n {
            return Err(ModelBuildError::FlowParamsMismatch {
                expected: n,
                provided: flow.num_nodes(),
            });
        }

        let capacities = convert_to_f64(flow.capacities())?;
        let demands = convert_to_f64(flow.demands())?;

        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                for h in self.graph.nodes() {
                    model.declare(VarKey::Flow(i, j, h), VarDomain::NonNegativeInteger);
                }
            }
        }

        // Total outgoing flow is bounded by the node's capacity.
        for i in self.graph.nodes() {
            let mut expr = LinearExpr::new();
            for j in self.graph.nodes() {
                for h in self.graph.nodes() {
                    expr.push(1.0, VarKey::Flow(i, j, h));
                }
            }
            model.constrain(LinearConstraint::new(
                "flow_capacity",
                expr,
                Comparison::LessOrEqual,
                capacities[i.get()],
            ));
        }

        // Outflow minus inflow is zero for relays; a donor injects its
        // full capacity into the network.
        for i in self.graph.nodes() {
            let mut expr = LinearExpr::new();
            for j in self.graph.nodes() {
                for h in self.graph.nodes() {
                    if h != i {
                        expr.push(1.0, VarKey::Flow(i, j, h));
                        expr.push(-1.0, VarKey::Flow(j, i, h));
                    }
                }
            }
            expr.push(-capacities[i.get()], VarKey::Level(i, 0));
            model.constrain(LinearConstraint::new(
                "flow_conservation",
                expr,
                Comparison::Equal,
                0.0,
            ));
        }

        // Every non-donor receives at least its demand.
        for j in self.graph.nodes() {
            let mut expr = LinearExpr::new();
            for i in self.graph.nodes() {
                expr.push(1.0, VarKey::Flow(i, j, j));
            }
            expr.push(demands[j.get()], VarKey::Level(j, 0));
            model.constrain(LinearConstraint::new(
                "flow_demand",
                expr,
                Comparison::GreaterOrEqual,
                demands[j.get()],
            ));
        }

        // Flow destined for the edge's own origin is forbidden.
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                model.constrain(LinearConstraint::new(
                    "flow_no_self_destination",
                    LinearExpr::new().term(1.0, VarKey::Flow(i, j, i)),
                    Comparison::Equal,
                    0.0,
                ));
            }
        }

        // Flow can only ride edges selected by the tree.
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                for h in self.graph.nodes() {
                    let expr = LinearExpr::new()
                        .term(1.0, VarKey::Flow(i, j, h))
                        .term(-capacities[i.get()], VarKey::Parent(i, j));
                    model.constrain(LinearConstraint::new(
                        "flow_edge_gated",
                        expr,
                        Comparison::LessOrEqual,
                        0.0,
                    ));
                }
            }
        }

        Ok(())
    }
}

fn convert_to_f64<T>(values: &[T]) -> Result<Vec<f64>, ModelBuildError>
where
    T: ToPrimitive,
{
    values
        .iter()
        .enumerate()
        .map(|(node, value)| {
            value
                .to_f64()
                .ok_or(ModelBuildError::UnrepresentableValue { node })
        })
        .collect()
}
