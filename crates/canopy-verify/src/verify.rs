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

//! Structural verification of solved topologies.
//!
//! The verifier re-checks every structural property against the original
//! graph and parameters, independently of the constraint model that
//! produced the solution. Checks never short-circuit: all violations of a
//! solution are collected in one pass so a single report shows everything
//! that is wrong. Donor sets and per-node level tallies are threaded
//! through [`TreeInspection`] values rather than shared state.

use crate::topology::{LabeledTopology, TopologyReconstructor};
use canopy_core::math::tree;
use canopy_core::num::rounding::ROUNDING_TOLERANCE;
use canopy_model::graph::ConnectivityGraph;
use canopy_model::index::NodeIndex;
use canopy_model::params::{FlowParams, TopologyParams};
use canopy_model::variable::{Assignment, VarKey};
use canopy_solver::report::{SolveReport, SolverStatus};
use num_traits::{PrimInt, Signed, ToPrimitive};
use petgraph::unionfind::UnionFind;
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{info, warn};

/// A single failed structural check.
///
/// Violations are independent facts about the solution; the verifier
/// reports all of them rather than the first one found.
#[derive(Clone, PartialEq, Debug, Error, Serialize)]
pub enum StructuralViolation {
    /// A node's one-hot level encoding is broken.
    #[error("node {node} has {active} active level indicators in the {tree} tree")]
    LevelNotUnique {
        tree: &'static str,
        node: usize,
        active: usize,
    },
    /// A node sits further from its root than the diameter allows.
    #[error("node {node} is at level {level} in the {tree} tree but the diameter bound is {max}")]
    DiameterExceeded {
        tree: &'static str,
        node: usize,
        level: usize,
        max: usize,
    },
    /// A tree without a root cannot feed anyone.
    #[error("the {tree} tree has no donor")]
    NoDonor { tree: &'static str },
    /// A node is fed by more than one parent.
    #[error("node {node} has {incoming} incoming active edges in the {tree} tree")]
    IncomingDegreeExceeded {
        tree: &'static str,
        node: usize,
        incoming: usize,
    },
    /// An active edge does not exist in the connectivity graph.
    #[error("the {tree} tree uses the non-existing edge ({from}, {to})")]
    IllegalEdge {
        tree: &'static str,
        from: usize,
        to: usize,
    },
    /// A node sends more flow than its capacity.
    #[error("node {node} sends {outflow} flow units but has capacity {capacity}")]
    FlowCapacityExceeded {
        node: usize,
        outflow: f64,
        capacity: f64,
    },
    /// Flow rides an edge the tree did not select.
    #[error("edge ({from}, {to}) carries {flow} flow units but is not part of the tree")]
    FlowOnInactiveEdge { from: usize, to: usize, flow: f64 },
    /// The donors together inject less than the non-donors demand.
    #[error("donors generate {generated} flow units but non-donors demand {required}")]
    FlowGenerationShortfall { generated: f64, required: f64 },
    /// Donors are sources; inbound flow means the tree direction broke.
    #[error("donor {node} receives {inflow} flow units")]
    DonorInflow { node: usize, inflow: f64 },
    /// A non-donor receives less destined flow than it demands.
    #[error("node {node} receives {delivered} destined flow units but demands {demand}")]
    DemandUnmet {
        node: usize,
        delivered: f64,
        demand: f64,
    },
    /// A connected group of tree edges spans more nodes than a
    /// diameter/degree-bounded tree can hold.
    #[error("a {tree} component spans {nodes} nodes but the tree-size bound is {bound}")]
    TreeTooLarge {
        tree: &'static str,
        nodes: usize,
        bound: u64,
    },
    /// Dual mode: one physical link may serve at most one tree in one
    /// direction.
    #[error("the link between {a} and {b} is used by more than one tree or direction")]
    SharedLink { a: usize, b: usize },
    /// Dual mode: the two donor sets must be disjoint.
    #[error("node {node} is a donor of both trees")]
    DonorSetsOverlap { node: usize },
    /// Dual mode: a donor belongs to its own tree only; every other node
    /// belongs to both.
    #[error("node {node} does not have the expected tree memberships")]
    CoverageMismatch { node: usize },
}

/// The error type for solver outcomes that leave nothing to verify.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum VerifyError {
    #[error("the solver proved the model infeasible")]
    Infeasible,
    #[error("the solver ended in unexpected status: {0}")]
    UnexpectedStatus(String),
}

/// The complete result of verifying one solution.
#[derive(Clone, Debug, Serialize)]
pub struct VerificationReport {
    /// How the solver run ended (optimal or aborted; fatal statuses never
    /// produce a report).
    pub status: SolverStatus,
    /// Number of donor nodes (both trees combined in dual mode).
    pub donor_count: usize,
    /// Deepest active level observed in the solution.
    pub observed_max_level: usize,
    /// Relative optimality gap; 0.0 for proven-optimal runs.
    pub gap: f64,
    /// Every failed structural check.
    pub violations: Vec<StructuralViolation>,
    /// The reconstructed discrete topology.
    pub topology: LabeledTopology,
}

impl VerificationReport {
    /// Proven optimal and structurally clean.
    #[inline]
    pub fn passed(&self) -> bool {
        self.status == SolverStatus::Optimal && self.violations.is_empty()
    }

    /// All structural checks passed, regardless of optimality.
    #[inline]
    pub fn structurally_sound(&self) -> bool {
        self.violations.is_empty()
    }

    /// A proven-optimal solution violating structure means the constraint
    /// formulation itself is wrong, not the solver.
    #[inline]
    pub fn indicates_model_bug(&self) -> bool {
        self.status == SolverStatus::Optimal && !self.violations.is_empty()
    }
}

/// Selects which tree's variables a check reads.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum TreeVars {
    Main,
    Backup,
}

impl TreeVars {
    #[inline]
    fn name(self) -> &'static str {
        match self {
            TreeVars::Main => "main",
            TreeVars::Backup => "backup",
        }
    }

    #[inline]
    fn level(self, node: NodeIndex, level: usize) -> VarKey {
        match self {
            TreeVars::Main => VarKey::Level(node, level),
            TreeVars::Backup => VarKey::BackupLevel(node, level),
        }
    }

    #[inline]
    fn parent(self, from: NodeIndex, to: NodeIndex) -> VarKey {
        match self {
            TreeVars::Main => VarKey::Parent(from, to),
            TreeVars::Backup => VarKey::BackupParent(from, to),
        }
    }
}

/// What one pass over a single tree's variables found.
///
/// Returned by value so donor sets and level tallies flow explicitly from
/// inspection to the checks that need them.
struct TreeInspection {
    donors: Vec<NodeIndex>,
    level_counts: Vec<usize>,
    active_edges: Vec<(NodeIndex, NodeIndex)>,
    max_level: usize,
}

/// Re-checks a solved assignment against the graph and parameters.
pub struct SolutionVerifier<'g, T> {
    graph: &'g ConnectivityGraph<T>,
    params: TopologyParams,
    flow: Option<FlowParams<T>>,
}

impl<'g, T> SolutionVerifier<'g, T>
where
    T: PrimInt + Signed,
{
    /// Creates a verifier for the given graph and structural parameters.
    #[inline]
    pub fn new(graph: &'g ConnectivityGraph<T>, params: TopologyParams) -> Self {
        Self {
            graph,
            params,
            flow: None,
        }
    }

    /// Enables the flow checks; pass the same parameters the model was
    /// built with.
    #[inline]
    pub fn with_flow(mut self, flow: FlowParams<T>) -> Self {
        self.flow = Some(flow);
        self
    }

    /// Verifies a single-tree solution.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Infeasible`] or
    /// [`VerifyError::UnexpectedStatus`] for solver outcomes without a
    /// usable solution. An aborted run is verified like an optimal one,
    /// with the optimality gap recorded in the report.
    pub fn verify_single_tree(
        &self,
        assignment: &Assignment,
        solve: &SolveReport,
    ) -> Result<VerificationReport, VerifyError> {
        debug_assert!(
            !assignment.has_backup_tree(),
            "called `SolutionVerifier::verify_single_tree` with a dual-tree assignment: use `verify_dual_tree`"
        );

        let gap = self.usable_gap(solve)?;
        let mut violations = Vec::new();

        let inspection = self.inspect_tree(assignment, TreeVars::Main, &mut violations);
        for node in self.graph.nodes() {
            if inspection.level_counts[node.get()] == 0 {
                violations.push(StructuralViolation::LevelNotUnique {
                    tree: "main",
                    node: node.get(),
                    active: 0,
                });
            }
        }
        if inspection.donors.is_empty() {
            violations.push(StructuralViolation::NoDonor { tree: "main" });
        }
        self.check_diameter(assignment, &mut violations);
        self.check_tree_size(TreeVars::Main, &inspection, &mut violations);
        if let Some(flow) = &self.flow {
            self.check_flow(assignment, &inspection, flow, &mut violations);
        }

        let topology = TopologyReconstructor::new(self.graph).reconstruct_single(assignment);
        Ok(self.finish(
            solve,
            gap,
            inspection.donors.len(),
            inspection.max_level,
            violations,
            topology,
        ))
    }

    /// Verifies a dual-tree solution.
    ///
    /// On top of the per-tree checks this validates the dual coverage
    /// contract: donor sets are disjoint, a donor belongs only to its own
    /// tree, and every other node belongs to both trees.
    pub fn verify_dual_tree(
        &self,
        assignment: &Assignment,
        solve: &SolveReport,
    ) -> Result<VerificationReport, VerifyError> {
        let gap = self.usable_gap(solve)?;
        let mut violations = Vec::new();

        let main = self.inspect_tree(assignment, TreeVars::Main, &mut violations);
        let backup = self.inspect_tree(assignment, TreeVars::Backup, &mut violations);

        if main.donors.is_empty() {
            violations.push(StructuralViolation::NoDonor { tree: "main" });
        }
        if backup.donors.is_empty() {
            violations.push(StructuralViolation::NoDonor { tree: "backup" });
        }

        for node in self.graph.nodes() {
            let main_donor = assignment.is_active(VarKey::Level(node, 0));
            let backup_donor = assignment.is_active(VarKey::BackupLevel(node, 0));
            let in_main = main.level_counts[node.get()] == 1;
            let in_backup = backup.level_counts[node.get()] == 1;

            if main_donor && backup_donor {
                violations.push(StructuralViolation::DonorSetsOverlap { node: node.get() });
                continue;
            }
            let covered = if main_donor {
                in_main && backup.level_counts[node.get()] == 0
            } else if backup_donor {
                in_backup && main.level_counts[node.get()] == 0
            } else {
                in_main && in_backup
            };
            if !covered {
                violations.push(StructuralViolation::CoverageMismatch { node: node.get() });
            }
        }

        self.check_shared_links(assignment, &mut violations);
        self.check_diameter(assignment, &mut violations);
        self.check_tree_size(TreeVars::Main, &main, &mut violations);
        self.check_tree_size(TreeVars::Backup, &backup, &mut violations);

        let topology = TopologyReconstructor::new(self.graph).reconstruct_dual(assignment);
        Ok(self.finish(
            solve,
            gap,
            main.donors.len() + backup.donors.len(),
            main.max_level.max(backup.max_level),
            violations,
            topology,
        ))
    }

    /// Maps the solver status to a gap, or to a fatal error.
    fn usable_gap(&self, solve: &SolveReport) -> Result<f64, VerifyError> {
        match &solve.status {
            SolverStatus::Optimal => Ok(0.0),
            SolverStatus::Aborted => {
                let gap = solve.gap();
                warn!(gap, "solver stopped early, verifying the incumbent");
                Ok(gap)
            }
            SolverStatus::Infeasible => Err(VerifyError::Infeasible),
            SolverStatus::Other(status) => Err(VerifyError::UnexpectedStatus(status.clone())),
        }
    }

    fn finish(
        &self,
        solve: &SolveReport,
        gap: f64,
        donor_count: usize,
        observed_max_level: usize,
        violations: Vec<StructuralViolation>,
        topology: LabeledTopology,
    ) -> VerificationReport {
        for violation in &violations {
            warn!(violation = %violation, "structural check failed");
        }
        info!(
            donor_count,
            observed_max_level,
            violations = violations.len(),
            status = %solve.status,
            "verification finished"
        );
        VerificationReport {
            status: solve.status.clone(),
            donor_count,
            observed_max_level,
            gap,
            violations,
            topology,
        }
    }

    /// One pass over a tree's level and parent variables.
    ///
    /// Emits the violations that are local to this tree (duplicate level
    /// indicators, incoming degree, edge legality); whether a zero level
    /// tally is a violation depends on the mode, so the caller decides.
    fn inspect_tree(
        &self,
        assignment: &Assignment,
        tree: TreeVars,
        violations: &mut Vec<StructuralViolation>,
    ) -> TreeInspection {
        let n = self.graph.num_nodes();
        let mut donors = Vec::new();
        let mut level_counts = vec![0usize; n];
        let mut max_level = 0;

        for node in self.graph.nodes() {
            let mut active: SmallVec<[usize; 4]> = SmallVec::new();
            for level in 0..=self.params.max_diameter {
                if assignment.is_active(tree.level(node, level)) {
                    active.push(level);
                }
            }
            level_counts[node.get()] = active.len();
            if active.len() > 1 {
                violations.push(StructuralViolation::LevelNotUnique {
                    tree: tree.name(),
                    node: node.get(),
                    active: active.len(),
                });
            }
            if let Some(deepest) = active.last() {
                max_level = max_level.max(*deepest);
            }
            if active.first() == Some(&0) {
                donors.push(node);
            }
        }

        let mut active_edges = Vec::new();
        for to in self.graph.nodes() {
            let mut incoming = 0;
            for from in self.graph.nodes() {
                if assignment.is_active(tree.parent(from, to)) {
                    incoming += 1;
                    active_edges.push((from, to));
                    if !self.graph.has_edge(from, to) {
                        violations.push(StructuralViolation::IllegalEdge {
                            tree: tree.name(),
                            from: from.get(),
                            to: to.get(),
                        });
                    }
                }
            }
            if incoming > 1 {
                violations.push(StructuralViolation::IncomingDegreeExceeded {
                    tree: tree.name(),
                    node: to.get(),
                    incoming,
                });
            }
        }

        TreeInspection {
            donors,
            level_counts,
            active_edges,
            max_level,
        }
    }

    /// Flags active level indicators beyond the diameter bound. The model
    /// never declares them; seeing one means the assignment came from a
    /// different parameterization.
    fn check_diameter(&self, assignment: &Assignment, violations: &mut Vec<StructuralViolation>) {
        for (key, value) in assignment.iter() {
            if *value <= ROUNDING_TOLERANCE {
                continue;
            }
            match key {
                VarKey::Level(node, level) if *level > self.params.max_diameter => {
                    violations.push(StructuralViolation::DiameterExceeded {
                        tree: "main",
                        node: node.get(),
                        level: *level,
                        max: self.params.max_diameter,
                    });
                }
                VarKey::BackupLevel(node, level) if *level > self.params.max_diameter => {
                    violations.push(StructuralViolation::DiameterExceeded {
                        tree: "backup",
                        node: node.get(),
                        level: *level,
                        max: self.params.max_diameter,
                    });
                }
                _ => {}
            }
        }
    }

    /// Dual mode: one physical link may serve at most one tree in one
    /// direction.
    fn check_shared_links(
        &self,
        assignment: &Assignment,
        violations: &mut Vec<StructuralViolation>,
    ) {
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                if i.get() >= j.get() {
                    continue;
                }
                let uses = [
                    VarKey::Parent(i, j),
                    VarKey::Parent(j, i),
                    VarKey::BackupParent(i, j),
                    VarKey::BackupParent(j, i),
                ]
                .into_iter()
                .filter(|key| assignment.is_active(*key))
                .count();
                if uses > 1 {
                    violations.push(StructuralViolation::SharedLink {
                        a: i.get(),
                        b: j.get(),
                    });
                }
            }
        }
    }

    /// Compares weakly-connected components of the active-edge subgraph
    /// against the combinatorial tree-size bound.
    fn check_tree_size(
        &self,
        tree: TreeVars,
        inspection: &TreeInspection,
        violations: &mut Vec<StructuralViolation>,
    ) {
        if !self.params.degree_bound.is_bounded() {
            return;
        }
        let bound = tree::max_tree_size_signed(
            self.params.max_diameter,
            self.params.degree_bound.as_signed(),
        );

        let n = self.graph.num_nodes();
        let mut components: UnionFind<usize> = UnionFind::new(n);
        for (from, to) in &inspection.active_edges {
            components.union(from.get(), to.get());
        }
        let labeling = components.into_labeling();
        let mut sizes = vec![0usize; n];
        for label in labeling {
            sizes[label] += 1;
        }
        for size in sizes {
            if size as u64 > bound {
                violations.push(StructuralViolation::TreeTooLarge {
                    tree: tree.name(),
                    nodes: size,
                    bound,
                });
            }
        }
    }

    fn check_flow(
        &self,
        assignment: &Assignment,
        inspection: &TreeInspection,
        flow: &FlowParams<T>,
        violations: &mut Vec<StructuralViolation>,
    ) {
        let n = self.graph.num_nodes();
        let capacities: Vec<f64> = flow
            .capacities()
            .iter()
            .map(|c| c.to_f64().unwrap_or(f64::NAN))
            .collect();
        let demands: Vec<f64> = flow
            .demands()
            .iter()
            .map(|d| d.to_f64().unwrap_or(f64::NAN))
            .collect();

        let mut is_donor = vec![false; n];
        for donor in &inspection.donors {
            is_donor[donor.get()] = true;
        }

        let mut outflow = vec![0.0f64; n];
        let mut inflow = vec![0.0f64; n];
        let mut destined = vec![0.0f64; n];
        for i in self.graph.nodes() {
            for j in self.graph.nodes() {
                let mut edge_total = 0.0;
                for h in self.graph.nodes() {
                    edge_total += assignment.value(VarKey::Flow(i, j, h));
                }
                outflow[i.get()] += edge_total;
                inflow[j.get()] += edge_total;
                destined[j.get()] += assignment.value(VarKey::Flow(i, j, j));

                if edge_total > ROUNDING_TOLERANCE
                    && !assignment.is_active(VarKey::Parent(i, j))
                {
                    violations.push(StructuralViolation::FlowOnInactiveEdge {
                        from: i.get(),
                        to: j.get(),
                        flow: edge_total,
                    });
                }
            }
        }

        for node in self.graph.nodes() {
            let index = node.get();
            if outflow[index] > capacities[index] + ROUNDING_TOLERANCE {
                violations.push(StructuralViolation::FlowCapacityExceeded {
                    node: index,
                    outflow: outflow[index],
                    capacity: capacities[index],
                });
            }
            if is_donor[index] {
                if inflow[index] > ROUNDING_TOLERANCE {
                    violations.push(StructuralViolation::DonorInflow {
                        node: index,
                        inflow: inflow[index],
                    });
                }
            } else if destined[index] < demands[index] - ROUNDING_TOLERANCE {
                violations.push(StructuralViolation::DemandUnmet {
                    node: index,
                    delivered: destined[index],
                    demand: demands[index],
                });
            }
        }

        // Net donor injection must cover the total non-donor demand, with
        // tolerance slack proportional to the donor count.
        let generated: f64 = inspection
            .donors
            .iter()
            .map(|donor| outflow[donor.get()] - inflow[donor.get()])
            .sum();
        let required: f64 = self
            .graph
            .nodes()
            .filter(|node| !is_donor[node.get()])
            .map(|node| demands[node.get()])
            .sum();
        if generated < required - ROUNDING_TOLERANCE * inspection.donors.len() as f64 {
            violations.push(StructuralViolation::FlowGenerationShortfall {
                generated,
                required,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_model::params::DegreeBound;

    fn ni(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    /// Routes verifier logs into the captured test output.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn ring(n: usize) -> ConnectivityGraph<i64> {
        let mut graph = ConnectivityGraph::new(n);
        for i in 0..n {
            graph.add_link(ni(i), ni((i + 1) % n));
        }
        graph
    }

    /// Chain 0 -> 1 -> 2 -> 3 on the 4-ring.
    fn chain_assignment() -> Assignment {
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        for i in 1..4 {
            assignment.set(VarKey::Level(ni(i), i), 1.0);
            assignment.set(VarKey::Parent(ni(i - 1), ni(i)), 1.0);
        }
        assignment
    }

    fn chain_params() -> TopologyParams {
        TopologyParams::new(3, DegreeBound::Constant(1))
    }

    #[test]
    fn test_single_donor_chain_passes() {
        init_tracing();
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let report = verifier
            .verify_single_tree(&chain_assignment(), &SolveReport::optimal(1.0))
            .unwrap();

        assert!(report.passed(), "violations: {:?}", report.violations);
        assert_eq!(report.donor_count, 1);
        assert_eq!(report.observed_max_level, 3);
        assert_eq!(report.gap, 0.0);
        assert!(!report.indicates_model_bug());
    }

    #[test]
    fn test_infeasible_is_fatal() {
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let solve = SolveReport {
            status: SolverStatus::Infeasible,
            lower_bound: None,
            upper_bound: None,
        };
        let result = verifier.verify_single_tree(&Assignment::new(), &solve);
        assert_eq!(result.unwrap_err(), VerifyError::Infeasible);
    }

    #[test]
    fn test_unexpected_status_is_fatal() {
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let solve = SolveReport {
            status: SolverStatus::Other("node limit".into()),
            lower_bound: None,
            upper_bound: None,
        };
        let result = verifier.verify_single_tree(&chain_assignment(), &solve);
        assert_eq!(
            result.unwrap_err(),
            VerifyError::UnexpectedStatus("node limit".into())
        );
    }

    #[test]
    fn test_aborted_run_is_verified_with_gap() {
        init_tracing();
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let solve = SolveReport {
            status: SolverStatus::Aborted,
            lower_bound: Some(1.0),
            upper_bound: Some(2.0),
        };
        let report = verifier
            .verify_single_tree(&chain_assignment(), &solve)
            .unwrap();

        assert_eq!(report.gap, 0.5);
        assert!(report.structurally_sound());
        // Not proven optimal, so the overall verdict stays soft.
        assert!(!report.passed());
    }

    #[test]
    fn test_duplicate_level_and_missing_level_are_flagged() {
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let mut assignment = chain_assignment();
        // Node 1 now sits at two levels; node 3 at none.
        assignment.set(VarKey::Level(ni(1), 2), 1.0);
        assignment.set(VarKey::Level(ni(3), 3), 0.0);

        let report = verifier
            .verify_single_tree(&assignment, &SolveReport::optimal(1.0))
            .unwrap();
        assert!(report.violations.contains(&StructuralViolation::LevelNotUnique {
            tree: "main",
            node: 1,
            active: 2
        }));
        assert!(report.violations.contains(&StructuralViolation::LevelNotUnique {
            tree: "main",
            node: 3,
            active: 0
        }));
        assert!(report.indicates_model_bug());
    }

    #[test]
    fn test_missing_donor_and_incoming_degree() {
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let mut assignment = Assignment::new();
        for i in 0..4 {
            assignment.set(VarKey::Level(ni(i), 1), 1.0);
        }
        // Node 2 fed from both sides.
        assignment.set(VarKey::Parent(ni(1), ni(2)), 1.0);
        assignment.set(VarKey::Parent(ni(3), ni(2)), 1.0);

        let report = verifier
            .verify_single_tree(&assignment, &SolveReport::optimal(0.0))
            .unwrap();
        assert!(report
            .violations
            .contains(&StructuralViolation::NoDonor { tree: "main" }));
        assert!(report
            .violations
            .contains(&StructuralViolation::IncomingDegreeExceeded {
                tree: "main",
                node: 2,
                incoming: 2
            }));
    }

    #[test]
    fn test_illegal_edge_is_flagged() {
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let mut assignment = chain_assignment();
        // 0 -> 2 is a chord the ring does not have.
        assignment.set(VarKey::Parent(ni(0), ni(2)), 1.0);

        let report = verifier
            .verify_single_tree(&assignment, &SolveReport::optimal(1.0))
            .unwrap();
        assert!(report.violations.contains(&StructuralViolation::IllegalEdge {
            tree: "main",
            from: 0,
            to: 2
        }));
    }

    #[test]
    fn test_tree_size_bound_is_enforced() {
        // Five chained nodes against the 4-node bound of D=3, deg<=1.
        let graph = ring(5);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        for i in 1..5 {
            assignment.set(VarKey::Level(ni(i), i.min(3)), 1.0);
            assignment.set(VarKey::Parent(ni(i - 1), ni(i)), 1.0);
        }

        let report = verifier
            .verify_single_tree(&assignment, &SolveReport::optimal(1.0))
            .unwrap();
        assert!(report.violations.contains(&StructuralViolation::TreeTooLarge {
            tree: "main",
            nodes: 5,
            bound: 4
        }));
    }

    #[test]
    fn test_flow_capacity_and_gating() {
        let graph = ring(3);
        let params = TopologyParams::new(2, DegreeBound::Unbounded);
        let verifier =
            SolutionVerifier::new(&graph, params).with_flow(FlowParams::with_defaults(3));

        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::Level(ni(1), 1), 1.0);
        assignment.set(VarKey::Level(ni(2), 1), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 1.0);
        // 11 units over a capacity-10 node, and flow on the unselected
        // edge 0 -> 2.
        assignment.set(VarKey::Flow(ni(0), ni(1), ni(1)), 11.0);
        assignment.set(VarKey::Flow(ni(0), ni(2), ni(2)), 1.0);

        let report = verifier
            .verify_single_tree(&assignment, &SolveReport::optimal(1.0))
            .unwrap();
        assert!(report.violations.iter().any(|v| matches!(
            v,
            StructuralViolation::FlowCapacityExceeded { node: 0, .. }
        )));
        assert!(report.violations.iter().any(|v| matches!(
            v,
            StructuralViolation::FlowOnInactiveEdge { from: 0, to: 2, .. }
        )));
    }

    #[test]
    fn test_flow_demand_and_donor_inflow() {
        let graph = ring(3);
        let params = TopologyParams::new(2, DegreeBound::Unbounded);
        let verifier =
            SolutionVerifier::new(&graph, params).with_flow(FlowParams::with_defaults(3));

        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::Level(ni(1), 1), 1.0);
        assignment.set(VarKey::Level(ni(2), 1), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 1.0);
        assignment.set(VarKey::Parent(ni(2), ni(0)), 1.0);
        // Node 1 is fed, node 2 is not, and the donor receives flow.
        assignment.set(VarKey::Flow(ni(0), ni(1), ni(1)), 1.0);
        assignment.set(VarKey::Flow(ni(2), ni(0), ni(0)), 1.0);

        let report = verifier
            .verify_single_tree(&assignment, &SolveReport::optimal(1.0))
            .unwrap();
        assert!(report.violations.iter().any(|v| matches!(
            v,
            StructuralViolation::DemandUnmet { node: 2, .. }
        )));
        assert!(report
            .violations
            .iter()
            .any(|v| matches!(v, StructuralViolation::DonorInflow { node: 0, .. })));
    }

    #[test]
    fn test_flow_generation_shortfall() {
        let graph = ring(3);
        let params = TopologyParams::new(2, DegreeBound::Unbounded);
        let verifier =
            SolutionVerifier::new(&graph, params).with_flow(FlowParams::with_defaults(3));

        // Donor injects nothing at all.
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::Level(ni(1), 1), 1.0);
        assignment.set(VarKey::Level(ni(2), 1), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(2)), 1.0);

        let report = verifier
            .verify_single_tree(&assignment, &SolveReport::optimal(1.0))
            .unwrap();
        assert!(report.violations.iter().any(|v| matches!(
            v,
            StructuralViolation::FlowGenerationShortfall { .. }
        )));
    }

    /// Two disjoint chains on the 4-ring: main 0 -> 1, backup 2 -> 3,
    /// with each non-donor in both trees.
    fn dual_assignment() -> Assignment {
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::BackupLevel(ni(2), 0), 1.0);
        // Non-donors 1 and 3 belong to both trees.
        assignment.set(VarKey::Level(ni(1), 1), 1.0);
        assignment.set(VarKey::BackupLevel(ni(1), 1), 1.0);
        assignment.set(VarKey::Level(ni(3), 1), 1.0);
        assignment.set(VarKey::BackupLevel(ni(3), 1), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(3)), 1.0);
        assignment.set(VarKey::BackupParent(ni(2), ni(1)), 1.0);
        assignment.set(VarKey::BackupParent(ni(2), ni(3)), 1.0);
        assignment
    }

    #[test]
    fn test_dual_tree_passes() {
        let graph = ring(4);
        let params = TopologyParams::new(2, DegreeBound::Constant(2));
        let verifier = SolutionVerifier::new(&graph, params);
        let report = verifier
            .verify_dual_tree(&dual_assignment(), &SolveReport::optimal(2.0))
            .unwrap();

        assert!(report.passed(), "violations: {:?}", report.violations);
        assert_eq!(report.donor_count, 2);
        assert_eq!(report.observed_max_level, 1);
    }

    #[test]
    fn test_dual_donor_overlap_is_flagged() {
        let graph = ring(4);
        let params = TopologyParams::new(2, DegreeBound::Constant(2));
        let verifier = SolutionVerifier::new(&graph, params);
        let mut assignment = dual_assignment();
        // Node 0 becomes a donor of both trees.
        assignment.set(VarKey::BackupLevel(ni(0), 0), 1.0);

        let report = verifier
            .verify_dual_tree(&assignment, &SolveReport::optimal(3.0))
            .unwrap();
        assert!(report
            .violations
            .contains(&StructuralViolation::DonorSetsOverlap { node: 0 }));
    }

    #[test]
    fn test_dual_coverage_mismatch_is_flagged() {
        let graph = ring(4);
        let params = TopologyParams::new(2, DegreeBound::Constant(2));
        let verifier = SolutionVerifier::new(&graph, params);
        let mut assignment = dual_assignment();
        // Node 3 drops out of the backup tree.
        assignment.set(VarKey::BackupLevel(ni(3), 1), 0.0);
        assignment.set(VarKey::BackupParent(ni(2), ni(3)), 0.0);

        let report = verifier
            .verify_dual_tree(&assignment, &SolveReport::optimal(2.0))
            .unwrap();
        assert!(report
            .violations
            .contains(&StructuralViolation::CoverageMismatch { node: 3 }));
    }

    #[test]
    fn test_dual_shared_link_is_flagged() {
        let graph = ring(4);
        let params = TopologyParams::new(2, DegreeBound::Constant(2));
        let verifier = SolutionVerifier::new(&graph, params);
        let mut assignment = dual_assignment();
        // The backup tree grabs the link the main tree already uses.
        assignment.set(VarKey::BackupParent(ni(1), ni(0)), 1.0);

        let report = verifier
            .verify_dual_tree(&assignment, &SolveReport::optimal(2.0))
            .unwrap();
        assert!(report
            .violations
            .contains(&StructuralViolation::SharedLink { a: 0, b: 1 }));
        // The shared link is a separation breach, not an edge-existence
        // one; both directions of the link do exist in the graph.
        assert!(!report
            .violations
            .iter()
            .any(|v| matches!(v, StructuralViolation::IllegalEdge { .. })));
    }

    #[test]
    #[should_panic(expected = "use `verify_dual_tree`")]
    fn test_single_tree_verifier_rejects_dual_assignment() {
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let mut assignment = chain_assignment();
        assignment.set(VarKey::BackupLevel(ni(0), 0), 1.0);

        let _ = verifier.verify_single_tree(&assignment, &SolveReport::optimal(1.0));
    }

    #[test]
    fn test_diameter_bound_is_enforced() {
        let graph = ring(4);
        let verifier = SolutionVerifier::new(&graph, chain_params());
        let mut assignment = chain_assignment();
        assignment.set(VarKey::Level(ni(3), 7), 1.0);

        let report = verifier
            .verify_single_tree(&assignment, &SolveReport::optimal(1.0))
            .unwrap();
        assert!(report.violations.contains(&StructuralViolation::DiameterExceeded {
            tree: "main",
            node: 3,
            level: 7,
            max: 3
        }));
    }
}
