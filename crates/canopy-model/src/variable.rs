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

//! The variable schema shared by the model builder, the solver contract and
//! the verifier.
//!
//! Every decision variable is addressed by a typed [`VarKey`]; a solved
//! [`Assignment`] maps keys to solver-reported floats. The assignment is
//! read-only float data with rounding noise near 0/1, so callers go through
//! the tolerance predicates instead of comparing to 0 or 1.

use crate::index::NodeIndex;
use canopy_core::num::rounding;
use rustc_hash::FxHashMap;

/// Identifies a single decision variable of the topology model.
///
/// The names mirror the algebraic formulation: `u[i,l]` level indicators,
/// `p[i,j]` parent-edge selectors, `ub`/`pb` their backup-tree analogues,
/// and `f[i,j,h]` flow on edge (i, j) destined for node h.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum VarKey {
    /// `u[i,l]`: node `i` sits at hop-distance `l` from its tree's root.
    Level(NodeIndex, usize),
    /// `p[i,j]`: the directed edge `i -> j` is an active parent link.
    Parent(NodeIndex, NodeIndex),
    /// `ub[i,l]`: backup-tree level indicator.
    BackupLevel(NodeIndex, usize),
    /// `pb[i,j]`: backup-tree parent link.
    BackupParent(NodeIndex, NodeIndex),
    /// `f[i,j,h]`: flow units on edge `i -> j` destined for node `h`.
    Flow(NodeIndex, NodeIndex, NodeIndex),
}

impl std::fmt::Display for VarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarKey::Level(i, l) => write!(f, "u[{},{}]", i.get(), l),
            VarKey::Parent(i, j) => write!(f, "p[{},{}]", i.get(), j.get()),
            VarKey::BackupLevel(i, l) => write!(f, "ub[{},{}]", i.get(), l),
            VarKey::BackupParent(i, j) => write!(f, "pb[{},{}]", i.get(), j.get()),
            VarKey::Flow(i, j, h) => write!(f, "f[{},{},{}]", i.get(), j.get(), h.get()),
        }
    }
}

/// The domain a declared variable ranges over.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VarDomain {
    /// {0, 1}.
    Binary,
    /// Non-negative integers.
    NonNegativeInteger,
}

/// A solved variable-value assignment, as returned by a solver backend.
///
/// Missing keys read as 0.0: solvers routinely omit variables stuck at
/// their lower bound.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    values: FxHashMap<VarKey, f64>,
}

impl Assignment {
    /// Creates an empty assignment.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of a variable.
    #[inline]
    pub fn set(&mut self, key: VarKey, value: f64) -> &mut Self {
        self.values.insert(key, value);
        self
    }

    /// Returns the value of a variable, defaulting to 0.0.
    #[inline]
    pub fn value(&self, key: VarKey) -> f64 {
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    /// Tolerance predicate used by verification: strictly above ε counts.
    #[inline]
    pub fn is_active(&self, key: VarKey) -> bool {
        rounding::is_active(self.value(key))
    }

    /// Threshold predicate used by reconstruction: 0.5 and above counts.
    #[inline]
    pub fn is_selected(&self, key: VarKey) -> bool {
        rounding::is_selected(self.value(key))
    }

    /// Returns `true` if the assignment carries any flow variables, i.e.
    /// the model was built with the flow extension.
    pub fn has_flow(&self) -> bool {
        self.values.keys().any(|k| matches!(k, VarKey::Flow(..)))
    }

    /// Returns `true` if the assignment carries any backup-tree variables.
    pub fn has_backup_tree(&self) -> bool {
        self.values
            .keys()
            .any(|k| matches!(k, VarKey::BackupLevel(..) | VarKey::BackupParent(..)))
    }

    /// Number of stored variable values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no variable value is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over all stored (key, value) pairs.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&VarKey, &f64)> {
        self.values.iter()
    }
}

impl FromIterator<(VarKey, f64)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (VarKey, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ni(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn test_var_key_display() {
        assert_eq!(format!("{}", VarKey::Level(ni(3), 0)), "u[3,0]");
        assert_eq!(format!("{}", VarKey::Parent(ni(1), ni(2))), "p[1,2]");
        assert_eq!(format!("{}", VarKey::BackupLevel(ni(0), 2)), "ub[0,2]");
        assert_eq!(format!("{}", VarKey::BackupParent(ni(2), ni(0))), "pb[2,0]");
        assert_eq!(format!("{}", VarKey::Flow(ni(0), ni(1), ni(2))), "f[0,1,2]");
    }

    #[test]
    fn test_missing_keys_read_as_zero() {
        let assignment = Assignment::new();
        assert_eq!(assignment.value(VarKey::Level(ni(0), 0)), 0.0);
        assert!(!assignment.is_active(VarKey::Level(ni(0), 0)));
    }

    #[test]
    fn test_tolerance_predicates() {
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 0.0005);
        assignment.set(VarKey::Level(ni(1), 1), 0.5);
        assignment.set(VarKey::Level(ni(2), 1), 0.9999);

        // Exactly at the tolerance: not set for verification.
        assert!(!assignment.is_active(VarKey::Level(ni(0), 0)));
        // Exactly at the reconstruction threshold: selected.
        assert!(assignment.is_selected(VarKey::Level(ni(1), 1)));
        assert!(!assignment.is_selected(VarKey::Level(ni(0), 0)));
        assert!(assignment.is_active(VarKey::Level(ni(2), 1)));
    }

    #[test]
    fn test_extension_detection() {
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assert!(!assignment.has_flow());
        assert!(!assignment.has_backup_tree());

        assignment.set(VarKey::Flow(ni(0), ni(1), ni(1)), 1.0);
        assert!(assignment.has_flow());

        assignment.set(VarKey::BackupLevel(ni(1), 0), 1.0);
        assert!(assignment.has_backup_tree());
    }

    #[test]
    fn test_from_iterator() {
        let assignment: Assignment = [(VarKey::Level(ni(0), 0), 1.0)].into_iter().collect();
        assert_eq!(assignment.len(), 1);
        assert!(assignment.is_active(VarKey::Level(ni(0), 0)));
    }
}
