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

//! Declarative linear constraint model.
//!
//! The model is plain data: variable declarations, linear constraints and a
//! minimized objective. No solving happens here — a solver backend consumes
//! the model through the contract in `canopy-solver` and hands back an
//! `Assignment`.

use crate::variable::{VarDomain, VarKey};

/// A linear expression: a sum of coefficient × variable terms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(f64, VarKey)>,
}

impl LinearExpr {
    /// Creates an empty expression.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `coefficient * variable` to the expression (chaining form).
    #[inline]
    pub fn term(mut self, coefficient: f64, variable: VarKey) -> Self {
        self.terms.push((coefficient, variable));
        self
    }

    /// Adds `coefficient * variable` to the expression in place.
    #[inline]
    pub fn push(&mut self, coefficient: f64, variable: VarKey) -> &mut Self {
        self.terms.push((coefficient, variable));
        self
    }

    /// Returns the terms of this expression.
    #[inline]
    pub fn terms(&self) -> &[(f64, VarKey)] {
        &self.terms
    }

    /// Evaluates the expression against an assignment.
    pub fn evaluate(&self, assignment: &crate::variable::Assignment) -> f64 {
        self.terms
            .iter()
            .map(|(c, k)| c * assignment.value(*k))
            .sum()
    }
}

impl std::fmt::Display for LinearExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (index, (coefficient, variable)) in self.terms.iter().enumerate() {
            if index > 0 {
                write!(f, " + ")?;
            }
            if (*coefficient - 1.0).abs() < f64::EPSILON {
                write!(f, "{}", variable)?;
            } else {
                write!(f, "{}*{}", coefficient, variable)?;
            }
        }
        Ok(())
    }
}

/// The relation between a constraint's expression and its right-hand side.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Comparison {
    LessOrEqual,
    GreaterOrEqual,
    Equal,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparison::LessOrEqual => write!(f, "<="),
            Comparison::GreaterOrEqual => write!(f, ">="),
            Comparison::Equal => write!(f, "=="),
        }
    }
}

/// A single linear constraint: `expr cmp rhs`.
///
/// The label names the constraint family ("single_level",
/// "incremental_distance", ...) for diagnostics and model dumps.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    pub label: &'static str,
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl LinearConstraint {
    #[inline]
    pub fn new(label: &'static str, expr: LinearExpr, cmp: Comparison, rhs: f64) -> Self {
        Self {
            label,
            expr,
            cmp,
            rhs,
        }
    }
}

impl std::fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} {} {}", self.label, self.expr, self.cmp, self.rhs)
    }
}

/// The full constraint model handed to a solver backend.
///
/// Built once per run from an immutable input graph, consumed by the
/// backend and discarded once the assignment has been extracted.
#[derive(Clone, Debug, Default)]
pub struct ConstraintModel {
    variables: Vec<(VarKey, VarDomain)>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl ConstraintModel {
    /// Creates an empty model.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable.
    #[inline]
    pub fn declare(&mut self, key: VarKey, domain: VarDomain) -> &mut Self {
        self.variables.push((key, domain));
        self
    }

    /// Appends a constraint.
    #[inline]
    pub fn constrain(&mut self, constraint: LinearConstraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    /// Sets the minimized objective expression.
    #[inline]
    pub fn minimize(&mut self, objective: LinearExpr) -> &mut Self {
        self.objective = objective;
        self
    }

    /// Returns all declared variables.
    #[inline]
    pub fn variables(&self) -> &[(VarKey, VarDomain)] {
        &self.variables
    }

    /// Returns all constraints.
    #[inline]
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Returns the minimized objective.
    #[inline]
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Returns the number of declared variables.
    #[inline]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Returns the number of constraints.
    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

impl std::fmt::Display for ConstraintModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConstraintModel(variables: {}, constraints: {})",
            self.num_variables(),
            self.num_constraints()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::NodeIndex;
    use crate::variable::Assignment;

    fn ni(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn test_expression_display() {
        let expr = LinearExpr::new()
            .term(1.0, VarKey::Level(ni(0), 0))
            .term(-2.0, VarKey::Parent(ni(0), ni(1)));
        assert_eq!(format!("{}", expr), "u[0,0] + -2*p[0,1]");
        assert_eq!(format!("{}", LinearExpr::new()), "0");
    }

    #[test]
    fn test_expression_evaluation() {
        let mut assignment = Assignment::new();
        assignment.set(VarKey::Level(ni(0), 0), 1.0);
        assignment.set(VarKey::Parent(ni(0), ni(1)), 0.5);

        let expr = LinearExpr::new()
            .term(3.0, VarKey::Level(ni(0), 0))
            .term(2.0, VarKey::Parent(ni(0), ni(1)))
            .term(1.0, VarKey::Level(ni(1), 1)); // missing, reads 0
        assert_eq!(expr.evaluate(&assignment), 4.0);
    }

    #[test]
    fn test_constraint_display() {
        let constraint = LinearConstraint::new(
            "antiparallel",
            LinearExpr::new()
                .term(1.0, VarKey::Parent(ni(0), ni(1)))
                .term(1.0, VarKey::Parent(ni(1), ni(0))),
            Comparison::LessOrEqual,
            1.0,
        );
        assert_eq!(
            format!("{}", constraint),
            "antiparallel: p[0,1] + p[1,0] <= 1"
        );
    }

    #[test]
    fn test_model_accounting() {
        let mut model = ConstraintModel::new();
        model.declare(VarKey::Level(ni(0), 0), VarDomain::Binary);
        model.declare(VarKey::Flow(ni(0), ni(1), ni(1)), VarDomain::NonNegativeInteger);
        model.constrain(LinearConstraint::new(
            "donor_count",
            LinearExpr::new().term(1.0, VarKey::Level(ni(0), 0)),
            Comparison::Equal,
            1.0,
        ));
        model.minimize(LinearExpr::new().term(1.0, VarKey::Level(ni(0), 0)));

        assert_eq!(model.num_variables(), 2);
        assert_eq!(model.num_constraints(), 1);
        assert_eq!(model.objective().terms().len(), 1);
        assert_eq!(
            format!("{}", model),
            "ConstraintModel(variables: 2, constraints: 1)"
        );
    }
}
