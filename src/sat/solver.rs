#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! What a finished solve hands back: the model and the search counters.

use crate::sat::assignment::Assignment;
use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::fmt;

/// A satisfying assignment, total over the variables of the input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solutions(FxHashMap<Variable, bool>);

impl Solutions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the model from the search assignment. Variables in `variables`
    /// that the search never had to fix default to `false`.
    #[must_use]
    pub fn complete(assignment: &Assignment, variables: &[Variable]) -> Self {
        let mut map: FxHashMap<Variable, bool> = assignment.iter().collect();
        for &var in variables {
            map.entry(var).or_insert(false);
        }
        Self(map)
    }

    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self.0.get(&var).copied()
    }

    /// `true` iff the DIMACS literal `lit` is true in this model.
    #[must_use]
    pub fn check(&self, lit: i32) -> bool {
        let lit = Literal::from(lit);
        self.value(lit.variable()) == Some(lit.polarity())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(variable, value)` pairs in ascending variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, bool)> + '_ {
        self.0
            .iter()
            .map(|(&v, &b)| (v, b))
            .sorted_unstable_by_key(|&(v, _)| v)
    }

    /// The model as signed DIMACS literals, ascending by variable.
    #[must_use]
    pub fn literals(&self) -> Vec<i32> {
        self.iter()
            .map(|(v, b)| Literal::new(v, b).to_i32())
            .collect()
    }
}

impl FromIterator<(Variable, bool)> for Solutions {
    fn from_iter<T: IntoIterator<Item = (Variable, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Solutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literals().iter().join(" "))
    }
}

/// Counters collected during one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    /// Decision points, i.e. variables split on. Each one accounts for one
    /// pair of attempted sub-searches.
    pub decisions: usize,
    /// Variables fixed by unit propagation.
    pub propagations: usize,
    /// Variables fixed by pure literal elimination.
    pub pure_literals: usize,
    /// Branches refuted by an empty clause.
    pub conflicts: usize,
    /// Deepest decision level reached.
    pub max_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_fills_missing_with_false() {
        let mut a = Assignment::new(5);
        a.assign(Literal::from(2));
        let s = Solutions::complete(&a, &[1, 2, 4]);

        assert_eq!(s.len(), 3);
        assert_eq!(s.value(1), Some(false));
        assert_eq!(s.value(2), Some(true));
        assert_eq!(s.value(4), Some(false));
        assert_eq!(s.value(3), None);
    }

    #[test]
    fn test_check_and_display() {
        let s: Solutions = [(3, true), (1, false), (2, true)].into_iter().collect();
        assert!(s.check(3));
        assert!(s.check(-1));
        assert!(!s.check(1));
        assert!(!s.check(9));
        assert_eq!(s.literals(), vec![-1, 2, 3]);
        assert_eq!(s.to_string(), "-1 2 3");
    }
}
