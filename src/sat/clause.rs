#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clauses with an undoable "active" prefix.
//!
//! A clause keeps every literal it was built with. The first `active`
//! literals are the ones still present in the simplified formula; literals
//! resolved away are swapped behind that prefix. Because removals happen
//! strictly at the end of the prefix, they can be undone in reverse order
//! by growing the prefix back.

use crate::sat::literal::Literal;
use core::ops::Index;
use itertools::Itertools;
use smallvec::SmallVec;

/// Inline capacity for clause literals. Sudoku encodings are dominated by
/// binary clauses and `n`-ary cell clauses, so most clauses stay inline.
pub type LiteralStorage = SmallVec<[Literal; 8]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    literals: LiteralStorage,
    active: usize,
}

impl Clause {
    /// Builds a clause from DIMACS literals. Repeated literals are collapsed.
    #[must_use]
    pub fn new(literals: Vec<i32>) -> Self {
        literals.into_iter().map(Literal::from).collect()
    }

    /// Number of active literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.active == 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Iterates over the active literals.
    pub fn iter(&self) -> impl Iterator<Item = &Literal> + Clone {
        self.literals[..self.active].iter()
    }

    /// Every literal the clause was built with, including resolved ones.
    #[must_use]
    pub fn original(&self) -> &[Literal] {
        &self.literals
    }

    #[must_use]
    pub fn contains(&self, lit: Literal) -> bool {
        self.iter().any(|&l| l == lit)
    }

    /// `true` if the clause holds some literal together with its negation.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.iter()
            .tuple_combinations()
            .any(|(a, b)| a.is_complement_of(*b))
    }

    /// Removes `lit` from the active prefix. Returns `false` if it was not
    /// active.
    pub fn resolve(&mut self, lit: Literal) -> bool {
        let Some(pos) = self.iter().position(|&l| l == lit) else {
            return false;
        };
        self.active -= 1;
        self.literals.swap(pos, self.active);
        true
    }

    /// Undoes the most recent [`Clause::resolve`], returning the literal that
    /// became active again.
    ///
    /// # Panics
    ///
    /// Panics if no literal has been resolved away.
    pub fn restore(&mut self) -> Literal {
        assert!(
            self.active < self.literals.len(),
            "restore called on a clause with nothing resolved"
        );
        self.active += 1;
        self.literals[self.active - 1]
    }

    /// Converts the original literals back to DIMACS integers.
    #[must_use]
    pub fn to_i32s(&self) -> Vec<i32> {
        self.literals.iter().map(|l| l.to_i32()).collect()
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[..self.active][index]
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        let literals: LiteralStorage = iter.into_iter().unique().collect();
        let active = literals.len();
        Self { literals, active }
    }
}

impl From<Vec<i32>> for Clause {
    fn from(literals: Vec<i32>) -> Self {
        Self::new(literals)
    }
}

impl From<&[i32]> for Clause {
    fn from(literals: &[i32]) -> Self {
        literals.iter().copied().map(Literal::from).collect()
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(literals: Vec<Literal>) -> Self {
        literals.into_iter().collect()
    }
}
