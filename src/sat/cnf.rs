#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The parsed input formula.
//!
//! `Cnf` is the immutable clause list handed to the solver. The search never
//! edits it; the mutable, undoable view lives in [`crate::sat::formula`].

use crate::sat::clause::Clause;
use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::Solutions;
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    clauses: Vec<Clause>,
    /// One past the largest variable index, so per-variable tables can be
    /// indexed directly by variable.
    num_vars: usize,
}

impl Cnf {
    pub fn new<I, C>(clauses: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = i32>,
    {
        let clauses = clauses
            .into_iter()
            .map(|c| c.into_iter().map(Literal::from).collect::<Clause>())
            .collect_vec();

        let num_vars = clauses
            .iter()
            .flat_map(|c| c.original().iter())
            .map(|l| l.variable() as usize)
            .max()
            .unwrap_or(0)
            + 1;

        Self { clauses, num_vars }
    }

    /// One past the largest variable that occurs in any clause.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Every variable that occurs in some clause, in first-seen order.
    #[must_use]
    pub fn variables(&self) -> Vec<Variable> {
        self.clauses
            .iter()
            .flat_map(|c| c.original().iter().map(|l| l.variable()))
            .unique()
            .collect()
    }

    /// Total number of literal occurrences.
    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(|c| c.original().len()).sum()
    }

    /// Checks that `solutions` makes at least one literal of every clause
    /// true. Variables missing from the model count as false literals.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.clauses.iter().all(|clause| {
            clause
                .original()
                .iter()
                .any(|lit| solutions.value(lit.variable()) == Some(lit.polarity()))
        })
    }
}

impl<C: IntoIterator<Item = i32>> FromIterator<C> for Cnf {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Vec<i32>>> for Cnf {
    fn from(clauses: Vec<Vec<i32>>) -> Self {
        Self::new(clauses)
    }
}

/// DIMACS rendering: a `p cnf` header followed by one `0`-terminated clause
/// per line.
impl fmt::Display for Cnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "p cnf {} {}",
            self.num_vars.saturating_sub(1),
            self.clauses.len()
        )?;
        for clause in &self.clauses {
            for lit in clause.original() {
                write!(f, "{lit} ")?;
            }
            writeln!(f, "0")?;
        }
        Ok(())
    }
}
