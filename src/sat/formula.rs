#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The formula store: unresolved clauses, the remaining-variable set and the
//! current assignment, all behind one undo log.
//!
//! The store is a single arena that the whole search mutates in place.
//! Satisfied clauses are flagged rather than removed, resolved literals are
//! swapped out of the clause's active prefix, and every such edit is pushed
//! on the [`Trail`]. Rolling back to a [`Checkpoint`] replays the edits in
//! reverse, which restores the clause set, the order of the remaining set
//! and the assignment exactly as they were. A branch that fails therefore
//! leaves no residue, the same as if it had worked on a private copy.

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::error::{Result, SolveError};
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::{Checkpoint, Edit, Trail};
use bit_vec::BitVec;

/// How a variable occurs across the active literals of live clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purity {
    /// No active occurrence at all.
    Absent,
    /// Only positive occurrences.
    Positive,
    /// Only negative occurrences.
    Negative,
    /// At least one occurrence of each polarity.
    Mixed,
}

/// Unassigned variables, as an indexed set with O(1) removal.
///
/// Removal moves the last element into the freed slot. Undoing removals in
/// reverse order with [`Remaining::restore`] gives back the exact former
/// order, so heuristics that depend on it stay deterministic across
/// backtracking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Remaining {
    vars: Vec<Variable>,
    slots: Vec<Option<usize>>,
}

impl Remaining {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            vars: Vec::new(),
            slots: vec![None; num_vars],
        }
    }

    /// Appends `var` unless it is already present.
    pub fn insert(&mut self, var: Variable) {
        let idx = var as usize;
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, None);
        }
        if self.slots[idx].is_none() {
            self.slots[idx] = Some(self.vars.len());
            self.vars.push(var);
        }
    }

    /// Removes `var`, returning the slot it occupied.
    pub fn remove(&mut self, var: Variable) -> Option<usize> {
        let slot = self.slots.get_mut(var as usize)?.take()?;
        let last = self.vars.pop()?;
        if slot < self.vars.len() {
            self.vars[slot] = last;
            self.slots[last as usize] = Some(slot);
        }
        Some(slot)
    }

    /// Puts `var` back into `slot`. Must mirror the most recent removal.
    pub fn restore(&mut self, var: Variable, slot: usize) {
        debug_assert!(!self.contains(var), "restoring a variable still present");
        if slot < self.vars.len() {
            let displaced = self.vars[slot];
            self.slots[displaced as usize] = Some(self.vars.len());
            self.vars.push(displaced);
            self.vars[slot] = var;
        } else {
            self.vars.push(var);
        }
        self.slots[var as usize] = Some(slot);
    }

    #[must_use]
    pub fn contains(&self, var: Variable) -> bool {
        self.slots.get(var as usize).is_some_and(Option::is_some)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The most recently inserted variable still present.
    #[must_use]
    pub fn last(&self) -> Option<Variable> {
        self.vars.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Variable> + '_ {
        self.vars.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Variable] {
        &self.vars
    }
}

#[derive(Debug, Clone)]
pub struct Formula {
    clauses: Vec<Clause>,
    satisfied: BitVec,
    /// Clause indices per literal index, built once from the input.
    occurrences: Vec<Vec<usize>>,
    /// Active occurrences per literal index over live clauses.
    counts: Vec<usize>,
    live: usize,
    empty: usize,
    variables: Vec<Variable>,
    remaining: Remaining,
    assignment: Assignment,
    trail: Trail,
    /// Clauses that may have become unit. Entries can be stale.
    pending_units: Vec<usize>,
}

impl Formula {
    /// Loads `cnf`. Tautological clauses are dropped, but their variables
    /// are still recorded so that a model covers them.
    #[must_use]
    pub fn new(cnf: &Cnf) -> Self {
        let num_vars = cnf.num_vars().max(1);
        let mut remaining = Remaining::new(num_vars);
        let mut variables = Vec::new();
        let mut clauses = Vec::with_capacity(cnf.len());
        let mut occurrences = vec![Vec::new(); num_vars * 2];
        let mut counts = vec![0; num_vars * 2];
        let mut pending_units = Vec::new();
        let mut empty = 0;

        for clause in cnf.iter() {
            for lit in clause.original() {
                if !remaining.contains(lit.variable()) {
                    variables.push(lit.variable());
                    remaining.insert(lit.variable());
                }
            }

            if clause.is_tautology() {
                continue;
            }

            let idx = clauses.len();
            for lit in clause.iter() {
                occurrences[lit.index()].push(idx);
                counts[lit.index()] += 1;
            }
            match clause.len() {
                0 => empty += 1,
                1 => pending_units.push(idx),
                _ => {}
            }
            clauses.push(clause.clone());
        }

        Self {
            satisfied: BitVec::from_elem(clauses.len(), false),
            live: clauses.len(),
            clauses,
            occurrences,
            counts,
            empty,
            variables,
            remaining,
            assignment: Assignment::new(num_vars),
            trail: Trail::new(),
            pending_units,
        }
    }

    /// `true` iff no clause is left: the current assignment satisfies the
    /// formula.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// `true` iff some live clause has no active literal left.
    #[must_use]
    pub const fn has_empty_clause(&self) -> bool {
        self.empty > 0
    }

    /// Number of live clauses.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Iterates over live (unsatisfied) clauses.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> + '_ {
        self.clauses
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.satisfied[*i])
            .map(|(_, c)| c)
    }

    /// The first falsified clause, if any.
    #[must_use]
    pub fn empty_clause(&self) -> Option<&Clause> {
        if self.has_empty_clause() {
            self.clauses().find(|c| c.is_empty())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn remaining(&self) -> &Remaining {
        &self.remaining
    }

    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    #[must_use]
    pub const fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Every variable of the input, in first-seen order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// One past the largest variable index.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.assignment.num_vars()
    }

    /// Active occurrences of `lit` in live clauses.
    #[must_use]
    pub fn occurrences(&self, lit: Literal) -> usize {
        self.counts.get(lit.index()).copied().unwrap_or(0)
    }

    /// Occurrences of `var`, either polarity, in the clauses as loaded.
    #[must_use]
    pub fn initial_occurrences(&self, var: Variable) -> usize {
        let pos = Literal::new(var, true).index();
        let neg = Literal::new(var, false).index();
        self.occurrences.get(pos).map_or(0, Vec::len) + self.occurrences.get(neg).map_or(0, Vec::len)
    }

    /// `true` if `var` has an active occurrence in some live clause.
    /// Remaining variables that fail this are fixed by nothing and are
    /// never worth a decision.
    #[must_use]
    pub fn occurs(&self, var: Variable) -> bool {
        self.purity(var) != Purity::Absent
    }

    /// Remaining variables that still occur in a live clause, in remaining
    /// order.
    pub fn candidates(&self) -> impl Iterator<Item = Variable> + '_ {
        self.remaining.iter().filter(|&v| self.occurs(v))
    }

    #[must_use]
    pub fn purity(&self, var: Variable) -> Purity {
        let pos = self.occurrences(Literal::new(var, true));
        let neg = self.occurrences(Literal::new(var, false));
        match (pos > 0, neg > 0) {
            (false, false) => Purity::Absent,
            (true, false) => Purity::Positive,
            (false, true) => Purity::Negative,
            (true, true) => Purity::Mixed,
        }
    }

    /// Makes `lit` true in the clause set: every live clause containing
    /// `lit` is satisfied, and `¬lit` is resolved out of every live clause
    /// containing it. A literal that occurs nowhere is a no-op.
    ///
    /// This only rewrites clauses; [`Formula::assign`] also records the
    /// assignment and updates the remaining set.
    pub fn eliminate(&mut self, lit: Literal) {
        let Self {
            clauses,
            satisfied,
            occurrences,
            counts,
            live,
            empty,
            trail,
            pending_units,
            ..
        } = self;

        let Some(sat_list) = occurrences.get(lit.index()) else {
            return;
        };
        for &c in sat_list {
            if satisfied[c] || !clauses[c].contains(lit) {
                continue;
            }
            satisfied.set(c, true);
            *live -= 1;
            for l in clauses[c].iter() {
                counts[l.index()] -= 1;
            }
            trail.push(Edit::Satisfied(c));
        }

        let neg = lit.negated();
        for &c in &occurrences[neg.index()] {
            if satisfied[c] || !clauses[c].resolve(neg) {
                continue;
            }
            counts[neg.index()] -= 1;
            trail.push(Edit::Resolved(c));
            match clauses[c].len() {
                0 => *empty += 1,
                1 => pending_units.push(c),
                _ => {}
            }
        }
    }

    /// Assigns `lit` true: records it, drops its variable from the remaining
    /// set and eliminates it from the clauses.
    ///
    /// Re-assigning the value a variable already holds is a no-op.
    ///
    /// # Errors
    ///
    /// [`SolveError::ConflictingAssignment`] if the variable holds the
    /// opposite value, [`SolveError::UnknownVariable`] if it is outside the
    /// formula.
    pub fn assign(&mut self, lit: Literal) -> Result<()> {
        let var = lit.variable();
        if var == 0 || !self.assignment.contains(var) {
            return Err(SolveError::UnknownVariable(var));
        }

        match self.assignment.var_value(var) {
            Some(current) if current == lit.polarity() => return Ok(()),
            Some(current) => return Err(SolveError::ConflictingAssignment { var, current }),
            None => {}
        }

        self.assignment.assign(lit);
        let slot = self.remaining.remove(var);
        self.trail.push(Edit::Assigned { lit, slot });
        self.eliminate(lit);
        Ok(())
    }

    /// Pops the literal of some live unit clause, if there is one.
    pub fn next_unit(&mut self) -> Option<Literal> {
        while let Some(c) = self.pending_units.pop() {
            if !self.satisfied[c] && self.clauses[c].is_unit() {
                return Some(self.clauses[c][0]);
            }
        }
        None
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        self.trail.checkpoint()
    }

    /// Undoes every edit made after `mark`.
    pub fn rollback(&mut self, mark: Checkpoint) {
        while let Some(edit) = self.trail.pop_to(mark) {
            match edit {
                Edit::Satisfied(c) => {
                    self.satisfied.set(c, false);
                    self.live += 1;
                    for l in self.clauses[c].iter() {
                        self.counts[l.index()] += 1;
                    }
                    if self.clauses[c].is_unit() {
                        self.pending_units.push(c);
                    }
                }
                Edit::Resolved(c) => {
                    if self.clauses[c].is_empty() {
                        self.empty -= 1;
                    }
                    let lit = self.clauses[c].restore();
                    self.counts[lit.index()] += 1;
                    if self.clauses[c].is_unit() {
                        self.pending_units.push(c);
                    }
                }
                Edit::Assigned { lit, slot } => {
                    self.assignment.unassign(lit.variable());
                    if let Some(slot) = slot {
                        self.remaining.restore(lit.variable(), slot);
                    }
                }
            }
        }
    }
}
