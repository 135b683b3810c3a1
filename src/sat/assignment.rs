#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The partial assignment built along the current search path.

use crate::sat::literal::{Literal, Variable};
use core::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::Assigned(true))
    }

    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::Assigned(false))
    }
}

/// Dense `Variable -> VarState` table. Index 0 is unused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    states: Vec<VarState>,
    assigned: usize,
}

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.states[index as usize]
    }
}

impl Assignment {
    /// Creates an empty assignment for variables `0..num_vars`.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            states: vec![VarState::Unassigned; num_vars],
            assigned: 0,
        }
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.states.len()
    }

    /// Number of variables currently assigned.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.assigned
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.assigned == 0
    }

    /// `true` if `var` is within the table.
    #[must_use]
    pub fn contains(&self, var: Variable) -> bool {
        (var as usize) < self.states.len()
    }

    /// Makes `lit` true. The caller guarantees `lit`'s variable is in range
    /// and unassigned.
    pub fn assign(&mut self, lit: Literal) {
        let state = &mut self.states[lit.variable() as usize];
        debug_assert!(state.is_unassigned(), "variable assigned twice");
        *state = VarState::Assigned(lit.polarity());
        self.assigned += 1;
    }

    pub fn unassign(&mut self, var: Variable) {
        let state = &mut self.states[var as usize];
        if state.is_assigned() {
            *state = VarState::Unassigned;
            self.assigned -= 1;
        }
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        match self.states.get(var as usize) {
            Some(VarState::Assigned(b)) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.var_value(lit.variable()).map(|b| b == lit.polarity())
    }

    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self.var_value(var).is_some()
    }

    /// Iterates `(variable, value)` over assigned variables in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, bool)> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                #[allow(clippy::cast_possible_truncation)]
                VarState::Assigned(b) => Some((i as Variable, *b)),
                VarState::Unassigned => None,
            })
    }
}
