#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Undo log for the formula store.
//!
//! Every mutation of the formula pushes one [`Edit`]. Backtracking pops
//! edits in reverse order until the trail is back at a [`Checkpoint`].

use crate::sat::literal::{Literal, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edit {
    /// The clause at this index became satisfied and left the formula.
    Satisfied(usize),
    /// The last active literal of the clause at this index was resolved away.
    Resolved(usize),
    /// A variable was assigned. `slot` is the position it held in the
    /// remaining set, if it was still there.
    Assigned {
        lit: Literal,
        slot: Option<usize>,
    },
}

/// A position in the trail to roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Checkpoint(usize);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail {
    edits: Vec<Edit>,
}

impl Trail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.edits.len())
    }

    /// Pops the newest edit if it was made after `mark`.
    pub fn pop_to(&mut self, mark: Checkpoint) -> Option<Edit> {
        if self.edits.len() > mark.0 {
            self.edits.pop()
        } else {
            None
        }
    }

    /// Variables assigned after `mark`.
    pub fn assigned_since(&self, mark: Checkpoint) -> impl Iterator<Item = Variable> + '_ {
        self.edits[mark.0.min(self.edits.len())..]
            .iter()
            .filter_map(|e| match e {
                Edit::Assigned { lit, .. } => Some(lit.variable()),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_to_stops_at_checkpoint() {
        let mut trail = Trail::new();
        trail.push(Edit::Satisfied(0));
        let mark = trail.checkpoint();
        trail.push(Edit::Resolved(1));
        trail.push(Edit::Assigned {
            lit: Literal::from(3),
            slot: Some(0),
        });

        assert_eq!(
            trail.pop_to(mark),
            Some(Edit::Assigned {
                lit: Literal::from(3),
                slot: Some(0)
            })
        );
        assert_eq!(trail.pop_to(mark), Some(Edit::Resolved(1)));
        assert_eq!(trail.pop_to(mark), None);
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_assigned_since() {
        let mut trail = Trail::new();
        trail.push(Edit::Assigned {
            lit: Literal::from(-1),
            slot: None,
        });
        let mark = trail.checkpoint();
        trail.push(Edit::Satisfied(2));
        trail.push(Edit::Assigned {
            lit: Literal::from(4),
            slot: Some(1),
        });

        assert_eq!(trail.assigned_since(Checkpoint::default()).count(), 2);
        assert_eq!(trail.assigned_since(mark).collect::<Vec<_>>(), vec![4]);
    }
}
