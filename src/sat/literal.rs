#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Signed-integer literals.
//!
//! A literal is stored exactly as it appears in DIMACS: a non-zero `i32`
//! whose sign is the polarity and whose magnitude is the variable. This
//! keeps variable and polarity extraction O(1) and makes negation a single
//! arithmetic negation.

use core::ops::{Neg, Not};
use std::fmt;

/// A propositional variable. Variables are numbered from `1`.
pub type Variable = u32;

/// A variable together with a polarity.
///
/// `Literal(3)` asserts variable 3 is true, `Literal(-3)` asserts it is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal(i32);

impl Literal {
    /// Builds a literal for `var` with the given polarity (`true` = positive).
    /// Every variable comes from a parsed `i32`, so it fits back into one.
    #[must_use]
    pub const fn new(var: Variable, polarity: bool) -> Self {
        debug_assert!(var <= i32::MAX as Variable, "literal variable overflowed i32");
        #[allow(clippy::cast_possible_wrap)]
        let var = var as i32;

        if polarity { Self(var) } else { Self(-var) }
    }

    /// Wraps a DIMACS literal. `value` must be non-zero.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        debug_assert!(value != 0, "0 is a clause terminator, not a literal");
        Self(value)
    }

    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.unsigned_abs()
    }

    /// `true` for a positive literal.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0.is_positive()
    }

    #[must_use]
    pub const fn is_negated(self) -> bool {
        !self.polarity()
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Dense index for per-literal tables: `2 * var` for the positive
    /// literal and `2 * var + 1` for the negative one.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.variable() as usize) * 2 + self.is_negated() as usize
    }

    /// `true` iff both literals share a variable and differ in polarity.
    #[must_use]
    pub const fn is_complement_of(self, other: Self) -> bool {
        self.0 == -other.0
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl From<Literal> for i32 {
    fn from(lit: Literal) -> Self {
        lit.0
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Neg for &Literal {
    type Output = Literal;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for &Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
