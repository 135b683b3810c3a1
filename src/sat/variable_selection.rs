#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Branching heuristics.
//!
//! Every heuristic answers one question: which unassigned variable should
//! the search split on next. They are interchangeable behind
//! [`VariableSelection`] and chosen once per solve through [`Heuristic`].

use crate::sat::error::{Result, SolveError};
use crate::sat::formula::Formula;
use crate::sat::literal::Variable;
use ordered_float::OrderedFloat;
use std::fmt;
use std::str::FromStr;

pub trait VariableSelection: fmt::Debug {
    /// Picks a variable from the formula's remaining set. `None` only when
    /// the remaining set has nothing to offer.
    fn pick(&mut self, formula: &Formula) -> Option<Variable>;

    /// Called when the search finds a falsified clause.
    fn on_conflict(&mut self, _formula: &Formula) {}
}

/// The first candidate with the highest score. NaN never wins.
fn first_max<I, F>(candidates: I, score: F) -> Option<Variable>
where
    I: IntoIterator<Item = Variable>,
    F: Fn(Variable) -> f64,
{
    let mut best: Option<(OrderedFloat<f64>, Variable)> = None;
    for var in candidates {
        let s = OrderedFloat(score(var));
        if s.is_nan() {
            continue;
        }
        if best.is_none_or(|(b, _)| s > b) {
            best = Some((s, var));
        }
    }
    best.map(|(_, var)| var)
}

/// Splits on the most recently inserted remaining variable that still
/// occurs in a live clause. Scores nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirstUnassigned;

impl VariableSelection for FirstUnassigned {
    fn pick(&mut self, formula: &Formula) -> Option<Variable> {
        formula
            .remaining()
            .as_slice()
            .iter()
            .rev()
            .copied()
            .find(|&v| formula.occurs(v))
    }
}

/// Two-sided Jeroslow-Wang: every literal in a live clause of length `n`
/// adds `2^-n` to its variable. Scores are rebuilt from scratch at each
/// decision; ties go to the variable that comes first in the remaining set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JeroslowWangTwoSided {
    scores: Vec<f64>,
}

impl JeroslowWangTwoSided {
    /// Recomputes the score table for the current formula.
    pub fn score(&mut self, formula: &Formula) -> &[f64] {
        self.scores.clear();
        self.scores.resize(formula.num_vars(), 0.0);

        for clause in formula.clauses() {
            let len = i32::try_from(clause.len()).unwrap_or(i32::MAX);
            let weight = 2f64.powi(-len);
            for lit in clause.iter() {
                self.scores[lit.variable() as usize] += weight;
            }
        }
        &self.scores
    }
}

impl VariableSelection for JeroslowWangTwoSided {
    fn pick(&mut self, formula: &Formula) -> Option<Variable> {
        let scores = self.score(formula);
        first_max(formula.candidates(), |v| scores[v as usize])
    }
}

const DEFAULT_DECAY: f64 = 0.95;
const DEFAULT_BUMP: f64 = 1.0;

/// Activity-based selection in the spirit of VSIDS.
///
/// The activity table belongs to the selector, not to the formula, so it is
/// never rolled back: it lives for exactly one solve and carries what was
/// learned across every branch and backtrack.
///
/// Lifecycle:
/// - first pick: each variable starts at its occurrence count in the clauses
///   as loaded;
/// - every later pick: all activities are multiplied by the decay factor
///   before selecting;
/// - every conflict: each variable of the falsified clause gains the bump.
///
/// Selection takes the highest activity among remaining variables that
/// still occur in a live clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Vsids {
    activity: Vec<f64>,
    initialised: bool,
    decay: f64,
    bump: f64,
}

impl Default for Vsids {
    fn default() -> Self {
        Self {
            activity: Vec::new(),
            initialised: false,
            decay: DEFAULT_DECAY,
            bump: DEFAULT_BUMP,
        }
    }
}

impl Vsids {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// [`SolveError::InvalidDecay`] unless `0 < decay < 1`.
    pub fn with_decay(decay: f64) -> Result<Self> {
        if decay > 0.0 && decay < 1.0 {
            Ok(Self {
                decay,
                ..Self::default()
            })
        } else {
            Err(SolveError::InvalidDecay(decay))
        }
    }

    #[must_use]
    pub const fn decay_factor(&self) -> f64 {
        self.decay
    }

    #[must_use]
    pub const fn is_initialised(&self) -> bool {
        self.initialised
    }

    #[must_use]
    pub fn activity(&self, var: Variable) -> f64 {
        self.activity.get(var as usize).copied().unwrap_or(0.0)
    }

    fn initialise(&mut self, formula: &Formula) {
        self.activity = vec![0.0; formula.num_vars()];
        for &var in formula.variables() {
            #[allow(clippy::cast_precision_loss)]
            let count = formula.initial_occurrences(var) as f64;
            self.activity[var as usize] = count;
        }
        self.initialised = true;
    }

    pub fn decay(&mut self) {
        for a in &mut self.activity {
            *a *= self.decay;
        }
    }

    pub fn bump(&mut self, var: Variable) {
        if let Some(a) = self.activity.get_mut(var as usize) {
            *a += self.bump;
        }
    }
}

impl VariableSelection for Vsids {
    fn pick(&mut self, formula: &Formula) -> Option<Variable> {
        if self.initialised {
            self.decay();
        } else {
            self.initialise(formula);
        }
        first_max(formula.candidates(), |v| self.activity(v))
    }

    fn on_conflict(&mut self, formula: &Formula) {
        if !self.initialised {
            return;
        }
        if let Some(clause) = formula.empty_clause() {
            for lit in clause.original() {
                self.bump(lit.variable());
            }
        }
    }
}

/// The three interchangeable heuristics, dispatched statically.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSelectionImpls {
    FirstUnassigned(FirstUnassigned),
    JeroslowWang(JeroslowWangTwoSided),
    Vsids(Vsids),
}

impl VariableSelection for VariableSelectionImpls {
    fn pick(&mut self, formula: &Formula) -> Option<Variable> {
        match self {
            Self::FirstUnassigned(s) => s.pick(formula),
            Self::JeroslowWang(s) => s.pick(formula),
            Self::Vsids(s) => s.pick(formula),
        }
    }

    fn on_conflict(&mut self, formula: &Formula) {
        match self {
            Self::FirstUnassigned(s) => s.on_conflict(formula),
            Self::JeroslowWang(s) => s.on_conflict(formula),
            Self::Vsids(s) => s.on_conflict(formula),
        }
    }
}

/// Heuristic selector, numbered as in the benchmark tables: `0` first
/// unassigned, `1` two-sided Jeroslow-Wang, `2` VSIDS-like activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Heuristic {
    FirstUnassigned = 0,
    JeroslowWang = 1,
    #[default]
    Vsids = 2,
}

impl Heuristic {
    pub const ALL: [Self; 3] = [Self::FirstUnassigned, Self::JeroslowWang, Self::Vsids];

    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstUnassigned => "first",
            Self::JeroslowWang => "jw",
            Self::Vsids => "vsids",
        }
    }

    /// The selector with default settings.
    #[must_use]
    pub fn selector(self) -> VariableSelectionImpls {
        match self {
            Self::FirstUnassigned => VariableSelectionImpls::FirstUnassigned(FirstUnassigned),
            Self::JeroslowWang => {
                VariableSelectionImpls::JeroslowWang(JeroslowWangTwoSided::default())
            }
            Self::Vsids => VariableSelectionImpls::Vsids(Vsids::new()),
        }
    }

    /// Builds the selector, using `decay` for VSIDS when given. Other
    /// heuristics ignore it.
    ///
    /// # Errors
    ///
    /// [`SolveError::InvalidDecay`] for an out-of-range decay.
    pub fn to_impl(self, decay: Option<f64>) -> Result<VariableSelectionImpls> {
        match (self, decay) {
            (Self::Vsids, Some(d)) => Ok(VariableSelectionImpls::Vsids(Vsids::with_decay(d)?)),
            _ => Ok(self.selector()),
        }
    }
}

impl TryFrom<u8> for Heuristic {
    type Error = SolveError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::FirstUnassigned),
            1 => Ok(Self::JeroslowWang),
            2 => Ok(Self::Vsids),
            other => Err(SolveError::UnknownHeuristic(other.to_string())),
        }
    }
}

impl FromStr for Heuristic {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "first" | "naive" | "first-unassigned" => Ok(Self::FirstUnassigned),
            "1" | "jw" | "jeroslow-wang" => Ok(Self::JeroslowWang),
            "2" | "vsids" => Ok(Self::Vsids),
            _ => Err(SolveError::UnknownHeuristic(s.to_string())),
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
