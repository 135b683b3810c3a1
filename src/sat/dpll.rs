#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The DPLL search.
//!
//! Each call of the search:
//! 1. simplifies the formula to fixpoint (unit propagation and pure
//!    literals);
//! 2. stops with SAT once no clause is left;
//! 3. stops with a conflict once some clause is empty;
//! 4. otherwise asks the heuristic for a variable, sets it `true` and
//!    recurses, and on failure rolls the formula back to the decision point
//!    and retries with `false`.
//!
//! All per-branch state lives in one [`Formula`] that is rolled back on
//! backtrack. The heuristic is the only state that outlives a branch.

use crate::sat::cnf::Cnf;
use crate::sat::error::{Result, SolveError};
use crate::sat::formula::Formula;
use crate::sat::literal::Literal;
use crate::sat::propagation::simplify;
use crate::sat::solver::{SolutionStats, Solutions};
use crate::sat::variable_selection::{Heuristic, VariableSelection, VariableSelectionImpls};
use log::{Level, debug, info, log_enabled};

#[derive(Debug, Clone)]
pub struct Dpll<S: VariableSelection = VariableSelectionImpls> {
    formula: Formula,
    selector: S,
    stats: SolutionStats,
    /// `Some` once a solve has finished; the inner option is the verdict.
    outcome: Option<Option<Solutions>>,
}

impl Dpll {
    /// A solver for `cnf` using `heuristic` with its default settings.
    #[must_use]
    pub fn new(cnf: &Cnf, heuristic: Heuristic) -> Self {
        Self::with_selector(cnf, heuristic.selector())
    }

    /// Like [`Dpll::new`], with an explicit VSIDS decay factor.
    ///
    /// # Errors
    ///
    /// [`SolveError::InvalidDecay`] if `decay` is outside `(0, 1)`.
    pub fn with_config(cnf: &Cnf, heuristic: Heuristic, decay: Option<f64>) -> Result<Self> {
        Ok(Self::with_selector(cnf, heuristic.to_impl(decay)?))
    }
}

impl<S: VariableSelection> Dpll<S> {
    pub fn with_selector(cnf: &Cnf, selector: S) -> Self {
        Self {
            formula: Formula::new(cnf),
            selector,
            stats: SolutionStats::default(),
            outcome: None,
        }
    }

    /// Runs the search. `Ok(Some(model))` is SAT, `Ok(None)` is UNSAT.
    ///
    /// The model covers every variable of the input; variables the search
    /// never had to fix are `false`. A finished solve is cached, so calling
    /// this again returns the same verdict without searching.
    ///
    /// # Errors
    ///
    /// A broken internal invariant, e.g. the heuristic offering no variable
    /// while clauses remain. The formula is rolled back to its initial state.
    pub fn solve(&mut self) -> Result<Option<Solutions>> {
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }

        info!(
            "solving {} clauses over {} variables",
            self.formula.len(),
            self.formula.variables().len()
        );

        let root = self.formula.checkpoint();
        let sat = match self.search(0) {
            Ok(sat) => sat,
            Err(e) => {
                self.formula.rollback(root);
                return Err(e);
            }
        };

        let outcome = sat.then(|| {
            Solutions::complete(self.formula.assignment(), self.formula.variables())
        });
        info!(
            "{} after {} decisions, {} conflicts",
            if sat { "SAT" } else { "UNSAT" },
            self.stats.decisions,
            self.stats.conflicts
        );

        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    fn search(&mut self, depth: usize) -> Result<bool> {
        self.stats.max_depth = self.stats.max_depth.max(depth);
        simplify(&mut self.formula, &mut self.stats)?;

        if self.formula.is_empty() {
            return Ok(true);
        }

        if self.formula.has_empty_clause() {
            self.stats.conflicts += 1;
            self.selector.on_conflict(&self.formula);
            return Ok(false);
        }

        let var = self
            .selector
            .pick(&self.formula)
            .ok_or(SolveError::NoBranchVariable)?;
        if let Some(current) = self.formula.assignment().var_value(var) {
            return Err(SolveError::ConflictingAssignment { var, current });
        }
        self.stats.decisions += 1;

        let mark = self.formula.checkpoint();
        for polarity in [true, false] {
            let lit = Literal::new(var, polarity);
            debug!("level {}: deciding {lit}", depth + 1);
            self.formula.assign(lit)?;

            if self.search(depth + 1)? {
                return Ok(true);
            }

            if log_enabled!(Level::Debug) {
                let undone = self.formula.trail().assigned_since(mark).count();
                debug!(
                    "level {}: backtracking over {lit}, undoing {undone} assignments",
                    depth + 1
                );
            }
            self.formula.rollback(mark);
        }

        Ok(false)
    }

    /// The model of the last solve, if it was SAT.
    #[must_use]
    pub fn solutions(&self) -> Option<&Solutions> {
        self.outcome.as_ref().and_then(Option::as_ref)
    }

    #[must_use]
    pub const fn stats(&self) -> SolutionStats {
        self.stats
    }

    /// Decision points so far. Never decreases during a solve.
    #[must_use]
    pub const fn branch_count(&self) -> usize {
        self.stats.decisions
    }

    #[must_use]
    pub const fn is_solved(&self) -> bool {
        self.outcome.is_some()
    }

    #[must_use]
    pub const fn formula(&self) -> &Formula {
        &self.formula
    }

    #[must_use]
    pub const fn selector(&self) -> &S {
        &self.selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::Variable;

    fn solve(clauses: Vec<Vec<i32>>, heuristic: Heuristic) -> (Option<Solutions>, usize) {
        let cnf = Cnf::new(clauses);
        let mut solver = Dpll::new(&cnf, heuristic);
        let result = solver.solve().unwrap();
        (result, solver.branch_count())
    }

    fn brute_force(cnf: &Cnf) -> bool {
        let n = cnf.num_vars() - 1;
        (0u32..1 << n).any(|mask| {
            cnf.iter().all(|clause| {
                clause
                    .original()
                    .iter()
                    .any(|lit| ((mask >> (lit.variable() - 1)) & 1 == 1) == lit.polarity())
            })
        })
    }

    fn random_cnf(rng: &mut fastrand::Rng) -> Cnf {
        let num_vars = rng.i32(1..=6);
        let num_clauses = rng.usize(1..=24);
        Cnf::new((0..num_clauses).map(|_| {
            let len = rng.usize(1..=3);
            (0..len)
                .map(|_| {
                    let var = rng.i32(1..=num_vars);
                    if rng.bool() { var } else { -var }
                })
                .collect::<Vec<_>>()
        }))
    }

    #[test]
    fn test_single_unit_clause() {
        for h in Heuristic::ALL {
            let (result, branches) = solve(vec![vec![1]], h);
            let model = result.unwrap();
            assert_eq!(model.value(1), Some(true));
            assert_eq!(model.len(), 1);
            assert_eq!(branches, 0);
        }
    }

    #[test]
    fn test_contradicting_units() {
        for h in Heuristic::ALL {
            let (result, branches) = solve(vec![vec![1], vec![-1]], h);
            assert!(result.is_none());
            assert_eq!(branches, 0);
        }
    }

    #[test]
    fn test_unique_model() {
        for h in Heuristic::ALL {
            let (result, _) = solve(vec![vec![1, 2], vec![-1, 2], vec![1, -2]], h);
            let model = result.unwrap();
            assert_eq!(model.value(1), Some(true));
            assert_eq!(model.value(2), Some(true));
        }
    }

    #[test]
    fn test_xor_has_one_of_two_models() {
        for h in Heuristic::ALL {
            let (result, _) = solve(vec![vec![1, 2], vec![-1, -2]], h);
            let model = result.unwrap();
            let pair = (model.value(1), model.value(2));
            assert!(
                pair == (Some(true), Some(false)) || pair == (Some(false), Some(true)),
                "{h}: {pair:?}"
            );
        }
    }

    #[test]
    fn test_true_branch_first() {
        // First-unassigned splits on 2; the true branch already succeeds.
        let (result, branches) = solve(vec![vec![1, 2], vec![-1, -2]], Heuristic::FirstUnassigned);
        let model = result.unwrap();
        assert_eq!(model.value(2), Some(true));
        assert_eq!(model.value(1), Some(false));
        assert_eq!(branches, 1);
    }

    #[test]
    fn test_pure_only_needs_no_branch() {
        for h in Heuristic::ALL {
            let (result, branches) = solve(vec![vec![1, 2], vec![1, -3], vec![-3, 2]], h);
            assert!(result.is_some());
            assert_eq!(branches, 0);
        }
    }

    #[test]
    fn test_empty_input() {
        let (result, branches) = solve(Vec::new(), Heuristic::Vsids);
        assert!(result.unwrap().is_empty());
        assert_eq!(branches, 0);
    }

    #[test]
    fn test_empty_clause_in_input() {
        for h in Heuristic::ALL {
            let (result, _) = solve(vec![vec![1, 2], vec![]], h);
            assert!(result.is_none());
        }
    }

    #[test]
    fn test_model_is_total() {
        // 3 disappears with the tautology, 4 with the clause 1 satisfies.
        let cnf = Cnf::new(vec![vec![1], vec![3, -3], vec![1, 4]]);
        let mut solver = Dpll::new(&cnf, Heuristic::JeroslowWang);
        let model = solver.solve().unwrap().unwrap();

        assert_eq!(model.len(), 3);
        assert_eq!(model.value(3), Some(false));
        assert_eq!(model.value(4), Some(false));
        assert!(cnf.verify(&model));
    }

    #[test]
    fn test_unsat_needs_branching() {
        let clauses = vec![vec![1, 2], vec![1, -2], vec![-1, 2], vec![-1, -2]];
        for h in Heuristic::ALL {
            let cnf = Cnf::new(clauses.clone());
            let mut solver = Dpll::new(&cnf, h);
            assert!(solver.solve().unwrap().is_none());
            assert_eq!(solver.branch_count(), 1);
            assert_eq!(solver.stats().conflicts, 2);
            assert_eq!(solver.stats().max_depth, 1);
        }
    }

    #[test]
    fn test_solve_is_cached() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, -2], vec![2, 3], vec![-2, -3]]);
        let mut solver = Dpll::new(&cnf, Heuristic::FirstUnassigned);
        let first = solver.solve().unwrap();
        let stats = solver.stats();

        assert!(solver.is_solved());
        assert_eq!(solver.solve().unwrap(), first);
        assert_eq!(solver.stats(), stats);
        assert_eq!(solver.solutions(), first.as_ref());
    }

    #[test]
    fn test_agrees_with_brute_force() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..300 {
            let cnf = random_cnf(&mut rng);
            let expected = brute_force(&cnf);

            for h in Heuristic::ALL {
                let mut solver = Dpll::new(&cnf, h);
                let result = solver.solve().unwrap();
                assert_eq!(result.is_some(), expected, "{h} on\n{cnf}");

                if let Some(model) = result {
                    assert!(cnf.verify(&model), "{h} returned a bad model for\n{cnf}");
                    assert_eq!(model.len(), cnf.variables().len());
                }
            }
        }
    }

    #[test]
    fn test_vsids_decay_setting() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, -2], vec![2, 3], vec![-2, -3]]);
        let mut solver = Dpll::with_config(&cnf, Heuristic::Vsids, Some(0.5)).unwrap();
        assert!(solver.solve().unwrap().is_some());

        assert_eq!(
            Dpll::with_config(&cnf, Heuristic::Vsids, Some(2.0)).err(),
            Some(SolveError::InvalidDecay(2.0))
        );
    }

    /// Wraps a real heuristic and counts picks of variables that no live
    /// clause mentions any more.
    #[derive(Debug)]
    struct CountIdle {
        inner: VariableSelectionImpls,
        idle: usize,
    }

    impl VariableSelection for CountIdle {
        fn pick(&mut self, formula: &Formula) -> Option<Variable> {
            let var = self.inner.pick(formula)?;
            if !formula.occurs(var) {
                self.idle += 1;
            }
            Some(var)
        }

        fn on_conflict(&mut self, formula: &Formula) {
            self.inner.on_conflict(formula);
        }
    }

    #[test]
    fn test_decisions_only_on_live_variables() {
        let mut rng = fastrand::Rng::with_seed(0x1d1e);
        for _ in 0..500 {
            let cnf = random_cnf(&mut rng);
            for h in Heuristic::ALL {
                let mut solver = Dpll::with_selector(
                    &cnf,
                    CountIdle {
                        inner: h.selector(),
                        idle: 0,
                    },
                );
                solver.solve().unwrap();
                assert_eq!(solver.selector().idle, 0, "{h} on\n{cnf}");
            }
        }
    }

    #[derive(Debug)]
    struct Offers(Option<Variable>);

    impl VariableSelection for Offers {
        fn pick(&mut self, _formula: &Formula) -> Option<Variable> {
            self.0
        }
    }

    #[test]
    fn test_missing_branch_variable_is_an_error() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, -2]]);
        let mut solver = Dpll::with_selector(&cnf, Offers(None));
        assert_eq!(solver.solve(), Err(SolveError::NoBranchVariable));
        assert!(!solver.is_solved());
        assert!(solver.formula().trail().is_empty());
    }

    #[test]
    fn test_unknown_branch_variable_is_an_error() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, -2]]);
        let mut solver = Dpll::with_selector(&cnf, Offers(Some(0)));
        let err = solver.solve().unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_assigned_branch_variable_is_an_error() {
        // 1 is fixed by propagation before the first decision.
        let cnf = Cnf::new(vec![vec![1], vec![2, 3], vec![-2, -3]]);
        let mut solver = Dpll::with_selector(&cnf, Offers(Some(1)));
        assert_eq!(
            solver.solve(),
            Err(SolveError::ConflictingAssignment {
                var: 1,
                current: true
            })
        );
    }
}
