#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Simplification to fixpoint: unit propagation, then pure literal
//! elimination, repeated until neither rule fires.
//!
//! Both rules only ever assign variables that are still unassigned, and each
//! assignment removes at least one variable from the remaining set, so the
//! loop terminates.

use crate::sat::error::Result;
use crate::sat::formula::{Formula, Purity};
use crate::sat::literal::Literal;
use crate::sat::solver::SolutionStats;
use itertools::Itertools;
use log::trace;

/// Assigns the literal of every unit clause until none is left. Returns the
/// number of variables fixed.
///
/// Runs to fixpoint even after a clause has become empty; the caller checks
/// for conflicts afterwards.
///
/// # Errors
///
/// Only if the formula reports a broken invariant while assigning.
pub fn unit_propagate(formula: &mut Formula) -> Result<usize> {
    let mut fixed = 0;
    while let Some(lit) = formula.next_unit() {
        formula.assign(lit)?;
        fixed += 1;
    }
    Ok(fixed)
}

/// Assigns every pure variable the polarity it occurs with, repeating full
/// passes over the remaining set until one makes no assignment. A variable
/// is pure only when all its occurrences share one sign; a variable with no
/// occurrences is skipped.
///
/// # Errors
///
/// Only if the formula reports a broken invariant while assigning.
pub fn eliminate_pure_literals(formula: &mut Formula) -> Result<usize> {
    let mut fixed = 0;
    loop {
        let mut changed = false;
        for var in formula.remaining().iter().collect_vec() {
            let lit = match formula.purity(var) {
                Purity::Positive => Literal::new(var, true),
                Purity::Negative => Literal::new(var, false),
                Purity::Absent | Purity::Mixed => continue,
            };
            formula.assign(lit)?;
            fixed += 1;
            changed = true;
        }
        if !changed {
            return Ok(fixed);
        }
    }
}

/// Runs both rules until neither changes the formula, adding what they did
/// to `stats`. Pure literal elimination is skipped once a clause is empty,
/// since the branch is already refuted.
///
/// # Errors
///
/// Only if the formula reports a broken invariant while assigning.
pub fn simplify(formula: &mut Formula, stats: &mut SolutionStats) -> Result<()> {
    loop {
        let units = unit_propagate(formula)?;
        stats.propagations += units;

        if formula.has_empty_clause() {
            trace!("simplify: conflict after {units} unit assignments");
            return Ok(());
        }

        let pures = eliminate_pure_literals(formula)?;
        stats.pure_literals += pures;
        trace!("simplify: {units} units, {pures} pure literals");

        if pures == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;

    fn formula(clauses: Vec<Vec<i32>>) -> Formula {
        Formula::new(&Cnf::new(clauses))
    }

    #[test]
    fn test_unit_propagation_chain() {
        let mut f = formula(vec![vec![1], vec![-1, 2], vec![-2, 3], vec![-3, 4, 5]]);
        let fixed = unit_propagate(&mut f).unwrap();

        assert_eq!(fixed, 3);
        assert_eq!(f.assignment().var_value(1), Some(true));
        assert_eq!(f.assignment().var_value(2), Some(true));
        assert_eq!(f.assignment().var_value(3), Some(true));
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn test_unit_propagation_conflict() {
        let mut f = formula(vec![vec![1], vec![-1]]);
        unit_propagate(&mut f).unwrap();
        assert!(f.has_empty_clause());
        assert_eq!(f.assignment().len(), 1);
    }

    #[test]
    fn test_pure_literals_strict_rule() {
        let mut f = formula(vec![vec![1, 2], vec![-2, 3], vec![1, -3], vec![2, -3]]);
        let fixed = eliminate_pure_literals(&mut f).unwrap();

        // 1 is positive-pure; 2 and 3 occur with both signs until 1 is set.
        assert_eq!(f.assignment().var_value(1), Some(true));
        assert!(fixed >= 1);
        assert!(!f.has_empty_clause());
    }

    #[test]
    fn test_pure_negative() {
        let mut f = formula(vec![vec![-1, 2], vec![-1, -2], vec![2, 3], vec![-2, 3]]);
        eliminate_pure_literals(&mut f).unwrap();
        assert_eq!(f.assignment().var_value(1), Some(false));
        assert_eq!(f.assignment().var_value(3), Some(true));
        assert!(f.is_empty());
    }

    #[test]
    fn test_simplify_counts() {
        let mut f = formula(vec![vec![1], vec![-1, 2], vec![3, 4], vec![3, -4]]);
        let mut stats = SolutionStats::default();
        simplify(&mut f, &mut stats).unwrap();

        assert!(f.is_empty());
        assert_eq!(stats.propagations, 2);
        assert_eq!(stats.pure_literals, 1);
        assert_eq!(f.assignment().var_value(3), Some(true));
        assert_eq!(f.assignment().var_value(4), None);
    }

    #[test]
    fn test_simplify_is_idempotent() {
        let mut f = formula(vec![
            vec![1, 2, 3],
            vec![-1, -2],
            vec![-1, -3],
            vec![-2, -3],
            vec![4],
            vec![-4, 1, 2],
        ]);
        let mut stats = SolutionStats::default();
        simplify(&mut f, &mut stats).unwrap();

        let trail_len = f.trail().len();
        let before = stats;
        simplify(&mut f, &mut stats).unwrap();

        assert_eq!(f.trail().len(), trail_len);
        assert_eq!(stats, before);
    }

    #[test]
    fn test_simplify_skips_pure_after_conflict() {
        let mut f = formula(vec![vec![1], vec![-1], vec![2, 3]]);
        let mut stats = SolutionStats::default();
        simplify(&mut f, &mut stats).unwrap();

        assert!(f.has_empty_clause());
        assert_eq!(stats.pure_literals, 0);
        assert_eq!(f.assignment().var_value(2), None);
    }
}
