#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A DPLL SAT solver with unit propagation, pure literal elimination and
//! three interchangeable branching heuristics, plus a Sudoku front end and
//! a parallel benchmark harness.

/// Formula representation, simplification, heuristics and the search.
pub mod sat;

/// Sudoku puzzles compiled to CNF and decoded from models.
pub mod sudoku;

/// Timing every heuristic over a batch of instances.
pub mod benchmark;
