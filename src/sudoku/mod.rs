#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Sudoku puzzles as SAT instances: parsing, CNF compilation and decoding
//! a model back into a grid.

pub mod solver;
