use crate::sat::cnf::Cnf;
use crate::sat::solver::Solutions;
use itertools::Itertools;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SudokuError {
    #[error("failed to read puzzles: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {len} cells do not form a 4x4, 9x9, 16x16 or 25x25 board")]
    InvalidLength { line: usize, len: usize },

    #[error("{0} is not a supported board size")]
    InvalidSize(usize),

    #[error("line {line}, cell {cell}: `{ch}` is not a value of a {size}x{size} board")]
    InvalidCell {
        line: usize,
        cell: usize,
        ch: char,
        size: usize,
    },

    #[error("row {row}, column {col}: {value} does not fit a {size}x{size} board")]
    InvalidValue {
        row: usize,
        col: usize,
        value: usize,
        size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board(Vec<Vec<usize>>);

impl Board {
    #[must_use]
    pub const fn new(board: Vec<Vec<usize>>) -> Self {
        Self(board)
    }

    /// Value at 1-based `(row, col)`; `0` is an empty cell.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> usize {
        self.0
            .get(row.wrapping_sub(1))
            .and_then(|r| r.get(col.wrapping_sub(1)))
            .copied()
            .unwrap_or(0)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.0.iter().map(Vec::as_slice)
    }
}

impl From<Vec<Vec<usize>>> for Board {
    fn from(board: Vec<Vec<usize>>) -> Self {
        Self::new(board)
    }
}

impl<const N: usize> From<[[usize; N]; N]> for Board {
    fn from(board: [[usize; N]; N]) -> Self {
        Self::new(board.iter().map(|r| r.to_vec()).collect())
    }
}

impl From<Board> for Vec<Vec<usize>> {
    fn from(board: Board) -> Self {
        board.0
    }
}

pub const EXAMPLE_FOUR: [[usize; 4]; 4] = [[0, 2, 3, 4], [3, 0, 1, 2], [2, 1, 0, 3], [4, 3, 2, 0]];

pub const EXAMPLE_NINE: [[usize; 9]; 9] = [
    [5, 3, 0, 0, 7, 0, 0, 0, 0],
    [6, 0, 0, 1, 9, 5, 0, 0, 0],
    [0, 9, 8, 0, 0, 0, 0, 6, 0],
    [8, 0, 0, 0, 6, 0, 0, 0, 3],
    [4, 0, 0, 8, 0, 3, 0, 0, 1],
    [7, 0, 0, 0, 2, 0, 0, 0, 6],
    [0, 6, 0, 0, 0, 0, 2, 8, 0],
    [0, 0, 0, 4, 1, 9, 0, 0, 5],
    [0, 0, 0, 0, 8, 0, 0, 7, 9],
];

#[derive(Debug, Clone, PartialEq, Eq, Copy, PartialOrd, Ord, Hash)]
pub enum Size {
    Four = 4,
    Nine = 9,
    Sixteen = 16,
    TwentyFive = 25,
}

impl TryFrom<usize> for Size {
    type Error = SudokuError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Four),
            9 => Ok(Self::Nine),
            16 => Ok(Self::Sixteen),
            25 => Ok(Self::TwentyFive),
            _ => Err(SudokuError::InvalidSize(value)),
        }
    }
}

impl From<Size> for usize {
    fn from(size: Size) -> Self {
        size as Self
    }
}

impl Size {
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Four => 2,
            Self::Nine => 3,
            Self::Sixteen => 4,
            Self::TwentyFive => 5,
        }
    }

    /// Number of propositional variables: one per (row, column, value).
    #[must_use]
    pub const fn num_variables(self) -> usize {
        let n = self as usize;
        n * n * n
    }
}

/// Printable form of a cell value: `.` for empty, `1`-`9`, then `A` for 10
/// up to `P` for 25.
fn value_to_char(value: usize) -> char {
    if value == 0 {
        return '.';
    }
    u32::try_from(value)
        .ok()
        .and_then(|v| char::from_digit(v, 36))
        .map_or('?', |c| c.to_ascii_uppercase())
}

fn char_to_value(ch: char) -> Option<usize> {
    match ch {
        '.' | '0' => Some(0),
        _ => ch.to_digit(36).map(|d| d as usize),
    }
}

/// The proposition "cell `(row, col)` holds `value`", all 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub value: usize,
}

impl Cell {
    #[must_use]
    pub const fn new(row: usize, col: usize, value: usize) -> Self {
        Self { row, col, value }
    }

    /// DIMACS variable of this proposition, in `1..=n^3`.
    #[must_use]
    pub const fn encode(&self, size: Size) -> i32 {
        let n = size as usize;
        let var = (self.row - 1) * n * n + (self.col - 1) * n + (self.value - 1) + 1;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let var = var as i32;
        var
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sudoku {
    pub board: Board,
    pub size: Size,
}

impl Sudoku {
    /// # Errors
    ///
    /// [`SudokuError::InvalidSize`] unless the board is square with a
    /// supported side, [`SudokuError::InvalidValue`] for a value above the
    /// side length.
    pub fn new(board: Board) -> Result<Self, SudokuError> {
        let size = Size::try_from(board.0.len())?;
        let n = usize::from(size);

        for (r, row) in board.0.iter().enumerate() {
            if row.len() != n {
                return Err(SudokuError::InvalidSize(row.len()));
            }
            if let Some((c, &value)) = row.iter().find_position(|&&v| v > n) {
                return Err(SudokuError::InvalidValue {
                    row: r + 1,
                    col: c + 1,
                    value,
                    size: n,
                });
            }
        }

        Ok(Self { board, size })
    }

    /// Parses one puzzle written as `n*n` cell characters on a single line.
    /// `line_no` only appears in error messages.
    ///
    /// # Errors
    ///
    /// [`SudokuError::InvalidLength`] if the cell count is not a supported
    /// board, [`SudokuError::InvalidCell`] for an unreadable or oversized
    /// value.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Self, SudokuError> {
        let cells = line.trim().chars().collect_vec();
        let size = [Size::Four, Size::Nine, Size::Sixteen, Size::TwentyFive]
            .into_iter()
            .find(|&s| usize::from(s).pow(2) == cells.len())
            .ok_or(SudokuError::InvalidLength {
                line: line_no,
                len: cells.len(),
            })?;
        let n = usize::from(size);

        let values = cells
            .iter()
            .enumerate()
            .map(|(i, &ch)| {
                char_to_value(ch)
                    .filter(|&v| v <= n)
                    .ok_or(SudokuError::InvalidCell {
                        line: line_no,
                        cell: i + 1,
                        ch,
                        size: n,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let board = values.chunks(n).map(<[usize]>::to_vec).collect();
        Ok(Self {
            board: Board::new(board),
            size,
        })
    }

    /// Compiles the puzzle to CNF:
    /// - every cell holds at least one value;
    /// - no value appears twice in a row, a column or a block (one binary
    ///   clause per pair of cells);
    /// - every given is a unit clause.
    ///
    /// Together these force exactly one value per cell.
    #[must_use]
    pub fn to_cnf(&self) -> Cnf {
        let n = usize::from(self.size);
        let b = self.size.block_size();
        let var = |row, col, value| Cell::new(row, col, value).encode(self.size);
        let mut clauses: Vec<Vec<i32>> = Vec::new();

        for (row, col) in (1..=n).cartesian_product(1..=n) {
            clauses.push((1..=n).map(|value| var(row, col, value)).collect());
        }

        let rows = (1..=n).map(|r| (1..=n).map(|c| (r, c)).collect_vec());
        let cols = (1..=n).map(|c| (1..=n).map(|r| (r, c)).collect_vec());
        let blocks = (0..b).cartesian_product(0..b).map(|(br, bc)| {
            (1..=b)
                .cartesian_product(1..=b)
                .map(|(r, c)| (br * b + r, bc * b + c))
                .collect_vec()
        });

        for group in rows.chain(cols).chain(blocks) {
            for value in 1..=n {
                for (&(r1, c1), &(r2, c2)) in group.iter().tuple_combinations() {
                    clauses.push(vec![-var(r1, c1, value), -var(r2, c2, value)]);
                }
            }
        }

        for (row, col) in (1..=n).cartesian_product(1..=n) {
            let value = self.board.get(row, col);
            if value != 0 {
                clauses.push(vec![var(row, col, value)]);
            }
        }

        Cnf::new(clauses)
    }

    /// Reads the grid back from a model of [`Sudoku::to_cnf`].
    #[must_use]
    pub fn decode(&self, solutions: &Solutions) -> Self {
        let n = usize::from(self.size);
        let board = (1..=n)
            .map(|row| {
                (1..=n)
                    .map(|col| {
                        (1..=n)
                            .find(|&value| solutions.check(Cell::new(row, col, value).encode(self.size)))
                            .unwrap_or(0)
                    })
                    .collect()
            })
            .collect();

        Self {
            board: Board::new(board),
            size: self.size,
        }
    }

    /// `true` if every cell is filled and no row, column or block repeats
    /// a value.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        fn full(n: usize, mut cells: impl Iterator<Item = usize>) -> bool {
            let mut seen = vec![false; n + 1];
            cells.all(|v| v != 0 && v <= n && !std::mem::replace(&mut seen[v], true))
        }

        let n = usize::from(self.size);
        let b = self.size.block_size();
        (1..=n).all(|r| full(n, (1..=n).map(|c| self.board.get(r, c))))
            && (1..=n).all(|c| full(n, (1..=n).map(|r| self.board.get(r, c))))
            && (0..b).cartesian_product(0..b).all(|(br, bc)| {
                full(
                    n,
                    (1..=b)
                        .cartesian_product(1..=b)
                        .map(|(r, c)| self.board.get(br * b + r, bc * b + c)),
                )
            })
    }

    /// `true` if `solution` keeps every given of this puzzle.
    #[must_use]
    pub fn is_completed_by(&self, solution: &Self) -> bool {
        let n = usize::from(self.size);
        self.size == solution.size
            && (1..=n).cartesian_product(1..=n).all(|(r, c)| {
                let given = self.board.get(r, c);
                given == 0 || given == solution.board.get(r, c)
            })
    }

    /// The puzzle in the single-line input format.
    #[must_use]
    pub fn to_line(&self) -> String {
        self.board
            .rows()
            .flat_map(|r| r.iter().map(|&v| value_to_char(v)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.board.rows()
    }
}

impl TryFrom<Board> for Sudoku {
    type Error = SudokuError;

    fn try_from(board: Board) -> Result<Self, Self::Error> {
        Self::new(board)
    }
}

impl From<Sudoku> for Board {
    fn from(sudoku: Sudoku) -> Self {
        sudoku.board
    }
}

impl fmt::Display for Sudoku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.board.rows() {
            writeln!(f, "{}", row.iter().map(|&v| value_to_char(v)).join(" "))?;
        }
        Ok(())
    }
}

/// Parses every non-blank line of `text` as one puzzle.
///
/// # Errors
///
/// The first malformed line, see [`Sudoku::parse_line`].
pub fn parse_sudokus(text: &str) -> Result<Vec<Sudoku>, SudokuError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| Sudoku::parse_line(line, i + 1))
        .collect()
}

/// Reads a puzzle file, one puzzle per line.
///
/// # Errors
///
/// [`SudokuError::Io`] if the file cannot be read, otherwise as
/// [`parse_sudokus`].
pub fn parse_sudoku_file<P: AsRef<Path>>(path: P) -> Result<Vec<Sudoku>, SudokuError> {
    parse_sudokus(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::dpll::Dpll;
    use crate::sat::variable_selection::Heuristic;

    const NINE_SOLUTION: [&str; 9] = [
        "534678912",
        "672195348",
        "198342567",
        "859761423",
        "426853791",
        "713924856",
        "961537284",
        "287419635",
        "345286179",
    ];

    fn solve(sudoku: &Sudoku, heuristic: Heuristic) -> Sudoku {
        let cnf = sudoku.to_cnf();
        let mut solver = Dpll::new(&cnf, heuristic);
        let model = solver.solve().unwrap().expect("puzzle should be satisfiable");
        assert!(cnf.verify(&model));
        sudoku.decode(&model)
    }

    #[test]
    fn test_encode() {
        assert_eq!(Cell::new(1, 1, 1).encode(Size::Nine), 1);
        assert_eq!(Cell::new(1, 1, 9).encode(Size::Nine), 9);
        assert_eq!(Cell::new(1, 2, 1).encode(Size::Nine), 10);
        assert_eq!(Cell::new(2, 1, 1).encode(Size::Nine), 82);
        assert_eq!(Cell::new(9, 9, 9).encode(Size::Nine), 729);
        assert_eq!(Cell::new(4, 4, 4).encode(Size::Four), 64);
    }

    #[test]
    fn test_cnf_shape() {
        let sudoku = Sudoku::new(Board::from(EXAMPLE_FOUR)).unwrap();
        let cnf = sudoku.to_cnf();

        // 16 cells, 3 groups * 4 units * 4 values * 6 pairs, 12 givens.
        assert_eq!(cnf.len(), 16 + 3 * 4 * 4 * 6 + 12);
        assert_eq!(cnf.num_vars(), Size::Four.num_variables() + 1);
        assert!(cnf.iter().any(|c| c.to_i32s() == vec![Cell::new(1, 2, 2).encode(Size::Four)]));
    }

    #[test]
    fn test_solve_four_all_heuristics() {
        let sudoku = Sudoku::parse_line("0234301221034320", 1).unwrap();
        for h in Heuristic::ALL {
            let solved = solve(&sudoku, h);
            assert_eq!(solved.to_line(), "1234341221434321", "{h}");
            assert!(solved.is_solved());
            assert!(sudoku.is_completed_by(&solved));
        }
    }

    #[test]
    fn test_solve_nine_all_heuristics() {
        let sudoku = Sudoku::new(Board::from(EXAMPLE_NINE)).unwrap();
        for h in Heuristic::ALL {
            let solved = solve(&sudoku, h);
            assert_eq!(solved.to_line(), NINE_SOLUTION.concat(), "{h}");
        }
    }

    #[test]
    fn test_conflicting_givens() {
        let sudoku = Sudoku::parse_line("11..............", 1).unwrap();
        let mut solver = Dpll::new(&sudoku.to_cnf(), Heuristic::JeroslowWang);
        assert!(solver.solve().unwrap().is_none());
    }

    #[test]
    fn test_parse_line_formats() {
        let dots = Sudoku::parse_line(".234301221034320", 1).unwrap();
        let zeros = Sudoku::parse_line("0234301221034320\n", 1).unwrap();
        assert_eq!(dots, zeros);
        assert_eq!(dots.size, Size::Four);
        assert_eq!(dots.board.get(1, 2), 2);
        assert_eq!(dots.to_line(), ".2343.1221.3432.");

        let big = format!("G{}", ".".repeat(255));
        let sixteen = Sudoku::parse_line(&big, 1).unwrap();
        assert_eq!(sixteen.size, Size::Sixteen);
        assert_eq!(sixteen.board.get(1, 1), 16);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(matches!(
            Sudoku::parse_line("12345", 3),
            Err(SudokuError::InvalidLength { line: 3, len: 5 })
        ));
        assert!(matches!(
            Sudoku::parse_line("5234301221034320", 1),
            Err(SudokuError::InvalidCell { cell: 1, ch: '5', .. })
        ));
        assert!(matches!(
            Sudoku::parse_line("x234301221034320", 1),
            Err(SudokuError::InvalidCell { ch: 'x', .. })
        ));
    }

    #[test]
    fn test_parse_many() {
        let text = "0234301221034320\n\n1234341221434321\n";
        let puzzles = parse_sudokus(text).unwrap();
        assert_eq!(puzzles.len(), 2);
        assert!(puzzles[1].is_solved());
        assert!(!puzzles[0].is_solved());
    }

    #[test]
    fn test_repeated_block_value_is_not_solved() {
        let latin = Sudoku::parse_line("1234214334124321", 1).unwrap();
        assert!(!latin.is_solved());
    }

    #[test]
    fn test_board_validation() {
        assert!(matches!(
            Sudoku::new(Board::from([[1, 2, 3], [0, 0, 0], [0, 0, 0]])),
            Err(SudokuError::InvalidSize(3))
        ));
        assert!(matches!(
            Sudoku::new(Board::from([[0, 0, 0, 7], [0; 4], [0; 4], [0; 4]])),
            Err(SudokuError::InvalidValue { row: 1, col: 4, value: 7, .. })
        ));
    }

    #[test]
    fn test_display() {
        let sudoku = Sudoku::new(Board::from(EXAMPLE_FOUR)).unwrap();
        assert_eq!(sudoku.to_string(), ". 2 3 4\n3 . 1 2\n2 1 . 3\n4 3 2 .\n");
    }
}
