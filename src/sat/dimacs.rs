#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Reading and writing the DIMACS CNF format.
//!
//! - `c` starts a comment line.
//! - `p cnf <variables> <clauses>` is the optional problem line. Its counts
//!   are checked for shape but the formula is sized from the clauses found.
//! - Literals are signed integers; `0` ends a clause. Clauses may span lines
//!   and a line may hold several clauses. A `0` with no literals before it is
//!   an empty clause.
//! - `%` ends the data (some benchmark suites append junk after it).
//!
//! Writing goes through the `Display` impl of [`Cnf`].

use crate::sat::cnf::Cnf;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DimacsError {
    #[error("failed to read DIMACS input: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: `{token}` is not a literal")]
    InvalidLiteral { line: usize, token: String },

    #[error("line {line}: malformed problem line `{text}`")]
    InvalidHeader { line: usize, text: String },
}

/// Parses DIMACS text from `reader`.
///
/// # Errors
///
/// [`DimacsError::Io`] if reading fails, [`DimacsError::InvalidLiteral`]
/// for a token that is not an `i32` (or is `i32::MIN`, which has no
/// negation), [`DimacsError::InvalidHeader`] for a malformed `p` line.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf, DimacsError> {
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace().peekable();

        match tokens.peek() {
            None => continue,
            Some(&"%") => break,
            Some(t) if t.starts_with('c') => continue,
            Some(&"p") => {
                check_header(&line, line_no)?;
                continue;
            }
            Some(_) => {}
        }

        for token in tokens {
            let lit = token
                .parse::<i32>()
                .ok()
                .filter(|&l| l != i32::MIN)
                .ok_or_else(|| DimacsError::InvalidLiteral {
                    line: line_no,
                    token: token.to_string(),
                })?;
            if lit == 0 {
                clauses.push(std::mem::take(&mut current));
            } else {
                current.push(lit);
            }
        }
    }

    // An unterminated last clause still counts.
    if !current.is_empty() {
        clauses.push(current);
    }

    Ok(Cnf::new(clauses))
}

fn check_header(line: &str, line_no: usize) -> Result<(), DimacsError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let ok = matches!(parts.as_slice(), ["p", "cnf", vars, clauses]
        if vars.parse::<usize>().is_ok() && clauses.parse::<usize>().is_ok());
    if ok {
        Ok(())
    } else {
        Err(DimacsError::InvalidHeader {
            line: line_no,
            text: line.trim().to_string(),
        })
    }
}

/// Parses the DIMACS file at `path`.
///
/// # Errors
///
/// See [`parse_dimacs`]; opening the file can also fail with
/// [`DimacsError::Io`].
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Cnf, DimacsError> {
    let file = File::open(path)?;
    parse_dimacs(BufReader::new(file))
}

/// Writes `cnf` as DIMACS.
///
/// # Errors
///
/// Whatever the writer reports.
pub fn write_dimacs<W: Write>(mut writer: W, cnf: &Cnf) -> io::Result<()> {
    write!(writer, "{cnf}")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Cnf, DimacsError> {
        parse_dimacs(Cursor::new(text))
    }

    fn clauses(cnf: &Cnf) -> Vec<Vec<i32>> {
        cnf.iter().map(|c| c.to_i32s()).collect()
    }

    #[test]
    fn test_parse_simple() {
        let cnf = parse("c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n").unwrap();
        assert_eq!(clauses(&cnf), vec![vec![1, -2], vec![2, 3]]);
        assert_eq!(cnf.num_vars(), 4);
    }

    #[test]
    fn test_clauses_span_lines() {
        let cnf = parse("p cnf 4 3\n1 2\n-3 0 4 0\n\n-1\n 0\n").unwrap();
        assert_eq!(clauses(&cnf), vec![vec![1, 2, -3], vec![4], vec![-1]]);
    }

    #[test]
    fn test_end_marker() {
        let cnf = parse("p cnf 2 1\n1 2 0\n%\n0\nnot dimacs\n").unwrap();
        assert_eq!(clauses(&cnf), vec![vec![1, 2]]);
    }

    #[test]
    fn test_lone_zero_is_empty_clause() {
        let cnf = parse("1 0\n0\n").unwrap();
        assert_eq!(cnf.len(), 2);
        assert!(cnf.clauses()[1].is_empty());
    }

    #[test]
    fn test_missing_header_and_final_zero() {
        let cnf = parse("1 -2 0\n2").unwrap();
        assert_eq!(clauses(&cnf), vec![vec![1, -2], vec![2]]);
    }

    #[test]
    fn test_bad_literal() {
        match parse("p cnf 2 1\n1 x 0\n") {
            Err(DimacsError::InvalidLiteral { line, token }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "x");
            }
            other => panic!("expected a literal error, got {other:?}"),
        }
        assert!(parse("-2147483648 0\n").is_err());
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            parse("p dnf 2 1\n1 0\n"),
            Err(DimacsError::InvalidHeader { line: 1, .. })
        ));
        assert!(matches!(
            parse("p cnf two 1\n"),
            Err(DimacsError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_write_then_parse() {
        let cnf = Cnf::new(vec![vec![1, -3], vec![2], vec![-1, -2, 3]]);
        let mut out = Vec::new();
        write_dimacs(&mut out, &cnf).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("p cnf 3 3\n"));
        assert_eq!(parse(&text).unwrap(), cnf);
    }
}
