#![allow(clippy::cast_precision_loss)]

use clap::{ArgAction, Args, Parser, Subcommand};
use dpll_sat::benchmark::{self, BenchConfig, BenchError, Instance};
use dpll_sat::sat::cnf::Cnf;
use dpll_sat::sat::dimacs::{DimacsError, parse_dimacs, parse_file, write_dimacs};
use dpll_sat::sat::dpll::Dpll;
use dpll_sat::sat::error::SolveError;
use dpll_sat::sat::solver::{SolutionStats, Solutions};
use dpll_sat::sat::variable_selection::Heuristic;
use dpll_sat::sudoku::solver::{SudokuError, parse_sudoku_file};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tikv_jemalloc_ctl::{epoch, stats};

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Dimacs(#[from] DimacsError),

    #[error(transparent)]
    Sudoku(#[from] SudokuError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    Bench(#[from] BenchError),

    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("{0}: model does not satisfy the formula")]
    Verification(String),

    #[error("failed to scan {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("{0} is neither a file nor a directory")]
    NotFound(PathBuf),

    #[error("no command given, see --help")]
    NoCommand,
}

/// Command-line interface of the DPLL solver.
#[derive(Parser, Debug)]
#[command(
    name = "dpll",
    version,
    about = "A DPLL SAT solver with pluggable branching heuristics",
    args_conflicts_with_subcommands = true
)]
pub(crate) struct Cli {
    /// A DIMACS `.cnf` file, a `.sudoku` puzzle file, or a directory of
    /// either, solved when no subcommand is given.
    pub path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula given inline, e.g. "1 -2 0 2 3 0".
    Text {
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every puzzle of a Sudoku file (one puzzle per line).
    Sudoku {
        #[arg(long)]
        path: PathBuf,

        /// Also write each generated CNF next to the puzzle file.
        #[arg(short, long, default_value_t = false)]
        export_dimacs: bool,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Time every heuristic on a Sudoku file or a directory of `.cnf` files.
    Bench {
        #[arg(long)]
        path: PathBuf,

        /// Heuristics to compare, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = Heuristic::ALL.to_vec())]
        heuristics: Vec<Heuristic>,

        /// CSV destination; standard output when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (default: one per core).
        #[arg(short, long)]
        workers: Option<usize>,

        /// VSIDS decay factor.
        #[arg(long)]
        decay: Option<f64>,

        #[arg(short, long, default_value_t = false)]
        debug: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    pub(crate) const fn debug(&self) -> bool {
        match self {
            Self::File { common, .. } | Self::Text { common, .. } | Self::Sudoku { common, .. } => {
                common.debug
            }
            Self::Bench { debug, .. } => *debug,
            Self::Completions { .. } => false,
        }
    }
}

/// Options shared by every solving command.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Log every decision and backtrack.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check the model against the input formula.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) verify: bool,

    /// Print the statistics table.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the satisfying assignment.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Branching heuristic: 0/first, 1/jw or 2/vsids.
    #[arg(long, default_value_t = Heuristic::Vsids)]
    pub(crate) heuristic: Heuristic,

    /// VSIDS decay factor in (0, 1).
    #[arg(long)]
    pub(crate) decay: Option<f64>,

    /// Write a satisfying model to this file in DIMACS form, one unit
    /// clause per variable.
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            debug: false,
            verify: true,
            stats: true,
            print_solution: false,
            heuristic: Heuristic::default(),
            decay: None,
            output: None,
        }
    }
}

/// Result of one solver run as the CLI reports it.
#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub solutions: Option<Solutions>,
    pub elapsed: Duration,
    pub stats: SolutionStats,
}

/// Runs the solver on `cnf` with the configured heuristic.
///
/// # Errors
///
/// An invalid decay, a broken solver invariant, or a model that fails
/// verification when `common.verify` is set.
pub(crate) fn solve(cnf: &Cnf, common: &CommonOptions, label: &str) -> Result<Outcome, CliError> {
    info!(
        "{label}: {} variables, {} clauses, heuristic {}",
        cnf.num_vars().saturating_sub(1),
        cnf.len(),
        common.heuristic
    );

    let time = Instant::now();
    let mut solver = Dpll::with_config(cnf, common.heuristic, common.decay)?;
    let solutions = solver.solve()?;
    let elapsed = time.elapsed();

    if common.verify {
        if let Some(model) = &solutions {
            if !cnf.verify(model) {
                return Err(CliError::Verification(label.to_string()));
            }
            info!("{label}: model verified");
        }
    }

    Ok(Outcome {
        solutions,
        elapsed,
        stats: solver.stats(),
    })
}

/// Allocated and resident memory in MiB, if jemalloc can report them.
fn memory_mib() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::read().ok()?;
    let resident = stats::resident::read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Writes `model` as a DIMACS formula of unit clauses, ascending by
/// variable.
fn write_model(path: &Path, model: &Solutions) -> Result<(), CliError> {
    let units: Cnf = model.literals().into_iter().map(|lit| [lit]).collect();
    write_cnf(path, &units)
}

/// Solves `cnf` and prints the verdict plus, as configured, the statistics
/// table and the model. A SAT model is also written to `model_path`.
///
/// # Errors
///
/// See [`solve`], plus a model file that cannot be written.
pub(crate) fn solve_and_report(
    cnf: &Cnf,
    common: &CommonOptions,
    label: &str,
    parse_time: Duration,
    model_path: Option<&Path>,
) -> Result<Outcome, CliError> {
    println!("Solving: {label}");
    let outcome = solve(cnf, common, label)?;

    if common.stats {
        print_stats(parse_time, cnf, common.heuristic, &outcome);
    }
    if common.print_solution {
        if let Some(model) = &outcome.solutions {
            println!("v {model} 0");
        }
    }
    if let (Some(out), Some(model)) = (model_path, &outcome.solutions) {
        write_model(out, model)?;
        println!("Model written to: {}", out.display());
    }
    println!(
        "{}",
        if outcome.solutions.is_some() {
            "SATISFIABLE"
        } else {
            "UNSATISFIABLE"
        }
    );

    Ok(outcome)
}

pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

pub(crate) fn print_stats(
    parse_time: Duration,
    cnf: &Cnf,
    heuristic: Heuristic,
    outcome: &Outcome,
) {
    let s = &outcome.stats;
    let elapsed = outcome.elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.variables().len());
    stat_line("Clauses", cnf.len());
    stat_line("Literals", cnf.num_literals());

    println!("========================[ Search Statistics ]========================");
    stat_line("Heuristic", heuristic);
    stat_line_with_rate("Decisions", s.decisions, elapsed);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed);
    stat_line_with_rate("Propagations", s.propagations, elapsed);
    stat_line_with_rate("Pure literals", s.pure_literals, elapsed);
    stat_line("Max depth", s.max_depth);
    match memory_mib() {
        Some((allocated, resident)) => {
            stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
            stat_line("Resident memory (MiB)", format!("{resident:.2}"));
        }
        None => stat_line("Memory usage (MiB)", "n/a"),
    }
    stat_line("CPU time (s)", format!("{elapsed:.3}"));
    println!("=====================================================================");
}

/// Solves a DIMACS file.
///
/// # Errors
///
/// Unreadable or malformed input, or see [`solve`].
pub(crate) fn solve_file(path: &Path, common: &CommonOptions) -> Result<Outcome, CliError> {
    let time = Instant::now();
    let cnf = parse_file(path)?;
    let parse_time = time.elapsed();
    solve_and_report(
        &cnf,
        common,
        &path.display().to_string(),
        parse_time,
        common.output.as_deref(),
    )
}

/// Solves a formula written inline in DIMACS clause syntax.
///
/// # Errors
///
/// Malformed input, or see [`solve`].
pub(crate) fn solve_text(input: &str, common: &CommonOptions) -> Result<Outcome, CliError> {
    let time = Instant::now();
    let cnf = parse_dimacs(input.as_bytes())?;
    let parse_time = time.elapsed();
    solve_and_report(&cnf, common, "<text>", parse_time, common.output.as_deref())
}

fn write_cnf(path: &Path, cnf: &Cnf) -> Result<(), CliError> {
    let io_err = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    write_dimacs(BufWriter::new(file), cnf).map_err(io_err)
}

/// Solves every puzzle in a Sudoku file and prints the filled grids.
///
/// # Errors
///
/// Unreadable or malformed puzzles, a failed export, or see [`solve`].
pub(crate) fn solve_sudoku(
    path: &Path,
    export_dimacs: bool,
    common: &CommonOptions,
) -> Result<(), CliError> {
    let time = Instant::now();
    let puzzles = parse_sudoku_file(path)?;
    let parse_time = time.elapsed();

    for (i, sudoku) in puzzles.iter().enumerate() {
        let label = format!("{} #{}", path.display(), i + 1);
        println!("Puzzle {}:\n{sudoku}", i + 1);
        let cnf = sudoku.to_cnf();

        if export_dimacs {
            let dimacs_path = if puzzles.len() == 1 {
                PathBuf::from(format!("{}.cnf", path.display()))
            } else {
                PathBuf::from(format!("{}.{}.cnf", path.display(), i + 1))
            };
            write_cnf(&dimacs_path, &cnf)?;
            println!("DIMACS written to: {}", dimacs_path.display());
        }

        let model_path = common.output.as_ref().map(|out| {
            if puzzles.len() == 1 {
                out.clone()
            } else {
                PathBuf::from(format!("{}.{}", out.display(), i + 1))
            }
        });
        let outcome = solve_and_report(&cnf, common, &label, parse_time, model_path.as_deref())?;
        match &outcome.solutions {
            Some(model) => println!("Solution:\n{}", sudoku.decode(model)),
            None => println!("No solution found"),
        }
    }
    Ok(())
}

fn is_sudoku_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "sudoku")
}

/// Solves every `.cnf` and `.sudoku` file under `path`. Models are not
/// written to `--output` here, since every file would overwrite it.
///
/// # Errors
///
/// The first entry that cannot be read, or file that fails to parse or
/// solve.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), CliError> {
    if let Some(out) = &common.output {
        warn!("ignoring --output {} for a directory", out.display());
    }
    let common = &CommonOptions {
        output: None,
        ..common.clone()
    };

    for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|source| CliError::Walk {
            path: path.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_path = entry.path();
        if is_sudoku_file(file_path) {
            solve_sudoku(file_path, false, common)?;
        } else if file_path.extension().is_some_and(|ext| ext == "cnf") {
            solve_file(file_path, common)?;
        } else {
            warn!("skipping {}", file_path.display());
        }
    }
    Ok(())
}

/// Solves whatever `path` points at.
///
/// # Errors
///
/// See [`solve_dir`], [`solve_sudoku`] and [`solve_file`].
pub(crate) fn solve_path(path: &Path, common: &CommonOptions) -> Result<(), CliError> {
    if path.is_dir() {
        solve_dir(path, common)
    } else if !path.is_file() {
        Err(CliError::NotFound(path.to_path_buf()))
    } else if is_sudoku_file(path) {
        solve_sudoku(path, false, common)
    } else {
        solve_file(path, common).map(|_| ())
    }
}

/// Benchmarks `heuristics` on the puzzles of a Sudoku file, or on every
/// `.cnf` file of a directory, and writes the CSV table.
///
/// # Errors
///
/// Unreadable input, an invalid decay, or a failed write.
pub(crate) fn run_bench(
    path: &Path,
    heuristics: &[Heuristic],
    output: Option<&Path>,
    workers: Option<usize>,
    decay: Option<f64>,
) -> Result<(), CliError> {
    let instances: Vec<Instance> = if path.is_dir() {
        benchmark::cnf_instances(path)?
    } else {
        benchmark::sudoku_instances(&parse_sudoku_file(path)?)
    };

    let records = benchmark::run(&instances, heuristics, decay, BenchConfig { workers })?;

    match output {
        Some(out) => {
            let io_err = |source| CliError::Io {
                path: out.to_path_buf(),
                source,
            };
            let file = File::create(out).map_err(io_err)?;
            benchmark::write_csv(BufWriter::new(file), &records).map_err(io_err)?;
            println!("Results written to: {}", out.display());
        }
        None => benchmark::write_csv(io::stdout().lock(), &records).map_err(|source| {
            CliError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            }
        })?,
    }

    for s in benchmark::summarise(&records) {
        eprintln!(
            "{:<6} runs {:>5}  mean {:>10.4}s  mean branches {:>10.1}  errors {}",
            s.heuristic,
            s.runs,
            s.mean_time.as_secs_f64(),
            s.mean_branches,
            s.errors
        );
    }
    Ok(())
}
