//! # dpll
//!
//! Command-line front end of the DPLL solver.
//!
//! ```sh
//! dpll problem.cnf                                  # solve a DIMACS file
//! dpll file --path problem.cnf --heuristic jw       # pick a heuristic
//! dpll text --input "1 -2 0 2 0"                    # inline clauses
//! dpll sudoku --path puzzles.sudoku --export-dimacs # one puzzle per line
//! dpll bench --path puzzles.sudoku -o results.csv   # compare heuristics
//! dpll completions zsh
//! ```
//!
//! Logging goes through `env_logger`: `--debug` lowers the default level to
//! `debug`, and `RUST_LOG` overrides either default.

mod command_line;

use clap::{CommandFactory, Parser};
use command_line::cli::{
    Cli, CliError, Commands, run_bench, solve_file, solve_path, solve_sudoku, solve_text,
};
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Some(Commands::File { path, common }) => solve_file(&path, &common).map(|_| ()),
        Some(Commands::Text { input, common }) => solve_text(&input, &common).map(|_| ()),
        Some(Commands::Sudoku {
            path,
            export_dimacs,
            common,
        }) => solve_sudoku(&path, export_dimacs, &common),
        Some(Commands::Bench {
            path,
            heuristics,
            output,
            workers,
            decay,
            ..
        }) => run_bench(&path, &heuristics, output.as_deref(), workers, decay),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        None => match cli.path {
            Some(path) => solve_path(&path, &cli.common),
            None => Err(CliError::NoCommand),
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.common.debug || cli.command.as_ref().is_some_and(Commands::debug));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
