#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Benchmark harness: solves every instance with every requested heuristic
//! in parallel and records wall-clock time and branch counts.
//!
//! Jobs share nothing. Each builds its own solver from its own copy of the
//! instance, so the only cross-thread traffic is the records coming back.

use crate::sat::cnf::Cnf;
use crate::sat::dimacs::{DimacsError, parse_file};
use crate::sat::dpll::Dpll;
use crate::sat::error::SolveError;
use crate::sat::variable_selection::Heuristic;
use crate::sudoku::solver::Sudoku;
use itertools::Itertools;
use log::{error, info};
use rayon::prelude::*;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::WalkDir;

pub const CSV_HEADER: &str = "Heuristic,Sudoku,Time,Branching Frequency,Result";

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to scan {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("{path}: {source}")]
    Dimacs { path: PathBuf, source: DimacsError },

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// One formula to benchmark, with the label it gets in the results.
#[derive(Debug, Clone)]
pub struct Instance {
    pub label: String,
    pub cnf: Cnf,
}

impl Instance {
    pub fn new(label: impl Into<String>, cnf: Cnf) -> Self {
        Self {
            label: label.into(),
            cnf,
        }
    }
}

/// Numbers puzzles from 1 in file order.
#[must_use]
pub fn sudoku_instances(puzzles: &[Sudoku]) -> Vec<Instance> {
    puzzles
        .iter()
        .enumerate()
        .map(|(i, p)| Instance::new((i + 1).to_string(), p.to_cnf()))
        .collect()
}

/// Loads every `.cnf` file under `dir`, sorted by path.
///
/// # Errors
///
/// The first directory entry that cannot be read or file that does not
/// parse.
pub fn cnf_instances(dir: &Path) -> Result<Vec<Instance>, BenchError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| BenchError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "cnf") {
            paths.push(path.to_path_buf());
        }
    }
    info!("found {} .cnf files under {}", paths.len(), dir.display());

    paths
        .into_iter()
        .map(|path| {
            let cnf = parse_file(&path).map_err(|source| BenchError::Dimacs {
                path: path.clone(),
                source,
            })?;
            let label = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .display()
                .to_string();
            Ok(Instance::new(label, cnf))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Sat,
    Unsat,
    /// The solve aborted, or returned a model that fails verification.
    Error,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sat => "SAT",
            Self::Unsat => "UNSAT",
            Self::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub heuristic: Heuristic,
    pub instance: String,
    pub time: Duration,
    pub branches: usize,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BenchConfig {
    /// Worker threads; `None` uses rayon's default.
    pub workers: Option<usize>,
}

fn run_job(instance: &Instance, heuristic: Heuristic, decay: Option<f64>) -> Record {
    let start = Instant::now();
    let outcome = Dpll::with_config(&instance.cnf, heuristic, decay).and_then(|mut solver| {
        let result = solver.solve()?;
        Ok((result, solver.branch_count()))
    });
    let time = start.elapsed();

    let (verdict, branches) = match outcome {
        Ok((Some(model), branches)) if instance.cnf.verify(&model) => (Verdict::Sat, branches),
        Ok((Some(_), branches)) => {
            error!("{heuristic} on {}: model fails verification", instance.label);
            (Verdict::Error, branches)
        }
        Ok((None, branches)) => (Verdict::Unsat, branches),
        Err(e) => {
            error!("{heuristic} on {}: {e}", instance.label);
            (Verdict::Error, 0)
        }
    };

    info!(
        "{heuristic} on {}: {verdict} in {:.3}s, {branches} branches",
        instance.label,
        time.as_secs_f64()
    );

    Record {
        heuristic,
        instance: instance.label.clone(),
        time,
        branches,
        verdict,
    }
}

/// Runs every instance against every heuristic. Records come back grouped
/// by instance, in the order the jobs were listed.
///
/// # Errors
///
/// An invalid `decay`, or a worker pool that cannot be built.
pub fn run(
    instances: &[Instance],
    heuristics: &[Heuristic],
    decay: Option<f64>,
    config: BenchConfig,
) -> Result<Vec<Record>, BenchError> {
    Heuristic::Vsids.to_impl(decay)?;

    let jobs = instances
        .iter()
        .cartesian_product(heuristics.iter().copied())
        .collect_vec();
    info!(
        "running {} jobs ({} instances x {} heuristics)",
        jobs.len(),
        instances.len(),
        heuristics.len()
    );

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(workers) = config.workers {
        builder = builder.num_threads(workers);
    }
    let pool = builder.build()?;

    Ok(pool.install(|| {
        jobs.par_iter()
            .map(|&(instance, heuristic)| run_job(instance, heuristic, decay))
            .collect()
    }))
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes the records as CSV, one row per job, time in seconds.
///
/// # Errors
///
/// Whatever the writer reports.
pub fn write_csv<W: Write>(mut writer: W, records: &[Record]) -> io::Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;
    for r in records {
        writeln!(
            writer,
            "{},{},{:.6},{},{}",
            r.heuristic.id(),
            csv_field(&r.instance),
            r.time.as_secs_f64(),
            r.branches,
            r.verdict
        )?;
    }
    writer.flush()
}

/// Per-heuristic aggregate over a set of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub heuristic: Heuristic,
    pub runs: usize,
    pub mean_time: Duration,
    pub mean_branches: f64,
    pub errors: usize,
}

#[must_use]
pub fn summarise(records: &[Record]) -> Vec<Summary> {
    records
        .iter()
        .into_group_map_by(|r| r.heuristic)
        .into_iter()
        .sorted_by_key(|(h, _)| *h)
        .map(|(heuristic, group)| {
            let runs = group.len();
            let total: Duration = group.iter().map(|r| r.time).sum();
            #[allow(clippy::cast_precision_loss)]
            let mean_branches =
                group.iter().map(|r| r.branches).sum::<usize>() as f64 / runs as f64;
            Summary {
                heuristic,
                runs,
                mean_time: total / u32::try_from(runs).unwrap_or(u32::MAX),
                mean_branches,
                errors: group.iter().filter(|r| r.verdict == Verdict::Error).count(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sudoku::solver::parse_sudokus;
    use std::fs;

    fn records_for(puzzles: &str, workers: Option<usize>) -> Vec<Record> {
        let puzzles = parse_sudokus(puzzles).unwrap();
        let instances = sudoku_instances(&puzzles);
        run(&instances, &Heuristic::ALL, None, BenchConfig { workers }).unwrap()
    }

    #[test]
    fn test_every_job_runs() {
        let records = records_for("0234301221034320\n11..............\n", Some(2));
        assert_eq!(records.len(), 6);

        let order = records
            .iter()
            .map(|r| (r.instance.as_str(), r.heuristic))
            .collect_vec();
        assert_eq!(order[0], ("1", Heuristic::FirstUnassigned));
        assert_eq!(order[5], ("2", Heuristic::Vsids));

        for r in &records {
            let expected = if r.instance == "1" {
                Verdict::Sat
            } else {
                Verdict::Unsat
            };
            assert_eq!(r.verdict, expected);
        }
    }

    #[test]
    fn test_invalid_decay_is_rejected() {
        let instances = vec![Instance::new("x", Cnf::new(vec![vec![1]]))];
        assert!(matches!(
            run(&instances, &[Heuristic::Vsids], Some(1.5), BenchConfig::default()),
            Err(BenchError::Solve(SolveError::InvalidDecay(_)))
        ));
    }

    #[test]
    fn test_csv_output() {
        let records = vec![
            Record {
                heuristic: Heuristic::JeroslowWang,
                instance: "3".to_string(),
                time: Duration::from_millis(1500),
                branches: 42,
                verdict: Verdict::Sat,
            },
            Record {
                heuristic: Heuristic::Vsids,
                instance: "a,b".to_string(),
                time: Duration::ZERO,
                branches: 0,
                verdict: Verdict::Unsat,
            },
        ];
        let mut out = Vec::new();
        write_csv(&mut out, &records).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Heuristic,Sudoku,Time,Branching Frequency,Result\n\
             1,3,1.500000,42,SAT\n\
             2,\"a,b\",0.000000,0,UNSAT\n"
        );
    }

    #[test]
    fn test_summarise() {
        let records = records_for("0234301221034320\n", None);
        let summary = summarise(&records);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].heuristic, Heuristic::FirstUnassigned);
        assert!(summary.iter().all(|s| s.runs == 1 && s.errors == 0));
    }

    #[test]
    fn test_cnf_instances_from_directory() {
        let dir = std::env::temp_dir().join(format!("dpll-bench-{}", std::process::id()));
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("a.cnf"), "p cnf 1 1\n1 0\n").unwrap();
        fs::write(dir.join("nested").join("b.cnf"), "1 0\n-1 0\n").unwrap();
        fs::write(dir.join("notes.txt"), "not a formula").unwrap();

        let instances = cnf_instances(&dir).unwrap();
        let labels = instances.iter().map(|i| i.label.clone()).collect_vec();
        let records = run(&instances, &[Heuristic::JeroslowWang], None, BenchConfig::default());
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], "a.cnf");
        let verdicts = records.unwrap().iter().map(|r| r.verdict).collect_vec();
        assert_eq!(verdicts, vec![Verdict::Sat, Verdict::Unsat]);
    }
}
