/*!
Benchmark harness: runs every engine over labeled directories of CNF files
and writes one result line per file and engine.
*/

use std::{
    any::Any,
    fs::File,
    io::{BufWriter, Write},
    panic::{catch_unwind, AssertUnwindSafe},
    path::{Path, PathBuf},
    time::Instant,
};

use crate::formula::Cnf;
use crate::parser::{self, parse_file};
use crate::prelude::*;
use crate::solver::{Engine, EngineOptions, Verdict};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to list directory '{}'", path.display()))]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create results file '{}'", path.display()))]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write results file '{}'", path.display()))]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read benchmark input"))]
    Parse { source: parser::Error },
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// `(label, directory)` pairs, visited in order.
    pub categories: Vec<(String, PathBuf)>,
    /// Results log, overwritten on each run.
    pub output: PathBuf,
    /// Resolution is not attempted on formulas with more clauses than this.
    pub resolution_clause_threshold: usize,
    pub engines: EngineOptions,
    /// Appends the built-in manual formulas after the file results.
    pub manual_cases: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            categories: Vec::new(),
            output: PathBuf::from("results.txt"),
            resolution_clause_threshold: 40,
            engines: EngineOptions::default(),
            manual_cases: true,
        }
    }
}

/// One engine run on one file.
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub engine: Engine,
    pub verdict: Verdict,
    pub elapsed_ms: f64,
    /// Not attempted because the formula was above the clause threshold.
    pub skipped: bool,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub label: String,
    pub file_name: String,
    pub num_clauses: usize,
    /// Empty if the file had no clauses and was skipped.
    pub runs: Vec<EngineRun>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Times `solve`. A panic becomes `Verdict::Error` with zero elapsed time.
fn timed<F>(engine: Engine, solve: F) -> EngineRun
where
    F: FnOnce() -> Verdict,
{
    let start = Instant::now();
    let result = catch_unwind(AssertUnwindSafe(solve));
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(verdict) => EngineRun {
            engine,
            verdict,
            elapsed_ms,
            skipped: false,
        },
        Err(payload) => {
            let message = panic_message(payload);
            warn!("{} failed: {}", engine, message);
            EngineRun {
                engine,
                verdict: Verdict::Error(message),
                elapsed_ms: 0.0,
                skipped: false,
            }
        }
    }
}

/// Runs one engine on a private copy of `formula`.
pub fn run_engine(engine: Engine, formula: &Cnf, options: &EngineOptions) -> EngineRun {
    let formula = formula.clone();
    timed(engine, || engine.solve(formula, options))
}

/// Runs every engine on one formula, skipping Resolution above the threshold.
pub fn run_all_engines(formula: &Cnf, config: &BenchConfig) -> Vec<EngineRun> {
    Engine::ALL
        .iter()
        .map(|&engine| {
            if engine == Engine::Resolution
                && formula.num_clauses() > config.resolution_clause_threshold
            {
                debug!(
                    "Skipping resolution on {} clauses (threshold {})",
                    formula.num_clauses(),
                    config.resolution_clause_threshold
                );
                EngineRun {
                    engine,
                    verdict: Verdict::Timeout,
                    elapsed_ms: 0.0,
                    skipped: true,
                }
            } else {
                run_engine(engine, formula, &config.engines)
            }
        })
        .collect()
}

/// `.cnf` files directly inside `dir`, sorted by name.
fn cnf_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).context(ReadDir { path: dir })? {
        let path = entry.context(ReadDir { path: dir })?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "cnf") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn write_run<W: Write>(out: &mut W, run: &EngineRun) -> std::io::Result<()> {
    let note = if run.skipped { " (too many clauses)" } else { "" };
    writeln!(
        out,
        "{}: {}{}, Time: {:.4} ms",
        run.engine, run.verdict, note, run.elapsed_ms
    )
}

fn write_report<W: Write>(out: &mut W, report: &FileReport) -> std::io::Result<()> {
    writeln!(out, "{} | File: {}", report.label, report.file_name)?;
    if report.runs.is_empty() {
        writeln!(out, "SKIPPED: No clauses found.")?;
    }
    for run in &report.runs {
        write_run(out, run)?;
    }
    writeln!(out)
}

/// Small hand-checked formulas, one satisfiable and one not.
pub fn manual_cases() -> Vec<(&'static str, Cnf)> {
    let cases: [(&'static str, &[&[i32]]); 2] = [
        (
            "Manual SAT",
            &[&[1, -2, -3], &[-1, -2, -3], &[2, 3], &[3, 4], &[3, -4]],
        ),
        (
            "Manual UNSAT",
            &[&[1, 2], &[1, -3], &[-1, 3], &[-1, -2], &[3, -2], &[-3, 2]],
        ),
    ];

    cases
        .iter()
        .filter_map(|&(label, clauses)| Some((label, Cnf::from_dimacs(clauses).ok()?)))
        .collect()
}

fn write_manual_case<W: Write>(
    out: &mut W,
    label: &str,
    formula: &Cnf,
    runs: &[EngineRun],
) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", label)?;
    writeln!(out, "Parsed {} clauses.", formula.num_clauses())?;
    for run in runs {
        write_run(out, run)?;
    }
    writeln!(out)
}

/// Benchmarks every category, then the manual formulas if enabled, and
/// writes the results log. Only the file rows are returned.
pub fn run(config: &BenchConfig) -> Result<Vec<FileReport>, Error> {
    let output = &config.output;
    let file = File::create(output).context(CreateOutput { path: output })?;
    let mut out = BufWriter::new(file);
    let mut reports = Vec::new();

    for (label, dir) in &config.categories {
        if !dir.is_dir() {
            warn!("Folder not found: {}", dir.display());
            continue;
        }

        let files = cnf_files(dir)?;
        if files.is_empty() {
            warn!("No .cnf files found in {}", dir.display());
            continue;
        }
        info!("{}: {} files in {}", label, files.len(), dir.display());

        for path in files {
            let formula = parse_file(&path).context(Parse)?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let runs = if formula.num_clauses() == 0 {
                info!("Skipping {}, no clauses found", file_name);
                Vec::new()
            } else {
                run_all_engines(&formula, config)
            };

            for run in &runs {
                info!(
                    "{} {}: {} in {:.4} ms",
                    file_name, run.engine, run.verdict, run.elapsed_ms
                );
            }

            let report = FileReport {
                label: label.clone(),
                file_name,
                num_clauses: formula.num_clauses(),
                runs,
            };
            write_report(&mut out, &report).context(WriteOutput { path: output })?;
            reports.push(report);
        }
    }

    if config.manual_cases {
        for (label, formula) in manual_cases() {
            let runs = run_all_engines(&formula, config);
            for run in &runs {
                info!(
                    "{} {}: {} in {:.4} ms",
                    label, run.engine, run.verdict, run.elapsed_ms
                );
            }
            write_manual_case(&mut out, label, &formula, &runs)
                .context(WriteOutput { path: output })?;
        }
    }

    out.flush().context(WriteOutput { path: output })?;
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panics_are_reported_inline() {
        let run = timed(Engine::Dpll, || panic!("boom"));
        assert_eq!(run.verdict, Verdict::Error("boom".to_owned()));
        assert_eq!(run.elapsed_ms, 0.0);
        assert_eq!(run.verdict.to_string(), "error (boom)");

        let run = timed(Engine::Dp, || panic!("{} clauses", 3));
        assert_eq!(run.verdict, Verdict::Error("3 clauses".to_owned()));
    }

    #[test]
    fn threshold_skips_are_told_apart_from_timeouts() {
        let formula = Cnf::from_dimacs(&[[1], [2], [3]]).unwrap();
        let config = BenchConfig {
            resolution_clause_threshold: 2,
            ..Default::default()
        };

        let runs = run_all_engines(&formula, &config);
        assert!(runs[0].skipped);
        assert!(runs[1..].iter().all(|run| !run.skipped));

        let mut out = Vec::new();
        write_run(&mut out, &runs[0]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Resolution: timeout (too many clauses), Time: 0.0000 ms\n"
        );

        let bounded = EngineRun {
            engine: Engine::Resolution,
            verdict: Verdict::Timeout,
            elapsed_ms: 1.5,
            skipped: false,
        };
        let mut out = Vec::new();
        write_run(&mut out, &bounded).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Resolution: timeout, Time: 1.5000 ms\n"
        );
    }

    #[test]
    fn manual_cases_have_known_verdicts() {
        let cases = manual_cases();
        assert_eq!(cases.len(), 2);
        for (label, formula) in &cases {
            let expected = if *label == "Manual SAT" {
                Verdict::Satisfiable
            } else {
                Verdict::Unsatisfiable
            };
            let runs = run_all_engines(formula, &BenchConfig::default());
            assert!(runs.iter().all(|run| run.verdict == expected), "{}", label);
        }
    }
}
