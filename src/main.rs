use std::{env::args, io::stdout, path::PathBuf};

use pretty_env_logger::formatted_builder;
use rand::{rngs::StdRng, SeedableRng};
use sat_classics::{
    bench::{self, BenchConfig},
    generator::random_k_cnf,
    parser::{self, parse_file, write_dimacs},
    prelude::*,
    report::Report,
    solver::{ConflictPolicy, Engine, EngineOptions},
};

fn usage_string() -> String {
    format!(
        "Usage: {0} <solver_name> check <file_name> [options]
       {0} bench [--output <file>] [--resolution-threshold <n>] [--manual-cases <bool>] [options] <label>=<dir>...
       {0} generate <num_variables> <num_clauses> [--width <k>] [--seed <n>]

solver_name: resolution, dp, dpll, cdcl

options:
    --max-steps <n>      resolution round limit (default 1000)
    --max-clauses <n>    resolution clause limit (default 10000)
    --policy <p>         cdcl conflict policy: restart, first-uip (default restart)
                         restart keeps implied values across restarts and may
                         report UNSAT for a satisfiable formula; use first-uip
                         for a sound and complete search",
        args().next().unwrap_or_else(|| "sat-classics".to_owned())
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown solver '{}'\n\n{}", name, usage_string()))]
    UnknownSolver { name: String },
    #[snafu(display("Unknown command '{}'\n\n{}", name, usage_string()))]
    UnknownCommand { name: String },
    #[snafu(display("Failed to parse CNF"))]
    ParserError { source: parser::Error },
    #[snafu(display("Benchmark failed"))]
    BenchError { source: bench::Error },
    #[snafu(display("Failed to write to stdout"))]
    OutputError { source: std::io::Error },
    #[snafu(display("Required argument does not exist\n\n{}", usage_string()))]
    MissingArgument,
    #[snafu(display("Invalid value '{}' for {}\n\n{}", value, name, usage_string()))]
    InvalidArgument { name: String, value: String },
}

/// Splits `--flag value` pairs from positional arguments.
struct Arguments {
    positional: Vec<String>,
    flags: Vec<(String, String)>,
}

impl Arguments {
    fn parse(args: Vec<String>) -> Result<Self, Error> {
        let mut positional = Vec::new();
        let mut flags = Vec::new();

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                let value = iter.next().context(MissingArgument)?;
                flags.push((name.to_owned(), value));
            } else {
                positional.push(arg);
            }
        }

        Ok(Arguments { positional, flags })
    }

    fn flag<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, Error> {
        match self.flags.iter().rev().find(|(flag, _)| flag == name) {
            Some((_, value)) => match value.parse() {
                Ok(parsed) => Ok(Some(parsed)),
                Err(_) => InvalidArgument { name, value }.fail(),
            },
            None => Ok(None),
        }
    }

    fn engine_options(&self) -> Result<EngineOptions, Error> {
        let mut options = EngineOptions::default();
        if let Some(max_steps) = self.flag("max-steps")? {
            options.resolution.max_steps = max_steps;
        }
        if let Some(max_total_clauses) = self.flag("max-clauses")? {
            options.resolution.max_total_clauses = max_total_clauses;
        }
        if let Some(policy) = self.flag::<ConflictPolicy>("policy")? {
            options.conflict_policy = policy;
        }
        Ok(options)
    }

    fn positional<T: std::str::FromStr>(&self, index: usize, name: &str) -> Result<T, Error> {
        let value = self.positional.get(index).context(MissingArgument)?;
        match value.parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => InvalidArgument { name, value }.fail(),
        }
    }
}

fn check(engine: Engine, args: Vec<String>) -> Result<(), Error> {
    let args = Arguments::parse(args)?;
    match args.positional.get(0).map(|s| s.as_str()) {
        Some("check") => {
            let path: PathBuf = args.positional(1, "file_name")?;
            let options = args.engine_options()?;
            let formula = parse_file(&path).context(ParserError)?;
            println!("{}", engine.solve(formula, &options));
        }
        Some(name) => UnknownCommand {
            name: name.to_owned(),
        }
        .fail()?,
        None => MissingArgument.fail()?,
    }

    Ok(())
}

fn run_bench(args: Vec<String>) -> Result<(), Error> {
    let args = Arguments::parse(args)?;
    let mut config = BenchConfig {
        engines: args.engine_options()?,
        ..Default::default()
    };
    if let Some(output) = args.flag("output")? {
        config.output = output;
    }
    if let Some(threshold) = args.flag("resolution-threshold")? {
        config.resolution_clause_threshold = threshold;
    }
    if let Some(manual_cases) = args.flag("manual-cases")? {
        config.manual_cases = manual_cases;
    }

    for category in &args.positional {
        let (label, dir) = match category.split_once('=') {
            Some(pair) => pair,
            None => InvalidArgument {
                name: "category",
                value: category,
            }
            .fail()?,
        };
        config
            .categories
            .push((label.to_owned(), PathBuf::from(dir)));
    }
    ensure!(!config.categories.is_empty(), MissingArgument);

    let reports = bench::run(&config).context(BenchError)?;
    println!(
        "Results for {} files saved to {}",
        reports.len(),
        config.output.display()
    );

    Ok(())
}

fn generate(args: Vec<String>) -> Result<(), Error> {
    let args = Arguments::parse(args)?;
    let num_variables: usize = args.positional(0, "num_variables")?;
    let num_clauses: usize = args.positional(1, "num_clauses")?;
    let width = args.flag("width")?.unwrap_or(3);
    let seed = args.flag("seed")?.unwrap_or(0);

    ensure!(
        width <= num_variables,
        InvalidArgument {
            name: "--width",
            value: width.to_string(),
        }
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let formula = random_k_cnf(num_variables, num_clauses, width, &mut rng);
    let stdout = stdout();
    write_dimacs(&formula, stdout.lock()).context(OutputError)?;

    Ok(())
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else if cfg!(debug_assertions) {
        builder.parse_filters("sat_classics=debug");
    } else {
        builder.parse_filters("sat_classics=warn");
    }

    builder.try_init().expect("Failed to initialize the logger");
}

fn main() -> Result<(), Report> {
    init_logger();

    let mut args = args();

    // drop arg[0]
    args.next();

    let command = args.next();
    let remaining: Vec<_> = args.collect();

    match command.as_deref() {
        Some("bench") => run_bench(remaining)?,
        Some("generate") => generate(remaining)?,
        Some(name) => match name.parse::<Engine>() {
            Ok(engine) => check(engine, remaining)?,
            Err(_) => UnknownSolver {
                name: name.to_owned(),
            }
            .fail()?,
        },
        None => {
            println!("{}", usage_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_warns_about_the_restart_policy() {
        let usage = usage_string();
        assert!(usage.contains("--policy <p>"));
        assert!(usage.contains("may\n                         report UNSAT for a satisfiable formula"));
        assert!(usage.contains("use first-uip"));
    }

    #[test]
    fn flags_are_split_from_positionals() {
        let args = Arguments::parse(
            vec!["check", "--policy", "first-uip", "a.cnf", "--max-steps", "7"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
        .unwrap();

        assert_eq!(args.positional, vec!["check", "a.cnf"]);
        let options = args.engine_options().unwrap();
        assert_eq!(options.conflict_policy, ConflictPolicy::FirstUip);
        assert_eq!(options.resolution.max_steps, 7);
        assert!(args.flag::<usize>("policy").is_err());
    }
}
