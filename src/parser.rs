use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, Literal};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while reading CNF file '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parse a data line to a clause.
/// Returns `None` if the line is not a `0`-terminated list of literals.
fn parse_line(line: &str) -> Option<Clause> {
    let numbers = line
        .split_whitespace()
        .map(|s| s.parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    let (&last, literals) = numbers.split_last()?;
    if last != 0 {
        return None;
    }

    literals
        .iter()
        .map(|&raw| Literal::from_dimacs(raw))
        .collect::<Option<Clause>>()
}

/// Parses a DIMACS-like CNF text.
///
/// Comment and problem lines are skipped and a `%` line ends the data. The
/// problem line is not checked against the clauses found; malformed data
/// lines are dropped with a warning.
pub fn parse_str(text: &str) -> Cnf {
    let mut cnf = Cnf::new(0);

    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('%') {
            // SATLIB end-of-data marker, usually followed by a stray `0`
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with('c') || trimmed.starts_with('p') {
            continue;
        }

        match parse_line(trimmed) {
            Some(clause) => cnf.add_clause(clause),
            None => warn!("Skipping malformed line {}: '{}'", number + 1, trimmed),
        }
    }

    cnf
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).context(IoError {
        path: path.to_owned(),
    })?;

    let cnf = parse_str(&text);
    debug!(
        "Parsed '{}': {} variables, {} clauses",
        path.display(),
        cnf.num_variables(),
        cnf.num_clauses()
    );

    Ok(cnf)
}

/// Writes the formula in DIMACS CNF format.
pub fn write_dimacs<W: Write>(cnf: &Cnf, mut out: W) -> std::io::Result<()> {
    writeln!(out, "p cnf {} {}", cnf.num_variables(), cnf.num_clauses())?;
    for clause in cnf.clauses() {
        for literal in clause.iter() {
            write!(out, "{} ", literal.to_dimacs())?;
        }
        writeln!(out, "0")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimacs(cnf: &Cnf) -> Vec<Vec<i32>> {
        cnf.clauses()
            .iter()
            .map(|clause| clause.iter().map(|literal| literal.to_dimacs()).collect())
            .collect()
    }

    #[test]
    fn skips_headers_and_stops_at_percent() {
        let cnf = parse_str("c a comment\np cnf 3 2\n1 -2 0\n  2 3 0  \n%\n0\n");
        assert_eq!(dimacs(&cnf), vec![vec![1, -2], vec![2, 3]]);
        assert_eq!(cnf.num_variables(), 3);
    }

    #[test]
    fn zero_alone_is_the_empty_clause() {
        let cnf = parse_str("p cnf 1 2\n1 0\n0\n");
        assert_eq!(dimacs(&cnf), vec![vec![1], vec![]]);
        assert!(cnf.has_empty_clause());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let cnf = parse_str("1 x 0\n1 2\n3 0 4 0\n\n-4 5 0\n");
        assert_eq!(dimacs(&cnf), vec![vec![-4, 5]]);
    }

    #[test]
    fn written_dimacs_parses_back() {
        let cnf = parse_str("1 -2 0\n-3 0\n");
        let mut out = Vec::new();
        write_dimacs(&cnf, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "p cnf 3 2\n1 -2 0\n-3 0\n");
        assert_eq!(parse_str(&text), cnf);
    }
}
