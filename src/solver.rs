use std::{fmt::Display, str::FromStr};

use crate::formula::Cnf;
use crate::prelude::*;

mod cdcl;
mod dp;
mod dpll;
mod resolution;

pub use cdcl::{CdclSolver, ConflictPolicy};
pub use dp::DpSolver;
pub use dpll::DpllSolver;
pub use resolution::{ResolutionLimits, ResolutionSolver};

/// Position of a clause inside an engine's working clause list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseIdx(usize);

impl From<usize> for ClauseIdx {
    fn from(index: usize) -> Self {
        ClauseIdx(index)
    }
}

impl From<ClauseIdx> for usize {
    fn from(index: ClauseIdx) -> Self {
        index.0
    }
}

impl Display for ClauseIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Outcome of a solve call, shared by every engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfiable,
    Unsatisfiable,
    /// A resource bound was hit before a decision was reached.
    Timeout,
    /// The solve call failed unexpectedly.
    Error(String),
}

impl Verdict {
    pub fn is_sat(&self) -> bool {
        matches!(self, Verdict::Satisfiable)
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Verdict::Unsatisfiable)
    }

    /// True for `Satisfiable` and `Unsatisfiable`.
    pub fn is_decided(&self) -> bool {
        self.is_sat() || self.is_unsat()
    }
}

impl From<bool> for Verdict {
    fn from(satisfiable: bool) -> Self {
        if satisfiable {
            Verdict::Satisfiable
        } else {
            Verdict::Unsatisfiable
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Satisfiable => write!(f, "SAT"),
            Verdict::Unsatisfiable => write!(f, "UNSAT"),
            Verdict::Timeout => write!(f, "timeout"),
            Verdict::Error(message) => write!(f, "error ({})", message),
        }
    }
}

pub trait Solver {
    /// Creates a new solver instance owning its working copy of the formula.
    fn new(formula: Cnf) -> Self;

    /// Decides the formula.
    fn solve(self) -> Verdict;
}

/// Tunables for the engines that have any.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    pub resolution: ResolutionLimits,
    pub conflict_policy: ConflictPolicy,
}

#[derive(Debug, Snafu)]
pub enum EngineParseError {
    #[snafu(display("Unknown engine '{}' (expected resolution, dp, dpll or cdcl)", name))]
    UnknownEngine { name: String },
}

/// Selects one of the four decision procedures at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Resolution,
    Dp,
    Dpll,
    Cdcl,
}

impl Engine {
    pub const ALL: [Engine; 4] = [Engine::Resolution, Engine::Dp, Engine::Dpll, Engine::Cdcl];

    pub fn solve(self, formula: Cnf, options: &EngineOptions) -> Verdict {
        match self {
            Engine::Resolution => {
                ResolutionSolver::with_limits(formula, options.resolution).solve()
            }
            Engine::Dp => DpSolver::new(formula).solve(),
            Engine::Dpll => DpllSolver::new(formula).solve(),
            Engine::Cdcl => CdclSolver::with_policy(formula, options.conflict_policy).solve(),
        }
    }
}

impl FromStr for Engine {
    type Err = EngineParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "resolution" => Ok(Engine::Resolution),
            "dp" => Ok(Engine::Dp),
            "dpll" => Ok(Engine::Dpll),
            "cdcl" => Ok(Engine::Cdcl),
            _ => UnknownEngine { name: s }.fail(),
        }
    }
}

impl Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Engine::Resolution => "Resolution",
            Engine::Dp => "DP",
            Engine::Dpll => "DPLL",
            Engine::Cdcl => "CDCL",
        };
        write!(f, "{}", name)
    }
}
