use std::{fmt::Display, str::FromStr};

use typed_index_collections::TiVec;

use crate::formula::{Clause, Cnf, Model, Variable};
use crate::prelude::*;

use self::conflict::{ConflictAnalyzer, ConflictDataProvider};
use self::tracker::{ClauseStatus, Tracker};

use super::{ClauseIdx, Solver, Verdict};

mod conflict;
mod tracker;

/// What the search does with a conflict found above decision level 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Learn the conflicting clause as it is and restart from level 0.
    ///
    /// Implied assignments are kept at level 0, so they survive the
    /// restart. This makes every restart progress, but the kept
    /// implications may depend on retracted decisions: a satisfiable
    /// formula can be reported unsatisfiable.
    Restart,
    /// Learn the first-UIP clause and backjump to the second highest level
    /// in it.
    FirstUip,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::Restart
    }
}

#[derive(Debug, Snafu)]
pub enum PolicyParseError {
    #[snafu(display("Unknown conflict policy '{}' (expected restart or first-uip)", name))]
    UnknownPolicy { name: String },
}

impl FromStr for ConflictPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "restart" => Ok(ConflictPolicy::Restart),
            "first-uip" | "uip" => Ok(ConflictPolicy::FirstUip),
            _ => UnknownPolicy { name: s }.fail(),
        }
    }
}

impl Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::Restart => write!(f, "restart"),
            ConflictPolicy::FirstUip => write!(f, "first-uip"),
        }
    }
}

pub struct CdclSolver {
    formula: Cnf,
    /// Input clauses followed by learned ones.
    clauses: TiVec<ClauseIdx, Clause>,
    tracker: Tracker,
    policy: ConflictPolicy,
    level: usize,
}

impl ConflictDataProvider for CdclSolver {
    fn value(&self, variable: Variable) -> bool {
        match self.tracker.assignment().get(variable) {
            Some(value) => value,
            None => unreachable!("{} is not assigned", variable),
        }
    }

    fn level(&self, variable: Variable) -> usize {
        match self.tracker.level(variable) {
            Some(level) => level,
            None => unreachable!("{} is not assigned", variable),
        }
    }

    fn antecedents(&self, variable: Variable) -> Option<&Clause> {
        self.tracker.reason(variable).map(|idx| &self.clauses[idx])
    }
}

impl CdclSolver {
    pub fn with_policy(formula: Cnf, policy: ConflictPolicy) -> Self {
        let clauses = formula.clauses().iter().cloned().collect();
        let tracker = Tracker::new();

        CdclSolver {
            formula,
            clauses,
            tracker,
            policy,
            level: 0,
        }
    }

    /// Assigns unit literals until nothing is forced.
    /// Returns the first falsified clause found, if any.
    fn propagate(&mut self) -> Option<ClauseIdx> {
        loop {
            let mut changed = false;

            for (idx, clause) in self.clauses.iter_enumerated() {
                match self.tracker.clause_status(clause) {
                    ClauseStatus::Satisfied | ClauseStatus::Unresolved => {}
                    ClauseStatus::Falsified => return Some(idx),
                    ClauseStatus::Unit(literal) => {
                        let (level, reason) = match self.policy {
                            ConflictPolicy::Restart => (0, None),
                            ConflictPolicy::FirstUip => (self.level, Some(idx)),
                        };
                        trace!("CDCL: {} forced by {} at level {}", literal, idx, level);
                        self.tracker.assign(literal, level, reason);
                        changed = true;
                    }
                }
            }

            if !changed {
                return None;
            }
        }
    }

    /// Runs the search. Returns true if the formula is satisfiable.
    fn search(&mut self) -> bool {
        let mut analyzer = ConflictAnalyzer::new();
        let mut conflicts = 0usize;

        loop {
            if let Some(conflict) = self.propagate() {
                conflicts += 1;
                if self.level == 0 {
                    debug!(
                        "CDCL: conflict on {} at level 0 after {} conflicts",
                        self.clauses[conflict], conflicts
                    );
                    return false;
                }

                let (learned, target) = match self.policy {
                    ConflictPolicy::Restart => (self.clauses[conflict].clone(), 0),
                    ConflictPolicy::FirstUip => {
                        let analysis = analyzer.analyze(
                            &*self,
                            self.level,
                            &self.clauses[conflict],
                            self.tracker.trail(),
                        );
                        (analysis.learned, analysis.backjump_level)
                    }
                };

                trace!(
                    "CDCL: learned {} at level {}, backjump to {}",
                    learned,
                    self.level,
                    target
                );
                self.clauses.push(learned);
                self.tracker.backjump(target);
                self.level = target;
            } else {
                match self.tracker.first_unassigned(&self.clauses) {
                    Some(literal) => {
                        self.level += 1;
                        trace!("CDCL: decide {} at level {}", literal, self.level);
                        self.tracker.assign(literal, self.level, None);
                    }
                    None => {
                        debug!(
                            "CDCL: every variable assigned after {} conflicts, {} learned clauses",
                            conflicts,
                            self.clauses.len() - self.formula.num_clauses()
                        );
                        return true;
                    }
                }
            }
        }
    }

    /// Solves the formula and returns a model if it is satisfiable.
    pub fn find_model(mut self) -> Option<Model> {
        if !self.search() {
            return None;
        }
        Some(Model::new(self.formula, self.tracker.assignment()))
    }
}

impl Solver for CdclSolver {
    fn new(formula: Cnf) -> Self {
        Self::with_policy(formula, ConflictPolicy::default())
    }

    fn solve(mut self) -> Verdict {
        self.search().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cnf(clauses: &[&[i32]]) -> Cnf {
        Cnf::from_dimacs(clauses).unwrap()
    }

    #[test]
    fn restart_learns_the_conflicting_clause_verbatim() {
        let mut solver = CdclSolver::new(cnf(&[
            &[1, 2],
            &[1, -3],
            &[-1, 3],
            &[-1, -2],
            &[3, -2],
            &[-3, 2],
        ]));
        assert!(!solver.search());
        assert_eq!(solver.clauses.len(), 7);
        assert_eq!(solver.clauses[ClauseIdx::from(6)], solver.clauses[ClauseIdx::from(5)]);
    }

    #[test]
    fn first_uip_learns_an_asserting_clause() {
        let mut solver = CdclSolver::with_policy(
            cnf(&[&[1, 2], &[1, -3], &[-1, 3], &[-1, -2], &[3, -2], &[-3, 2]]),
            ConflictPolicy::FirstUip,
        );
        assert!(!solver.search());
        // Deciding x1 forces x3 and ¬x2, which clash in the last clause.
        assert_eq!(
            solver.clauses[ClauseIdx::from(6)],
            Cnf::from_dimacs(&[[-1]]).unwrap().clauses()[0]
        );
    }

    #[test]
    fn restart_keeps_implications_of_retracted_decisions() {
        // Satisfiable with x1 = false, x2 = x3 = false, x4 = true, but deciding
        // x1 first leaves x2 and x3 behind after the restart.
        let clauses: &[&[i32]] = &[&[1, 4], &[-1, 2], &[-1, 3], &[-1, -2, -3], &[-2, -3]];
        assert_eq!(CdclSolver::new(cnf(clauses)).solve(), Verdict::Unsatisfiable);
        assert_eq!(
            CdclSolver::with_policy(cnf(clauses), ConflictPolicy::FirstUip).solve(),
            Verdict::Satisfiable
        );
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!("restart".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Restart);
        assert_eq!("First-UIP".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::FirstUip);
        assert!("vsids".parse::<ConflictPolicy>().is_err());
    }
}
