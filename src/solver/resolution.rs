use std::collections::HashSet;

use typed_index_collections::TiVec;

use crate::formula::{Clause, Cnf};

use super::{ClauseIdx, Solver, Verdict};

/// Bounds on the saturation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionLimits {
    /// Maximum number of saturation rounds.
    pub max_steps: usize,
    /// Maximum number of known clauses before giving up.
    pub max_total_clauses: usize,
}

impl Default for ResolutionLimits {
    fn default() -> Self {
        ResolutionLimits {
            max_steps: 1000,
            max_total_clauses: 10000,
        }
    }
}

/// Resolves two normalized clauses.
///
/// Returns `None` unless the clauses clash on exactly one literal; with two
/// or more clashes the resolvent would be a tautology.
fn resolve(left: &Clause, right: &Clause) -> Option<Clause> {
    let mut pivots = left.iter().filter(|&literal| right.contains(!literal));
    let pivot = pivots.next()?;
    if pivots.next().is_some() {
        return None;
    }

    let mut resolvent = left
        .iter()
        .filter(|&literal| literal != pivot)
        .collect::<Clause>();
    for literal in right.iter() {
        if literal != !pivot && !resolvent.contains(literal) {
            resolvent.push(literal);
        }
    }

    Some(resolvent.normalized())
}

/// Saturates the clause set under binary resolution.
#[derive(Debug)]
pub struct ResolutionSolver {
    formula: Cnf,
    limits: ResolutionLimits,
}

impl ResolutionSolver {
    pub fn with_limits(formula: Cnf, limits: ResolutionLimits) -> Self {
        ResolutionSolver { formula, limits }
    }
}

impl Solver for ResolutionSolver {
    fn new(formula: Cnf) -> Self {
        Self::with_limits(formula, ResolutionLimits::default())
    }

    fn solve(self) -> Verdict {
        let ResolutionLimits {
            max_steps,
            max_total_clauses,
        } = self.limits;

        if self.formula.has_empty_clause() {
            debug!("Resolution: input contains the empty clause");
            return Verdict::Unsatisfiable;
        }

        let mut known: TiVec<ClauseIdx, Clause> = TiVec::new();
        let mut seen = HashSet::new();
        for clause in self.formula.into_clauses() {
            let clause = clause.normalized();
            if clause.is_tautology() {
                trace!("Resolution: discarding tautology {}", clause);
                continue;
            }
            if seen.insert(clause.clone()) {
                known.push(clause);
            }
        }

        let mut steps = 0;
        let mut saturated = false;
        while steps < max_steps && known.len() < max_total_clauses {
            let mut fresh = Vec::new();

            for (i, left) in known.iter_enumerated() {
                for (j, right) in known.iter_enumerated().skip(usize::from(i) + 1) {
                    let resolvent = match resolve(left, right) {
                        Some(resolvent) => resolvent,
                        None => continue,
                    };

                    if resolvent.is_empty() {
                        debug!(
                            "Resolution: empty clause from {} and {} after {} rounds",
                            i, j, steps
                        );
                        return Verdict::Unsatisfiable;
                    }

                    if seen.insert(resolvent.clone()) {
                        fresh.push(resolvent);
                    }
                }
            }

            if fresh.is_empty() {
                saturated = true;
                break;
            }

            trace!(
                "Resolution: round {} added {} clauses ({} known)",
                steps,
                fresh.len(),
                known.len() + fresh.len()
            );
            known.extend(fresh);
            steps += 1;
        }

        if saturated {
            debug!(
                "Resolution: saturated with {} clauses after {} rounds",
                known.len(),
                steps
            );
            Verdict::Satisfiable
        } else {
            debug!(
                "Resolution: gave up after {} rounds with {} clauses",
                steps,
                known.len()
            );
            Verdict::Timeout
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(literals: &[i32]) -> Clause {
        Cnf::from_dimacs(&[literals]).unwrap().into_clauses().remove(0)
    }

    fn cnf(clauses: &[&[i32]]) -> Cnf {
        Cnf::from_dimacs(clauses).unwrap()
    }

    #[test]
    fn resolves_on_a_single_clash() {
        let resolvent = resolve(&clause(&[1, 2]), &clause(&[-2, 3])).unwrap();
        assert_eq!(resolvent, clause(&[1, 3]));
    }

    #[test]
    fn two_clashes_give_no_resolvent() {
        assert!(resolve(&clause(&[1, 2]), &clause(&[-1, -2])).is_none());
        assert!(resolve(&clause(&[1, 2]), &clause(&[3])).is_none());
    }

    #[test]
    fn duplicate_literals_do_not_hide_a_refutation() {
        let verdict = ResolutionSolver::new(cnf(&[&[1, 1], &[-1]])).solve();
        assert_eq!(verdict, Verdict::Unsatisfiable);
    }

    #[test]
    fn tautologies_are_not_resolved_against() {
        // (x1 ∨ ¬x1) must not turn (¬x1 ∨ x2) into (x2)
        let verdict = ResolutionSolver::new(cnf(&[&[1, -1], &[-1, 2], &[-2]])).solve();
        assert_eq!(verdict, Verdict::Satisfiable);
    }

    #[test]
    fn step_bound_yields_timeout() {
        let formula = cnf(&[&[1, 2], &[1, -2], &[-1, 2], &[-1, -2]]);
        let limits = ResolutionLimits {
            max_steps: 1,
            max_total_clauses: 10000,
        };
        assert_eq!(
            ResolutionSolver::with_limits(formula.clone(), limits).solve(),
            Verdict::Timeout
        );
        assert_eq!(
            ResolutionSolver::new(formula).solve(),
            Verdict::Unsatisfiable
        );
    }

    #[test]
    fn clause_bound_yields_timeout() {
        let formula = cnf(&[&[1, 2], &[1, -2], &[-1, 2], &[-1, -2]]);
        let limits = ResolutionLimits {
            max_steps: 1000,
            max_total_clauses: 4,
        };
        assert_eq!(
            ResolutionSolver::with_limits(formula, limits).solve(),
            Verdict::Timeout
        );
    }
}
