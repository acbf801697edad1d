use std::collections::HashSet;

use crate::formula::{Clause, Cnf, Literal, Variable};

use super::{Solver, Verdict};

/// Davis–Putnam procedure: simplify, then eliminate one variable at a time
/// by resolving every positive occurrence against every negative one.
///
/// Each elimination removes a variable for good and the simplification
/// steps only shrink the clause set, so the loop always terminates.
#[derive(Debug)]
pub struct DpSolver {
    clauses: Vec<Clause>,
}

impl DpSolver {
    /// Distinct literals of unit clauses, in scan order.
    fn unit_literals(&self) -> Vec<Literal> {
        let mut units = Vec::new();
        for clause in &self.clauses {
            if let [literal] = clause.literals() {
                if !units.contains(literal) {
                    units.push(*literal);
                }
            }
        }
        units
    }

    /// Makes every unit literal true: satisfied clauses are dropped and the
    /// negation is struck from the rest. Returns false if there was no unit.
    fn propagate_units(&mut self) -> bool {
        let units = self.unit_literals();
        if units.is_empty() {
            return false;
        }

        for literal in units {
            trace!("DP: unit {}", literal);
            let falsified = !literal;
            self.clauses = self
                .clauses
                .drain(..)
                .filter(|clause| !clause.contains(literal))
                .map(|clause| {
                    if clause.contains(falsified) {
                        clause.iter().filter(|&l| l != falsified).collect()
                    } else {
                        clause
                    }
                })
                .collect();
        }

        true
    }

    /// Drops tautological clauses and returns how many were dropped.
    fn remove_tautologies(&mut self) -> usize {
        let before = self.clauses.len();
        self.clauses.retain(|clause| !clause.is_tautology());
        before - self.clauses.len()
    }

    fn occurring_literals(&self) -> HashSet<Literal> {
        self.clauses.iter().flat_map(|clause| clause.iter()).collect()
    }

    /// Drops every clause containing a pure literal. Returns false if no
    /// literal was pure.
    fn eliminate_pure_literals(&mut self) -> bool {
        let occurring = self.occurring_literals();
        let pure = occurring
            .iter()
            .copied()
            .filter(|&literal| !occurring.contains(&!literal))
            .collect::<HashSet<_>>();

        if pure.is_empty() {
            return false;
        }

        trace!("DP: {} pure literals", pure.len());
        self.clauses
            .retain(|clause| !clause.iter().any(|literal| pure.contains(&literal)));
        true
    }

    /// First variable, in scan order, that occurs in both polarities.
    fn elimination_candidate(&self) -> Option<Variable> {
        let occurring = self.occurring_literals();
        self.clauses
            .iter()
            .flat_map(|clause| clause.iter())
            .find(|&literal| occurring.contains(&!literal))
            .map(|literal| literal.variable())
    }

    /// Replaces every clause mentioning `variable` by the resolvents on it.
    /// Returns false if an empty resolvent was derived.
    fn eliminate(&mut self, variable: Variable) -> bool {
        let positive = Literal::new(variable, true);
        let negative = !positive;

        let mut with_positive = Vec::new();
        let mut with_negative = Vec::new();
        let mut untouched = Vec::new();
        for clause in self.clauses.drain(..) {
            if clause.contains(positive) {
                with_positive.push(clause);
            } else if clause.contains(negative) {
                with_negative.push(clause);
            } else {
                untouched.push(clause);
            }
        }

        let mut seen = HashSet::new();
        let mut resolvents = Vec::new();
        for left in &with_positive {
            for right in &with_negative {
                let mut resolvent = left
                    .iter()
                    .chain(right.iter())
                    .filter(|literal| literal.variable() != variable)
                    .collect::<Clause>();
                resolvent.dedup();

                if resolvent.is_empty() {
                    trace!("DP: empty resolvent eliminating {}", variable);
                    return false;
                }
                if seen.insert(resolvent.clone()) {
                    resolvents.push(resolvent);
                }
            }
        }

        trace!(
            "DP: eliminated {} ({} × {} clauses → {} resolvents)",
            variable,
            with_positive.len(),
            with_negative.len(),
            resolvents.len()
        );

        untouched.extend(resolvents);
        self.clauses = untouched;
        true
    }
}

impl Solver for DpSolver {
    fn new(formula: Cnf) -> Self {
        DpSolver {
            clauses: formula.into_clauses(),
        }
    }

    fn solve(mut self) -> Verdict {
        for clause in &mut self.clauses {
            clause.dedup();
        }

        let mut eliminated = 0;
        loop {
            if self.propagate_units() {
                continue;
            }

            self.remove_tautologies();

            if self.eliminate_pure_literals() {
                continue;
            }

            if self.clauses.iter().any(Clause::is_empty) {
                debug!("DP: empty clause after {} eliminations", eliminated);
                return Verdict::Unsatisfiable;
            }
            if self.clauses.is_empty() {
                debug!("DP: no clauses left after {} eliminations", eliminated);
                return Verdict::Satisfiable;
            }

            let variable = match self.elimination_candidate() {
                Some(variable) => variable,
                // With no pure literal left every literal has its negation.
                None => unreachable!(),
            };
            if !self.eliminate(variable) {
                debug!("DP: empty resolvent after {} eliminations", eliminated);
                return Verdict::Unsatisfiable;
            }
            eliminated += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver(clauses: &[&[i32]]) -> DpSolver {
        DpSolver::new(Cnf::from_dimacs(clauses).unwrap())
    }

    fn dimacs(solver: &DpSolver) -> Vec<Vec<i32>> {
        solver
            .clauses
            .iter()
            .map(|clause| clause.iter().map(|literal| literal.to_dimacs()).collect())
            .collect()
    }

    #[test]
    fn unit_propagation_strikes_negations() {
        let mut dp = solver(&[&[1], &[-1, 2, 3], &[1, 4], &[-2]]);
        assert!(dp.propagate_units());
        assert_eq!(dimacs(&dp), vec![vec![3]]);
    }

    #[test]
    fn contradicting_units_leave_an_empty_clause() {
        let mut dp = solver(&[&[1], &[-1]]);
        assert!(dp.propagate_units());
        assert_eq!(dimacs(&dp), vec![Vec::<i32>::new()]);
        assert_eq!(dp.solve(), Verdict::Unsatisfiable);
    }

    #[test]
    fn elimination_resolves_both_polarities() {
        let mut dp = solver(&[&[1, 2], &[-1, 3], &[-1, 2], &[4, 5]]);
        assert_eq!(dp.elimination_candidate(), Variable::from_id(1));
        assert!(dp.eliminate(Variable::from_id(1).unwrap()));
        assert_eq!(dimacs(&dp), vec![vec![4, 5], vec![2, 3], vec![2]]);
    }

    #[test]
    fn closed_clause_set_is_a_fixpoint() {
        let clauses: &[&[i32]] = &[&[1, 2], &[-1, -2], &[1, -2], &[-1, 2]];
        let mut dp = solver(clauses);
        let before = dimacs(&dp);

        assert!(!dp.propagate_units());
        assert_eq!(dp.remove_tautologies(), 0);
        assert!(!dp.eliminate_pure_literals());
        for clause in &mut dp.clauses {
            clause.dedup();
        }

        assert_eq!(dimacs(&dp), before);
    }
}
