use std::collections::HashSet;

use crate::formula::{Assignment, Clause, Cnf, Literal, Model};

use super::{Solver, Verdict};

/// Removes clauses satisfied by `assignment` and strikes falsified literals
/// from the rest.
fn simplify(clauses: &[Clause], assignment: &Assignment) -> Vec<Clause> {
    clauses
        .iter()
        .filter(|clause| {
            !clause
                .iter()
                .any(|literal| assignment.value(literal) == Some(true))
        })
        .map(|clause| {
            clause
                .iter()
                .filter(|&literal| assignment.value(literal).is_none())
                .collect()
        })
        .collect()
}

/// The only literal of the first unit clause.
fn find_unit(clauses: &[Clause]) -> Option<Literal> {
    clauses.iter().find_map(|clause| match clause.literals() {
        [literal] => Some(*literal),
        _ => None,
    })
}

/// The first literal, in scan order, whose negation never occurs.
fn find_pure(clauses: &[Clause]) -> Option<Literal> {
    let occurring = clauses
        .iter()
        .flat_map(|clause| clause.iter())
        .collect::<HashSet<_>>();

    clauses
        .iter()
        .flat_map(|clause| clause.iter())
        .find(|&literal| !occurring.contains(&!literal))
}

/// A branch point whose `true` side is being explored.
/// Holds what is needed to try the `false` side later.
struct Frame {
    clauses: Vec<Clause>,
    assignment: Assignment,
    branch: Literal,
}

/// Backtracking search with unit propagation and pure literal elimination.
///
/// The decision tree is walked with an explicit stack of pending `false`
/// branches, so deep instances cannot overflow the native stack.
#[derive(Debug)]
pub struct DpllSolver {
    formula: Cnf,
    initial: Assignment,
}

impl DpllSolver {
    /// Starts the search from a partial assignment instead of an empty one.
    pub fn with_assignment(formula: Cnf, initial: Assignment) -> Self {
        DpllSolver { formula, initial }
    }

    /// Runs the search and returns the satisfying assignment, if any.
    fn search(&self) -> Option<Assignment> {
        let mut stack: Vec<Frame> = Vec::new();
        let mut current = Some((self.formula.clauses().clone(), self.initial.clone()));
        let mut decisions = 0usize;

        loop {
            if let Some((clauses, mut assignment)) = current.take() {
                let clauses = simplify(&clauses, &assignment);

                if clauses.iter().any(Clause::is_empty) {
                    trace!("DPLL: conflict at depth {}", stack.len());
                } else if clauses.is_empty() {
                    debug!("DPLL: satisfied after {} decisions", decisions);
                    return Some(assignment);
                } else if let Some(literal) = find_unit(&clauses) {
                    trace!("DPLL: unit {}", literal);
                    assignment.assign(literal);
                    current = Some((clauses, assignment));
                    continue;
                } else if let Some(literal) = find_pure(&clauses) {
                    trace!("DPLL: pure {}", literal);
                    assignment.assign(literal);
                    current = Some((clauses, assignment));
                    continue;
                } else {
                    // Every literal left is unassigned after simplification.
                    let branch = Literal::new(clauses[0].literals()[0].variable(), true);
                    trace!("DPLL: decide {} at depth {}", branch, stack.len());
                    decisions += 1;

                    stack.push(Frame {
                        clauses: clauses.clone(),
                        assignment: assignment.clone(),
                        branch,
                    });
                    assignment.assign(branch);
                    current = Some((clauses, assignment));
                    continue;
                }
            }

            // The current branch failed: resume the latest pending one.
            let Frame {
                clauses,
                mut assignment,
                branch,
            } = match stack.pop() {
                Some(frame) => frame,
                None => {
                    debug!("DPLL: refuted after {} decisions", decisions);
                    return None;
                }
            };
            trace!("DPLL: backtrack, trying {}", !branch);
            assignment.assign(!branch);
            current = Some((clauses, assignment));
        }
    }

    /// Solves the formula and returns a model if it is satisfiable.
    pub fn find_model(self) -> Option<Model> {
        let assignment = self.search()?;
        Some(Model::new(self.formula, &assignment))
    }
}

impl Solver for DpllSolver {
    fn new(formula: Cnf) -> Self {
        let initial = Assignment::new();
        Self::with_assignment(formula, initial)
    }

    fn solve(self) -> Verdict {
        self.search().is_some().into()
    }
}
