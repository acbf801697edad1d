use std::collections::HashMap;

use crate::formula::{Assignment, Clause, Literal, Variable};
use crate::solver::ClauseIdx;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClauseStatus {
    /// Every literal is assigned and none is true.
    Falsified,
    /// Some literal is true.
    Satisfied,
    /// No literal is true and exactly this one is unassigned.
    Unit(Literal),
    Unresolved,
}

/// The evolving assignment of the search, with the decision level and the
/// reason clause of every assigned variable.
#[derive(Debug, Default)]
pub struct Tracker {
    assignment: Assignment,
    /// Decision level of every assigned variable.
    levels: HashMap<Variable, usize>,
    /// Clause that forced a variable. Decisions have none.
    reasons: HashMap<Variable, ClauseIdx>,
    /// Assigned literals in assignment order.
    trail: Vec<Literal>,
}

impl Tracker {
    pub fn new() -> Self {
        Tracker::default()
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn trail(&self) -> &[Literal] {
        &self.trail
    }

    pub fn value(&self, literal: Literal) -> Option<bool> {
        self.assignment.value(literal)
    }

    pub fn level(&self, variable: Variable) -> Option<usize> {
        self.levels.get(&variable).copied()
    }

    pub fn reason(&self, variable: Variable) -> Option<ClauseIdx> {
        self.reasons.get(&variable).copied()
    }

    /// Makes `literal` true at decision level `level`.
    /// Panics if the variable is already assigned.
    pub fn assign(&mut self, literal: Literal, level: usize, reason: Option<ClauseIdx>) {
        let variable = literal.variable();

        self.assignment.assign(literal);
        self.levels.insert(variable, level);
        if let Some(reason) = reason {
            self.reasons.insert(variable, reason);
        }
        self.trail.push(literal);
    }

    /// Undoes every assignment made above decision level `level`.
    pub fn backjump(&mut self, level: usize) {
        let Tracker {
            assignment,
            levels,
            reasons,
            trail,
        } = self;

        trail.retain(|literal| {
            let variable = literal.variable();
            if levels.get(&variable).map_or(false, |&assigned| assigned > level) {
                assignment.unassign(variable);
                levels.remove(&variable);
                reasons.remove(&variable);
                false
            } else {
                true
            }
        });

        debug_assert_eq!(assignment.len(), trail.len());
        debug_assert_eq!(levels.len(), trail.len());
    }

    pub fn clause_status(&self, clause: &Clause) -> ClauseStatus {
        let mut unassigned = None;
        let mut unassigned_count = 0;

        for literal in clause.iter() {
            match self.value(literal) {
                Some(true) => return ClauseStatus::Satisfied,
                Some(false) => {}
                None => {
                    unassigned_count += 1;
                    unassigned.get_or_insert(literal);
                }
            }
        }

        match (unassigned_count, unassigned) {
            (0, _) => ClauseStatus::Falsified,
            (1, Some(literal)) => ClauseStatus::Unit(literal),
            _ => ClauseStatus::Unresolved,
        }
    }

    /// The first unassigned literal, scanning `clauses` in order.
    pub fn first_unassigned<'a, I>(&self, clauses: I) -> Option<Literal>
    where
        I: IntoIterator<Item = &'a Clause>,
    {
        clauses
            .into_iter()
            .flat_map(|clause| clause.iter())
            .find(|&literal| self.value(literal).is_none())
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::*;

    fn lit(raw: i32) -> Literal {
        Literal::try_from(raw).unwrap()
    }

    #[test]
    fn backjump_keeps_levels_in_step_with_the_assignment() {
        let mut tracker = Tracker::new();
        tracker.assign(lit(1), 0, None);
        tracker.assign(lit(-2), 1, None);
        tracker.assign(lit(3), 1, Some(ClauseIdx::from(0)));
        tracker.assign(lit(4), 2, None);

        tracker.backjump(0);

        assert_eq!(tracker.trail(), &[lit(1)]);
        assert_eq!(tracker.assignment().len(), 1);
        for id in 2..=4 {
            let variable = Variable::from_id(id).unwrap();
            assert_eq!(tracker.level(variable), None);
            assert_eq!(tracker.reason(variable), None);
            assert!(!tracker.assignment().is_assigned(variable));
        }
        assert_eq!(tracker.level(lit(1).variable()), Some(0));
    }

    #[test]
    fn huge_variable_ids_are_tracked() {
        let mut tracker = Tracker::new();
        tracker.assign(lit(-2_000_000_000), 0, None);
        tracker.assign(lit(7), 1, Some(ClauseIdx::from(3)));

        let huge = lit(2_000_000_000).variable();
        assert_eq!(tracker.value(lit(2_000_000_000)), Some(false));
        assert_eq!(tracker.level(huge), Some(0));
        assert_eq!(tracker.reason(lit(7).variable()), Some(ClauseIdx::from(3)));

        tracker.backjump(0);
        assert_eq!(tracker.trail(), &[lit(-2_000_000_000)]);
        assert_eq!(tracker.reason(lit(7).variable()), None);
    }

    #[test]
    fn clause_status_counts_unassigned_literals() {
        let mut tracker = Tracker::new();
        tracker.assign(lit(-1), 0, None);

        let clause = |raw: &[i32]| raw.iter().map(|&l| lit(l)).collect::<Clause>();
        assert_eq!(tracker.clause_status(&clause(&[1])), ClauseStatus::Falsified);
        assert_eq!(tracker.clause_status(&clause(&[-1, 2])), ClauseStatus::Satisfied);
        assert_eq!(tracker.clause_status(&clause(&[1, 2])), ClauseStatus::Unit(lit(2)));
        assert_eq!(tracker.clause_status(&clause(&[1, 2, 3])), ClauseStatus::Unresolved);
        assert_eq!(tracker.clause_status(&Clause::empty()), ClauseStatus::Falsified);
    }
}
