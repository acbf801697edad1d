use std::{collections::HashSet, mem::take};

use crate::formula::{Clause, Literal, Variable};

pub trait ConflictDataProvider {
    /// Returns the current value assigned to a variable.
    fn value(&self, variable: Variable) -> bool;

    /// Returns the decision level of a variable.
    fn level(&self, variable: Variable) -> usize;

    /// Returns the clause that forced a variable.
    /// `None` if the variable is a decision variable.
    fn antecedents(&self, variable: Variable) -> Option<&Clause>;
}

/// Result of analyzing one conflict.
#[derive(Debug)]
pub struct Analysis {
    /// Asserting clause. The first-UIP literal is last.
    pub learned: Clause,
    /// Highest level among the other literals of `learned`, 0 if none.
    pub backjump_level: usize,
}

/// First-UIP conflict analysis over the implication graph.
#[derive(Default)]
pub struct ConflictAnalyzer {
    /// Variables already visited in the current analysis.
    seen: HashSet<Variable>,
    /// Literals of the clause to learn, below the current level.
    recorded: Vec<Literal>,
    /// Highest level among `recorded`.
    backjump_level: usize,
    /// Unresolved variables on the current level
    unresolved_on_current_level: usize,
}

impl ConflictAnalyzer {
    pub fn new() -> Self {
        ConflictAnalyzer::default()
    }

    fn finalize(&mut self, uip: Literal) -> Analysis {
        self.seen.clear();
        self.unresolved_on_current_level = 0;

        let mut recorded = take(&mut self.recorded);
        recorded.push(uip);

        Analysis {
            learned: Clause::new(recorded),
            backjump_level: take(&mut self.backjump_level),
        }
    }

    /// Mark the variable, return true if the variable is previously unseen.
    fn mark_if_unseen(&mut self, variable: Variable) -> bool {
        self.seen.insert(variable)
    }

    fn add_clause<P>(&mut self, current_level: usize, data_provider: &P, clause: &Clause)
    where
        P: ConflictDataProvider,
    {
        for literal in clause.iter() {
            if self.mark_if_unseen(literal.variable()) {
                let literal_level = data_provider.level(literal.variable());
                if literal_level == current_level {
                    self.unresolved_on_current_level += 1;
                } else if literal_level != 0 {
                    // Level-0 assignments are permanent and need not be learned.
                    self.recorded.push(literal);
                    self.backjump_level = self.backjump_level.max(literal_level);
                }
            }
        }
    }

    /// Resolves `conflicting_clause` backwards along `trail` until a single
    /// literal of `current_level` remains.
    pub fn analyze<P>(
        &mut self,
        data_provider: &P,
        current_level: usize,
        conflicting_clause: &Clause,
        trail: &[Literal],
    ) -> Analysis
    where
        P: ConflictDataProvider,
    {
        self.add_clause(current_level, data_provider, conflicting_clause);

        for literal in trail.iter().rev().copied() {
            let variable = literal.variable();
            if self.seen.contains(&variable) {
                self.unresolved_on_current_level -= 1;
                if self.unresolved_on_current_level == 0 {
                    // First UIP reached
                    let uip = Literal::new(variable, !data_provider.value(variable));
                    return self.finalize(uip);
                }

                // If this was not UIP, mark its antecedents
                match data_provider.antecedents(variable) {
                    Some(antecedents) => {
                        self.add_clause(current_level, data_provider, antecedents)
                    }
                    None => unreachable!("only the last seen literal can be a decision"),
                }
            }
        }

        // Decision variable is guaranteed to be UIP
        unreachable!()
    }
}
