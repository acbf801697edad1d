/*!
A module to represent conjunctive normal form formula and assignments over it.
*/

use std::{
    collections::{BTreeMap, HashMap},
    convert::TryFrom,
    fmt::Display,
    num::NonZeroU32,
    str::FromStr,
};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum VariableParseError {
    #[snafu(display("Failed to parse Variable ID"))]
    ParseIntError { source: std::num::ParseIntError },
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: u64 },
    #[snafu(display("0 is a clause terminator, not a literal"))]
    ZeroLiteral,
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    /// DIMACS literals are signed 32-bit integers.
    pub const MAX_VARIABLE_ID: usize = i32::MAX as usize;
}

impl Variable {
    pub fn id(&self) -> u32 {
        self.0.get()
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        let id = index.checked_add(1)?;
        Variable::from_id(id)
    }

    /// Creates a variable from its DIMACS id.
    pub fn from_id(id: usize) -> Option<Self> {
        if id > Variable::MAX_VARIABLE_ID {
            return None;
        }
        Some(Variable(NonZeroU32::new(u32::try_from(id).ok()?)?))
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<u64>().context(ParseIntError)?;
        ensure!(num != 0, ZeroLiteral);
        let id = usize::try_from(num).ok().context(RangeError { num })?;
        Variable::from_id(id).context(RangeError { num })
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A variable together with a polarity.
///
/// Literals order by variable first, then negative before positive. Clause
/// normalization relies on this being a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    /// Converts a DIMACS integer literal. Returns `None` for `0` and for
    /// `i32::MIN`, whose magnitude is not a valid variable.
    pub fn from_dimacs(raw: i32) -> Option<Self> {
        let id = Variable::from_id(raw.checked_abs()? as usize)?;
        Some(Literal::new(id, raw > 0))
    }

    pub fn to_dimacs(&self) -> i32 {
        let id = self.id.id() as i32;
        if self.positive {
            id
        } else {
            -id
        }
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }
}

impl TryFrom<i32> for Literal {
    type Error = VariableParseError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        ensure!(raw != 0, ZeroLiteral);
        Literal::from_dimacs(raw).context(RangeError {
            num: u64::from(raw.unsigned_abs()),
        })
    }
}

impl FromStr for Literal {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (positive, id) = if let Some(rest) = s.strip_prefix('-') {
            (false, rest.parse()?)
        } else {
            (true, s.parse()?)
        };

        Ok(Literal { id, positive })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }

    pub fn contains(&self, literal: Literal) -> bool {
        self.literals.contains(&literal)
    }

    pub fn push(&mut self, literal: Literal) {
        self.literals.push(literal);
    }

    /// A clause holding both polarities of a variable is always true.
    pub fn is_tautology(&self) -> bool {
        self.iter().any(|literal| self.contains(!literal))
    }

    /// Removes repeated literals, keeping the first occurrence of each.
    pub fn dedup(&mut self) {
        let mut kept = Vec::with_capacity(self.literals.len());
        for literal in self.literals.drain(..) {
            if !kept.contains(&literal) {
                kept.push(literal);
            }
        }
        self.literals = kept;
    }

    /// Sorted, duplicate-free copy. Two clauses over the same literal set
    /// normalize to equal values.
    pub fn normalized(&self) -> Clause {
        let mut literals = self.literals.clone();
        literals.sort_unstable();
        literals.dedup();
        Clause { literals }
    }

    /// Largest variable id mentioned in the clause, 0 if empty.
    pub fn max_variable(&self) -> usize {
        self.iter()
            .map(|literal| literal.variable().id() as usize)
            .max()
            .unwrap_or(0)
    }
}

impl std::iter::FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Clause::new(iter.into_iter().collect())
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Formula representation in Conjunctive Normal Form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: Vec::new(),
        }
    }

    /// Builds a formula from DIMACS integer clauses.
    pub fn from_dimacs<C>(clauses: &[C]) -> Result<Self, VariableParseError>
    where
        C: AsRef<[i32]>,
    {
        let mut cnf = Cnf::new(0);
        for raw in clauses {
            let clause = raw
                .as_ref()
                .iter()
                .map(|&literal| Literal::try_from(literal))
                .collect::<Result<Clause, _>>()?;
            cnf.add_clause(clause);
        }
        Ok(cnf)
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &Vec<Clause> {
        &self.clauses
    }

    pub fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }

    pub fn add_clause(&mut self, clause: Clause) {
        self.num_variables = self.num_variables.max(clause.max_variable());
        self.clauses.push(clause);
    }

    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// A partial mapping from variables to truth values.
///
/// Each variable holds at most one value; assigning an assigned variable
/// panics instead of silently overwriting. Only assigned variables take
/// space, so sparse variable ids stay cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: HashMap<Variable, bool>,
}

impl Assignment {
    pub fn new() -> Self {
        Assignment::default()
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, variable: Variable) -> Option<bool> {
        self.values.get(&variable).copied()
    }

    pub fn is_assigned(&self, variable: Variable) -> bool {
        self.values.contains_key(&variable)
    }

    /// Truth value of `literal` under this assignment, `None` if unassigned.
    pub fn value(&self, literal: Literal) -> Option<bool> {
        self.get(literal.variable())
            .map(|value| value == literal.positive())
    }

    /// Makes `literal` true.
    ///
    /// # Panics
    ///
    /// Panics if the variable already has a value.
    pub fn assign(&mut self, literal: Literal) {
        let old = self.values.insert(literal.variable(), literal.positive());
        assert!(old.is_none(), "{} assigned twice", literal.variable());
    }

    /// Removes the value of `variable`, returning it.
    pub fn unassign(&mut self, variable: Variable) -> Option<bool> {
        self.values.remove(&variable)
    }
}

/// Represents a satisfying assignment for a formula.
#[derive(Debug)]
pub struct Model {
    formula: Cnf,
    assignment: BTreeMap<Variable, bool>,
}

impl Model {
    /// Creates a new model from a formula and a partial assignment.
    /// Variables of the formula without a value are set to `true`.
    pub fn new(formula: Cnf, partial: &Assignment) -> Self {
        let assignment = formula
            .clauses()
            .iter()
            .flat_map(|clause| clause.iter())
            .map(|literal| {
                let variable = literal.variable();
                (variable, partial.get(variable).unwrap_or(true))
            })
            .collect();

        Model {
            formula,
            assignment,
        }
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    /// Values of the variables occurring in the formula, in id order.
    pub fn assignment(&self) -> &BTreeMap<Variable, bool> {
        &self.assignment
    }

    pub fn value(&self, variable: Variable) -> bool {
        self.assignment.get(&variable).copied().unwrap_or(true)
    }

    /// Re-checks every clause of the formula against the assignment.
    pub fn verify(&self) -> bool {
        self.formula.clauses().iter().all(|clause| {
            clause
                .iter()
                .any(|literal| self.value(literal.variable()) == literal.positive())
        })
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model for {}\nAssignment:", self.formula)?;
        for (variable, value) in &self.assignment {
            write!(f, "\n  {}: {}", variable, value)?;
        }

        Ok(())
    }
}
