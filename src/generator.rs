/*!
Uniform random k-CNF instances, shaped like the SATLIB `uf`/`uuf` families.
*/

use rand::{seq::index::sample, Rng};

use crate::formula::{Clause, Cnf, Literal, Variable};

/// Draws `num_clauses` clauses, each over `width` distinct variables taken
/// from `1..=num_variables`, with independent uniform polarities.
///
/// # Panics
///
/// Panics if `width` exceeds `num_variables`.
pub fn random_k_cnf<R: Rng + ?Sized>(
    num_variables: usize,
    num_clauses: usize,
    width: usize,
    rng: &mut R,
) -> Cnf {
    assert!(
        width <= num_variables,
        "cannot draw {} distinct variables out of {}",
        width,
        num_variables
    );

    let mut cnf = Cnf::new(num_variables);
    for _ in 0..num_clauses {
        let clause = sample(rng, num_variables, width)
            .into_iter()
            .filter_map(Variable::from_index)
            .map(|variable| Literal::new(variable, rng.gen()))
            .collect::<Clause>();
        cnf.add_clause(clause);
    }

    trace!(
        "Generated {}-CNF with {} variables and {} clauses",
        width,
        num_variables,
        num_clauses
    );
    cnf
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn clauses_have_distinct_variables() {
        let mut rng = StdRng::seed_from_u64(7);
        let cnf = random_k_cnf(5, 40, 3, &mut rng);

        assert_eq!(cnf.num_clauses(), 40);
        assert!(cnf.num_variables() <= 5);
        for clause in cnf.clauses() {
            assert_eq!(clause.len(), 3);
            assert_eq!(clause.normalized().len(), 3);
            assert!(!clause.is_tautology());
        }
    }

    #[test]
    fn same_seed_same_formula() {
        let first = random_k_cnf(10, 20, 3, &mut StdRng::seed_from_u64(42));
        let second = random_k_cnf(10, 20, 3, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }
}
