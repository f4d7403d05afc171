//! Transition solver — from one generation of selfing to a closed form in k
//!
//! `T[x, y]` is the probability that selfing the representative of state x
//! yields progeny in state y. The state chain is exact only when every member
//! of a state has the representative's row (lumpability) and the founding
//! population is uniform within every state; both are checked at build time.
//! With `T = P·Λ·P⁻¹` the genotype probability of state s at generation k is
//!
//! ```text
//! (F1 · I · P · Λ^(k − offset) · P⁻¹ · C)[s]
//! ```
//!
//! where `I` is the genotype × state incidence matrix and `C` the diagonal
//! correction matrix.

use super::formula::{ClosedForm, Term};
use crate::algebra::matrix::{self, PolynomialMatrix};
use crate::algebra::{diagonalize, Polynomial, RationalFunction};
use crate::error::{InheritanceError, Result};
use crate::genetics::{Diplotype, GenotypeKey, Population};
use crate::states::{CrossDesign, StatePartition};
use log::{debug, info};
use nalgebra::DMatrix;
use num_traits::{One, Zero};
use std::collections::BTreeMap;

/// The state-level Markov chain of one cross design.
#[derive(Debug, Clone)]
pub struct TransitionSystem {
    design: CrossDesign,
    partition: StatePartition,
    matrix: PolynomialMatrix,
    /// Generation-1 probability of every genotype, in alphabet order
    founding: Vec<Polynomial>,
}

fn selfed_masses(partition: &StatePartition, key: GenotypeKey) -> Result<Vec<Polynomial>> {
    let progeny = Population::founder(Diplotype::from_key(key, Polynomial::one())).cycle();
    partition.state_masses(&progeny)
}

impl TransitionSystem {
    /// Validate the design's partition and build its transition matrix.
    pub fn build(design: CrossDesign) -> Result<Self> {
        let partition = design.partition()?;
        Self::from_partition(design, partition)
    }

    pub fn from_partition(design: CrossDesign, partition: StatePartition) -> Result<Self> {
        let n = partition.len();
        let mut rows: Vec<Vec<Polynomial>> = Vec::with_capacity(n);
        for state in partition.states() {
            let row = selfed_masses(&partition, state.representative)?;
            for &member in &state.members {
                if member != state.representative && selfed_masses(&partition, member)? != row {
                    return Err(InheritanceError::NotLumpable {
                        state: state.label(),
                        genotype: member.to_string(),
                    });
                }
            }
            rows.push(row);
        }
        let matrix = DMatrix::from_fn(n, n, |i, j| rows[i][j].clone());

        let generation_one = design.founding_population().combine();
        // every founding genotype must be covered
        partition.state_masses(&generation_one)?;
        let founding = partition.genotype_vector(&generation_one);
        for state in partition.states() {
            let reference = generation_one.probability_of(&state.representative);
            if let Some(odd) = state
                .members
                .iter()
                .find(|m| generation_one.probability_of(m) != reference)
            {
                return Err(InheritanceError::AsymmetricFounders {
                    state: state.label(),
                    genotype: odd.to_string(),
                });
            }
        }

        info!(
            "Built {} transition system: {} states over {} genotypes",
            design,
            n,
            partition.genotypes().len()
        );

        Ok(Self {
            design,
            partition,
            matrix,
            founding,
        })
    }

    pub fn design(&self) -> CrossDesign {
        self.design
    }

    pub fn partition(&self) -> &StatePartition {
        &self.partition
    }

    pub fn transition_matrix(&self) -> &PolynomialMatrix {
        &self.matrix
    }

    /// The transition matrix evaluated at a numeric recombination fraction.
    pub fn numeric_matrix(&self, r: f64) -> DMatrix<f64> {
        self.matrix.map(|p| p.eval_f64(r))
    }

    pub fn founding_vector(&self) -> &[Polynomial] {
        &self.founding
    }

    /// State masses of generation 1: `F1 · I`.
    pub fn founding_masses(&self) -> Vec<RationalFunction> {
        let f1: Vec<RationalFunction> = self
            .founding
            .iter()
            .cloned()
            .map(RationalFunction::from)
            .collect();
        matrix::row_times(&f1, &self.partition.incidence_matrix())
    }

    /// State masses at generation `k` by exact repeated multiplication with T.
    pub fn propagate(&self, k: u32) -> Result<Vec<Polynomial>> {
        let offset = self.design.offset();
        let steps = k
            .checked_sub(offset)
            .ok_or(InheritanceError::GenerationOutOfRange {
                generation: k,
                first: offset,
            })?;
        let n = self.partition.len();
        let mut masses = vec![Polynomial::zero(); n];
        for (g, p) in self.partition.genotypes().iter().zip(&self.founding) {
            if let Some(s) = self.partition.state_of(g) {
                masses[s] += p;
            }
        }
        for _ in 0..steps {
            masses = (0..n)
                .map(|j| {
                    (0..n).fold(Polynomial::zero(), |acc, i| {
                        &acc + &(&masses[i] * &self.matrix[(i, j)])
                    })
                })
                .collect();
        }
        Ok(masses)
    }

    /// Diagonalize T and assemble one closed form per state.
    pub fn solve(&self) -> Result<ClosedFormSolution> {
        let eig = diagonalize(&self.matrix)?;
        let n = self.partition.len();
        let offset = self.design.offset();
        let u = matrix::row_times(&self.founding_masses(), eig.vectors());
        let corrections = self.partition.correction_factors();

        let forms: Vec<ClosedForm> = (0..n)
            .map(|s| {
                let terms = (0..n)
                    .filter(|&j| !u[j].is_zero())
                    .map(|j| {
                        let coefficient = (&u[j] * &eig.inverse()[(j, s)]).scale(&corrections[s]);
                        Term::new(coefficient, eig.eigenvalues()[j].clone())
                    })
                    .collect();
                ClosedForm::new(offset, terms)
            })
            .collect();

        let eigenvalues: Vec<Polynomial> =
            eig.distinct_eigenvalues().into_iter().map(|(v, _)| v).collect();
        for (state, form) in self.partition.states().iter().zip(&forms) {
            debug!("{} {}: {}", self.design, state.label(), form);
        }
        info!(
            "Solved {} closed form: {} states, {} distinct eigenvalues",
            self.design,
            n,
            eigenvalues.len()
        );

        Ok(ClosedFormSolution {
            design: self.design,
            partition: self.partition.clone(),
            eigenvalues,
            forms,
        })
    }
}

/// Closed forms for every state of a design.
///
/// Each state's form is the probability of any single genotype of that state.
#[derive(Debug, Clone)]
pub struct ClosedFormSolution {
    design: CrossDesign,
    partition: StatePartition,
    eigenvalues: Vec<Polynomial>,
    forms: Vec<ClosedForm>,
}

impl ClosedFormSolution {
    pub fn design(&self) -> CrossDesign {
        self.design
    }

    pub fn partition(&self) -> &StatePartition {
        &self.partition
    }

    /// Distinct eigenvalues of the transition matrix.
    pub fn eigenvalues(&self) -> &[Polynomial] {
        &self.eigenvalues
    }

    /// Forms in state order.
    pub fn forms(&self) -> &[ClosedForm] {
        &self.forms
    }

    /// State label → closed form.
    pub fn by_state(&self) -> BTreeMap<String, ClosedForm> {
        self.partition
            .labels()
            .into_iter()
            .zip(self.forms.iter().cloned())
            .collect()
    }

    pub fn formula(&self, state: &str) -> Option<&ClosedForm> {
        self.partition
            .states()
            .iter()
            .position(|s| s.label() == state)
            .map(|i| &self.forms[i])
    }

    /// Closed form of one genotype, through its state.
    pub fn genotype_formula(&self, genotype: &GenotypeKey) -> Option<&ClosedForm> {
        self.partition.state_of(genotype).map(|i| &self.forms[i])
    }

    /// Closed forms summed per unphased genotype key.
    pub fn unphased(&self) -> BTreeMap<String, ClosedForm> {
        let offset = self.design.offset();
        let mut table: BTreeMap<String, ClosedForm> = BTreeMap::new();
        for genotype in self.partition.genotypes() {
            let Some(form) = self.genotype_formula(genotype) else {
                continue;
            };
            let entry = table
                .entry(genotype.unphased())
                .or_insert_with(|| ClosedForm::zero(offset));
            *entry = &*entry + form;
        }
        table
    }

    /// Exact genotype probability of every genotype at generation `k`.
    pub fn genotype_probabilities(&self, k: u32) -> Result<BTreeMap<GenotypeKey, RationalFunction>> {
        let values = self
            .forms
            .iter()
            .map(|f| f.at_generation(k))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .partition
            .genotypes()
            .iter()
            .filter_map(|g| self.partition.state_of(g).map(|s| (*g, values[s].clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::rational;
    use crate::states::StateDeclaration;
    use num_rational::BigRational;

    fn sample_rates() -> Vec<BigRational> {
        vec![rational(0, 1), rational(1, 5), rational(1, 3), rational(1, 2)]
    }

    #[test]
    fn test_biparental_transition_matrix() {
        let system = TransitionSystem::build(CrossDesign::Biparental).unwrap();
        let t = system.transition_matrix();
        assert_eq!(t.shape(), (5, 5));
        // state order: AA|AA, AB|AB, AA|AB, AA|BB, AB|BA
        assert_eq!(t[(0, 0)], Polynomial::one());
        assert_eq!(t[(2, 0)], Polynomial::from_ratio(1, 4));
        assert_eq!(t[(2, 2)], Polynomial::from_ratio(1, 2));
        let one_minus_r = Polynomial::linear(rational(1, 1), rational(-1, 1));
        assert_eq!(t[(3, 3)], one_minus_r.pow(2).scale(&rational(1, 2)));
        assert_eq!(
            t[(4, 2)],
            (&Polynomial::variable() * &one_minus_r).scale(&rational(2, 1))
        );
        for i in 0..5 {
            let row_sum = (0..5).fold(Polynomial::zero(), |acc, j| &acc + &t[(i, j)]);
            assert!(row_sum.is_one(), "row {} does not sum to 1", i);
        }
        let numeric = system.numeric_matrix(0.5);
        assert!((numeric[(3, 4)] - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_biparental_eigenvalues() {
        let solution = TransitionSystem::build(CrossDesign::Biparental)
            .unwrap()
            .solve()
            .unwrap();
        let expected = vec![
            Polynomial::from_ratio(1, 2),
            Polynomial::linear(rational(1, 2), rational(-1, 1)),
            Polynomial::from_coeffs(vec![rational(1, 2), rational(-1, 1), rational(1, 1)]),
            Polynomial::one(),
        ];
        assert_eq!(solution.eigenvalues(), expected.as_slice());
    }

    #[test]
    fn test_closed_form_matches_exact_propagation() {
        let system = TransitionSystem::build(CrossDesign::Biparental).unwrap();
        let solution = system.solve().unwrap();
        for k in 1..=5 {
            let masses = system.propagate(k).unwrap();
            for (s, state) in solution.partition().states().iter().enumerate() {
                let size = RationalFunction::from(state.members.len() as i64);
                let closed = &solution.forms()[s].at_generation(k).unwrap() * &size;
                assert_eq!(
                    closed,
                    RationalFunction::from(masses[s].clone()),
                    "k={} {}",
                    k,
                    state.label()
                );
            }
        }
    }

    #[test]
    fn test_closed_form_matches_cycling() {
        let solution = TransitionSystem::build(CrossDesign::Biparental)
            .unwrap()
            .solve()
            .unwrap();
        let generations = CrossDesign::Biparental.founding_population().generations(4);
        for (i, population) in generations.iter().enumerate() {
            let k = i as u32 + 1;
            let exact = solution.genotype_probabilities(k).unwrap();
            for (genotype, value) in &exact {
                let iterated = population.probability_of(genotype);
                for r in sample_rates() {
                    assert_eq!(value.eval(&r), Some(iterated.eval(&r)), "k={} {}", k, genotype);
                }
            }
        }
    }

    #[test]
    fn test_unphased_closed_forms_cover_nine_keys() {
        let solution = TransitionSystem::build(CrossDesign::Biparental)
            .unwrap()
            .solve()
            .unwrap();
        let unphased = solution.unphased();
        assert_eq!(unphased.len(), 9);
        let f2 = CrossDesign::Biparental.founding_population().cycle().unphase();
        for (key, form) in &unphased {
            assert_eq!(form.at_generation(2).unwrap(), RationalFunction::from(f2[key].clone()));
        }
        assert_eq!(solution.by_state().len(), 5);
        assert!(solution.formula("AA|BB").is_some());
        assert!(solution.formula("CC|CC").is_none());
    }

    #[test]
    fn test_non_lumpable_partition_is_rejected() {
        // AA|AB selfs differently from AA|BB, so they cannot share a state
        let table = vec![
            StateDeclaration::new("AA|AA", &["AA|AA", "BB|BB"]),
            StateDeclaration::new("AB|AB", &["AB|AB", "BA|BA"]),
            StateDeclaration::new(
                "AA|AB",
                &["AA|AB", "BA|BB", "AA|BA", "AB|BB", "AA|BB"],
            ),
            StateDeclaration::new("AB|BA", &["AB|BA"]),
        ];
        let alphabet = CrossDesign::Biparental.founding_population().selfing_closure();
        let partition = StatePartition::validate(&table, &alphabet).unwrap();
        match TransitionSystem::from_partition(CrossDesign::Biparental, partition) {
            Err(InheritanceError::NotLumpable { state, genotype }) => {
                assert_eq!(state, "AA|AB");
                assert_eq!(genotype, "AA|BB");
            }
            other => panic!("unexpected {:?}", other.map(|s| s.partition().len())),
        }
    }

    #[test]
    fn test_propagate_rejects_generation_zero() {
        let system = TransitionSystem::build(CrossDesign::Biparental).unwrap();
        assert!(matches!(
            system.propagate(0),
            Err(InheritanceError::GenerationOutOfRange { .. })
        ));
    }
}
