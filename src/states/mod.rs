//! State collapser — symmetry classes of genotypes
//!
//! A cross design declares its states as configuration data: a representative
//! genotype plus every member genotype. The declaration is validated against
//! the genotype alphabet the cross actually produces, never derived.

pub mod designs;

pub use designs::CrossDesign;

use crate::algebra::{Polynomial, RationalFunction, RationalMatrix};
use crate::error::{InheritanceError, Result};
use crate::genetics::{GenotypeKey, Population};
use log::info;
use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One declared state as written in a design's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDeclaration {
    pub representative: String,
    pub members: Vec<String>,
}

impl StateDeclaration {
    pub fn new(representative: &str, members: &[&str]) -> Self {
        Self {
            representative: representative.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// A validated equivalence class of canonical genotypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub representative: GenotypeKey,
    /// Distinct canonical members, sorted
    pub members: Vec<GenotypeKey>,
}

impl State {
    pub fn label(&self) -> String {
        self.representative.to_string()
    }

    /// 1 / number of distinct unordered haplotype pairs in the state.
    pub fn correction(&self) -> BigRational {
        BigRational::new(BigInt::from(1), BigInt::from(self.members.len()))
    }
}

/// A partition of a genotype alphabet into states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePartition {
    states: Vec<State>,
    /// Genotype alphabet in enumeration order
    genotypes: Vec<GenotypeKey>,
    membership: BTreeMap<GenotypeKey, usize>,
}

impl StatePartition {
    /// Check that `declarations` partition `alphabet` exactly: no empty
    /// state, no genotype in two states, nothing missing, nothing foreign.
    pub fn validate(
        declarations: &[StateDeclaration],
        alphabet: &BTreeSet<GenotypeKey>,
    ) -> Result<Self> {
        let mut states = Vec::with_capacity(declarations.len());
        let mut membership: BTreeMap<GenotypeKey, usize> = BTreeMap::new();

        for (index, declaration) in declarations.iter().enumerate() {
            let representative: GenotypeKey = declaration.representative.parse()?;
            if declaration.members.is_empty() {
                return Err(InheritanceError::EmptyState {
                    state: declaration.representative.clone(),
                });
            }
            let mut members = BTreeSet::new();
            for raw in &declaration.members {
                let key: GenotypeKey = raw.parse()?;
                if !alphabet.contains(&key) {
                    return Err(InheritanceError::PartitionExtraneous {
                        state: representative.to_string(),
                        genotype: key.to_string(),
                    });
                }
                if let Some(&other) = membership.get(&key) {
                    if other != index {
                        return Err(InheritanceError::PartitionOverlap {
                            genotype: key.to_string(),
                            first: states
                                .get(other)
                                .map(State::label)
                                .unwrap_or_default(),
                            second: representative.to_string(),
                        });
                    }
                }
                membership.insert(key, index);
                members.insert(key);
            }
            if !members.contains(&representative) {
                return Err(InheritanceError::RepresentativeNotMember {
                    state: representative.to_string(),
                });
            }
            states.push(State {
                representative,
                members: members.into_iter().collect(),
            });
        }

        if let Some(missing) = alphabet.iter().find(|g| !membership.contains_key(g)) {
            return Err(InheritanceError::PartitionMissing {
                genotype: missing.to_string(),
            });
        }

        info!(
            "Validated state partition: {} genotypes in {} states",
            alphabet.len(),
            states.len()
        );

        Ok(Self {
            states,
            genotypes: alphabet.iter().copied().collect(),
            membership,
        })
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, index: usize) -> &State {
        &self.states[index]
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn genotypes(&self) -> &[GenotypeKey] {
        &self.genotypes
    }

    pub fn labels(&self) -> Vec<String> {
        self.states.iter().map(State::label).collect()
    }

    /// Index of the state holding `genotype`.
    pub fn state_of(&self, genotype: &GenotypeKey) -> Option<usize> {
        self.membership.get(genotype).copied()
    }

    /// `I[g, s] = 1` iff genotype `g` belongs to state `s`.
    pub fn incidence_matrix(&self) -> RationalMatrix {
        DMatrix::from_fn(self.genotypes.len(), self.states.len(), |g, s| {
            if self.membership.get(&self.genotypes[g]) == Some(&s) {
                RationalFunction::from(1)
            } else {
                RationalFunction::zero()
            }
        })
    }

    pub fn correction_factors(&self) -> Vec<BigRational> {
        self.states.iter().map(State::correction).collect()
    }

    /// Diagonal matrix of correction factors.
    pub fn correction_matrix(&self) -> RationalMatrix {
        let factors = self.correction_factors();
        DMatrix::from_fn(self.states.len(), self.states.len(), |i, j| {
            if i == j {
                RationalFunction::constant(factors[i].clone())
            } else {
                RationalFunction::zero()
            }
        })
    }

    /// Probability mass of `population` per state.
    ///
    /// Fails on a genotype outside the partition.
    pub fn state_masses(&self, population: &Population) -> Result<Vec<Polynomial>> {
        let mut masses = vec![Polynomial::zero(); self.states.len()];
        for d in population.iter() {
            let s = self
                .state_of(&d.key())
                .ok_or_else(|| InheritanceError::PartitionMissing {
                    genotype: d.key().to_string(),
                })?;
            masses[s] += d.probability();
        }
        Ok(masses)
    }

    /// Genotype probabilities of `population` in alphabet order.
    pub fn genotype_vector(&self, population: &Population) -> Vec<Polynomial> {
        let combined = population.combine();
        self.genotypes
            .iter()
            .map(|g| combined.probability_of(g))
            .collect()
    }
}
