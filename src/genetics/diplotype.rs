//! Diplotype — a phased two-locus genotype with a symbolic probability

use super::gamete::{meiosis, Gamete};
use super::haplotype::{GenotypeKey, Haplotype};
use crate::algebra::Polynomial;
use crate::error::{InheritanceError, Result};
use num_traits::One;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A haplotype pair plus the probability that an individual carries it.
///
/// Immutable; aggregation always builds new values. Equality compares the
/// canonical pair and the probability expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diplotype {
    key: GenotypeKey,
    probability: Polynomial,
}

impl Diplotype {
    /// An unweighted diplotype (probability exactly 1).
    pub fn new(a: Haplotype, b: Haplotype) -> Self {
        Self::weighted(a, b, Polynomial::one())
    }

    pub fn weighted(a: Haplotype, b: Haplotype, probability: Polynomial) -> Self {
        Self {
            key: GenotypeKey::new(a, b),
            probability,
        }
    }

    pub fn from_key(key: GenotypeKey, probability: Polynomial) -> Self {
        Self { key, probability }
    }

    /// Build from haplotype strings; exactly two of length two.
    pub fn from_haplotypes(haplotypes: &[&str]) -> Result<Self> {
        match haplotypes {
            [a, b] => Ok(Self::new(a.parse()?, b.parse()?)),
            _ => Err(InheritanceError::HaplotypeCount {
                count: haplotypes.len(),
            }),
        }
    }

    pub fn key(&self) -> GenotypeKey {
        self.key
    }

    pub fn maternal(&self) -> Haplotype {
        self.key.first()
    }

    pub fn paternal(&self) -> Haplotype {
        self.key.second()
    }

    pub fn probability(&self) -> &Polynomial {
        &self.probability
    }

    pub fn with_probability(&self, probability: Polynomial) -> Self {
        Self {
            key: self.key,
            probability,
        }
    }

    pub fn gametes(&self) -> [Gamete; 4] {
        meiosis(self.maternal(), self.paternal(), &self.probability)
    }

    /// All 16 ordered gamete pairings of `self` with itself, uncombined.
    ///
    /// One individual produces both gametes, so the parent's probability
    /// enters once: children sum to exactly `self.probability()`.
    pub fn selfmate(&self) -> Vec<Diplotype> {
        let gametes = meiosis(self.maternal(), self.paternal(), &Polynomial::one());
        gametes
            .iter()
            .flat_map(|g1| {
                gametes.iter().map(move |g2| {
                    Diplotype::weighted(
                        g1.haplotype,
                        g2.haplotype,
                        &(&g1.probability * &g2.probability) * &self.probability,
                    )
                })
            })
            .collect()
    }

    /// All 16 ordered gamete pairings of `self` with `other`, uncombined;
    /// each child's probability is the product of its two gametes'.
    pub fn cross(&self, other: &Diplotype) -> Vec<Diplotype> {
        let mine = self.gametes();
        let theirs = other.gametes();
        mine.iter()
            .flat_map(|g1| {
                theirs.iter().map(move |g2| {
                    Diplotype::weighted(
                        g1.haplotype,
                        g2.haplotype,
                        &g1.probability * &g2.probability,
                    )
                })
            })
            .collect()
    }

    /// Locus-1 alleles, maternal then paternal.
    pub fn locus1(&self) -> String {
        [self.maternal().locus1(), self.paternal().locus1()]
            .iter()
            .collect()
    }

    /// Locus-2 alleles, maternal then paternal.
    pub fn locus2(&self) -> String {
        [self.maternal().locus2(), self.paternal().locus2()]
            .iter()
            .collect()
    }

    pub fn unphased_key(&self) -> String {
        self.key.unphased()
    }

    pub fn contains(&self, haplotype: &Haplotype) -> bool {
        self.maternal() == *haplotype || self.paternal() == *haplotype
    }

    pub fn alleles(&self) -> BTreeSet<char> {
        [self.maternal(), self.paternal()]
            .iter()
            .flat_map(|h| [h.locus1(), h.locus2()])
            .collect()
    }
}

impl FromStr for Diplotype {
    type Err = InheritanceError;

    /// Parses `"AB|CD"` into an unweighted diplotype.
    fn from_str(s: &str) -> Result<Self> {
        let key: GenotypeKey = s.parse()?;
        Ok(Self::from_key(key, Polynomial::one()))
    }
}

impl fmt::Display for Diplotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
