//! Haplotypes and canonical genotype keys

use crate::error::{InheritanceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The alleles carried together on one chromosome copy, locus 1 then locus 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Haplotype([char; 2]);

impl Haplotype {
    pub fn new(locus1: char, locus2: char) -> Self {
        Self([locus1, locus2])
    }

    pub fn locus1(&self) -> char {
        self.0[0]
    }

    pub fn locus2(&self) -> char {
        self.0[1]
    }

    /// Locus 1 from `self`, locus 2 from `other`.
    pub fn recombine(&self, other: &Haplotype) -> Haplotype {
        Haplotype([self.0[0], other.0[1]])
    }

    pub fn relabel(&self, map: impl Fn(char) -> char) -> Haplotype {
        Haplotype([map(self.0[0]), map(self.0[1])])
    }
}

impl FromStr for Haplotype {
    type Err = InheritanceError;

    fn from_str(s: &str) -> Result<Self> {
        let alleles: Vec<char> = s.chars().collect();
        match alleles.as_slice() {
            [a, b] => Ok(Haplotype([*a, *b])),
            _ => Err(InheritanceError::HaplotypeLength {
                haplotype: s.to_string(),
                length: alleles.len(),
            }),
        }
    }
}

impl TryFrom<String> for Haplotype {
    type Error = InheritanceError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Haplotype> for String {
    fn from(h: Haplotype) -> String {
        h.to_string()
    }
}

impl fmt::Display for Haplotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0[0], self.0[1])
    }
}

/// An unordered haplotype pair, stored sorted.
///
/// This is the single identity used for equality, hashing and aggregation of
/// genotypes; construction order never leaks through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GenotypeKey {
    first: Haplotype,
    second: Haplotype,
}

impl GenotypeKey {
    pub fn new(a: Haplotype, b: Haplotype) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> Haplotype {
        self.first
    }

    pub fn second(&self) -> Haplotype {
        self.second
    }

    pub fn is_homozygous(&self) -> bool {
        self.first == self.second
    }

    /// Phase-free key: sorted locus-1 alleles followed by sorted locus-2 alleles.
    pub fn unphased(&self) -> String {
        let mut l1 = [self.first.locus1(), self.second.locus1()];
        let mut l2 = [self.first.locus2(), self.second.locus2()];
        l1.sort_unstable();
        l2.sort_unstable();
        [l1[0], l1[1], l2[0], l2[1]].iter().collect()
    }

    /// Rename alleles, re-canonicalizing the pair.
    pub fn relabel(&self, map: impl Fn(char) -> char) -> GenotypeKey {
        GenotypeKey::new(self.first.relabel(&map), self.second.relabel(&map))
    }
}

impl FromStr for GenotypeKey {
    type Err = InheritanceError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('|').collect();
        match parts.as_slice() {
            [a, b] => Ok(GenotypeKey::new(a.parse()?, b.parse()?)),
            _ => Err(InheritanceError::HaplotypeCount { count: parts.len() }),
        }
    }
}

impl TryFrom<String> for GenotypeKey {
    type Error = InheritanceError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<GenotypeKey> for String {
    fn from(key: GenotypeKey) -> String {
        key.to_string()
    }
}

impl fmt::Display for GenotypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.first, self.second)
    }
}
