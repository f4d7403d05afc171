//! Population — a weighted multiset of diplotypes and its selfing recurrence

use super::diplotype::Diplotype;
use super::haplotype::GenotypeKey;
use crate::algebra::{Polynomial, RationalFunction};
use crate::numeric::RateFunction;
use log::debug;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One generation's genotype distribution.
///
/// Only a combined population has unique genotypes; `combine` is applied by
/// every builder and by `cycle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    members: Vec<Diplotype>,
}

impl Population {
    pub fn new(members: Vec<Diplotype>) -> Self {
        Self { members }
    }

    /// A population holding a single individual with probability 1.
    pub fn founder(diplotype: Diplotype) -> Self {
        Self::new(vec![diplotype.with_probability(Polynomial::one())])
    }

    /// Combined progeny of crossing two individuals.
    pub fn from_cross(a: &Diplotype, b: &Diplotype) -> Self {
        Self::new(a.cross(b)).combine()
    }

    /// Combined progeny of crossing every member of `self` with every member
    /// of `other`.
    pub fn cross(&self, other: &Population) -> Self {
        self.members
            .iter()
            .flat_map(|a| other.members.iter().flat_map(move |b| a.cross(b)))
            .collect::<Population>()
            .combine()
    }

    pub fn members(&self) -> &[Diplotype] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diplotype> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum the probabilities of identical genotypes; result sorted by key.
    pub fn combine(&self) -> Population {
        let mut groups: BTreeMap<GenotypeKey, Polynomial> = BTreeMap::new();
        for d in &self.members {
            groups
                .entry(d.key())
                .and_modify(|p| *p += d.probability())
                .or_insert_with(|| d.probability().clone());
        }
        Population {
            members: groups
                .into_iter()
                .filter(|(_, p)| !p.is_zero())
                .map(|(key, p)| Diplotype::from_key(key, p))
                .collect(),
        }
    }

    /// Probabilities per phase-free genotype key.
    pub fn unphase(&self) -> BTreeMap<String, Polynomial> {
        let mut table: BTreeMap<String, Polynomial> = BTreeMap::new();
        for d in &self.members {
            table
                .entry(d.unphased_key())
                .and_modify(|p| *p += d.probability())
                .or_insert_with(|| d.probability().clone());
        }
        table
    }

    /// One generation of selfing: each individual selfed on its own, the
    /// pooled progeny combined again.
    pub fn cycle(&self) -> Population {
        let nursery: Vec<Diplotype> = self
            .members
            .iter()
            .flat_map(|d| Population::new(d.selfmate()).combine().members)
            .collect();
        let next = Population::new(nursery).combine();
        debug!("selfed {} genotypes into {}", self.len(), next.len());
        next
    }

    /// Total probability mass; exactly 1 for any valid population.
    pub fn marginal(&self) -> Polynomial {
        self.members
            .iter()
            .fold(Polynomial::zero(), |acc, d| &acc + d.probability())
    }

    /// Numerically evaluable functions of r, one per unphased genotype.
    pub fn to_functions(&self) -> Vec<RateFunction> {
        self.unphase()
            .into_iter()
            .map(|(label, p)| RateFunction::new(label, RationalFunction::from(p)))
            .collect()
    }

    /// Phased member labels (`AB|CD`) and their probabilities, in member order.
    pub fn vectorize(&self) -> (Vec<String>, Vec<Polynomial>) {
        self.members
            .iter()
            .map(|d| (d.to_string(), d.probability().clone()))
            .unzip()
    }

    /// Probability of one genotype; zero when absent.
    pub fn probability_of(&self, key: &GenotypeKey) -> Polynomial {
        self.members
            .iter()
            .filter(|d| d.key() == *key)
            .fold(Polynomial::zero(), |acc, d| &acc + d.probability())
    }

    pub fn support(&self) -> BTreeSet<GenotypeKey> {
        self.members.iter().map(Diplotype::key).collect()
    }

    /// Every genotype reachable from this population by repeated selfing,
    /// including its own members.
    pub fn selfing_closure(&self) -> BTreeSet<GenotypeKey> {
        let mut seen = self.support();
        let mut frontier: Vec<GenotypeKey> = seen.iter().copied().collect();
        while let Some(key) = frontier.pop() {
            for child in Diplotype::from_key(key, Polynomial::one()).selfmate() {
                if seen.insert(child.key()) {
                    frontier.push(child.key());
                }
            }
        }
        seen
    }

    /// This population as generation 1 followed by `n - 1` selfed generations.
    pub fn generations(&self, n: usize) -> Vec<Population> {
        let mut out: Vec<Population> = Vec::with_capacity(n);
        if n == 0 {
            return out;
        }
        out.push(self.combine());
        while out.len() < n {
            let next = out[out.len() - 1].cycle();
            out.push(next);
        }
        out
    }
}

impl FromIterator<Diplotype> for Population {
    fn from_iter<I: IntoIterator<Item = Diplotype>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::rational;
    use crate::numeric::RateExpression;

    fn f1() -> Population {
        let a: Diplotype = "AA|AA".parse().unwrap();
        let b: Diplotype = "BB|BB".parse().unwrap();
        Population::from_cross(&a, &b)
    }

    #[test]
    fn test_f1_is_single_genotype() {
        let pop = f1();
        assert_eq!(pop.len(), 1);
        assert_eq!(pop.members()[0].to_string(), "AA|BB");
        assert!(pop.marginal().is_one());
    }

    #[test]
    fn test_combine_is_idempotent() {
        let raw = Population::new("AB|BA".parse::<Diplotype>().unwrap().selfmate());
        let once = raw.combine();
        assert_eq!(once.combine(), once);
        assert!(once.len() < raw.len());
        assert_eq!(once.marginal(), raw.marginal());
    }

    #[test]
    fn test_f2_without_recombination() {
        let f2 = f1().cycle();
        assert!(f2.marginal().is_one());
        let zero = rational(0, 1);
        let table = f2.unphase();
        let at_zero: BTreeMap<&str, _> = table
            .iter()
            .map(|(k, p)| (k.as_str(), p.eval(&zero)))
            .filter(|(_, v)| !v.is_zero())
            .collect();
        assert_eq!(at_zero.len(), 3);
        assert_eq!(at_zero["AAAA"], rational(1, 4));
        assert_eq!(at_zero["ABAB"], rational(1, 2));
        assert_eq!(at_zero["BBBB"], rational(1, 4));
    }

    #[test]
    fn test_f2_unlinked_is_mendelian() {
        let half = rational(1, 2);
        let table = f1().cycle().unphase();
        assert_eq!(table.len(), 9);
        for (key, p) in &table {
            let l1 = if key[0..2] == key[0..1].repeat(2) { 1 } else { 2 };
            let l2 = if key[2..4] == key[2..3].repeat(2) { 1 } else { 2 };
            assert_eq!(p.eval(&half), rational(l1 * l2, 16), "genotype {}", key);
        }
    }

    #[test]
    fn test_probability_of_and_vectorize() {
        let f2 = f1().cycle();
        let key: GenotypeKey = "AA|AA".parse().unwrap();
        let expected = Polynomial::linear(rational(1, 2), rational(-1, 2)).pow(2);
        assert_eq!(f2.probability_of(&key), expected);
        assert!(f2.probability_of(&"CC|CC".parse().unwrap()).is_zero());

        let (labels, probs) = f2.vectorize();
        assert_eq!(labels.len(), f2.len());
        assert_eq!(labels.len(), probs.len());
        assert_eq!(labels[0], "AA|AA");
        assert!(labels.iter().all(|l| l.contains('|')));
        assert!(labels.contains(&"AB|BA".to_string()));
        assert_eq!(probs[0], expected);

        let functions = f2.to_functions();
        let aaaa = functions.iter().find(|f| f.label == "AAAA").unwrap();
        assert!((aaaa.evaluate(0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_selfing_closure_of_biparental_f1() {
        let closure = f1().selfing_closure();
        // unordered pairs over {AA, AB, BA, BB}
        assert_eq!(closure.len(), 10);
        let f4 = f1().generations(4);
        assert_eq!(f4.len(), 4);
        for generation in &f4 {
            assert!(generation.support().is_subset(&closure));
            assert!(generation.marginal().is_one());
        }
        println!("biparental alphabet: {} genotypes", closure.len());
    }
}
