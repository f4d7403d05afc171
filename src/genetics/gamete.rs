//! Gamete generator — meiosis of one diplotype
//!
//! Two parental haplotypes with weight (1−r)/2 each and two recombinants
//! (locus-2 alleles swapped) with weight r/2 each, all scaled by the parent's
//! own probability.

use super::haplotype::Haplotype;
use crate::algebra::{rational, Polynomial};
use num_traits::One;

/// A transmitted haplotype with its symbolic probability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gamete {
    pub haplotype: Haplotype,
    pub probability: Polynomial,
}

/// (1 − r) / 2
pub fn parental_weight() -> Polynomial {
    Polynomial::linear(rational(1, 2), rational(-1, 2))
}

/// r / 2
pub fn recombinant_weight() -> Polynomial {
    Polynomial::linear(rational(0, 1), rational(1, 2))
}

/// The four gametes of a parent with haplotypes `maternal` and `paternal`
/// occurring with probability `weight`.
pub fn meiosis(maternal: Haplotype, paternal: Haplotype, weight: &Polynomial) -> [Gamete; 4] {
    let parental = if weight.is_one() {
        parental_weight()
    } else {
        &parental_weight() * weight
    };
    let recombinant = if weight.is_one() {
        recombinant_weight()
    } else {
        &recombinant_weight() * weight
    };
    [
        Gamete {
            haplotype: maternal,
            probability: parental.clone(),
        },
        Gamete {
            haplotype: paternal,
            probability: parental,
        },
        Gamete {
            haplotype: maternal.recombine(&paternal),
            probability: recombinant.clone(),
        },
        Gamete {
            haplotype: paternal.recombine(&maternal),
            probability: recombinant,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    fn total(gametes: &[Gamete]) -> Polynomial {
        gametes
            .iter()
            .fold(Polynomial::zero(), |acc, g| &acc + &g.probability)
    }

    #[test]
    fn test_gametes_of_double_heterozygote() {
        let gametes = meiosis("AA".parse().unwrap(), "BB".parse().unwrap(), &Polynomial::one());
        let names: Vec<String> = gametes.iter().map(|g| g.haplotype.to_string()).collect();
        assert_eq!(names, vec!["AA", "BB", "AB", "BA"]);
        assert_eq!(gametes[0].probability, parental_weight());
        assert_eq!(gametes[3].probability, recombinant_weight());
        assert_eq!(total(&gametes), Polynomial::one());
    }

    #[test]
    fn test_probability_sums_to_parent_weight() {
        let weight = &Polynomial::variable() * &Polynomial::from_ratio(3, 7);
        let gametes = meiosis("AC".parse().unwrap(), "BD".parse().unwrap(), &weight);
        assert_eq!(total(&gametes), weight);
    }

    #[test]
    fn test_homozygote_collapses() {
        let h: Haplotype = "CD".parse().unwrap();
        let gametes = meiosis(h, h, &Polynomial::one());
        assert!(gametes.iter().all(|g| g.haplotype == h));
        assert_eq!(total(&gametes), Polynomial::one());
    }
}
