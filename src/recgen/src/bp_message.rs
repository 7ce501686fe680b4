//! Sparse belief-propagation messages over pairs of genes.
//!
//! A message is a probability distribution over unordered gene pairs
//! (`BpDomain`), kept as a sparse map plus a shared `nullval` for every
//! domain element that was never explicitly touched. This mirrors the
//! reference `bp_message`/`bp_domain` pair: a `std::map` keyed on the
//! canonical (min, max) gene ordering, with arithmetic operators that
//! fold the untouched mass (`nullval * remaining domain size`) in rather
//! than materializing every pair up front.

use ahash::AHashMap;
use genome::Gene;

/// A canonically-ordered pair of genes: `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BpDomain(Gene, Gene);

impl BpDomain {
    #[must_use]
    pub fn new(g1: Gene, g2: Gene) -> Self {
        if g1 <= g2 {
            BpDomain(g1, g2)
        } else {
            BpDomain(g2, g1)
        }
    }

    #[must_use]
    pub fn get(self, i: usize) -> Gene {
        if i == 0 {
            self.0
        } else {
            self.1
        }
    }
}

/// Sparse probability distribution over [`BpDomain`] elements.
#[derive(Debug, Clone)]
pub struct Message {
    probabilities: AHashMap<BpDomain, f64>,
    nullval: f64,
}

impl Message {
    #[must_use]
    pub fn new(nullval: f64) -> Self {
        Message { probabilities: AHashMap::new(), nullval }
    }

    #[must_use]
    pub fn get(&self, domain: BpDomain) -> f64 {
        *self.probabilities.get(&domain).unwrap_or(&self.nullval)
    }

    pub fn set(&mut self, domain: BpDomain, value: f64) {
        self.probabilities.insert(domain, value);
    }

    pub fn add_to(&mut self, domain: BpDomain, delta: f64) {
        let entry = self.probabilities.entry(domain).or_insert(self.nullval);
        *entry += delta;
    }

    /// Marginal probability of a single gene: sum over every domain
    /// element containing it. Untouched pairs contribute `nullval` for
    /// every value the gene is not explicitly paired with; the driver
    /// only ever queries marginals for genes it has already enumerated
    /// as part of a finite candidate set, so this stays O(entries).
    #[must_use]
    pub fn marginal(&self, gene: Gene, candidate_genes: &[Gene]) -> f64 {
        let mut sum = 0.0;
        for &other in candidate_genes {
            let domain = BpDomain::new(gene, other);
            sum += self.probabilities.get(&domain).copied().unwrap_or(self.nullval);
        }
        sum
    }

    pub fn mul_scalar(&mut self, scalar: f64) {
        for value in self.probabilities.values_mut() {
            *value *= scalar;
        }
        self.nullval *= scalar;
    }

    pub fn div_scalar(&mut self, scalar: f64) {
        self.mul_scalar(1.0 / scalar);
    }

    /// Normalizes the distribution so every entry (including the implicit
    /// `nullval` mass over the rest of the domain) sums to one.
    pub fn normalize(&mut self, domain_size: usize) {
        let explicit: f64 = self.probabilities.values().sum();
        let untouched = (domain_size as f64 - self.probabilities.len() as f64).max(0.0);
        let sum = explicit + self.nullval * untouched;
        if sum > 0.0 {
            self.div_scalar(sum);
        }
    }

    /// The domain element with the highest assigned probability. Falls
    /// back to an arbitrary `(1, 2)`-shaped pair when every entry is
    /// still at `nullval`, matching the reference's default.
    #[must_use]
    pub fn extract_max(&self) -> BpDomain {
        let mut best = BpDomain::new(Gene(1), Gene(2));
        let mut best_weight = 0.0_f64;
        for (&domain, &weight) in &self.probabilities {
            if weight > best_weight {
                best = domain;
                best_weight = weight;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_entries_fall_back_to_nullval() {
        let msg = Message::new(0.25);
        assert_eq!(msg.get(BpDomain::new(Gene(1), Gene(2))), 0.25);
    }

    #[test]
    fn domain_is_order_independent() {
        assert_eq!(BpDomain::new(Gene(3), Gene(1)), BpDomain::new(Gene(1), Gene(3)));
    }

    #[test]
    fn normalize_divides_explicit_and_implicit_mass() {
        let mut msg = Message::new(0.0);
        msg.set(BpDomain::new(Gene(1), Gene(2)), 4.0);
        msg.normalize(4);
        assert!((msg.get(BpDomain::new(Gene(1), Gene(2))) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn extract_max_picks_heaviest_pair() {
        let mut msg = Message::new(0.0);
        msg.set(BpDomain::new(Gene(1), Gene(2)), 0.1);
        msg.set(BpDomain::new(Gene(3), Gene(4)), 0.9);
        assert_eq!(msg.extract_max(), BpDomain::new(Gene(3), Gene(4)));
    }
}
