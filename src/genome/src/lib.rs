//! Gene and genome primitives shared by every REC-GEN crate.
//!
//! A [`Gene`] is an opaque, nonnegative integer identifier: the simulator
//! mints distinct genes for founders, inheritance only ever copies an
//! existing value, and reconstruction treats genes as indivisible tokens it
//! can compare for equality but never interpret further. `0` is reserved to
//! mean "unknown" (not yet assigned / not yet reconstructed).

use std::fmt;
use std::ops::{Index, IndexMut};

use thiserror::Error;

/// An opaque gene identifier. `Gene::UNKNOWN` (value `0`) marks a slot whose
/// value has not been determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Gene(pub u64);

impl Gene {
    pub const UNKNOWN: Gene = Gene(0);

    #[must_use]
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Gene {
    fn from(value: u64) -> Self {
        Gene(value)
    }
}

#[derive(Debug, Error)]
pub enum GenomeError {
    #[error("block index {index} out of range for genome of {len} blocks")]
    BlockOutOfRange { index: usize, len: usize },
}

/// A fixed-length sequence of genes: one strand of an individual's genome.
///
/// The number of blocks (`B` in the pedigree parameters) is fixed at
/// construction time and never changes; every `Genome` belonging to the same
/// `Pedigree` carries the same length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genome(Vec<Gene>);

impl Genome {
    /// Builds a genome with `num_blocks` slots, all set to [`Gene::UNKNOWN`].
    #[must_use]
    pub fn unknown(num_blocks: usize) -> Self {
        Genome(vec![Gene::UNKNOWN; num_blocks])
    }

    #[must_use]
    pub fn from_genes(genes: Vec<Gene>) -> Self {
        Genome(genes)
    }

    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, block: usize) -> Option<Gene> {
        self.0.get(block).copied()
    }

    pub fn try_set(&mut self, block: usize, gene: Gene) -> Result<(), GenomeError> {
        let len = self.0.len();
        let slot = self
            .0
            .get_mut(block)
            .ok_or(GenomeError::BlockOutOfRange { index: block, len })?;
        *slot = gene;
        Ok(())
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Gene> {
        self.0.iter()
    }

    /// Whether every block has been assigned a known gene.
    #[must_use]
    pub fn is_fully_known(&self) -> bool {
        self.0.iter().all(|g| !g.is_unknown())
    }
}

impl Index<usize> for Genome {
    type Output = Gene;
    fn index(&self, block: usize) -> &Gene {
        &self.0[block]
    }
}

impl IndexMut<usize> for Genome {
    fn index_mut(&mut self, block: usize) -> &mut Gene {
        &mut self.0[block]
    }
}

impl<'a> IntoIterator for &'a Genome {
    type Item = &'a Gene;
    type IntoIter = std::slice::Iter<'a, Gene>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_genome_has_all_unknown_genes() {
        let g = Genome::unknown(4);
        assert_eq!(g.num_blocks(), 4);
        assert!(!g.is_fully_known());
        assert!(g.iter().all(|gene| gene.is_unknown()));
    }

    #[test]
    fn set_and_index_roundtrip() {
        let mut g = Genome::unknown(2);
        g.try_set(0, Gene(7)).unwrap();
        assert_eq!(g[0], Gene(7));
        assert_eq!(g[1], Gene::UNKNOWN);
        assert!(!g.is_fully_known());
        g.try_set(1, Gene(3)).unwrap();
        assert!(g.is_fully_known());
    }

    #[test]
    fn out_of_range_block_errors() {
        let mut g = Genome::unknown(2);
        assert!(matches!(
            g.try_set(5, Gene(1)),
            Err(GenomeError::BlockOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn gene_zero_is_unknown() {
        assert!(Gene::UNKNOWN.is_unknown());
        assert!(!Gene(1).is_unknown());
    }
}
