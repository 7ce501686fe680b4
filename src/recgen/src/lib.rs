//! The REC-GEN reconstruction driver: siblinghood testing, parent
//! assignment, and the five interchangeable symbol-collector variants
//! that fill in ancestral genomes generation by generation.
//!
//! Collector and sibling-test strategies are trait objects rather than an
//! inheritance chain, so `driver::run` can be handed any combination of
//! `Box<dyn SiblingTest>` / `Box<dyn SymbolCollector>` without caring which
//! concrete variant it is.

pub mod bp_message;
pub mod collect;
pub mod driver;
pub mod parent_assign;
pub mod sibling;
pub mod thresholds;

pub use collect::{
    BeliefPropagationCollector, MostFrequentCollector, ParsimonyCollector, RecursiveCollector,
    TripleVoteCollector,
};
pub use driver::{run, RecGenConfig};
pub use sibling::{CandidatePairSiblingTest, NaiveSiblingTest};
pub use thresholds::Thresholds;

use hypergraph::Hypergraph;
use ids::CoupleId;
use pedigree::Pedigree;

/// Tests a generation's couples for siblinghood, producing the 3-uniform
/// hypergraph that `assign_parents` extracts cliques from. Implementors
/// correspond to the naive cubic variant and the candidate-pair quadratic
/// variant from the original paper.
pub trait SiblingTest {
    fn test(&self, ped: &Pedigree, thresholds: &Thresholds) -> Hypergraph;
}

/// Reconstructs the genetic material of a single couple from its
/// children's (already-collected) genetic information. Each of the five
/// variants implements this differently; the driver calls it once per
/// couple in the current layer, after parents for that layer have been
/// assigned.
pub trait SymbolCollector {
    fn collect(&mut self, ped: &mut Pedigree, couple: CoupleId);
}
