//! The five symbol-collector variants, each implementing
//! [`crate::SymbolCollector`] over the same couple/children shape but with
//! a different strategy for guessing a parent couple's genome from its
//! children's (already-collected) genetic information.

mod bp;
mod most_frequent;
mod parsimony;
mod recursive;
mod triple_vote;

pub use bp::BeliefPropagationCollector;
pub use most_frequent::MostFrequentCollector;
pub use parsimony::ParsimonyCollector;
pub use recursive::RecursiveCollector;
pub use triple_vote::TripleVoteCollector;
