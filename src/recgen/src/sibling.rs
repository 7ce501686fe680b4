//! Sibling tests: the naive cubic variant (all triples of the current
//! layer) and the quadratic candidate-pair variant (pairwise filter, then
//! triple completion only against the surviving candidates).

use hypergraph::Hypergraph;
use ids::CoupleId;
use log::debug;
use pedigree::{shared_blocks, Pedigree};

use crate::{SiblingTest, Thresholds};

/// `rec_gen_basic::test_siblinghood`: every triple of the current layer
/// is tested directly against `sib`, at O(|layer|^3) cost.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveSiblingTest;

impl SiblingTest for NaiveSiblingTest {
    fn test(&self, ped: &Pedigree, thresholds: &Thresholds) -> Hypergraph {
        let mut graph = Hypergraph::new();
        let layer: Vec<CoupleId> = ped.current_layer().iter().copied().collect();
        let threshold = (thresholds.sib() * ped.num_blocks() as f64).ceil() as usize;
        for i in 0..layer.len() {
            for j in (i + 1)..layer.len() {
                for k in (j + 1)..layer.len() {
                    let (u, v, w) = (layer[i], layer[j], layer[k]);
                    if shared_blocks(ped, u, v, w) >= threshold {
                        debug!("sibling triple ({u}, {v}, {w}) passes sib test");
                        graph.insert_edge(u, v, w);
                    }
                }
            }
        }
        graph
    }
}

/// `rec_gen_quadratic::test_siblinghood`: first narrows to candidate
/// pairs whose pairwise overlap clears `cand`, then only completes
/// triples by scanning the rest of the layer against those candidates,
/// at O(|layer|^2) cost.
#[derive(Debug, Default, Clone, Copy)]
pub struct CandidatePairSiblingTest;

impl CandidatePairSiblingTest {
    /// Pairwise overlap used to prune candidate pairs before the
    /// quadratic triple-completion pass: counts blocks where `other`
    /// carries either gene of `couple`.
    fn pairwise_shared(ped: &Pedigree, couple: CoupleId, other: CoupleId) -> usize {
        let Some(node) = ped.couple(couple) else {
            return 0;
        };
        let [a, b] = node.members();
        let mut shared = 0;
        for block in 0..ped.num_blocks() {
            let gene_a = ped.individual(a).and_then(|i| i.genome().get(block)).unwrap_or_default();
            let gene_b = ped.individual(b).and_then(|i| i.genome().get(block)).unwrap_or_default();
            if ped.has_gene(other, block, gene_a) || ped.has_gene(other, block, gene_b) {
                shared += 1;
            }
        }
        shared
    }
}

impl SiblingTest for CandidatePairSiblingTest {
    fn test(&self, ped: &Pedigree, thresholds: &Thresholds) -> Hypergraph {
        let mut graph = Hypergraph::new();
        let layer: Vec<CoupleId> = ped.current_layer().iter().copied().collect();
        let cand_threshold = (thresholds.cand() * ped.num_blocks() as f64).ceil() as usize;
        let sib_threshold = (thresholds.sib() * ped.num_blocks() as f64).ceil() as usize;

        let mut candidates = Vec::new();
        for i in 0..layer.len() {
            for j in (i + 1)..layer.len() {
                if Self::pairwise_shared(ped, layer[i], layer[j]) >= cand_threshold {
                    candidates.push((layer[i], layer[j]));
                }
            }
        }
        debug!(
            "found {} candidate pairs out of {}",
            candidates.len(),
            layer.len() * layer.len().saturating_sub(1) / 2
        );

        for (a, b) in candidates {
            for &c in &layer {
                if c == a || c == b {
                    continue;
                }
                if graph.contains_edge(a, b, c) {
                    continue;
                }
                if shared_blocks(ped, c, a, b) >= sib_threshold {
                    graph.insert_edge(a, b, c);
                }
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genome::Gene;
    use pedigree::Pedigree;

    fn make_triple(shared_blocks: usize, total_blocks: usize) -> (Pedigree, [CoupleId; 3]) {
        let mut ped = Pedigree::new(total_blocks, 2, 1, 6, true);
        ped.reset();
        let mut couples = Vec::new();
        for idx in 0..3u64 {
            let a = ped.new_individual();
            for block in 0..total_blocks {
                let gene = if block < shared_blocks {
                    Gene(1)
                } else {
                    Gene(100 + idx * 10 + block as u64)
                };
                ped.individual_mut(a).unwrap().genome_mut().try_set(block, gene).unwrap();
            }
            let couple = ped.mate_with_self(a);
            couples.push(couple);
            ped.add_to_current_layer(couple);
        }
        (ped, [couples[0], couples[1], couples[2]])
    }

    #[test]
    fn naive_test_inserts_edge_when_overlap_clears_threshold() {
        let (ped, [u, v, w]) = make_triple(10, 10);
        let thresholds = Thresholds::decaying(0.5, 1.0, 0.99, 3);
        let graph = NaiveSiblingTest.test(&ped, &thresholds);
        assert!(graph.contains_edge(u, v, w));
    }

    #[test]
    fn naive_test_skips_edge_below_threshold() {
        let (ped, [u, v, w]) = make_triple(2, 10);
        let thresholds = Thresholds::decaying(0.5, 1.0, 0.99, 3);
        let graph = NaiveSiblingTest.test(&ped, &thresholds);
        assert!(!graph.contains_edge(u, v, w));
    }

    #[test]
    fn quadratic_test_agrees_with_naive_on_strong_triple() {
        let (ped, [u, v, w]) = make_triple(10, 10);
        let thresholds = Thresholds::decaying(0.5, 1.0, 0.99, 3);
        let graph = CandidatePairSiblingTest.test(&ped, &thresholds);
        assert!(graph.contains_edge(u, v, w));
    }
}
