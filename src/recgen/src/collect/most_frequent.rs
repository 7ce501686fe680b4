//! `rec_gen_quadratic::collect_symbols`: for each block, count how many of
//! a couple's direct children have a gene anywhere among their own extant
//! descendants, and insert the two most broadly witnessed genes.

use ahash::{AHashMap, AHashSet};
use genome::Gene;
use ids::{CoupleId, IndividualId};
use pedigree::Pedigree;

use crate::SymbolCollector;

#[derive(Debug, Default, Clone, Copy)]
pub struct MostFrequentCollector;

impl SymbolCollector for MostFrequentCollector {
    fn collect(&mut self, ped: &mut Pedigree, couple: CoupleId) {
        let children: Vec<IndividualId> = ped.children_of(couple).collect();
        let num_blocks = ped.num_blocks();

        for block in 0..num_blocks {
            let mut counts: AHashMap<Gene, usize> = AHashMap::new();
            for &child in &children {
                let Some(mate) = ped.individual(child).and_then(|i| i.mate()) else {
                    continue;
                };
                let mut present: AHashSet<Gene> = AHashSet::new();
                for ext in ped.extant_descendants(mate) {
                    if let Some(g) = ped.individual(ext).and_then(|i| i.genome().get(block)) {
                        if !g.is_unknown() {
                            present.insert(g);
                        }
                    }
                }
                for gene in present {
                    *counts.entry(gene).or_insert(0) += 1;
                }
            }

            let mut ranked: Vec<(Gene, usize)> = counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

            match ranked.as_slice() {
                [] => {}
                [(g, _)] => {
                    let _ = ped.insert_gene(couple, block, *g);
                    let _ = ped.insert_gene(couple, block, *g);
                }
                [(g1, _), (g2, _), ..] => {
                    let _ = ped.insert_gene(couple, block, *g1);
                    let _ = ped.insert_gene(couple, block, *g2);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedigree::Pedigree;

    fn leaf(ped: &mut Pedigree, gene: u64, num_blocks: usize) -> CoupleId {
        let indiv = ped.new_individual();
        for block in 0..num_blocks {
            ped.individual_mut(indiv).unwrap().genome_mut().try_set(block, Gene(gene)).unwrap();
        }
        ped.mate_with_self(indiv)
    }

    #[test]
    fn majority_gene_beats_a_lone_minority_witness() {
        let mut ped = Pedigree::new(1, 3, 2, 8, true);
        ped.reset();
        let c1 = leaf(&mut ped, 5, 1);
        let c2 = leaf(&mut ped, 5, 1);
        let c3 = leaf(&mut ped, 9, 1);

        let ind_a = ped.new_individual();
        let ind_b = ped.new_individual();
        let parent = ped.mate(ind_a, ind_b);
        for child_couple in [c1, c2, c3] {
            let child_indiv = ped.get_orphan(child_couple).unwrap();
            ped.add_child(parent, child_indiv).unwrap();
        }

        MostFrequentCollector.collect(&mut ped, parent);
        assert!(ped.has_gene(parent, 0, Gene(5)));
        assert!(ped.has_gene(parent, 0, Gene(9)));
    }

    #[test]
    fn single_witnessed_gene_is_doubled() {
        let mut ped = Pedigree::new(1, 3, 2, 8, true);
        ped.reset();
        let c1 = leaf(&mut ped, 4, 1);
        let c2 = leaf(&mut ped, 4, 1);

        let ind_a = ped.new_individual();
        let ind_b = ped.new_individual();
        let parent = ped.mate(ind_a, ind_b);
        for child_couple in [c1, c2] {
            let child_indiv = ped.get_orphan(child_couple).unwrap();
            ped.add_child(parent, child_indiv).unwrap();
        }

        MostFrequentCollector.collect(&mut ped, parent);
        let [a, b] = ped.couple(parent).unwrap().members();
        let ga = ped.individual(a).unwrap().genome().get(0).unwrap();
        let gb = ped.individual(b).unwrap().genome().get(0).unwrap();
        assert_eq!(ga, Gene(4));
        assert_eq!(gb, Gene(4));
    }
}
