//! `rec_gen_parsimony::collect_symbols`: each couple keeps, per block, the
//! set of genes consistent with some minimum-error assignment of its
//! subtree. A parent picks the pair over its children's union that
//! minimizes the count of children matching neither gene, then folds every
//! gene appearing in a tied best pair back into its own set.

use ahash::AHashSet;
use genome::Gene;
use ids::{CoupleId, IndividualId};
use pedigree::Pedigree;

use crate::SymbolCollector;

#[derive(Debug, Default, Clone)]
pub struct ParsimonyCollector {
    min_err: ahash::AHashMap<(CoupleId, usize), AHashSet<Gene>>,
}

impl ParsimonyCollector {
    fn min_err_of(&mut self, ped: &Pedigree, couple: CoupleId, block: usize) -> AHashSet<Gene> {
        if let Some(set) = self.min_err.get(&(couple, block)) {
            return set.clone();
        }
        let Some(node) = ped.couple(couple) else { return AHashSet::new() };
        let set = if node.is_extant() {
            let member = node.member(0);
            let gene = ped.individual(member).and_then(|i| i.genome().get(block));
            gene.filter(|g| !g.is_unknown()).into_iter().collect()
        } else {
            AHashSet::new()
        };
        self.min_err.insert((couple, block), set.clone());
        set
    }
}

impl SymbolCollector for ParsimonyCollector {
    fn collect(&mut self, ped: &mut Pedigree, couple: CoupleId) {
        let children: Vec<IndividualId> = ped.children_of(couple).collect();
        let num_blocks = ped.num_blocks();

        for block in 0..num_blocks {
            let child_sets: Vec<AHashSet<Gene>> = children
                .iter()
                .filter_map(|&child| ped.individual(child).and_then(|i| i.mate()))
                .map(|mate| self.min_err_of(ped, mate, block))
                .collect();

            let mut candidates: Vec<Gene> = AHashSet::<Gene>::from_iter(
                child_sets.iter().flat_map(|set| set.iter().copied()),
            )
            .into_iter()
            .collect();
            candidates.sort();

            let mut best_cost = usize::MAX;
            let mut best_pairs: Vec<(Gene, Gene)> = Vec::new();
            for &g1 in &candidates {
                for &g2 in &candidates {
                    let cost = child_sets
                        .iter()
                        .filter(|set| !set.contains(&g1) && !set.contains(&g2))
                        .count();
                    match cost.cmp(&best_cost) {
                        std::cmp::Ordering::Less => {
                            best_cost = cost;
                            best_pairs.clear();
                            best_pairs.push((g1, g2));
                        }
                        std::cmp::Ordering::Equal => best_pairs.push((g1, g2)),
                        std::cmp::Ordering::Greater => {}
                    }
                }
            }

            if let Some(&(g1, g2)) = best_pairs.first() {
                let _ = ped.insert_gene(couple, block, g1);
                let _ = ped.insert_gene(couple, block, g2);
            }

            let mut new_min_err: AHashSet<Gene> = AHashSet::new();
            for &(g1, g2) in &best_pairs {
                new_min_err.insert(g1);
                new_min_err.insert(g2);
            }
            self.min_err.insert((couple, block), new_min_err);
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
    fn majority_gene_wins_the_min_cost_assignment() {
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

        let mut collector = ParsimonyCollector::default();
        collector.collect(&mut ped, parent);
        assert!(ped.has_gene(parent, 0, Gene(5)) || ped.has_gene(parent, 0, Gene(9)));
        assert_eq!(collector.min_err.get(&(parent, 0)).unwrap().len(), 2);
    }

    #[test]
    fn two_children_with_disjoint_genes_both_survive_as_a_tied_pair() {
        let mut ped = Pedigree::new(1, 3, 2, 8, true);
        ped.reset();
        let c1 = leaf(&mut ped, 5, 1);
        let c2 = leaf(&mut ped, 9, 1);

        let ind_a = ped.new_individual();
        let ind_b = ped.new_individual();
        let parent = ped.mate(ind_a, ind_b);
        for child_couple in [c1, c2] {
            let child_indiv = ped.get_orphan(child_couple).unwrap();
            ped.add_child(parent, child_indiv).unwrap();
        }

        let mut collector = ParsimonyCollector::default();
        collector.collect(&mut ped, parent);
        assert!(ped.has_gene(parent, 0, Gene(5)));
        assert!(ped.has_gene(parent, 0, Gene(9)));
    }
}
