//! `rec_gen_recursive::collect_symbols`: each couple keeps a descendant
//! gene list of `(gene, bushiness)` pairs, built bottom-up from its
//! children's own lists. Bushiness is the h-index of the per-child
//! thresholds contributed for that gene: a gene witnessed deeply by many
//! independent subtrees outranks one witnessed shallowly by a single one.

use ahash::AHashMap;
use genome::Gene;
use ids::{CoupleId, IndividualId};
use pedigree::Pedigree;

use crate::SymbolCollector;

const DEFAULT_BUSH_TH: usize = 2;

#[derive(Debug, Clone)]
pub struct RecursiveCollector {
    bush_th: usize,
    des_genes: AHashMap<(CoupleId, usize), Vec<(Gene, usize)>>,
}

impl Default for RecursiveCollector {
    fn default() -> Self {
        RecursiveCollector { bush_th: DEFAULT_BUSH_TH, des_genes: AHashMap::new() }
    }
}

impl RecursiveCollector {
    #[must_use]
    pub fn new(bush_th: usize) -> Self {
        RecursiveCollector { bush_th, des_genes: AHashMap::new() }
    }

    pub fn set_bush_th(&mut self, bush_th: usize) {
        self.bush_th = bush_th;
    }

    /// The cached `(gene, bushiness)` list for `couple` at `block`, seeding
    /// extant leaves with their own gene at infinite bushiness on first
    /// access.
    fn des_genes_of(&mut self, ped: &Pedigree, couple: CoupleId, block: usize) -> Vec<(Gene, usize)> {
        if let Some(entries) = self.des_genes.get(&(couple, block)) {
            return entries.clone();
        }
        let Some(node) = ped.couple(couple) else { return Vec::new() };
        let entries = if node.is_extant() {
            let member = node.member(0);
            let gene = ped.individual(member).and_then(|i| i.genome().get(block));
            match gene.filter(|g| !g.is_unknown()) {
                Some(g) => vec![(g, usize::MAX)],
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };
        self.des_genes.insert((couple, block), entries.clone());
        entries
    }

    /// `max_i min(i, t_i)` over the per-child thresholds for one gene,
    /// sorted descending: the h-index of the threshold list.
    fn bushiness(mut thresholds: Vec<usize>) -> usize {
        thresholds.sort_unstable_by(|a, b| b.cmp(a));
        thresholds
            .iter()
            .enumerate()
            .map(|(i, &t)| (i + 1).min(t))
            .max()
            .unwrap_or(0)
    }
}

impl SymbolCollector for RecursiveCollector {
    fn collect(&mut self, ped: &mut Pedigree, couple: CoupleId) {
        let children: Vec<IndividualId> = ped.children_of(couple).collect();
        let num_blocks = ped.num_blocks();

        for block in 0..num_blocks {
            let mut per_gene: AHashMap<Gene, Vec<usize>> = AHashMap::new();
            for &child in &children {
                let Some(mate) = ped.individual(child).and_then(|i| i.mate()) else { continue };
                for (gene, bushiness) in self.des_genes_of(ped, mate, block) {
                    per_gene.entry(gene).or_default().push(bushiness);
                }
            }

            let mut scored: Vec<(Gene, usize)> = per_gene
                .into_iter()
                .map(|(gene, thresholds)| (gene, Self::bushiness(thresholds)))
                .collect();
            scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

            let kept: Vec<(Gene, usize)> =
                scored.iter().copied().filter(|&(_, b)| b >= self.bush_th).collect();
            self.des_genes.insert((couple, block), kept);

            match scored.as_slice() {
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
    fn gene_witnessed_by_every_child_outranks_a_lone_witness() {
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

        let mut collector = RecursiveCollector::default();
        collector.collect(&mut ped, parent);
        assert!(ped.has_gene(parent, 0, Gene(5)));
        assert!(ped.has_gene(parent, 0, Gene(9)));
    }

    #[test]
    fn below_threshold_genes_are_dropped_from_the_descendant_list() {
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

        let mut collector = RecursiveCollector::new(2);
        collector.collect(&mut ped, parent);
        assert!(collector.des_genes.get(&(parent, 0)).unwrap().is_empty());
    }
}
