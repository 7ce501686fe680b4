//! `rec_gen_basic::collect_symbols`: for every triple of a couple's
//! direct children, and every triple of extant descendants drawn one from
//! each child's subtree, a gene shared by all three at a block is voted
//! into the couple's genome at that block (if not already present).

use ids::{CoupleId, IndividualId};
use log::trace;
use pedigree::Pedigree;

use crate::SymbolCollector;

#[derive(Debug, Default, Clone, Copy)]
pub struct TripleVoteCollector;

impl SymbolCollector for TripleVoteCollector {
    fn collect(&mut self, ped: &mut Pedigree, couple: CoupleId) {
        let children: Vec<IndividualId> = ped.children_of(couple).collect();
        let num_blocks = ped.num_blocks();

        for i in 0..children.len() {
            for j in (i + 1)..children.len() {
                for k in (j + 1)..children.len() {
                    let mate_of = |id: IndividualId| ped.individual(id).and_then(|i| i.mate());
                    let (Some(mu), Some(mv), Some(mw)) =
                        (mate_of(children[i]), mate_of(children[j]), mate_of(children[k]))
                    else {
                        continue;
                    };
                    let (xs, ys, zs) = (
                        ped.extant_descendants(mu),
                        ped.extant_descendants(mv),
                        ped.extant_descendants(mw),
                    );
                    for &x in &xs {
                        for &y in &ys {
                            for &z in &zs {
                                if x == y || y == z || z == x {
                                    continue;
                                }
                                for block in 0..num_blocks {
                                    let gx = ped.individual(x).and_then(|i| i.genome().get(block));
                                    let gy = ped.individual(y).and_then(|i| i.genome().get(block));
                                    let gz = ped.individual(z).and_then(|i| i.genome().get(block));
                                    let Some(gx) = gx.filter(|g| !g.is_unknown()) else { continue };
                                    if gy == Some(gx) && gz == Some(gx) && !ped.has_gene(couple, block, gx) {
                                        trace!(
                                            "found gene {gx} for couple {couple} at block {block} from triple ({x}, {y}, {z})"
                                        );
                                        let _ = ped.insert_gene(couple, block, gx);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genome::Gene;
    use pedigree::Pedigree;

    fn leaf(ped: &mut Pedigree, gene: u64, num_blocks: usize) -> CoupleId {
        let indiv = ped.new_individual();
        for block in 0..num_blocks {
            ped.individual_mut(indiv).unwrap().genome_mut().try_set(block, Gene(gene)).unwrap();
        }
        ped.mate_with_self(indiv)
    }

    #[test]
    fn gene_shared_by_all_three_descendant_triples_is_voted_in() {
        let mut ped = Pedigree::new(1, 3, 2, 8, true);
        ped.reset();
        let c1 = leaf(&mut ped, 7, 1);
        let c2 = leaf(&mut ped, 7, 1);
        let c3 = leaf(&mut ped, 7, 1);

        let ind_a = ped.new_individual();
        let ind_b = ped.new_individual();
        let parent = ped.mate(ind_a, ind_b);
        for child_couple in [c1, c2, c3] {
            let child_indiv = ped.get_orphan(child_couple).unwrap();
            ped.add_child(parent, child_indiv).unwrap();
        }

        TripleVoteCollector.collect(&mut ped, parent);
        assert!(ped.has_gene(parent, 0, Gene(7)));
    }
}
