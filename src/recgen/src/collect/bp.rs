//! `rec_gen_bp::collect_symbols`: treats the pedigree as a factor graph and
//! propagates sparse [`Message`]s bottom-up. A couple's message is a
//! distribution over unordered gene pairs drawn from its descendants'
//! combined domain; `epsilon` is the per-child mutation/noise probability
//! folded into the DP recurrence over "how many children miss both genes."

use ahash::AHashMap;
use genome::Gene;
use ids::{CoupleId, IndividualId};
use pedigree::Pedigree;

use crate::bp_message::{BpDomain, Message};
use crate::SymbolCollector;

const DEFAULT_EPSILON: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct BeliefPropagationCollector {
    epsilon: f64,
    /// Whether to drop a child couple's cached message/domain once its
    /// parent's has been computed from it, trading memory for re-runs.
    purge_pairs: bool,
    messages: AHashMap<(CoupleId, usize), Message>,
    des_genes: AHashMap<(CoupleId, usize), Vec<Gene>>,
}

impl Default for BeliefPropagationCollector {
    fn default() -> Self {
        BeliefPropagationCollector {
            epsilon: DEFAULT_EPSILON,
            purge_pairs: false,
            messages: AHashMap::new(),
            des_genes: AHashMap::new(),
        }
    }
}

impl BeliefPropagationCollector {
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        BeliefPropagationCollector { epsilon, ..Self::default() }
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn set_purge_pairs(&mut self, purge_pairs: bool) {
        self.purge_pairs = purge_pairs;
    }

    fn des_genes_of(&mut self, ped: &Pedigree, couple: CoupleId, block: usize) -> Vec<Gene> {
        if let Some(genes) = self.des_genes.get(&(couple, block)) {
            return genes.clone();
        }
        let Some(node) = ped.couple(couple) else { return Vec::new() };
        let genes = if node.is_extant() {
            let member = node.member(0);
            let gene = ped.individual(member).and_then(|i| i.genome().get(block));
            gene.filter(|g| !g.is_unknown()).into_iter().collect()
        } else {
            Vec::new()
        };
        self.des_genes.insert((couple, block), genes.clone());
        genes
    }

    fn message_of(&mut self, ped: &Pedigree, couple: CoupleId, block: usize) -> Message {
        if let Some(msg) = self.messages.get(&(couple, block)) {
            return msg.clone();
        }
        let Some(node) = ped.couple(couple) else { return Message::new(0.0) };
        if node.is_extant() {
            let member = node.member(0);
            let gene = ped
                .individual(member)
                .and_then(|i| i.genome().get(block))
                .unwrap_or(Gene::UNKNOWN);
            let mut msg = Message::new(0.0);
            msg.set(BpDomain::new(gene, gene), 1.0);
            self.messages.insert((couple, block), msg.clone());
            return msg;
        }
        Message::new(0.0)
    }
}

impl SymbolCollector for BeliefPropagationCollector {
    fn collect(&mut self, ped: &mut Pedigree, couple: CoupleId) {
        let children: Vec<IndividualId> = ped.children_of(couple).collect();
        let num_blocks = ped.num_blocks();
        let _ = ped.all_genes();

        for block in 0..num_blocks {
            let child_couples: Vec<CoupleId> = children
                .iter()
                .filter_map(|&child| ped.individual(child).and_then(|i| i.mate()))
                .collect();
            if child_couples.is_empty() {
                continue;
            }

            let mut domain: Vec<Gene> = Vec::new();
            for &cc in &child_couples {
                for gene in self.des_genes_of(ped, cc, block) {
                    if !domain.contains(&gene) {
                        domain.push(gene);
                    }
                }
            }
            domain.sort();
            self.des_genes.insert((couple, block), domain.clone());

            let child_messages: Vec<Message> =
                child_couples.iter().map(|&cc| self.message_of(ped, cc, block)).collect();
            let k = child_messages.len();

            let mut out = Message::new(f64::MIN_POSITIVE);
            for (i, &g1) in domain.iter().enumerate() {
                for &g2 in &domain[i..] {
                    let pair = BpDomain::new(g1, g2);
                    let mut n = vec![0.0_f64; k + 1];
                    n[0] = 1.0;
                    for (idx, msg) in child_messages.iter().enumerate() {
                        let marg1 = msg.marginal(g1, &domain);
                        let marg2 = if g1 != g2 { msg.marginal(g2, &domain) } else { 0.0 };
                        let point = msg.get(pair);
                        let p = if g1 != g2 { marg1 + marg2 - point } else { marg1 };
                        let mut next = vec![0.0_f64; k + 1];
                        for j in 0..=(idx + 1) {
                            let keep = n.get(j).copied().unwrap_or(0.0);
                            let flip = if j > 0 { n[j - 1] } else { 0.0 };
                            next[j] = keep * p + flip * (1.0 - p);
                        }
                        n = next;
                    }
                    let mass: f64 = n.iter().enumerate().map(|(j, &nj)| nj * self.epsilon.powi(j as i32)).sum();
                    out.set(pair, mass.max(f64::MIN_POSITIVE));
                }
            }

            let domain_size = domain.len() * (domain.len() + 1) / 2;
            out.normalize(domain_size.max(1));
            let best = out.extract_max();
            let _ = ped.insert_gene(couple, block, best.get(0));
            let _ = ped.insert_gene(couple, block, best.get(1));

            self.messages.insert((couple, block), out);
            if self.purge_pairs {
                for &cc in &child_couples {
                    self.messages.remove(&(cc, block));
                    self.des_genes.remove(&(cc, block));
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
    fn two_children_agreeing_on_a_pair_with_zero_epsilon_is_a_point_mass() {
        let mut ped = Pedigree::new(1, 2, 2, 4, true);
        ped.reset();
        let c1 = leaf(&mut ped, 7, 1);
        let c2 = leaf(&mut ped, 9, 1);

        let ind_a = ped.new_individual();
        let ind_b = ped.new_individual();
        let parent = ped.mate(ind_a, ind_b);
        for child_couple in [c1, c2] {
            let child_indiv = ped.get_orphan(child_couple).unwrap();
            ped.add_child(parent, child_indiv).unwrap();
        }

        let mut collector = BeliefPropagationCollector::new(0.0);
        collector.collect(&mut ped, parent);
        assert!(ped.has_gene(parent, 0, Gene(7)));
        assert!(ped.has_gene(parent, 0, Gene(9)));
    }

    #[test]
    fn purge_pairs_drops_child_state_after_use() {
        let mut ped = Pedigree::new(1, 2, 2, 4, true);
        ped.reset();
        let c1 = leaf(&mut ped, 7, 1);
        let c2 = leaf(&mut ped, 7, 1);

        let ind_a = ped.new_individual();
        let ind_b = ped.new_individual();
        let parent = ped.mate(ind_a, ind_b);
        for child_couple in [c1, c2] {
            let child_indiv = ped.get_orphan(child_couple).unwrap();
            ped.add_child(parent, child_indiv).unwrap();
        }

        let mut collector = BeliefPropagationCollector::default();
        collector.set_purge_pairs(true);
        collector.collect(&mut ped, parent);
        assert!(collector.messages.get(&(c1, 0)).is_none());
        assert!(collector.messages.contains_key(&(parent, 0)));
    }
}
