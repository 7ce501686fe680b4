//! The pedigree graph: individuals and couples addressed by stable ids and
//! organized into generational layers.
//!
//! The original data structures (`individual_node`, `coupled_node`) hold
//! raw pointers to each other and to their pedigree. Rust has no safe,
//! ergonomic equivalent of that pointer web for a self-referential graph,
//! so here the nodes are plain data living in two arenas owned by
//! [`Pedigree`], addressed by [`IndividualId`]/[`CoupleId`]. Every
//! pointer-chasing operation in the original (`has_gene`, `insert_gene`,
//! `is_child`, `is_sib`, `extant_desc`, ...) becomes an inherent method on
//! `Pedigree` that takes the relevant ids as arguments.

mod couple;
mod individual;

pub use couple::Couple;
pub use individual::Individual;

use ahash::AHashSet;
use genome::Gene;
use ids::{CoupleId, IndividualId, Registry};
use log::{debug, trace};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PedigreeError {
    #[error("couple {0} has no unassigned member to receive a gene")]
    NoFreeMember(CoupleId),
    #[error("individual id {0} not found in pedigree arena")]
    UnknownIndividual(IndividualId),
    #[error("couple id {0} not found in pedigree arena")]
    UnknownCouple(CoupleId),
}

/// A stochastic diploid pedigree: `B` genome blocks, `T` generational
/// layers, parameterized fertility `alpha` and founder population `N`.
///
/// Layer `0` is the extant (youngest) generation; layer `num_generations -
/// 1` holds the founders. `cur_gen` tracks which layer iteration/insertion
/// currently targets, exactly as the reference implementation's `cur_gen`
/// grade pointer does.
#[derive(Debug, Clone)]
pub struct Pedigree {
    num_blocks: usize,
    fertility: usize,
    num_generations: usize,
    founder_pop_size: usize,
    deterministic: bool,
    cur_gen: isize,
    layers: Vec<AHashSet<CoupleId>>,
    individuals: Registry<IndividualId, Individual>,
    couples: Registry<CoupleId, Couple>,
    all_genes_cache: Option<Vec<AHashSet<Gene>>>,
}

impl Pedigree {
    #[must_use]
    pub fn new(
        num_blocks: usize,
        fertility: usize,
        num_generations: usize,
        founder_pop_size: usize,
        deterministic: bool,
    ) -> Self {
        Pedigree {
            num_blocks,
            fertility,
            num_generations,
            founder_pop_size,
            deterministic,
            cur_gen: -1,
            layers: (0..num_generations).map(|_| AHashSet::new()).collect(),
            individuals: Registry::new(),
            couples: Registry::new(),
            all_genes_cache: None,
        }
    }

    // ---- statistic accessors ------------------------------------------------

    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    #[must_use]
    pub fn fertility(&self) -> usize {
        self.fertility
    }

    #[must_use]
    pub fn num_generations(&self) -> usize {
        self.num_generations
    }

    #[must_use]
    pub fn founder_pop_size(&self) -> usize {
        self.founder_pop_size
    }

    #[must_use]
    pub fn deterministic(&self) -> bool {
        self.deterministic
    }

    #[must_use]
    pub fn cur_gen(&self) -> isize {
        self.cur_gen
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.current_layer().len()
    }

    // ---- arena mutation ------------------------------------------------------

    /// Mints a new individual with an all-unknown genome, returning its id.
    pub fn new_individual(&mut self) -> IndividualId {
        self.individuals.insert_new(Individual::new(self.num_blocks))
    }

    /// Mints a couple from two distinct individuals and points each
    /// individual's mate link at it.
    pub fn mate(&mut self, a: IndividualId, b: IndividualId) -> CoupleId {
        let couple_id = self.couples.insert_new(Couple::new(a, b));
        if let Some(indiv) = self.individuals.get_mut(a) {
            indiv.set_mate(couple_id);
        }
        if let Some(indiv) = self.individuals.get_mut(b) {
            indiv.set_mate(couple_id);
        }
        couple_id
    }

    /// Mints a self-coupled node representing an unmated extant individual.
    pub fn mate_with_self(&mut self, indiv: IndividualId) -> CoupleId {
        let couple_id = self.couples.insert_new(Couple::extant(indiv));
        if let Some(individual) = self.individuals.get_mut(indiv) {
            individual.set_mate(couple_id);
        }
        couple_id
    }

    #[must_use]
    pub fn individual(&self, id: IndividualId) -> Option<&Individual> {
        self.individuals.get(id)
    }

    pub fn individual_mut(&mut self, id: IndividualId) -> Option<&mut Individual> {
        self.individuals.get_mut(id)
    }

    #[must_use]
    pub fn couple(&self, id: CoupleId) -> Option<&Couple> {
        self.couples.get(id)
    }

    pub fn couple_mut(&mut self, id: CoupleId) -> Option<&mut Couple> {
        self.couples.get_mut(id)
    }

    pub fn individuals_iter(&self) -> impl Iterator<Item = (IndividualId, &Individual)> {
        self.individuals.iter()
    }

    pub fn couples_iter(&self) -> impl Iterator<Item = (CoupleId, &Couple)> {
        self.couples.iter()
    }

    /// Used by restore: insert an individual/couple under an explicit id
    /// recorded in a dump, rather than minting a fresh one.
    pub fn insert_individual_with_id(&mut self, id: IndividualId, individual: Individual) {
        self.individuals.insert_with_id(id, individual);
    }

    pub fn insert_couple_with_id(&mut self, id: CoupleId, couple: Couple) {
        self.couples.insert_with_id(id, couple);
    }

    // ---- gene access -----------------------------------------------------

    /// Whether either member of `couple` carries `gene` at `block`.
    /// `Gene::UNKNOWN` never matches, since an unassigned slot is not a
    /// shared gene.
    #[must_use]
    pub fn has_gene(&self, couple: CoupleId, block: usize, gene: Gene) -> bool {
        if gene.is_unknown() {
            return false;
        }
        let Some(couple) = self.couples.get(couple) else {
            return false;
        };
        let [a, b] = couple.members();
        [a, b].into_iter().any(|member| {
            self.individuals
                .get(member)
                .and_then(|indiv| indiv.genome().get(block))
                == Some(gene)
        })
    }

    /// Assigns `gene` to the first member of `couple` whose slot at `block`
    /// is still unknown. A no-op if `gene` is [`Gene::UNKNOWN`] or both
    /// slots are already filled, per the insert_gene contract in spec §4.1.
    pub fn insert_gene(
        &mut self,
        couple: CoupleId,
        block: usize,
        gene: Gene,
    ) -> Result<(), PedigreeError> {
        if gene.is_unknown() {
            return Ok(());
        }
        let [a, b] = self
            .couples
            .get(couple)
            .ok_or(PedigreeError::UnknownCouple(couple))?
            .members();
        let slot_known = |this: &Self, id: IndividualId| {
            this.individuals
                .get(id)
                .and_then(|i| i.genome().get(block))
                .map(genome::Gene::is_unknown)
                == Some(false)
        };
        let target = if !slot_known(self, a) {
            a
        } else if !slot_known(self, b) {
            b
        } else {
            trace!("couple {couple} already holds two genes at block {block}, dropping {gene}");
            return Ok(());
        };
        let indiv = self
            .individuals
            .get_mut(target)
            .ok_or(PedigreeError::UnknownIndividual(target))?;
        indiv
            .genome_mut()
            .try_set(block, gene)
            .map_err(|_| PedigreeError::NoFreeMember(couple))
    }

    /// Returns whichever member of `couple` has not yet been assigned a
    /// parent couple — used while stitching founders to themselves and
    /// while restoring extant-only dumps.
    #[must_use]
    pub fn get_orphan(&self, couple: CoupleId) -> Option<IndividualId> {
        let couple = self.couples.get(couple)?;
        let [a, b] = couple.members();
        if self.individuals.get(a)?.parent().is_none() {
            Some(a)
        } else {
            Some(b)
        }
    }

    // ---- parent/child relations --------------------------------------------

    /// Assigns `parent` as `child`'s parent couple and registers `child`
    /// among `parent`'s children.
    pub fn add_child(
        &mut self,
        parent: CoupleId,
        child: IndividualId,
    ) -> Result<(), PedigreeError> {
        self.individuals
            .get_mut(child)
            .ok_or(PedigreeError::UnknownIndividual(child))?
            .assign_parent(Some(parent));
        self.couples
            .get_mut(parent)
            .ok_or(PedigreeError::UnknownCouple(parent))?
            .insert_child(child);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: CoupleId, child: IndividualId) {
        if let Some(couple) = self.couples.get_mut(parent) {
            couple.remove_child(child);
        }
        if let Some(indiv) = self.individuals.get_mut(child) {
            indiv.assign_parent(None);
        }
    }

    #[must_use]
    pub fn is_child_of_individual(&self, couple: CoupleId, other: IndividualId) -> bool {
        self.couples
            .get(couple)
            .is_some_and(|c| c.has_child(other))
    }

    /// Whether either member of `other` is a child of `couple`.
    #[must_use]
    pub fn is_child_of_couple(&self, couple: CoupleId, other: CoupleId) -> bool {
        let Some(other) = self.couples.get(other) else {
            return false;
        };
        let [a, b] = other.members();
        self.is_child_of_individual(couple, a) || (a != b && self.is_child_of_individual(couple, b))
    }

    /// Whether `couple` and `other` share a parent couple.
    #[must_use]
    pub fn is_sibling(&self, couple: CoupleId, other: CoupleId) -> bool {
        let Some(couple_node) = self.couples.get(couple) else {
            return false;
        };
        let [a, b] = couple_node.members();
        [a, b].into_iter().any(|member| {
            self.individuals
                .get(member)
                .and_then(Individual::parent)
                .is_some_and(|parent| self.is_child_of_couple(parent, other))
        })
    }

    #[must_use]
    pub fn num_children(&self, couple: CoupleId) -> usize {
        self.couples.get(couple).map_or(0, Couple::num_children)
    }

    pub fn children_of(&self, couple: CoupleId) -> impl Iterator<Item = IndividualId> + '_ {
        self.couples
            .get(couple)
            .into_iter()
            .flat_map(Couple::children)
    }

    /// The set of extant (layer-0) individuals descended from `couple`.
    #[must_use]
    pub fn extant_descendants(&self, couple: CoupleId) -> AHashSet<IndividualId> {
        let mut out = AHashSet::new();
        self.extant_descendants_into(couple, &mut out);
        out
    }

    fn extant_descendants_into(&self, couple: CoupleId, out: &mut AHashSet<IndividualId>) {
        let Some(node) = self.couples.get(couple) else {
            return;
        };
        if node.is_extant() {
            out.insert(node.member(0));
            return;
        }
        for child in node.children() {
            if let Some(child_mate) = self.individuals.get(child).and_then(Individual::mate) {
                self.extant_descendants_into(child_mate, out);
            }
        }
    }

    // ---- generational layers ------------------------------------------------

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cur_gen == self.num_generations as isize - 1
    }

    pub fn reset(&mut self) -> &mut Self {
        self.cur_gen = 0;
        self.all_genes_cache = None;
        self
    }

    /// Every distinct gene value observed at each block among the extant
    /// (layer 0) individuals. Populated lazily on first call and owned by
    /// the pedigree, per the belief-propagation collector's domain needs.
    pub fn all_genes(&mut self) -> &[AHashSet<Gene>] {
        if self.all_genes_cache.is_none() {
            let mut cache = vec![AHashSet::new(); self.num_blocks];
            for couple in self.layer(0).clone() {
                let Some(node) = self.couples.get(couple) else { continue };
                let member = node.member(0);
                let Some(indiv) = self.individuals.get(member) else { continue };
                for (block, slot) in cache.iter_mut().enumerate() {
                    if let Some(gene) = indiv.genome().get(block) {
                        if !gene.is_unknown() {
                            slot.insert(gene);
                        }
                    }
                }
            }
            self.all_genes_cache = Some(cache);
        }
        self.all_genes_cache.as_deref().unwrap()
    }

    /// Pushes a fresh empty layer and advances `cur_gen` to it.
    pub fn new_layer(&mut self) -> &mut Self {
        self.cur_gen += 1;
        debug!("pushing empty layer at generation {}", self.cur_gen);
        if let Some(layer) = self.layers.get_mut(self.cur_gen as usize) {
            layer.clear();
        }
        self
    }

    pub fn next_layer(&mut self) -> &mut Self {
        self.cur_gen += 1;
        self
    }

    pub fn prev_layer(&mut self) -> &mut Self {
        self.cur_gen -= 1;
        self
    }

    pub fn add_to_current_layer(&mut self, couple: CoupleId) -> CoupleId {
        self.layers[self.cur_gen as usize].insert(couple);
        couple
    }

    #[must_use]
    pub fn layer(&self, gen: usize) -> &AHashSet<CoupleId> {
        &self.layers[gen]
    }

    #[must_use]
    pub fn current_layer(&self) -> &AHashSet<CoupleId> {
        &self.layers[self.cur_gen as usize]
    }
}

/// Counts blocks at which `u`'s genes are each independently shared by
/// both `v` and `w` — the core statistic behind sibling-candidate triple
/// tests.
#[must_use]
pub fn shared_blocks(ped: &Pedigree, u: CoupleId, v: CoupleId, w: CoupleId) -> usize {
    let Some(u_node) = ped.couple(u) else {
        return 0;
    };
    let [a, b] = u_node.members();
    let mut shared = 0;
    for block in 0..ped.num_blocks() {
        let gene_a = ped.individual(a).and_then(|i| i.genome().get(block)).unwrap_or_default();
        let gene_b = ped.individual(b).and_then(|i| i.genome().get(block)).unwrap_or_default();
        let matches_a = ped.has_gene(v, block, gene_a) && ped.has_gene(w, block, gene_a);
        let matches_b = ped.has_gene(v, block, gene_b) && ped.has_gene(w, block, gene_b);
        if matches_a || matches_b {
            shared += 1;
        }
    }
    shared
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trio() -> (Pedigree, CoupleId, IndividualId) {
        let mut ped = Pedigree::new(2, 2, 2, 4, true);
        let dad = ped.new_individual();
        let mom = ped.new_individual();
        let parents = ped.mate(dad, mom);
        ped.individual_mut(dad).unwrap().genome_mut().try_set(0, Gene(1)).unwrap();
        ped.individual_mut(mom).unwrap().genome_mut().try_set(0, Gene(2)).unwrap();
        let child = ped.new_individual();
        ped.add_child(parents, child).unwrap();
        (ped, parents, child)
    }

    #[test]
    fn all_genes_caches_extant_values_per_block_and_survives_reuse() {
        let mut ped = Pedigree::new(1, 1, 1, 2, true);
        let a = ped.new_individual();
        ped.individual_mut(a).unwrap().genome_mut().try_set(0, Gene(9)).unwrap();
        let extant = ped.mate_with_self(a);
        ped.reset();
        ped.add_to_current_layer(extant);

        let genes = ped.all_genes();
        assert!(genes[0].contains(&Gene(9)));
        // cache is reused on a second call, not recomputed from an emptied layer.
        let genes_again = ped.all_genes();
        assert_eq!(genes_again[0].len(), 1);
    }

    #[test]
    fn has_gene_checks_either_member_and_rejects_unknown() {
        let (ped, parents, _) = sample_trio();
        assert!(ped.has_gene(parents, 0, Gene(1)));
        assert!(ped.has_gene(parents, 0, Gene(2)));
        assert!(!ped.has_gene(parents, 0, Gene(3)));
        assert!(!ped.has_gene(parents, 0, Gene::UNKNOWN));
    }

    #[test]
    fn insert_gene_fills_first_free_member() {
        let mut ped = Pedigree::new(1, 1, 1, 2, true);
        let a = ped.new_individual();
        let b = ped.new_individual();
        let couple = ped.mate(a, b);
        ped.insert_gene(couple, 0, Gene(9)).unwrap();
        ped.insert_gene(couple, 0, Gene(10)).unwrap();
        assert!(ped.has_gene(couple, 0, Gene(9)));
        assert!(ped.has_gene(couple, 0, Gene(10)));
        // Both slots full: further inserts and UNKNOWN gene are no-ops.
        ped.insert_gene(couple, 0, Gene(11)).unwrap();
        assert!(!ped.has_gene(couple, 0, Gene(11)));
        ped.insert_gene(couple, 0, Gene::UNKNOWN).unwrap();
    }

    #[test]
    fn add_child_registers_both_directions() {
        let (ped, parents, child) = sample_trio();
        assert!(ped.is_child_of_individual(parents, child));
        assert_eq!(ped.individual(child).unwrap().parent(), Some(parents));
        assert_eq!(ped.num_children(parents), 1);
    }

    #[test]
    fn siblings_share_a_parent_couple() {
        let (mut ped, parents, child1) = sample_trio();
        let child2 = ped.new_individual();
        ped.add_child(parents, child2).unwrap();
        let couple1 = ped.mate_with_self(child1);
        let couple2 = ped.mate_with_self(child2);
        assert!(ped.is_sibling(couple1, couple2));
    }

    #[test]
    fn extant_descendants_of_extant_couple_is_itself() {
        let mut ped = Pedigree::new(1, 1, 1, 2, true);
        let a = ped.new_individual();
        let couple = ped.mate_with_self(a);
        let desc = ped.extant_descendants(couple);
        assert_eq!(desc.len(), 1);
        assert!(desc.contains(&a));
    }

    #[test]
    fn extant_descendants_recurse_through_mates() {
        let (mut ped, parents, child) = sample_trio();
        let child_couple = ped.mate_with_self(child);
        let desc = ped.extant_descendants(parents);
        assert_eq!(desc, AHashSet::from_iter([child]));
        let _ = child_couple;
    }

    #[test]
    fn layers_track_current_generation() {
        let mut ped = Pedigree::new(1, 1, 3, 2, true);
        ped.reset();
        assert_eq!(ped.cur_gen(), 0);
        assert!(!ped.is_done());
        ped.next_layer();
        ped.next_layer();
        assert!(ped.is_done());
    }
}
