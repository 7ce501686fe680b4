//! `tree_diff`/`tree_diff_basic`: bijects an original pedigree against a
//! reconstructed one and reports how much of its topology and genetic
//! content survived reconstruction.
//!
//! Extant couples are bijected directly by shared individual id. Ancestral
//! couples are bijected greedily, youngest generation first, by building a
//! histogram of reconstructed parent candidates over each original
//! couple's already-bijected children and picking the best candidate that
//! clears the `ch_acc` acceptance thresholds on both sides and is not
//! already claimed.

use ahash::AHashMap;
use genome::Gene;
use ids::{CoupleId, IndividualId};
use log::debug;
use pedigree::Pedigree;

/// Minimum fraction of a couple's children (on either side of the
/// bijection) that must agree on a parent candidate for it to be accepted.
pub const DEFAULT_CH_ACC: f64 = 0.49;

/// A attempted/correct tally, formatted as `"correct/total (p%)"` with the
/// percentage rounded down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    pub correct: u64,
    pub total: u64,
}

impl Bucket {
    pub fn record(&mut self, correct: u64, total: u64) {
        self.correct += correct;
        self.total += total;
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pct = if self.total == 0 { 0 } else { self.correct * 100 / self.total };
        write!(f, "{}/{} ({pct}%)", self.correct, self.total)
    }
}

/// Node/edge/block tallies for a single generation (or, in
/// [`DiffReport::total`], summed across all of them).
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationStats {
    pub nodes: Bucket,
    pub edges: Bucket,
    pub blocks: Bucket,
}

/// The full result of [`TreeDiff::topology_biject`] + [`TreeDiff::blocks_check`].
/// `per_generation[i]` corresponds to generation `i + 1` of the original
/// pedigree (generation 0 is extant and is not reported on, since it is
/// bijected by definition rather than scored).
#[derive(Debug, Clone, Default)]
pub struct DiffReport {
    pub per_generation: Vec<GenerationStats>,
    pub total: GenerationStats,
}

/// Stateful evaluator: owns the bijection maps built up across one
/// `topology_biject` + `blocks_check` run.
#[derive(Debug, Clone)]
pub struct TreeDiff {
    ch_acc: f64,
    or_to_re: AHashMap<CoupleId, CoupleId>,
    re_to_or: AHashMap<CoupleId, CoupleId>,
}

impl Default for TreeDiff {
    fn default() -> Self {
        TreeDiff::new(DEFAULT_CH_ACC)
    }
}

impl TreeDiff {
    #[must_use]
    pub fn new(ch_acc: f64) -> Self {
        TreeDiff { ch_acc, or_to_re: AHashMap::new(), re_to_or: AHashMap::new() }
    }

    #[must_use]
    pub fn image_of(&self, original: CoupleId) -> Option<CoupleId> {
        self.or_to_re.get(&original).copied()
    }

    #[must_use]
    pub fn preimage_of(&self, reconstructed: CoupleId) -> Option<CoupleId> {
        self.re_to_or.get(&reconstructed).copied()
    }

    fn biject(&mut self, original: CoupleId, reconstructed: CoupleId) {
        self.or_to_re.insert(original, reconstructed);
        self.re_to_or.insert(reconstructed, original);
    }

    /// Maps every extant couple in `reconstructed` to the original couple
    /// wrapping the same individual id.
    fn biject_extant(&mut self, original: &Pedigree, reconstructed: &Pedigree) {
        let mut by_individual: AHashMap<IndividualId, CoupleId> = AHashMap::new();
        for &couple in original.layer(0) {
            if let Some(node) = original.couple(couple) {
                by_individual.insert(node.member(0), couple);
            }
        }
        for &re_couple in reconstructed.layer(0) {
            let Some(node) = reconstructed.couple(re_couple) else { continue };
            if let Some(&or_couple) = by_individual.get(&node.member(0)) {
                self.biject(or_couple, re_couple);
            }
        }
    }

    /// Finds `v`'s reconstructed image among the parents of generation
    /// `child_gen`'s reconstructed couples, returning the number of `v`'s
    /// children whose bijected image voted for that candidate.
    fn biject_parent(
        &mut self,
        original: &Pedigree,
        reconstructed: &Pedigree,
        child_gen: usize,
        v: CoupleId,
    ) -> u64 {
        let Some(v_node) = original.couple(v) else { return 0 };
        let num_ch = v_node.num_children() as f64;

        let mut par_count: AHashMap<CoupleId, u64> = AHashMap::new();
        for &re_child in reconstructed.layer(child_gen) {
            let Some(&or_image) = self.re_to_or.get(&re_child) else { continue };
            if !original.is_child_of_couple(v, or_image) {
                continue;
            }
            let Some(re_node) = reconstructed.couple(re_child) else { continue };
            let [m0, m1] = re_node.members();
            if let Some(p0) = reconstructed.individual(m0).and_then(pedigree::Individual::parent) {
                *par_count.entry(p0).or_insert(0) += 1;
            }
            if m1 != m0 {
                if let Some(p1) = reconstructed.individual(m1).and_then(pedigree::Individual::parent) {
                    *par_count.entry(p1).or_insert(0) += 1;
                }
            }
        }

        let mut best: Option<(CoupleId, u64)> = None;
        for (&candidate, &count) in &par_count {
            if count as f64 <= self.ch_acc * num_ch {
                continue;
            }
            let Some(cand_node) = reconstructed.couple(candidate) else { continue };
            if count as f64 <= self.ch_acc * cand_node.num_children() as f64 {
                continue;
            }
            if self.re_to_or.contains_key(&candidate) {
                continue;
            }
            let is_better = match best {
                Some((_, best_count)) => count > best_count,
                None => true,
            };
            if is_better {
                best = Some((candidate, count));
            }
        }

        let Some((candidate, count)) = best else {
            debug!("no reconstructed image found for original couple {v}");
            return 0;
        };
        self.biject(v, candidate);
        count
    }

    /// Number of `v`'s original children whose couple's reconstructed
    /// image is a child of `v`'s own reconstructed image.
    fn edges_correct(&self, original: &Pedigree, reconstructed: &Pedigree, v: CoupleId, image: CoupleId) -> u64 {
        let Some(v_node) = original.couple(v) else { return 0 };
        let mut correct = 0;
        for child in v_node.children() {
            let Some(child_couple) = original.individual(child).and_then(pedigree::Individual::mate) else {
                continue;
            };
            if let Some(&child_image) = self.or_to_re.get(&child_couple) {
                if reconstructed.is_child_of_couple(image, child_image) {
                    correct += 1;
                }
            }
        }
        correct
    }

    /// Bijects `original` against `reconstructed` generation by
    /// generation, starting from the extant bijection and working up,
    /// reporting node/edge tallies per generation.
    pub fn topology_biject(&mut self, original: &Pedigree, reconstructed: &Pedigree) -> DiffReport {
        self.or_to_re.clear();
        self.re_to_or.clear();
        self.biject_extant(original, reconstructed);

        let mut per_generation = Vec::new();
        let mut total = GenerationStats::default();

        for gen in 1..original.num_generations() {
            let mut stats = GenerationStats::default();
            let mut originals: Vec<CoupleId> = original.layer(gen).iter().copied().collect();
            originals.sort_by_key(|&c| std::cmp::Reverse(original.num_children(c)));

            for v in originals {
                let num_ch = original.num_children(v) as u64;
                let count = self.biject_parent(original, reconstructed, gen - 1, v);
                let edges_correct = match self.or_to_re.get(&v) {
                    Some(&image) => self.edges_correct(original, reconstructed, v, image),
                    None => 0,
                };
                stats.nodes.record(u64::from(count > 0), 1);
                stats.edges.record(edges_correct, num_ch);
            }

            total.nodes.record(stats.nodes.correct, stats.nodes.total);
            total.edges.record(stats.edges.correct, stats.edges.total);
            per_generation.push(stats);
        }

        DiffReport { per_generation, total }
    }

    /// Scores per-block genetic accuracy for every bijected non-extant
    /// couple and folds the result into `report`'s existing node/edge
    /// tallies. Must be called after [`TreeDiff::topology_biject`].
    pub fn blocks_check(&self, original: &Pedigree, reconstructed: &Pedigree, report: &mut DiffReport) {
        for (idx, gen) in (1..original.num_generations()).enumerate() {
            let mut blocks = Bucket::default();
            for &v in original.layer(gen) {
                let Some(&image) = self.or_to_re.get(&v) else { continue };
                let Some(v_node) = original.couple(v) else { continue };
                let Some(image_node) = reconstructed.couple(image) else { continue };
                let [o0, o1] = v_node.members();
                let [r0, r1] = image_node.members();
                if o0 == o1 {
                    continue;
                }

                for block in 0..original.num_blocks() {
                    let gr0 = reconstructed.individual(r0).and_then(|i| i.genome().get(block));
                    let gr1 = reconstructed.individual(r1).and_then(|i| i.genome().get(block));
                    blocks.total += u64::from(gr0.is_some_and(|g| !g.is_unknown()));
                    blocks.total += u64::from(gr1.is_some_and(|g| !g.is_unknown()));

                    let go0 = original.individual(o0).and_then(|i| i.genome().get(block)).filter(|g| !g.is_unknown());
                    let go1 = original.individual(o1).and_then(|i| i.genome().get(block)).filter(|g| !g.is_unknown());
                    let (Some(go0), Some(go1)) = (go0, go1) else { continue };

                    blocks.correct += block_matches(go0, go1, gr0, gr1);
                }
            }
            if let Some(stats) = report.per_generation.get_mut(idx) {
                stats.blocks = blocks;
            }
            report.total.blocks.record(blocks.correct, blocks.total);
        }
    }
}

/// The homozygous/heterozygous block-match rule from spec §4.8: the first
/// original slot always gets its own check; the second slot is checked
/// against both reconstructed slots if heterozygous, or requires an exact
/// double match if homozygous.
fn block_matches(go0: Gene, go1: Gene, gr0: Option<Gene>, gr1: Option<Gene>) -> u64 {
    let mut correct = 0;
    if gr0 == Some(go0) || gr1 == Some(go0) {
        correct += 1;
    }
    if go1 == go0 {
        if gr0 == Some(go1) && gr1 == Some(go1) {
            correct += 1;
        }
    } else if gr0 == Some(go1) || gr1 == Some(go1) {
        correct += 1;
    }
    correct
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedigree_io::{dump_extant, dump_full, restore_extant, restore_full};
    use simulator::{build, seeded_rng};

    fn self_diff_pedigree() -> Pedigree {
        let mut rng = seeded_rng(true, 11);
        build(6, 2, 3, 10, true, &mut rng)
    }

    #[test]
    fn diffing_a_pedigree_against_itself_is_perfect() {
        let ped = self_diff_pedigree();
        let mut diff = TreeDiff::default();
        let mut report = diff.topology_biject(&ped, &ped);
        diff.blocks_check(&ped, &ped, &mut report);

        assert_eq!(report.total.nodes.correct, report.total.nodes.total);
        assert_eq!(report.total.edges.correct, report.total.edges.total);
        assert_eq!(report.total.blocks.correct, report.total.blocks.total);
    }

    #[test]
    fn round_trip_through_full_dump_still_diffs_perfectly() {
        let ped = self_diff_pedigree();
        let restored = restore_full(&dump_full(&ped)).expect("dump round-trips");
        let mut diff = TreeDiff::default();
        let mut report = diff.topology_biject(&ped, &restored);
        diff.blocks_check(&ped, &restored, &mut report);
        assert_eq!(report.total.nodes.correct, report.total.nodes.total);
    }

    #[test]
    fn bucket_formats_as_fraction_with_floored_percentage() {
        let bucket = Bucket { correct: 1, total: 3 };
        assert_eq!(bucket.to_string(), "1/3 (33%)");
    }

    #[test]
    fn extant_bijection_alone_needs_no_topology() {
        let ped = self_diff_pedigree();
        let extant_only = restore_extant(&dump_extant(&ped)).expect("extant dump round-trips");
        let mut diff = TreeDiff::default();
        diff.topology_biject(&extant_only, &extant_only);
        for &couple in extant_only.layer(0) {
            assert!(diff.image_of(couple).is_some());
        }
    }
}
