//! Builds a stochastic pedigree top-down: founders first, then one
//! generation of children at a time, down to a self-coupled extant
//! generation (spec §4.3).
//!
//! Grounded in `poisson_pedigree::build()` in the original C++ source.
//! That version draws from a single `std::default_random_engine` seeded
//! from `time(NULL)`; here the caller supplies an explicit [`fastrand::Rng`]
//! (spec §5 "the simulator owns its RNG") so deterministic mode can hand in
//! a fixed-seed stream instead of reaching for ambient global state.
//!
//! [`tree_ped`] builds the same shape of pedigree without any randomness
//! at all, for the "perfect small tree" REC-GEN accuracy scenario and for
//! `tree-info --tree-ped`.

use genome::Gene;
use ids::{CoupleId, IndividualId};
use log::info;
use pedigree::Pedigree;

/// Samples from a Poisson distribution with mean `lambda` via Knuth's
/// algorithm: draw uniform variates until their running product drops
/// below `e^-lambda`, counting the draws.
fn sample_poisson(rng: &mut fastrand::Rng, lambda: f64) -> usize {
    let threshold = (-lambda).exp();
    let mut product = 1.0;
    let mut count = 0usize;
    loop {
        product *= rng.f64();
        if product <= threshold {
            return count;
        }
        count += 1;
    }
}

/// Builds a pedigree with `num_blocks` genome blocks, `fertility` children
/// per couple (mean, or exact count in deterministic mode), `num_generations`
/// layers, and `founder_pop_size` founders (rounded down to an even number
/// so every founder can be mated).
///
/// `rng` drives both the Poisson fertility draws and the mate-ordering
/// shuffle. Two calls with the same parameters and an identically-seeded
/// `rng` produce byte-identical pedigrees.
#[must_use]
pub fn build(
    num_blocks: usize,
    fertility: usize,
    num_generations: usize,
    founder_pop_size: usize,
    deterministic: bool,
    rng: &mut fastrand::Rng,
) -> Pedigree {
    let mut ped = Pedigree::new(num_blocks, fertility, num_generations, founder_pop_size, deterministic);
    ped.reset();
    for _ in 0..num_generations.saturating_sub(1) {
        ped.next_layer();
    }
    // `cur_gen` now sits at the founders' layer (num_generations - 1).

    let founders = (founder_pop_size / 2) * 2;
    info!("building generation {}: {founders} founders", ped.cur_gen());
    let mut mating_pool: Vec<(f64, IndividualId)> = Vec::with_capacity(founders);
    for i in 1..=founders {
        let id = ped.new_individual();
        let indiv = ped.individual_mut(id).expect("just inserted");
        for b in 0..num_blocks {
            indiv.genome_mut().try_set(b, Gene(i as u64)).expect("block in range");
        }
        mating_pool.push((rng.f64(), id));
    }

    while ped.cur_gen() > 0 {
        mating_pool.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("mating keys are finite"));
        if mating_pool.len() % 2 == 1 {
            mating_pool.pop();
        }

        let mut couples = Vec::with_capacity(mating_pool.len() / 2);
        for pair in mating_pool.chunks_exact(2) {
            let couple = ped.mate(pair[0].1, pair[1].1);
            ped.add_to_current_layer(couple);
            couples.push(couple);
        }
        mating_pool.clear();
        info!("building generation {}: {} couples", ped.cur_gen() - 1, couples.len());

        for couple in couples {
            let n_children = if deterministic { fertility } else { sample_poisson(rng, fertility as f64) };
            for _ in 0..n_children {
                let child = inherit_child(&mut ped, couple, num_blocks, rng);
                ped.add_child(couple, child).expect("couple exists");
                mating_pool.push((rng.f64(), child));
            }
        }
        ped.prev_layer();
    }

    for (_, indiv) in mating_pool {
        let couple = ped.mate_with_self(indiv);
        ped.add_to_current_layer(couple);
    }

    let founder_couples: Vec<CoupleId> = ped.layer(num_generations - 1).iter().copied().collect();
    for couple in founder_couples {
        let [a, b] = ped.couple(couple).expect("founder layer").members();
        ped.individual_mut(a).expect("member exists").assign_parent(Some(couple));
        if b != a {
            ped.individual_mut(b).expect("member exists").assign_parent(Some(couple));
        }
    }

    ped
}

/// Mints a child of `couple` whose genome is sampled block-by-block,
/// uniformly at random, from one of its two parents.
fn inherit_child(ped: &mut Pedigree, couple: CoupleId, num_blocks: usize, rng: &mut fastrand::Rng) -> IndividualId {
    let members = ped.couple(couple).expect("couple exists").members();
    let child = ped.new_individual();
    for b in 0..num_blocks {
        let donor = usize::from(rng.f64() >= 0.5);
        let gene = ped
            .individual(members[donor])
            .and_then(|i| i.genome().get(b))
            .unwrap_or_default();
        ped.individual_mut(child)
            .expect("just inserted")
            .genome_mut()
            .try_set(b, gene)
            .expect("block in range");
    }
    child
}

/// Builds a perfect `fertility`-ary tree pedigree: a single founder couple
/// at the top, every couple down to (but excluding) the extant layer has
/// exactly `fertility` children, and children are paired off consecutively
/// rather than through the random mate-ordering `build` uses. Used by
/// `tree-info --tree-ped` and by the "perfect small tree" end-to-end
/// scenario (spec §8), where REC-GEN's reconstruction accuracy is checked
/// against ground truth free of demographic noise.
///
/// Unlike [`build`], inheritance alternates parents by child index rather
/// than drawing a coin flip, so two calls with the same parameters are
/// always byte-identical without needing an RNG at all.
#[must_use]
pub fn tree_ped(num_blocks: usize, num_generations: usize, fertility: usize) -> Pedigree {
    let mut ped = Pedigree::new(num_blocks, fertility, num_generations, 2, true);
    ped.reset();
    for _ in 0..num_generations.saturating_sub(1) {
        ped.next_layer();
    }

    let founder_a = ped.new_individual();
    let founder_b = ped.new_individual();
    for (i, founder) in [founder_a, founder_b].into_iter().enumerate() {
        let indiv = ped.individual_mut(founder).expect("just inserted");
        for b in 0..num_blocks {
            indiv.genome_mut().try_set(b, Gene((i + 1) as u64)).expect("block in range");
        }
    }
    let mut pool: Vec<IndividualId> = vec![founder_a, founder_b];

    while ped.cur_gen() > 0 {
        if pool.len() % 2 == 1 {
            pool.pop();
        }
        let mut couples = Vec::with_capacity(pool.len() / 2);
        for pair in pool.chunks_exact(2) {
            let couple = ped.mate(pair[0], pair[1]);
            ped.add_to_current_layer(couple);
            couples.push(couple);
        }
        pool.clear();

        for couple in couples {
            for idx in 0..fertility {
                let child = inherit_child_alternating(&mut ped, couple, num_blocks, idx);
                ped.add_child(couple, child).expect("couple exists");
                pool.push(child);
            }
        }
        ped.prev_layer();
    }

    for indiv in pool {
        let couple = ped.mate_with_self(indiv);
        ped.add_to_current_layer(couple);
    }

    let founder_couples: Vec<CoupleId> = ped.layer(num_generations - 1).iter().copied().collect();
    for couple in founder_couples {
        let [a, b] = ped.couple(couple).expect("founder layer").members();
        ped.individual_mut(a).expect("member exists").assign_parent(Some(couple));
        if b != a {
            ped.individual_mut(b).expect("member exists").assign_parent(Some(couple));
        }
    }

    ped
}

/// Mints a child of `couple` whose genome alternates donor parent by
/// block, offset by `child_index` so siblings don't all inherit
/// identically.
fn inherit_child_alternating(ped: &mut Pedigree, couple: CoupleId, num_blocks: usize, child_index: usize) -> IndividualId {
    let members = ped.couple(couple).expect("couple exists").members();
    let child = ped.new_individual();
    for b in 0..num_blocks {
        let donor = (b + child_index) % 2;
        let gene = ped
            .individual(members[donor])
            .and_then(|i| i.genome().get(b))
            .unwrap_or_default();
        ped.individual_mut(child)
            .expect("just inserted")
            .genome_mut()
            .try_set(b, gene)
            .expect("block in range");
    }
    child
}

/// Builds the RNG `build` should use for a given run: a fixed seed in
/// deterministic mode, fresh entropy otherwise (spec §5 RNG discipline).
#[must_use]
pub fn seeded_rng(deterministic: bool, seed: u64) -> fastrand::Rng {
    if deterministic {
        fastrand::Rng::with_seed(seed)
    } else {
        fastrand::Rng::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_runs_with_same_seed_are_identical() {
        let mut rng_a = seeded_rng(true, 42);
        let mut rng_b = seeded_rng(true, 42);
        let ped_a = build(4, 2, 3, 8, true, &mut rng_a);
        let ped_b = build(4, 2, 3, 8, true, &mut rng_b);
        assert_eq!(ped_a.layer(0).len(), ped_b.layer(0).len());
        for id in ped_a.individuals_iter() {
            let other = ped_b.individual(id.0).expect("same ids minted in same order");
            assert_eq!(id.1.genome(), other.genome());
        }
    }

    #[test]
    fn founder_population_is_rounded_down_to_even() {
        let mut rng = seeded_rng(true, 1);
        let ped = build(2, 1, 2, 5, true, &mut rng);
        assert_eq!(ped.layer(1).len(), 2);
    }

    #[test]
    fn extant_generation_is_self_coupled() {
        let mut rng = seeded_rng(true, 7);
        let ped = build(3, 2, 3, 6, true, &mut rng);
        for couple_id in ped.layer(0) {
            assert!(ped.couple(*couple_id).unwrap().is_extant());
        }
    }

    #[test]
    fn founders_are_their_own_parents() {
        let mut rng = seeded_rng(true, 3);
        let ped = build(2, 1, 2, 4, true, &mut rng);
        for couple_id in ped.layer(1) {
            let couple = ped.couple(*couple_id).unwrap();
            for member in couple.members() {
                assert_eq!(ped.individual(member).unwrap().parent(), Some(*couple_id));
            }
        }
    }

    #[test]
    fn tree_ped_gives_every_couple_exactly_fertility_children() {
        let ped = tree_ped(10, 3, 2);
        for gen in 1..3 {
            for &couple in ped.layer(gen) {
                assert_eq!(ped.num_children(couple), 2);
            }
        }
        assert_eq!(ped.layer(0).len(), 4);
    }

    #[test]
    fn tree_ped_is_fully_deterministic() {
        let a = tree_ped(6, 3, 2);
        let b = tree_ped(6, 3, 2);
        for id in a.individuals_iter() {
            let other = b.individual(id.0).expect("same ids minted in same order");
            assert_eq!(id.1.genome(), other.genome());
        }
    }

    #[test]
    fn tree_ped_founders_self_parent() {
        let ped = tree_ped(4, 3, 2);
        for &couple in ped.layer(2) {
            let node = ped.couple(couple).unwrap();
            for member in node.members() {
                assert_eq!(ped.individual(member).unwrap().parent(), Some(couple));
            }
        }
    }
}
