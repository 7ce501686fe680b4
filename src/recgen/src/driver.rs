//! The REC-GEN driver loop (Algorithm 1): repeatedly test the current
//! layer for siblinghood, assign parents from the resulting hypergraph,
//! then collect genetic symbols for every couple just created, until the
//! founder generation is reached.

use ids::CoupleId;
use log::{debug, info};
use pedigree::Pedigree;

use crate::{parent_assign::assign_parents, SiblingTest, SymbolCollector, Thresholds};

/// Knobs that vary the run independently of the chosen collector/sibling
/// test: `no_top` mirrors `rec_gen::no_top` ("do not attempt to
/// reconstruct topology, perform symbol collection only"), used by
/// `tree-diff`-style evaluation over a known topology.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecGenConfig {
    pub no_top: bool,
}

/// Runs the full reconstruction loop against `ped`, mutating it in
/// place. `ped` must already hold its extant (layer 0) population with
/// known genomes; `apply_rec_gen` resets it to generation 0 and rebuilds
/// every older layer in turn.
pub fn run(
    ped: &mut Pedigree,
    mut thresholds: Thresholds,
    sibling_test: &dyn SiblingTest,
    collector: &mut dyn SymbolCollector,
    config: RecGenConfig,
) {
    info!("REC-GEN begins");
    ped.reset();
    while !ped.is_done() {
        debug!("building generation {}", ped.cur_gen() + 1);
        if config.no_top {
            ped.next_layer();
        } else {
            let graph = sibling_test.test(ped, &thresholds);
            assign_parents(ped, graph, thresholds.d());
        }
        let layer: Vec<CoupleId> = ped.current_layer().iter().copied().collect();
        for couple in layer {
            debug!("collecting symbols for couple {couple}");
            collector.collect(ped, couple);
        }
        thresholds.advance();
    }
    info!("REC-GEN done");
    // Founders have no further ancestors: each member is its own couple's
    // "child", closing the loop the same way the reference implementation
    // points founder parent pointers back at themselves.
    let founders: Vec<CoupleId> = ped.current_layer().iter().copied().collect();
    for couple in founders {
        if let Some(node) = ped.couple(couple) {
            let [a, b] = node.members();
            let _ = ped.add_child(couple, a);
            if b != a {
                let _ = ped.add_child(couple, b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::MostFrequentCollector;
    use crate::sibling::CandidatePairSiblingTest;
    use genome::Gene;
    use pedigree_io::{dump_extant, restore_extant};
    use simulator::{build, seeded_rng};

    #[test]
    fn driver_runs_to_completion_on_a_simulated_pedigree() {
        let mut rng = seeded_rng(true, 42);
        let simulated = build(8, 2, 3, 12, true, &mut rng);
        let mut ped = restore_extant(&dump_extant(&simulated)).expect("dump round-trips");
        let thresholds = Thresholds::decaying(0.1, 0.85, 0.5, 3);
        let mut collector = MostFrequentCollector;
        run(&mut ped, thresholds, &CandidatePairSiblingTest, &mut collector, RecGenConfig::default());
        assert!(ped.is_done());
        for &founder in ped.current_layer() {
            let node = ped.couple(founder).unwrap();
            let [a, b] = node.members();
            assert!(ped.individual(a).unwrap().parent().is_some());
            assert!(ped.individual(b).unwrap().parent().is_some());
        }
    }

    #[test]
    fn no_top_mode_skips_topology_reconstruction() {
        let mut rng = seeded_rng(true, 7);
        let mut ped = build(4, 2, 2, 6, true, &mut rng);
        let thresholds = Thresholds::default();
        let mut collector = MostFrequentCollector;
        let config = RecGenConfig { no_top: true };
        run(&mut ped, thresholds, &CandidatePairSiblingTest, &mut collector, config);
        assert!(ped.is_done());
        // Topology is untouched: the only couples at the founder layer are
        // whatever the simulator itself produced, not freshly reconstructed ones.
        assert_eq!(ped.current_layer().len(), ped.layer(ped.num_generations() - 1).len());
        let _ = Gene::UNKNOWN;
    }
}
