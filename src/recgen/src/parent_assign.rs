//! Turns a siblinghood hypergraph into the next (older) generational
//! layer: repeatedly extract a maximal clique of size at least `d`, mint
//! a parent couple for it, attach every clique member's still-parentless
//! individual as a child, then strip the claimed edges out of the graph
//! before extracting the next clique.

use hypergraph::Hypergraph;
use ids::CoupleId;
use log::debug;
use pedigree::Pedigree;

/// A couple vertex is fully claimed once both its member individuals
/// have an assigned parent. `Pedigree::get_orphan` always returns
/// *some* member; it only returns one that still lacks a parent when
/// one exists, so checking that returned member's parent tells us
/// whether any orphan remains.
fn is_couple_claimed(ped: &Pedigree, couple: CoupleId) -> bool {
    ped.get_orphan(couple)
        .and_then(|orphan| ped.individual(orphan))
        .and_then(pedigree::Individual::parent)
        .is_some()
}

/// `rec_gen_basic::assign_parents` (Algorithm 1, parent-assignment step).
pub fn assign_parents(ped: &mut Pedigree, mut graph: Hypergraph, d: usize) {
    ped.new_layer();
    loop {
        let clique = graph.extract_clique(d);
        debug!("extracted a clique of size {}", clique.len());
        if clique.len() < d {
            break;
        }
        let a = ped.new_individual();
        let b = ped.new_individual();
        let parent_couple = ped.mate(a, b);
        for &child in &clique {
            if let Some(orphan) = ped.get_orphan(child) {
                let _ = ped.add_child(parent_couple, orphan);
            }
        }
        ped.add_to_current_layer(parent_couple);

        let members: Vec<CoupleId> = clique.into_iter().collect();
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                for k in (j + 1)..members.len() {
                    graph.erase_edge(members[i], members[j], members[k], |v| {
                        is_couple_claimed(ped, v)
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypergraph::Hypergraph;

    #[test]
    fn clique_of_exactly_d_mints_one_parent_couple_per_member() {
        let mut ped = Pedigree::new(4, 2, 2, 6, true);
        ped.reset();
        let mut children = Vec::new();
        for _ in 0..3 {
            let indiv = ped.new_individual();
            let couple = ped.mate_with_self(indiv);
            ped.add_to_current_layer(couple);
            children.push(couple);
        }
        let mut graph = Hypergraph::new();
        graph.insert_edge(children[0], children[1], children[2]);

        assign_parents(&mut ped, graph, 3);

        for &child in &children {
            let orphan = ped.get_orphan(child).unwrap();
            assert!(ped.individual(orphan).unwrap().parent().is_some());
        }
        assert_eq!(ped.current_layer().len(), 1);
    }

    #[test]
    fn below_threshold_clique_assigns_nothing() {
        let mut ped = Pedigree::new(4, 2, 2, 6, true);
        ped.reset();
        let a = ped.new_individual();
        let couple_a = ped.mate_with_self(a);
        ped.add_to_current_layer(couple_a);
        let graph = Hypergraph::new();
        assign_parents(&mut ped, graph, 3);
        assert!(ped.current_layer().is_empty());
    }
}
