//! The siblinghood hypergraph: a 3-uniform hypergraph over couples, edge
//! multiplicity capped at 2 (paper definition 3.11), used to detect
//! sibling groups before assigning them a parent couple.
//!
//! Grounded in `hypergraph_basic`/`edge_basic` in `rec_gen_basic.cpp`. That
//! version is intertwined with `coupled_node*` pointers and with parent
//! assignment (`erase_edge` reaches into `v->get_orphan()->parent()`
//! directly). Here the hypergraph knows only about [`ids::CoupleId`]s;
//! the "is this vertex already claimed" check becomes a caller-supplied
//! predicate, so this crate never depends on the `pedigree` crate.

use ahash::{AHashMap, AHashSet};
use ids::{CoupleId, Id};

/// A hyperedge: three couples, always stored in ascending-ID order so
/// equality is structural (spec §4.5 "canonical edge form").
pub type Edge = [CoupleId; 3];

fn canonical(mut e: Edge) -> Edge {
    e.sort_by_key(|id| id.raw());
    e
}

#[derive(Debug, Clone, Default)]
pub struct Hypergraph {
    vert: AHashMap<CoupleId, AHashSet<Edge>>,
    adj: AHashMap<Edge, u8>,
}

impl Hypergraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vert.len()
    }

    #[must_use]
    pub fn contains_edge(&self, u: CoupleId, v: CoupleId, w: CoupleId) -> bool {
        self.adj.contains_key(&canonical([u, v, w]))
    }

    #[must_use]
    pub fn multiplicity(&self, u: CoupleId, v: CoupleId, w: CoupleId) -> u8 {
        self.adj.get(&canonical([u, v, w])).copied().unwrap_or(0)
    }

    /// Inserts the edge `{u, v, w}`, incrementing its multiplicity up to a
    /// cap of 2.
    pub fn insert_edge(&mut self, u: CoupleId, v: CoupleId, w: CoupleId) {
        let edge = canonical([u, v, w]);
        let count = self.adj.entry(edge).or_insert(0);
        *count = (*count + 1).min(2);
        for vertex in edge {
            self.vert.entry(vertex).or_default().insert(edge);
        }
    }

    /// Removes one occurrence of `{u, v, w}`. When its multiplicity hits
    /// zero the edge (and any vertex left with no incident edges) is
    /// dropped. `is_claimed(vertex)` should report whether that couple's
    /// orphan individual already has an assigned parent — any such vertex
    /// is removed outright, along with all of its incident edges, per
    /// spec §4.5 "erase semantics".
    pub fn erase_edge(&mut self, u: CoupleId, v: CoupleId, w: CoupleId, mut is_claimed: impl FnMut(CoupleId) -> bool) {
        let edge = canonical([u, v, w]);
        if let Some(count) = self.adj.get_mut(&edge) {
            *count -= 1;
            if *count == 0 {
                self.adj.remove(&edge);
                for vertex in edge {
                    if let Some(edges) = self.vert.get_mut(&vertex) {
                        edges.remove(&edge);
                        if edges.is_empty() {
                            self.vert.remove(&vertex);
                        }
                    }
                }
            }
        }
        for vertex in edge {
            if is_claimed(vertex) {
                self.remove_vertex(vertex);
            }
        }
    }

    /// Drops a vertex and every edge incident to it.
    pub fn remove_vertex(&mut self, vertex: CoupleId) {
        if let Some(edges) = self.vert.remove(&vertex) {
            for edge in edges {
                self.adj.remove(&edge);
            }
        }
    }

    fn cliquable(&self, clique: &AHashSet<CoupleId>, candidate: CoupleId) -> bool {
        let members: Vec<CoupleId> = clique.iter().copied().collect();
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                if !self.adj.contains_key(&canonical([members[i], members[j], candidate])) {
                    return false;
                }
            }
        }
        true
    }

    fn find_d_clique(&self, vertices: &[CoupleId], idx: usize, d: usize, clique: &mut AHashSet<CoupleId>) {
        if clique.len() >= d || idx >= vertices.len() {
            return;
        }
        let candidate = vertices[idx];
        if self.cliquable(clique, candidate) {
            clique.insert(candidate);
            self.find_d_clique(vertices, idx + 1, d, clique);
            if clique.len() >= d {
                return;
            }
            clique.remove(&candidate);
        }
        self.find_d_clique(vertices, idx + 1, d, clique);
    }

    fn augment_clique(&self, vertices: &[CoupleId], idx: usize, clique: &mut AHashSet<CoupleId>) {
        if idx >= vertices.len() {
            return;
        }
        let candidate = vertices[idx];
        if !clique.contains(&candidate) && self.cliquable(clique, candidate) {
            clique.insert(candidate);
        }
        self.augment_clique(vertices, idx + 1, clique);
    }

    /// Greedily builds a clique of size ≥ `d` (stopping the moment it's
    /// reached), then augments it to maximal. Vertices are visited in
    /// ascending-ID order so repeated calls on identical state are
    /// reproducible (spec §5 ordering guarantees). Returns an empty set
    /// if the hypergraph has no vertices.
    #[must_use]
    pub fn extract_clique(&self, d: usize) -> AHashSet<CoupleId> {
        let mut vertices: Vec<CoupleId> = self.vert.keys().copied().collect();
        vertices.sort_by_key(|id| id.raw());
        let mut clique = AHashSet::new();
        self.find_d_clique(&vertices, 0, d, &mut clique);
        self.augment_clique(&vertices, 0, &mut clique);
        clique
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(n: u64) -> CoupleId {
        CoupleId::new(n)
    }

    #[test]
    fn canonical_form_is_order_independent() {
        let mut g = Hypergraph::new();
        g.insert_edge(cid(3), cid(1), cid(2));
        assert!(g.contains_edge(cid(1), cid(2), cid(3)));
        assert!(g.contains_edge(cid(2), cid(3), cid(1)));
    }

    #[test]
    fn multiplicity_caps_at_two() {
        let mut g = Hypergraph::new();
        for _ in 0..5 {
            g.insert_edge(cid(1), cid(2), cid(3));
        }
        assert_eq!(g.multiplicity(cid(1), cid(2), cid(3)), 2);
    }

    #[test]
    fn insert_then_erase_restores_prior_state() {
        let mut g = Hypergraph::new();
        g.insert_edge(cid(1), cid(2), cid(3));
        g.erase_edge(cid(1), cid(2), cid(3), |_| false);
        assert!(!g.contains_edge(cid(1), cid(2), cid(3)));
        assert_eq!(g.num_vertices(), 0);
    }

    #[test]
    fn erase_removes_vertices_with_claimed_orphans() {
        let mut g = Hypergraph::new();
        g.insert_edge(cid(1), cid(2), cid(3));
        g.insert_edge(cid(1), cid(2), cid(3));
        g.erase_edge(cid(1), cid(2), cid(3), |v| v == cid(2));
        // Multiplicity 1 remains on the edge itself, but vertex 2 is gone.
        assert_eq!(g.num_vertices(), 2);
    }

    #[test]
    fn extract_clique_finds_k4_on_four_couples() {
        let mut g = Hypergraph::new();
        let verts = [cid(1), cid(2), cid(3), cid(4)];
        for i in 0..verts.len() {
            for j in (i + 1)..verts.len() {
                for k in (j + 1)..verts.len() {
                    g.insert_edge(verts[i], verts[j], verts[k]);
                }
            }
        }
        let clique = g.extract_clique(3);
        assert!(clique.len() >= 3);
        assert!(clique.iter().all(|v| verts.contains(v)));
    }

    #[test]
    fn extract_clique_on_empty_graph_is_empty() {
        let g = Hypergraph::new();
        assert!(g.extract_clique(3).is_empty());
    }
}
