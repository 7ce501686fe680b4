use ahash::AHashSet;

use ids::IndividualId;

/// Two mated individuals and the children born to them.
///
/// An unmated extant individual is represented as a couple whose two
/// members are the same [`IndividualId`] — this lets every layer of the
/// pedigree, extant or ancestral, be stored uniformly as a set of couples
/// (mirroring the reference implementation's "couples of one individual
/// store two copies of that individual").
#[derive(Debug, Clone)]
pub struct Couple {
    members: [IndividualId; 2],
    children: AHashSet<IndividualId>,
}

impl Couple {
    #[must_use]
    pub fn new(a: IndividualId, b: IndividualId) -> Self {
        Couple {
            members: [a, b],
            children: AHashSet::new(),
        }
    }

    #[must_use]
    pub fn extant(indiv: IndividualId) -> Self {
        Couple {
            members: [indiv, indiv],
            children: AHashSet::new(),
        }
    }

    #[must_use]
    pub fn is_extant(&self) -> bool {
        self.members[0] == self.members[1]
    }

    #[must_use]
    pub fn members(&self) -> [IndividualId; 2] {
        self.members
    }

    /// Overwrites both members in place. Used by dump restore, which
    /// declares a couple's id before its members are known.
    pub fn set_members(&mut self, a: IndividualId, b: IndividualId) {
        self.members = [a, b];
    }

    #[must_use]
    pub fn member(&self, index: usize) -> IndividualId {
        self.members[index.min(1)]
    }

    #[must_use]
    pub fn children(&self) -> impl Iterator<Item = IndividualId> + '_ {
        self.children.iter().copied()
    }

    #[must_use]
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn insert_child(&mut self, child: IndividualId) {
        self.children.insert(child);
    }

    pub fn remove_child(&mut self, child: IndividualId) -> bool {
        self.children.remove(&child)
    }

    #[must_use]
    pub fn has_child(&self, child: IndividualId) -> bool {
        self.children.contains(&child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extant_couple_has_duplicate_member() {
        let c = Couple::extant(IndividualId::new(1));
        assert!(c.is_extant());
        assert_eq!(c.members(), [IndividualId::new(1), IndividualId::new(1)]);
    }

    #[test]
    fn mated_couple_is_not_extant() {
        let c = Couple::new(IndividualId::new(1), IndividualId::new(2));
        assert!(!c.is_extant());
    }

    #[test]
    fn set_members_overwrites_placeholder() {
        let mut c = Couple::new(IndividualId::new(0), IndividualId::new(0));
        c.set_members(IndividualId::new(4), IndividualId::new(5));
        assert_eq!(c.members(), [IndividualId::new(4), IndividualId::new(5)]);
    }

    #[test]
    fn children_insert_and_remove() {
        let mut c = Couple::new(IndividualId::new(1), IndividualId::new(2));
        let ch = IndividualId::new(3);
        c.insert_child(ch);
        assert!(c.has_child(ch));
        assert_eq!(c.num_children(), 1);
        assert!(c.remove_child(ch));
        assert!(!c.has_child(ch));
    }
}
