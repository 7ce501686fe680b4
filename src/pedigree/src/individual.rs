use genome::Genome;
use ids::CoupleId;

/// One person: a genome plus the two relations that place them in the
/// pedigree — the couple they were born from, and the couple they formed
/// with a mate. Both are `Option<CoupleId>` rather than owning pointers;
/// the graph lives entirely in the arenas of [`crate::Pedigree`].
#[derive(Debug, Clone)]
pub struct Individual {
    genome: Genome,
    parent: Option<CoupleId>,
    mate: Option<CoupleId>,
}

impl Individual {
    #[must_use]
    pub fn new(num_blocks: usize) -> Self {
        Individual {
            genome: Genome::unknown(num_blocks),
            parent: None,
            mate: None,
        }
    }

    #[must_use]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn genome_mut(&mut self) -> &mut Genome {
        &mut self.genome
    }

    #[must_use]
    pub fn parent(&self) -> Option<CoupleId> {
        self.parent
    }

    pub fn assign_parent(&mut self, parent: Option<CoupleId>) {
        self.parent = parent;
    }

    #[must_use]
    pub fn mate(&self) -> Option<CoupleId> {
        self.mate
    }

    pub fn set_mate(&mut self, mate: CoupleId) {
        self.mate = Some(mate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_individual_has_unknown_genome_and_no_relations() {
        let indiv = Individual::new(3);
        assert_eq!(indiv.genome().num_blocks(), 3);
        assert!(indiv.parent().is_none());
        assert!(indiv.mate().is_none());
    }

    #[test]
    fn assign_parent_and_mate() {
        let mut indiv = Individual::new(2);
        indiv.assign_parent(Some(CoupleId::new(1)));
        indiv.set_mate(CoupleId::new(2));
        assert_eq!(indiv.parent(), Some(CoupleId::new(1)));
        assert_eq!(indiv.mate(), Some(CoupleId::new(2)));
    }
}
