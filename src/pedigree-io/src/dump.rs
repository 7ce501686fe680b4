//! Text dump and restore of pedigrees, full and extant-only (spec §4.2).
//!
//! The wire format is the flag-grammar line language of [`crate::flags`]:
//! pedigree-level parameter lines start with `-`, individual content lines
//! start with `i`, couple content lines start with `c`. A full dump
//! declares every node's id up front (so references can be resolved
//! regardless of the order nodes are later filled in), then emits one
//! content line per node — directly mirroring the two-phase
//! declare-then-fill restore the original `poisson_pedigree::recover_dumped`
//! performs.

use ahash::AHashSet;
use genome::Gene;
use ids::{CoupleId, Id, IndividualId};
use log::debug;
use pedigree::{Couple, Individual, Pedigree};

use crate::error::{DumpError, IdKind};
use crate::flags::{Arity, FlagReader};

fn header_reader() -> FlagReader {
    let mut fr = FlagReader::new();
    fr.add_flag("blocks", 'B', Arity::Fixed(1));
    fr.add_flag("alpha", 'A', Arity::Fixed(1));
    fr.add_flag("generations", 'T', Arity::Fixed(1));
    fr.add_flag("founders", 'N', Arity::Fixed(1));
    fr.add_flag("extant", 'n', Arity::Fixed(1));
    fr.add_flag("deterministic", 'd', Arity::Fixed(0));
    fr.add_flag("individual", 'i', Arity::Fixed(1));
    fr.add_flag("couple", 'c', Arity::Fixed(1));
    fr
}

fn individual_reader() -> FlagReader {
    let mut fr = FlagReader::new();
    fr.add_flag("id", 'i', Arity::Fixed(1));
    fr.add_flag("couple", 'c', Arity::Fixed(1));
    fr.add_flag("parent", 'p', Arity::Fixed(1));
    fr.add_flag("genome", 'g', Arity::Dynamic);
    fr
}

fn couple_reader() -> FlagReader {
    let mut fr = FlagReader::new();
    fr.add_flag("id", 'i', Arity::Fixed(1));
    fr.add_flag("members", 'm', Arity::Dynamic);
    fr.add_flag("children", 'c', Arity::Dynamic);
    fr
}

fn parse_u64(s: &str) -> Result<u64, DumpError> {
    Ok(s.parse::<u64>()?)
}

/// Serializes an individual's genome as `-g {n} {g1} {g2} ...`.
fn dump_genes(indiv: &Individual) -> String {
    let genome = indiv.genome();
    let mut d = format!("-g {}", genome.num_blocks());
    for gene in genome.iter() {
        d += &format!(" {}", gene.0);
    }
    d
}

/// Full dump: header, declarations, then one content line per node.
#[must_use]
pub fn dump_full(ped: &Pedigree) -> String {
    let mut out = String::new();
    out += &format!(
        "-B {}\n-A {}\n-T {}\n-N {}\n",
        ped.num_blocks(),
        ped.fertility(),
        ped.num_generations(),
        ped.founder_pop_size()
    );
    if ped.deterministic() {
        out += "-d\n";
    }

    let mut indiv_ids: Vec<IndividualId> = ped.individuals_iter().map(|(id, _)| id).collect();
    indiv_ids.sort_by_key(|id| id.raw());
    let mut couple_ids: Vec<CoupleId> = ped.couples_iter().map(|(id, _)| id).collect();
    couple_ids.sort_by_key(|id| id.raw());

    for id in &indiv_ids {
        out += &format!("-i {id}\n");
    }
    for id in &couple_ids {
        out += &format!("-c {id}\n");
    }
    for id in &indiv_ids {
        let indiv = ped.individual(*id).expect("id collected from registry");
        let couple_id = indiv.mate().map_or(0, Id::raw);
        let parent_id = indiv.parent().map_or(0, Id::raw);
        out += &format!("i -i {id} -c {couple_id} -p {parent_id} {}\n", dump_genes(indiv));
    }
    for id in &couple_ids {
        let couple = ped.couple(*id).expect("id collected from registry");
        let [a, b] = couple.members();
        let mut children: Vec<IndividualId> = couple.children().collect();
        children.sort_by_key(|id| id.raw());
        let mut d = format!("c -i {id} -m 2 {a} {b} -c {}", children.len());
        for ch in children {
            d += &format!(" {ch}");
        }
        out += &d;
        out += "\n";
    }
    out
}

/// Extant-only dump: input to REC-GEN (spec §4.2).
#[must_use]
pub fn dump_extant(ped: &Pedigree) -> String {
    let layer0 = ped.layer(0);
    let mut out = format!(
        "-n {}\n-T {}\n-B {}\n",
        layer0.len(),
        ped.num_generations(),
        ped.num_blocks()
    );
    let mut ids: Vec<CoupleId> = layer0.iter().copied().collect();
    ids.sort_by_key(|id| id.raw());
    for id in ids {
        let couple = ped.couple(id).expect("layer membership implies presence");
        let member = couple.member(0);
        let indiv = ped.individual(member).expect("member resolves");
        out += &format!("i -i {member} {}\n", dump_genes(indiv));
    }
    out
}

/// Restores a full dump produced by [`dump_full`].
pub fn restore_full(text: &str) -> Result<Pedigree, DumpError> {
    let header_fr = header_reader();
    let indiv_fr = individual_reader();
    let couple_fr = couple_reader();

    let mut num_blocks = None;
    let mut fertility = None;
    let mut num_generations = None;
    let mut founder_pop_size = None;
    let mut deterministic = false;
    let mut declared_individuals = Vec::new();
    let mut declared_couples = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() || !line.starts_with('-') {
            continue;
        }
        for flag in header_fr.parse_line(line)? {
            match flag.name {
                "blocks" => num_blocks = Some(parse_u64(&flag.args[0])? as usize),
                "alpha" => fertility = Some(parse_u64(&flag.args[0])? as usize),
                "generations" => num_generations = Some(parse_u64(&flag.args[0])? as usize),
                "founders" => founder_pop_size = Some(parse_u64(&flag.args[0])? as usize),
                "deterministic" => deterministic = true,
                "individual" => declared_individuals.push(parse_u64(&flag.args[0])?),
                "couple" => declared_couples.push(parse_u64(&flag.args[0])?),
                "extant" => {} // full dumps never carry -n; ignore defensively
                _ => unreachable!("unregistered header flag"),
            }
        }
    }

    let num_blocks = num_blocks.ok_or(DumpError::MissingFlag('B'))?;
    let fertility = fertility.ok_or(DumpError::MissingFlag('A'))?;
    let num_generations = num_generations.ok_or(DumpError::MissingFlag('T'))?;
    let founder_pop_size = founder_pop_size.ok_or(DumpError::MissingFlag('N'))?;

    debug!(
        "declaring {} individuals and {} couples before filling their content lines",
        declared_individuals.len(),
        declared_couples.len()
    );
    let mut ped = Pedigree::new(num_blocks, fertility, num_generations, founder_pop_size, deterministic);
    for raw in &declared_individuals {
        ped.insert_individual_with_id(IndividualId::new(*raw), Individual::new(num_blocks));
    }
    for raw in &declared_couples {
        // Placeholder members, overwritten once the couple's content line runs.
        ped.insert_couple_with_id(CoupleId::new(*raw), Couple::new(IndividualId::new(0), IndividualId::new(0)));
    }

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("i ") {
            restore_individual_line(&mut ped, &indiv_fr, rest, num_blocks)?;
        } else if let Some(rest) = line.strip_prefix("c ") {
            restore_couple_line(&mut ped, &couple_fr, rest)?;
        }
    }

    rebuild_layers_from_founders_down(&mut ped);
    Ok(ped)
}

fn restore_individual_line(
    ped: &mut Pedigree,
    fr: &FlagReader,
    rest: &str,
    num_blocks: usize,
) -> Result<(), DumpError> {
    let mut id = None;
    let mut couple_id = None;
    let mut parent_id = None;
    let mut genome = None;
    for flag in fr.parse_line(rest)? {
        match flag.name {
            "id" => id = Some(parse_u64(&flag.args[0])?),
            "couple" => couple_id = Some(parse_u64(&flag.args[0])?),
            "parent" => parent_id = Some(parse_u64(&flag.args[0])?),
            "genome" => {
                let genes = flag
                    .args
                    .iter()
                    .map(|s| parse_u64(s).map(Gene))
                    .collect::<Result<Vec<_>, _>>()?;
                genome = Some(genes);
            }
            _ => unreachable!("unregistered individual flag"),
        }
    }
    let id = id.ok_or(DumpError::MissingFlag('i'))?;
    let indiv_id = IndividualId::new(id);
    if let Some(genes) = genome {
        if genes.len() != num_blocks {
            return Err(DumpError::GenomeLengthMismatch {
                found: genes.len(),
                expected: num_blocks,
            });
        }
        let indiv = ped
            .individual_mut(indiv_id)
            .ok_or(DumpError::DanglingReference(IdKind::Individual, id))?;
        for (b, g) in genes.into_iter().enumerate() {
            let _ = indiv.genome_mut().try_set(b, g);
        }
    }
    if let Some(cid) = couple_id {
        if cid != 0 {
            if !ped_has_couple(ped, cid) {
                return Err(DumpError::DanglingReference(IdKind::Couple, cid));
            }
            ped.individual_mut(indiv_id)
                .ok_or(DumpError::DanglingReference(IdKind::Individual, id))?
                .set_mate(CoupleId::new(cid));
        }
    }
    if let Some(pid) = parent_id {
        let parent = if pid == 0 {
            None
        } else {
            if !ped_has_couple(ped, pid) {
                return Err(DumpError::DanglingReference(IdKind::Couple, pid));
            }
            Some(CoupleId::new(pid))
        };
        ped.individual_mut(indiv_id)
            .ok_or(DumpError::DanglingReference(IdKind::Individual, id))?
            .assign_parent(parent);
    }
    Ok(())
}

fn restore_couple_line(ped: &mut Pedigree, fr: &FlagReader, rest: &str) -> Result<(), DumpError> {
    let mut id = None;
    let mut members = None;
    let mut children = None;
    for flag in fr.parse_line(rest)? {
        match flag.name {
            "id" => id = Some(parse_u64(&flag.args[0])?),
            "members" => {
                let ids = flag
                    .args
                    .iter()
                    .map(|s| parse_u64(s))
                    .collect::<Result<Vec<_>, _>>()?;
                members = Some(ids);
            }
            "children" => {
                let ids = flag
                    .args
                    .iter()
                    .map(|s| parse_u64(s))
                    .collect::<Result<Vec<_>, _>>()?;
                children = Some(ids);
            }
            _ => unreachable!("unregistered couple flag"),
        }
    }
    let id = id.ok_or(DumpError::MissingFlag('i'))?;
    let couple_id = CoupleId::new(id);
    if let Some(m) = members {
        if m.len() != 2 {
            return Err(DumpError::GenomeLengthMismatch {
                found: m.len(),
                expected: 2,
            });
        }
        for raw in &m {
            if !ped_has_individual(ped, *raw) {
                return Err(DumpError::DanglingReference(IdKind::Individual, *raw));
            }
        }
        ped.couple_mut(couple_id)
            .ok_or(DumpError::DanglingReference(IdKind::Couple, id))?
            .set_members(IndividualId::new(m[0]), IndividualId::new(m[1]));
    }
    if let Some(ch) = children {
        for raw in ch {
            if !ped_has_individual(ped, raw) {
                return Err(DumpError::DanglingReference(IdKind::Individual, raw));
            }
            ped.couple_mut(couple_id)
                .ok_or(DumpError::DanglingReference(IdKind::Couple, id))?
                .insert_child(IndividualId::new(raw));
        }
    }
    Ok(())
}

fn ped_has_individual(ped: &Pedigree, raw: u64) -> bool {
    ped.individual(IndividualId::new(raw)).is_some()
}

fn ped_has_couple(ped: &Pedigree, raw: u64) -> bool {
    ped.couple(CoupleId::new(raw)).is_some()
}

/// Reconstructs layer membership by walking up from the self-coupled
/// (extant) couples through parent pointers, as spec §4.2 prescribes for
/// full dumps lacking an explicit extant marker.
fn rebuild_layers_from_founders_down(ped: &mut Pedigree) {
    ped.reset();
    let mut extant: Vec<CoupleId> = ped
        .couples_iter()
        .filter(|(_, c)| c.is_extant())
        .map(|(id, _)| id)
        .collect();
    extant.sort_by_key(|id| id.raw());
    debug!("rebuilding layers from {} extant couples up through the founders", extant.len());
    for id in extant {
        ped.add_to_current_layer(id);
    }
    while (ped.cur_gen() as usize) < ped.num_generations() - 1 {
        ped.new_layer();
        let prev: Vec<CoupleId> = ped.layer(ped.cur_gen() as usize - 1).iter().copied().collect();
        let mut seen: AHashSet<CoupleId> = ped.layer(ped.cur_gen() as usize).iter().copied().collect();
        let mut to_add = Vec::new();
        for couple_id in prev {
            let Some(couple) = ped.couple(couple_id) else {
                continue;
            };
            for member in couple.members() {
                if let Some(parent) = ped.individual(member).and_then(pedigree::Individual::parent) {
                    if seen.insert(parent) {
                        to_add.push(parent);
                    }
                }
            }
        }
        to_add.sort_by_key(|id| id.raw());
        for parent in to_add {
            ped.add_to_current_layer(parent);
        }
    }
}

/// Restores an extant-only dump produced by [`dump_extant`]: only layer 0
/// is populated, every extant individual self-coupled (spec §4.2 contract).
pub fn restore_extant(text: &str) -> Result<Pedigree, DumpError> {
    let header_fr = header_reader();
    let indiv_fr = individual_reader();

    let mut num_blocks = None;
    let mut num_generations = None;
    let mut extant_count = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() || !line.starts_with('-') {
            continue;
        }
        for flag in header_fr.parse_line(line)? {
            match flag.name {
                "blocks" => num_blocks = Some(parse_u64(&flag.args[0])? as usize),
                "generations" => num_generations = Some(parse_u64(&flag.args[0])? as usize),
                "extant" => extant_count = Some(parse_u64(&flag.args[0])? as usize),
                _ => {}
            }
        }
    }

    let num_blocks = num_blocks.ok_or(DumpError::MissingFlag('B'))?;
    let num_generations = num_generations.ok_or(DumpError::MissingFlag('T'))?;
    let _ = extant_count;

    let mut ped = Pedigree::new(num_blocks, 0, num_generations, 0, false);
    ped.reset();

    for line in text.lines() {
        let line = line.trim_end();
        let Some(rest) = line.strip_prefix("i ") else {
            continue;
        };
        let mut id = None;
        let mut genome = None;
        for flag in indiv_fr.parse_line(rest)? {
            match flag.name {
                "id" => id = Some(parse_u64(&flag.args[0])?),
                "genome" => {
                    let genes = flag
                        .args
                        .iter()
                        .map(|s| parse_u64(s).map(Gene))
                        .collect::<Result<Vec<_>, _>>()?;
                    genome = Some(genes);
                }
                _ => {}
            }
        }
        let id = id.ok_or(DumpError::MissingFlag('i'))?;
        let genes = genome.unwrap_or_default();
        if genes.len() != num_blocks {
            return Err(DumpError::GenomeLengthMismatch {
                found: genes.len(),
                expected: num_blocks,
            });
        }
        let mut indiv = Individual::new(num_blocks);
        for (b, g) in genes.into_iter().enumerate() {
            let _ = indiv.genome_mut().try_set(b, g);
        }
        ped.insert_individual_with_id(IndividualId::new(id), indiv);
        let couple_id = ped.mate_with_self(IndividualId::new(id));
        ped.add_to_current_layer(couple_id);
    }

    Ok(ped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_deterministic_pedigree() -> Pedigree {
        let mut ped = Pedigree::new(3, 2, 2, 4, true);
        let f1 = ped.new_individual();
        let f2 = ped.new_individual();
        let f3 = ped.new_individual();
        let f4 = ped.new_individual();
        for (idx, f) in [f1, f2, f3, f4].into_iter().enumerate() {
            let i = ped.individual_mut(f).unwrap();
            for b in 0..3 {
                i.genome_mut().try_set(b, Gene((idx + 1) as u64)).unwrap();
            }
        }
        ped.reset();
        let c1 = ped.mate(f1, f2);
        let c2 = ped.mate(f3, f4);
        ped.add_to_current_layer(c1);
        ped.add_to_current_layer(c2);
        ped.individual_mut(f1).unwrap().assign_parent(Some(c1));
        ped.individual_mut(f2).unwrap().assign_parent(Some(c1));
        ped.individual_mut(f3).unwrap().assign_parent(Some(c2));
        ped.individual_mut(f4).unwrap().assign_parent(Some(c2));

        ped.new_layer();
        let child1 = ped.new_individual();
        let child2 = ped.new_individual();
        ped.add_child(c1, child1).unwrap();
        ped.add_child(c2, child2).unwrap();
        for b in 0..3 {
            ped.insert_gene(c1, b, Gene(1)).unwrap();
        }
        let ext1 = ped.mate_with_self(child1);
        let ext2 = ped.mate_with_self(child2);
        ped.individual_mut(child1).unwrap().genome_mut().try_set(0, Gene(1)).unwrap();
        ped.individual_mut(child2).unwrap().genome_mut().try_set(0, Gene(3)).unwrap();
        ped.add_to_current_layer(ext1);
        ped.add_to_current_layer(ext2);
        ped
    }

    #[test]
    fn full_dump_restore_roundtrip_preserves_ids_and_genomes() {
        let ped = small_deterministic_pedigree();
        let dumped = dump_full(&ped);
        let restored = restore_full(&dumped).unwrap();
        let redumped = dump_full(&restored);
        assert_eq!(dumped, redumped);
    }

    #[test]
    fn extant_dump_restore_yields_layer0_only() {
        let ped = small_deterministic_pedigree();
        let dumped = dump_extant(&ped);
        let restored = restore_extant(&dumped).unwrap();
        assert_eq!(restored.layer(0).len(), ped.layer(0).len());
        for couple_id in restored.layer(0) {
            let couple = restored.couple(*couple_id).unwrap();
            assert!(couple.is_extant());
        }
    }

    #[test]
    fn dangling_member_reference_is_an_error() {
        let text = "-B 1\n-A 1\n-T 1\n-N 2\n-c 1\nc -i 1 -m 2 99 98 -c 0\n";
        assert!(matches!(
            restore_full(text),
            Err(DumpError::DanglingReference(IdKind::Individual, 99))
        ));
    }

    #[test]
    fn missing_required_header_flag_errors() {
        let text = "-A 1\n-T 1\n-N 2\n";
        assert!(matches!(restore_full(text), Err(DumpError::MissingFlag('B'))));
    }
}
