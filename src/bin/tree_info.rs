//! `tree-info`: reports structural statistics over an extant dump (or, with
//! `--tree-ped`, a freshly-built perfect tree-pedigree), selected by flag.
//!
//! `-L`/`--badlca` is grounded directly in `bad_joint_LCAs`/`preprocess`
//! (`source/tree_analyze.cpp`): for every generation, how many pairs of
//! extant individuals share a "joint" least common ancestor whose two
//! relevant children's subtrees nonetheless split the pair, against how
//! many such unique-child-descended pairs exist at all.
//!
//! `-B`/`-b` (per-block and per-sibling-pair sharing counts) are
//! implemented here as straightforward counts over [`pedigree::shared_blocks`]
//! and direct block comparison; the original `block_share_stat`/
//! `sib_block_share_stat` bodies were not available to check against, so
//! these are an honest best-effort adaptation rather than a port (see
//! DESIGN.md).

use std::io::Read;
use std::process;

use ahash::{AHashMap, AHashSet};
use clap::Parser;
use ids::{CoupleId, IndividualId};
use located_error::prelude::*;
use parser::TreeInfoArgs;
use pedigree::Pedigree;

/// Full (not extant-only) descendant-couple sets, built bottom-up.
fn descendant_couples(ped: &Pedigree) -> AHashMap<CoupleId, AHashSet<CoupleId>> {
    let mut des: AHashMap<CoupleId, AHashSet<CoupleId>> = AHashMap::new();
    for gen in 0..ped.num_generations() {
        for &v in ped.layer(gen) {
            let mut set = AHashSet::new();
            set.insert(v);
            for child in ped.children_of(v) {
                if let Some(mate) = ped.individual(child).and_then(pedigree::Individual::mate) {
                    if let Some(child_des) = des.get(&mate) {
                        set.extend(child_des.iter().copied());
                    }
                }
            }
            des.insert(v, set);
        }
    }
    des
}

/// Ancestor-couple sets, built top-down from the founder generation.
fn ancestor_couples(ped: &Pedigree) -> AHashMap<CoupleId, AHashSet<CoupleId>> {
    let mut anc: AHashMap<CoupleId, AHashSet<CoupleId>> = AHashMap::new();
    for gen in (0..ped.num_generations()).rev() {
        for &v in ped.layer(gen) {
            let mut set = AHashSet::new();
            set.insert(v);
            if let Some(node) = ped.couple(v) {
                for member in node.members() {
                    if let Some(parent) = ped.individual(member).and_then(pedigree::Individual::parent) {
                        if parent != v {
                            if let Some(parent_anc) = anc.get(&parent) {
                                set.extend(parent_anc.iter().copied());
                            }
                        }
                    }
                }
            }
            anc.insert(v, set);
        }
    }
    anc
}

/// Generation label per couple.
fn grade_of(ped: &Pedigree) -> AHashMap<CoupleId, usize> {
    let mut grade = AHashMap::new();
    for gen in 0..ped.num_generations() {
        for &v in ped.layer(gen) {
            grade.insert(v, gen);
        }
    }
    grade
}

/// `bad_joint_LCAs`: for each generation, `(bad, total)` where `bad` counts
/// extant pairs whose mutual-ancestor chain still splits them across a
/// common ancestor's two children, and `total` counts all pairs descended
/// from distinct children at that generation.
fn bad_joint_lcas(ped: &Pedigree) -> Vec<(i64, i64)> {
    let des = descendant_couples(ped);
    let anc = ancestor_couples(ped);
    let grade = grade_of(ped);
    let extant: Vec<CoupleId> = ped.layer(0).iter().copied().collect();

    let mut bad_lca = vec![(0i64, 0i64); ped.num_generations()];

    for x in 0..extant.len() {
        for y in (x + 1)..extant.len() {
            let Some(anc_x) = anc.get(&extant[x]) else { continue };
            let Some(anc_y) = anc.get(&extant[y]) else { continue };
            let mutual: Vec<CoupleId> = anc_x.intersection(anc_y).copied().collect();

            for &v in &mutual {
                for &u in &mutual {
                    if v == u {
                        continue;
                    }
                    let u_is_descendant_of_v = des.get(&v).is_some_and(|set| set.contains(&u));
                    if !u_is_descendant_of_v {
                        continue;
                    }
                    let Some(node) = ped.couple(v) else { continue };
                    let mut bad = false;
                    for child in ped.children_of(v) {
                        let Some(mate) = ped.individual(child).and_then(pedigree::Individual::mate) else {
                            continue;
                        };
                        let Some(child_des) = des.get(&mate) else { continue };
                        if child_des.contains(&extant[x]) && !child_des.contains(&extant[y]) {
                            bad = true;
                            break;
                        }
                    }
                    let _ = node;
                    if bad {
                        if let Some(&g) = grade.get(&v) {
                            bad_lca[g].0 += 1;
                        }
                    }
                }
            }
        }
    }

    for gen in 1..ped.num_generations() {
        for &v in ped.layer(gen) {
            let mut sig: i64 = 0;
            for child in ped.children_of(v) {
                let Some(mate) = ped.individual(child).and_then(pedigree::Individual::mate) else {
                    continue;
                };
                let nds = ped.extant_descendants(mate).len() as i64;
                sig += nds;
                sig += nds * nds;
            }
            bad_lca[gen].1 += sig / 2;
        }
    }

    bad_lca
}

fn render_bad_lca(ped: &Pedigree) -> String {
    let bad_lca = bad_joint_lcas(ped);
    let mut out = String::new();
    for (i, &(bad, total)) in bad_lca.iter().enumerate().skip(1) {
        let pct = 100 * bad / total.max(1);
        out.push_str(&format!("Generation {i}:\t{bad}/{total}\t{pct}%\n"));
    }
    out.push('\n');
    out
}

/// Per-generation, per-couple block-sharing counts: for each couple, how
/// many blocks its two members agree on, followed by (for each child) how
/// many blocks that child shares with the couple's combined gene pool.
fn render_blocks(ped: &Pedigree, divide: bool, only_gen: Option<usize>) -> String {
    let mut out = String::new();
    for gen in 0..ped.num_generations() {
        if let Some(target) = only_gen {
            if target != gen {
                continue;
            }
        }
        for &couple in ped.layer(gen) {
            let Some(node) = ped.couple(couple) else { continue };
            let [a, b] = node.members();
            let mut own_match = 0usize;
            for block in 0..ped.num_blocks() {
                let gene_a = ped.individual(a).and_then(|i| i.genome().get(block)).unwrap_or_default();
                let gene_b = ped.individual(b).and_then(|i| i.genome().get(block)).unwrap_or_default();
                if gene_a == gene_b && !gene_a.is_unknown() {
                    own_match += 1;
                }
            }
            let render = |e: usize| if divide { 100 * e / ped.num_blocks().max(1) } else { e };
            out.push_str(&format!("{} ", render(own_match)));
            for child in ped.children_of(couple) {
                let mut shared = 0usize;
                for block in 0..ped.num_blocks() {
                    if let Some(gene) = ped.individual(child).and_then(|i| i.genome().get(block)) {
                        if ped.has_gene(couple, block, gene) {
                            shared += 1;
                        }
                    }
                }
                out.push_str(&format!("{} ", render(shared)));
            }
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

/// Sibling-pair block-sharing counts: for every pair of siblings in every
/// couple's children, how many blocks they agree on.
fn render_siblocks(ped: &Pedigree, divide: bool) -> String {
    let mut out = String::new();
    for gen in 0..ped.num_generations() {
        for &couple in ped.layer(gen) {
            let children: Vec<IndividualId> = ped.children_of(couple).collect();
            for i in 0..children.len() {
                for j in (i + 1)..children.len() {
                    let mut shared = 0usize;
                    for block in 0..ped.num_blocks() {
                        let gene_i = ped.individual(children[i]).and_then(|i| i.genome().get(block)).unwrap_or_default();
                        let gene_j = ped.individual(children[j]).and_then(|i| i.genome().get(block)).unwrap_or_default();
                        if gene_i == gene_j && !gene_i.is_unknown() {
                            shared += 1;
                        }
                    }
                    let value = if divide { 100 * shared / ped.num_blocks().max(1) } else { shared };
                    out.push_str(&format!("{value} "));
                }
            }
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

/// Dumps the subtree rooted at `id`: the couple's members, its direct
/// children, and its full extant-descendant set.
fn render_dump_id(ped: &Pedigree, id: u64) -> anyhow::Result<String> {
    let couple = CoupleId::new(id);
    let node = ped.couple(couple).ok_or_else(|| anyhow::anyhow!("no couple with id {id}"))?;
    let [a, b] = node.members();
    let children: Vec<IndividualId> = ped.children_of(couple).collect();
    let extant: Vec<IndividualId> = ped.extant_descendants(couple).into_iter().collect();

    let mut out = String::new();
    out.push_str(&format!("couple {id}: members [{a}, {b}]\n"));
    out.push_str(&format!("children: {:?}\n", children.iter().map(IndividualId::get).collect::<Vec<_>>()));
    out.push_str(&format!(
        "extant descendants ({}): {:?}\n",
        extant.len(),
        extant.iter().map(IndividualId::get).collect::<Vec<_>>()
    ));
    Ok(out)
}

fn run(args: &TreeInfoArgs) -> anyhow::Result<String> {
    let ped = if let Some((blocks, generations, alpha)) = args.tree_ped_params()? {
        simulator::tree_ped(blocks, generations, alpha)
    } else {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input).with_loc(|| "failed to read stdin")?;
        let (extant, _) = parser::split_on_stop_char(&input).unwrap_or((input.as_str(), ""));
        pedigree_io::restore_extant(extant).with_loc(|| "failed to restore extant dump")?
    };

    let mut out = String::new();
    if args.bad_lca {
        out.push_str(&render_bad_lca(&ped));
    }
    if let Some(opts) = &args.blocks {
        let divide = opts.first().copied().unwrap_or(0) != 0;
        let gen = opts.get(1).copied();
        out.push_str(&render_blocks(&ped, divide, gen));
    }
    if let Some(divide) = args.siblocks {
        out.push_str(&render_siblocks(&ped, divide != 0));
    }
    if let Some(id) = args.dump_id {
        out.push_str(&render_dump_id(&ped, id)?);
    }
    Ok(out)
}

fn main() {
    let args = TreeInfoArgs::parse();
    logger::Logger::init(args.logging.verbosity());

    match run(&args) {
        Ok(report) => print!("{report}"),
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    }
}
