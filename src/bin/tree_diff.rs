//! `tree-diff`: reads an original full dump, a `~` separator, then a
//! reconstructed full dump from stdin, and prints a per-generation and
//! total accuracy report.
//!
//! Grounded in `main/treediff_main.cpp`, which prints `"GENERATION {i}:"`
//! followed by the generation's stat line for every ancestral generation,
//! then a final `"TOTAL:"` block.

use std::io::Read;
use std::process;

use clap::Parser;
use located_error::prelude::*;
use parser::TreeDiffArgs;
use treediff::TreeDiff;

fn run(args: &TreeDiffArgs) -> anyhow::Result<String> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input).with_loc(|| "failed to read stdin")?;
    let (original_text, reconstructed_text) =
        parser::split_on_stop_char(&input).with_loc(|| "expected two dumps separated by '~'")?;

    let original = pedigree_io::restore_full(original_text).with_loc(|| "failed to restore original dump")?;
    let reconstructed =
        pedigree_io::restore_full(reconstructed_text).with_loc(|| "failed to restore reconstructed dump")?;

    let mut diff = TreeDiff::new(args.ch_acc);
    let mut report = diff.topology_biject(&original, &reconstructed);
    diff.blocks_check(&original, &reconstructed, &mut report);

    let mut out = String::new();
    for (i, stats) in report.per_generation.iter().enumerate() {
        out.push_str(&format!(
            "GENERATION {}:\nnodes: {}\nedges: {}\nblocks: {}\n",
            i + 1,
            stats.nodes,
            stats.edges,
            stats.blocks
        ));
    }
    out.push_str(&format!(
        "TOTAL:\nnodes: {}\nedges: {}\nblocks: {}\n",
        report.total.nodes, report.total.edges, report.total.blocks
    ));
    Ok(out)
}

fn main() {
    let args = TreeDiffArgs::parse();
    logger::Logger::init(args.logging.verbosity());

    match run(&args) {
        Ok(report) => print!("{report}"),
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    }
}
