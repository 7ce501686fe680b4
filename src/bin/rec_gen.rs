//! `rec-gen`: reads an extant-only dump from stdin, reconstructs ancestral
//! topology and genomes, and prints the resulting full dump to stdout.
//!
//! Grounded in `main/recgen_main.cpp`: `-B`/`-R`/`-P` select the basic,
//! recursive and belief-propagation variants respectively; with none of
//! those given, the default is the quadratic candidate-pair sibling test
//! paired with the most-frequent collector.

use std::io::Read;
use std::process;

use clap::Parser;
use located_error::prelude::*;
use parser::RecGenArgs;
use recgen::{
    BeliefPropagationCollector, CandidatePairSiblingTest, MostFrequentCollector, NaiveSiblingTest,
    RecGenConfig, RecursiveCollector, SiblingTest, SymbolCollector, Thresholds, TripleVoteCollector,
};

fn thresholds_from(args: &RecGenArgs) -> Thresholds {
    if args.sib.len() > 1 || args.cand.len() > 1 {
        Thresholds::with_schedule(args.sib.clone(), args.cand.clone(), args.rec, args.d)
    } else {
        let sib = args.sib.first().copied().unwrap_or(recgen::thresholds::DEFAULT_SIB);
        Thresholds::decaying(sib, args.decay, args.rec, args.d)
    }
}

fn run(args: &RecGenArgs) -> anyhow::Result<String> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input).with_loc(|| "failed to read stdin")?;
    let (extant, _) = parser::split_on_stop_char(&input).unwrap_or((input.as_str(), ""));
    let mut ped = pedigree_io::restore_extant(extant).with_loc(|| "failed to restore extant dump")?;

    let thresholds = thresholds_from(args);
    let sibling_test: Box<dyn SiblingTest> =
        if args.basic { Box::new(NaiveSiblingTest) } else { Box::new(CandidatePairSiblingTest) };
    let mut collector: Box<dyn SymbolCollector> = if args.basic {
        Box::new(TripleVoteCollector)
    } else if args.recursive {
        Box::new(RecursiveCollector::default())
    } else if args.bp {
        let mut bp = BeliefPropagationCollector::new(args.epsilon);
        bp.set_purge_pairs(args.memmode != 0);
        Box::new(bp)
    } else {
        Box::new(MostFrequentCollector)
    };

    let config = RecGenConfig { no_top: args.no_top };
    recgen::run(&mut ped, thresholds, sibling_test.as_ref(), collector.as_mut(), config);
    Ok(pedigree_io::dump_full(&ped))
}

fn main() {
    let args = RecGenArgs::parse();
    logger::Logger::init(args.logging.verbosity());

    match run(&args) {
        Ok(dump) => println!("{dump}"),
        Err(e) => {
            log::error!("{e}");
            process::exit(1);
        }
    }
}
