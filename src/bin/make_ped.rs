//! `make-ped`: stochastically generates a pedigree from demographic
//! parameters and writes its extant dump, a `~` separator, then its full
//! dump to stdout (spec §6).
//!
//! Grounded in `main/mkped_main.cpp`: that driver reads its parameters
//! either from argv or (shorthand mode) from a dumped-flag string on
//! stdin; here `clap::Parser` covers both argv parsing and defaulting, so
//! the shorthand path collapses into "just run with defaults."

use std::process;

use clap::Parser;
use parser::{MakePedArgs, STOP_CHAR};

fn main() {
    let args = MakePedArgs::parse();
    logger::Logger::init(args.logging.verbosity());

    if args.blocks == 0 {
        log::error!("Invalid commands.");
        process::exit(1);
    }

    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    let mut rng = simulator::seeded_rng(args.deterministic, seed);

    log::info!(
        "building pedigree: B={} A={} T={} N={} deterministic={}",
        args.blocks, args.fertility, args.generations, args.founders, args.deterministic
    );
    let ped = simulator::build(
        args.blocks,
        args.fertility,
        args.generations,
        args.founders,
        args.deterministic,
        &mut rng,
    );

    println!("{}", pedigree_io::dump_extant(&ped));
    println!("{STOP_CHAR}");
    println!("{}", pedigree_io::dump_full(&ped));
}
