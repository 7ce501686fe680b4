//! Command line argument definitions for the four REC-GEN binaries
//! (`make-ped`, `rec-gen`, `tree-diff`, `tree-info`), plus the small set of
//! value parsers their flags need and the `~`-separated stream convention
//! shared by every binary that reads or writes two dumps on one stream.
//!
//! Grounded in the original `main/*_main.cpp` drivers' `flag_reader`
//! registrations: flag names, short letters and defaults mirror theirs,
//! translated from hand-rolled closures into `clap` derive fields the way
//! the teacher crate's own `Cli`/`Common` structs do it.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

mod error;
pub use error::ParserError;

/// The character the original tools use to separate two dumps written to
/// (or read from) the same stream (spec §6).
pub const STOP_CHAR: char = '~';

/// Splits `text` on the first line containing only [`STOP_CHAR`], returning
/// the text before and after it. Used by `rec-gen` (which only needs the
/// first half) and `tree-diff` (which needs both).
pub fn split_on_stop_char(text: &str) -> Result<(&str, &str), ParserError> {
    text.split_once(STOP_CHAR).map(|(a, b)| (a, b.trim_start_matches('\n'))).ok_or(ParserError::MissingSeparator)
}

fn parse_csv_f64(s: &str) -> Result<Vec<f64>, ParserError> {
    s.split(',')
        .map(|tok| {
            tok.trim()
                .parse::<f64>()
                .map_err(|source| ParserError::ParseFloat { value: tok.to_string(), source })
        })
        .collect()
}

fn parse_csv_usize(s: &str) -> Result<Vec<usize>, ParserError> {
    s.split(',')
        .map(|tok| {
            tok.trim()
                .parse::<usize>()
                .map_err(|source| ParserError::ParseInt { value: tok.to_string(), source })
        })
        .collect()
}

/// Verbosity and optional log-file-sink flags, flattened into every
/// binary's argument struct (spec §6 "Logging/data files are optional
/// sinks opened by path").
///
/// The original `LOG_FLAG_READ` macro additionally registers `-w`/`-d` to
/// toggle between a "work" and a "data" logging channel exclusively. That
/// `-d` collides with a binary-specific flag in three of the four
/// binaries here (`make-ped`'s `-d` deterministic, `rec-gen`'s `-d`
/// richness, `tree-info`'s `-d` subtree dump) — `clap` refuses two fields
/// claiming the same short letter, so the channel toggle is dropped rather
/// than shadowed silently; `--work-log`/`--data-log` take an explicit path
/// each and are independent, which is simpler and loses no real
/// functionality since file sinks are themselves out-of-scope ambient
/// infrastructure (spec §1).
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingArgs {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[clap(short = 'v', long, parse(from_occurrences))]
    pub verbose: u8,

    /// Silence all logging, overriding -v.
    #[clap(short = 's', long)]
    pub silent: bool,

    /// Append human-readable progress lines to this file, in addition to stderr.
    #[clap(short = 'W', long, required(false))]
    pub work_log: Option<PathBuf>,

    /// Append structured per-run statistics to this file, in addition to stderr.
    #[clap(short = 'D', long, required(false))]
    pub data_log: Option<PathBuf>,
}

impl LoggingArgs {
    #[must_use]
    pub fn verbosity(&self) -> u8 {
        if self.silent {
            0
        } else {
            self.verbose
        }
    }
}

/// Arguments for `make-ped`: stochastically generate a pedigree and print
/// its extant and full dumps to stdout, separated by [`STOP_CHAR`].
///
/// The original binary also accepts a no-argument "shorthand" mode that
/// reads these same parameters from stdin instead; that shorthand piggybacks
/// on the dump header's own flag grammar (`poisson_pedigree::parse_shorthand`
/// is just `recover_dumped` against stdin). `clap` already gives us that for
/// free: running `make-ped` with no flags simply uses the defaults below.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name = "make-ped", author, version, about, long_about = None)]
pub struct MakePedArgs {
    /// Number of genome blocks.
    #[clap(short = 'B', long = "blocks", default_value("10"))]
    pub blocks: usize,

    /// Expected (or, in deterministic mode, exact) number of children per couple.
    #[clap(short = 'A', long = "alpha", default_value("2"))]
    pub fertility: usize,

    /// Number of generational layers, extant included.
    #[clap(short = 'T', long = "generations", default_value("4"))]
    pub generations: usize,

    /// Founder population size (rounded down to an even number).
    #[clap(short = 'N', long = "founders", default_value("10"))]
    pub founders: usize,

    /// Disable randomness: fixed fertility per couple and a seeded RNG stream.
    #[clap(short = 'd', long)]
    pub deterministic: bool,

    /// Fix the RNG seed (only meaningful alongside -d; otherwise fresh entropy is used).
    #[clap(long, required(false))]
    pub seed: Option<u64>,

    #[clap(flatten)]
    pub logging: LoggingArgs,
}

/// Arguments for `rec-gen`: read an extant-only dump from stdin and print
/// a reconstructed full dump to stdout.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name = "rec-gen", author, version, about, long_about = None)]
pub struct RecGenArgs {
    /// Sibling-triple overlap threshold(s), comma-separated for an explicit
    /// per-generation schedule (otherwise a single value decays by --decay).
    #[clap(short = 'S', long = "sib", default_value("0.21"), parse(try_from_str = parse_csv_f64))]
    pub sib: Vec<f64>,

    /// Candidate-pair overlap threshold(s), same schedule convention as --sib.
    #[clap(short = 'c', long = "cand", default_value("0.21"), parse(try_from_str = parse_csv_f64))]
    pub cand: Vec<f64>,

    /// Minimum recovered-genome fraction for a node to be considered usable.
    #[clap(short = 'r', long = "rec", default_value("0.99"))]
    pub rec: f64,

    /// Per-generation decay applied to --sib/--cand when no explicit schedule is given.
    #[clap(short = 'y', long = "decay", default_value("0.85"))]
    pub decay: f64,

    /// Minimum desirable siblinghood-clique size (definition 4.2, d-richness).
    #[clap(short = 'd', long = "richness", default_value("3"))]
    pub d: usize,

    /// Use the naive cubic sibling test with triple-vote symbol collection.
    #[clap(short = 'B', long)]
    pub basic: bool,

    /// Use the recursive (bushiness) symbol collector.
    #[clap(short = 'R', long)]
    pub recursive: bool,

    /// Use the belief-propagation symbol collector.
    #[clap(short = 'P', long)]
    pub bp: bool,

    /// Per-child mutation/noise probability (belief-propagation only).
    #[clap(short = 'e', long, default_value("0.01"))]
    pub epsilon: f64,

    /// Nonzero purges a child couple's cached message once consumed (belief-propagation only).
    #[clap(short = 'm', long, default_value("0"))]
    pub memmode: u8,

    /// Skip topology reconstruction; only run symbol collection over the existing layers.
    #[clap(long)]
    pub no_top: bool,

    #[clap(flatten)]
    pub logging: LoggingArgs,
}

/// Arguments for `tree-diff`: read an original-full dump, a [`STOP_CHAR`]
/// separator, then a reconstructed-full dump from stdin, and print a
/// per-generation and total accuracy report to stdout.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name = "tree-diff", author, version, about, long_about = None)]
pub struct TreeDiffArgs {
    /// Minimum fraction of a couple's children that must agree on a parent
    /// candidate for the ancestral bijection to accept it.
    #[clap(short = 'a', long = "acc", default_value("0.49"))]
    pub ch_acc: f64,

    #[clap(flatten)]
    pub logging: LoggingArgs,
}

/// Arguments for `tree-info`: read an extant-only dump from stdin (unless
/// `--tree-ped` is given, in which case a fresh tree-pedigree is built
/// instead) and print the analytics selected by flag.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name = "tree-info", author, version, about, long_about = None)]
pub struct TreeInfoArgs {
    /// Report, per generation, how many joint-LCA extant pairs there are
    /// relative to all cross-child extant pairs.
    #[clap(short = 'L', long = "badlca")]
    pub bad_lca: bool,

    /// Per-generation, per-child-slot block-sharing counts. Takes
    /// "<divide>[,<generation>]": divide != 0 normalizes to a percentage of
    /// --blocks; generation restricts the report to one generation (all by default).
    #[clap(short = 'B', long = "blocks", required(false), parse(try_from_str = parse_csv_usize))]
    pub blocks: Option<Vec<usize>>,

    /// Sibling-pair block-sharing counts; nonzero normalizes to a percentage.
    #[clap(short = 'b', long = "siblocks", required(false))]
    pub siblocks: Option<u8>,

    /// Print the subtree (members, children, extant descendants) rooted at this couple id.
    #[clap(short = 'd', long = "dump-id", required(false))]
    pub dump_id: Option<u64>,

    /// Build a fresh perfect tree-pedigree instead of reading stdin: "blocks,generations,alpha".
    #[clap(short = 'T', long = "tree-ped", required(false), parse(try_from_str = parse_csv_usize))]
    pub tree_ped: Option<Vec<usize>>,

    #[clap(flatten)]
    pub logging: LoggingArgs,
}

impl TreeInfoArgs {
    /// Validates and unpacks `--tree-ped` into `(blocks, generations, alpha)`.
    pub fn tree_ped_params(&self) -> Result<Option<(usize, usize, usize)>, ParserError> {
        match &self.tree_ped {
            None => Ok(None),
            Some(v) if v.len() == 3 => Ok(Some((v[0], v[1], v[2]))),
            Some(v) => Err(ParserError::TreePedArity(v.len())),
        }
    }
}
