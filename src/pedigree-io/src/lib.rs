//! Text serialization for [`pedigree::Pedigree`]: the flag-grammar tokenizer
//! ([`flags`]) and the dump/restore formats built on top of it ([`dump`]).

pub mod dump;
pub mod error;
pub mod flags;

pub use dump::{dump_extant, dump_full, restore_extant, restore_full};
pub use error::{DumpError, FlagError, IdKind};
pub use flags::{Arity, FlagReader, ParsedFlag};
