use thiserror::Error;

/// Which kind of id a dangling reference in a dump pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Individual,
    Couple,
}

impl std::fmt::Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdKind::Individual => write!(f, "individual"),
            IdKind::Couple => write!(f, "couple"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("token '{0}' is not a recognized flag")]
    UnknownFlag(String),
    #[error("flag '{0}' expected {1} argument(s) but the line ran out of tokens")]
    MissingArguments(String, usize),
    #[error("flag '{0}' requires a dynamic argument count but none was given")]
    MissingCount(String),
    #[error("could not parse '{0}' as an argument count")]
    BadCount(String),
    #[error("empty flag token")]
    EmptyToken,
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("dump references unknown {0} id {1}")]
    DanglingReference(IdKind, u64),
    #[error("dump is missing required flag '-{0}'")]
    MissingFlag(char),
    #[error("could not parse integer field in dump: {0}")]
    BadInteger(#[from] std::num::ParseIntError),
    #[error("malformed flag grammar: {0}")]
    Grammar(#[from] FlagError),
    #[error("genome in dump has {found} blocks, expected {expected}")]
    GenomeLengthMismatch { found: usize, expected: usize },
}
