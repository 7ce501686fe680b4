use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("could not parse '{value}' as a floating point number: {source}")]
    ParseFloat { value: String, #[source] source: std::num::ParseFloatError },

    #[error("could not parse '{value}' as an integer: {source}")]
    ParseInt { value: String, #[source] source: std::num::ParseIntError },

    #[error("'--tree-ped' expects exactly 3 values (blocks generations alpha), found {0}")]
    TreePedArity(usize),

    #[error("neither stdin nor a dump file was provided")]
    MissingDumpInput,

    #[error("input stream is missing the '~' separator between its two dumps")]
    MissingSeparator,
}
