//! A small command-line-flag style tokenizer, used both to read the
//! `-B`/`-A`/... pedigree parameter lines and the per-node dump/restore
//! content lines (spec §6 "Flag grammar" / "Dump line grammar").
//!
//! A direct idiomatic translation of `flag_reader` in the original
//! `source/flags.h`/`flags.cpp`: that version dispatches each flag to a
//! `std::function` closure holding a `void*` possessor. Rust has no
//! equivalent of the untyped possessor, so this version just tokenizes a
//! line into an ordered list of `(flag name, arguments)` pairs and lets the
//! caller (the dump/restore code in [`crate::dump`]) match on flag names
//! directly — same grammar, no `void*`.

use ahash::AHashMap;

use crate::error::FlagError;

/// How many argument tokens a flag consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Consumes exactly `n` tokens.
    Fixed(usize),
    /// The next token is parsed as a count, then that many tokens are
    /// consumed (the original's `narg < 0` convention).
    Dynamic,
}

#[derive(Debug, Clone)]
struct FlagSpec {
    name: &'static str,
    arity: Arity,
}

/// A single parsed flag occurrence: its long name plus the argument
/// tokens it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFlag {
    pub name: &'static str,
    pub args: Vec<String>,
}

/// A registered set of flags (long name + optional short nickname +
/// arity) that can tokenize a flag-grammar line.
#[derive(Debug, Clone, Default)]
pub struct FlagReader {
    nicknames: AHashMap<char, &'static str>,
    specs: AHashMap<&'static str, FlagSpec>,
}

impl FlagReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a flag. `nick` of `'\0'` means "no short form".
    pub fn add_flag(&mut self, name: &'static str, nick: char, arity: Arity) -> &mut Self {
        self.specs.insert(name, FlagSpec { name, arity });
        if nick != '\0' {
            self.nicknames.insert(nick, name);
        }
        self
    }

    /// Tokenizes a full line (e.g. `"-i 5 -c 2 -p 0 -g 3 1 2 3"`) into an
    /// ordered list of flags and their arguments, mirroring
    /// `flag_reader::read_flags(std::string)`.
    pub fn parse_line(&self, line: &str) -> Result<Vec<ParsedFlag>, FlagError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        self.parse_tokens(&tokens)
    }

    /// Tokenizes pre-split tokens, mirroring
    /// `flag_reader::read_flags(int, std::vector<std::string>)`.
    pub fn parse_tokens(&self, tokens: &[&str]) -> Result<Vec<ParsedFlag>, FlagError> {
        let mut flag_queue: Vec<&'static str> = Vec::new();
        let mut out = Vec::new();
        let mut pos = 0usize;

        while pos < tokens.len() {
            let tok = tokens[pos];
            if let Some(rest) = tok.strip_prefix('-') {
                if rest.is_empty() {
                    return Err(FlagError::UnknownFlag(tok.to_string()));
                }
                if let Some(long) = rest.strip_prefix('-') {
                    let name = self.resolve_long(long)?;
                    flag_queue.push(name);
                } else {
                    for nick in rest.chars() {
                        let name = *self
                            .nicknames
                            .get(&nick)
                            .ok_or_else(|| FlagError::UnknownFlag(format!("-{nick}")))?;
                        flag_queue.push(name);
                    }
                }
                pos += 1;
            } else if flag_queue.is_empty() {
                // Stray argument with nothing pending: skip, matching the
                // original's "no flags waiting" branch.
                pos += 1;
            } else {
                let name = flag_queue.remove(0);
                let spec = &self.specs[name];
                let n_tok = match spec.arity {
                    Arity::Fixed(n) => n,
                    Arity::Dynamic => {
                        let count_tok = tokens
                            .get(pos)
                            .ok_or_else(|| FlagError::MissingCount(name.to_string()))?;
                        pos += 1;
                        count_tok
                            .parse::<usize>()
                            .map_err(|_| FlagError::BadCount((*count_tok).to_string()))?
                    }
                };
                if pos + n_tok > tokens.len() {
                    return Err(FlagError::MissingArguments(name.to_string(), n_tok));
                }
                let args = tokens[pos..pos + n_tok]
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                pos += n_tok;
                out.push(ParsedFlag { name, args });
            }
        }

        // Leftover flags must take no arguments (fired with an empty vec).
        for name in flag_queue {
            let spec = &self.specs[name];
            if spec.arity != Arity::Fixed(0) {
                return Err(FlagError::MissingArguments(name.to_string(), 0));
            }
            out.push(ParsedFlag {
                name,
                args: Vec::new(),
            });
        }

        Ok(out)
    }

    fn resolve_long(&self, name: &str) -> Result<&'static str, FlagError> {
        self.specs
            .get(name)
            .map(|spec| spec.name)
            .ok_or_else(|| FlagError::UnknownFlag(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reader() -> FlagReader {
        let mut fr = FlagReader::new();
        fr.add_flag("id", 'i', Arity::Fixed(1));
        fr.add_flag("genome", 'g', Arity::Dynamic);
        fr.add_flag("deterministic", 'd', Arity::Fixed(0));
        fr
    }

    #[test]
    fn parses_fixed_and_dynamic_arity() {
        let fr = sample_reader();
        let parsed = fr.parse_line("-i 5 -g 3 1 2 3").unwrap();
        assert_eq!(
            parsed,
            vec![
                ParsedFlag {
                    name: "id",
                    args: vec!["5".to_string()]
                },
                ParsedFlag {
                    name: "genome",
                    args: vec!["1".to_string(), "2".to_string(), "3".to_string()]
                },
            ]
        );
    }

    #[test]
    fn trailing_zero_arity_flag_fires_empty() {
        let fr = sample_reader();
        let parsed = fr.parse_line("-i 5 -d").unwrap();
        assert_eq!(parsed[1].name, "deterministic");
        assert!(parsed[1].args.is_empty());
    }

    #[test]
    fn unknown_short_flag_errors() {
        let fr = sample_reader();
        assert!(matches!(
            fr.parse_line("-z 1"),
            Err(FlagError::UnknownFlag(_))
        ));
    }

    #[test]
    fn concatenated_short_flags_expand() {
        let mut fr = FlagReader::new();
        fr.add_flag("verbose", 'v', Arity::Fixed(0));
        fr.add_flag("work", 'w', Arity::Fixed(0));
        fr.add_flag("data", 'd', Arity::Fixed(0));
        let parsed = fr.parse_line("-vwd").unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn missing_arguments_errors() {
        let fr = sample_reader();
        assert!(matches!(
            fr.parse_line("-i"),
            Err(FlagError::MissingArguments(_, 1))
        ));
    }
}
