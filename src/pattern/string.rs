use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use super::options::{PatternOptions, flag};
use crate::error::{Error, Result};
use crate::matches::Match;

/// Literal occurrences of one or more strings.
#[derive(Clone)]
pub struct StringPattern {
    literals: Vec<String>,
    // Case-insensitive search goes through an escaped regex per literal.
    folded: Vec<Regex>,
    pub(crate) options: PatternOptions,
}

impl StringPattern {
    pub fn new<I, S>(literals: I, options: PatternOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let literals: Vec<String> = literals.into_iter().map(Into::into).filter(|l: &String| !l.is_empty()).collect();
        if literals.is_empty() {
            return Err(Error::EmptyPattern("string"));
        }
        let folded = if flag(options.ignore_case) {
            literals
                .iter()
                .map(|literal| {
                    RegexBuilder::new(&regex::escape(literal))
                        .case_insensitive(true)
                        .build()
                        .map_err(|source| Error::Regex { pattern: literal.clone(), source })
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };
        Ok(Self { literals, folded, options })
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    pub(crate) fn raw_matches(&self, input: &Arc<str>) -> Vec<Match> {
        let mut out = Vec::new();
        if self.folded.is_empty() {
            for literal in &self.literals {
                for (start, found) in input.match_indices(literal.as_str()) {
                    out.push(self.options.new_match(start, start + found.len(), input));
                }
            }
        } else {
            for re in &self.folded {
                for found in re.find_iter(input) {
                    out.push(self.options.new_match(found.start(), found.end(), input));
                }
            }
        }
        out
    }
}

impl fmt::Debug for StringPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringPattern").field("literals", &self.literals).field("options", &self.options).finish()
    }
}
