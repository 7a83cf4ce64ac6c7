use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use super::options::{PatternOptions, RegexFlags, flag};
use crate::error::{Error, Result};
use crate::matches::Match;

/// Regular expression occurrences; capture groups become children.
///
/// A named group gives its name to the child; an unnamed one inherits the
/// pattern name. Only the last capture of a repeated group is reported.
#[derive(Clone)]
pub struct RegexPattern {
    regexes: Vec<Regex>,
    pub(crate) options: PatternOptions,
}

impl RegexPattern {
    pub fn new<I, S>(patterns: I, options: PatternOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flags = options.flags.unwrap_or_default();
        if flag(options.ignore_case) {
            flags |= RegexFlags::IGNORECASE;
        }
        let abbreviations = options.abbreviations.clone().unwrap_or_default();

        let regexes = patterns
            .into_iter()
            .map(|pattern| {
                let pattern: String = pattern.into();
                let source = abbreviations.iter().fold(pattern.clone(), |acc, (abbr, full)| acc.replace(abbr, full));
                RegexBuilder::new(&source)
                    .case_insensitive(flags.contains(RegexFlags::IGNORECASE))
                    .multi_line(flags.contains(RegexFlags::MULTILINE))
                    .dot_matches_new_line(flags.contains(RegexFlags::DOTALL))
                    .ignore_whitespace(flags.contains(RegexFlags::VERBOSE))
                    .build()
                    .map_err(|source| Error::Regex { pattern, source })
            })
            .collect::<Result<Vec<_>>>()?;
        if regexes.is_empty() {
            return Err(Error::EmptyPattern("regex"));
        }
        Ok(Self { regexes, options })
    }

    pub fn regexes(&self) -> &[Regex] {
        &self.regexes
    }

    /// Names of every capture group, in declaration order.
    pub fn group_names(&self) -> Vec<&str> {
        self.regexes.iter().flat_map(|re| re.capture_names().flatten()).collect()
    }

    pub(crate) fn raw_matches(&self, input: &Arc<str>) -> Vec<Match> {
        let mut out = Vec::new();
        for re in &self.regexes {
            let names: Vec<Option<&str>> = re.capture_names().collect();
            for caps in re.captures_iter(input) {
                let Some(whole) = caps.get(0) else { continue };
                let mut parent = self.options.new_match(whole.start(), whole.end(), input);
                for (index, group_name) in names.iter().enumerate().skip(1) {
                    let Some(group) = caps.get(index) else { continue };
                    let mut child = self.options.new_match(group.start(), group.end(), input);
                    child.name = group_name.map(str::to_string).or_else(|| parent.name.clone());
                    parent.children.push(child);
                }
                out.push(parent);
            }
        }
        out
    }
}

impl fmt::Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<&str> = self.regexes.iter().map(Regex::as_str).collect();
        f.debug_struct("RegexPattern").field("regexes", &sources).field("options", &self.options).finish()
    }
}
