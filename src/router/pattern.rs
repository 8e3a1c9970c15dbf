//! Route pattern compilation.
//!
//! A pattern is a path with `:name` placeholders, e.g. `/files/:name`.
//! A placeholder runs until the next `/` or the end of the pattern and
//! matches one or more non-`/` characters. Everything else matches
//! literally.

use regex::Regex;

/// Prefix that introduces a named parameter.
pub const PARAM_MARKER: char = ':';

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("pattern {0:?} has a parameter marker without a name")]
    EmptyParameterName(String),
    #[error("parameter {name:?} appears more than once in {pattern:?}")]
    DuplicateParameter { pattern: String, name: String },
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// An anchored matcher plus the parameter names of its capture groups,
/// in capture order.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    names: Vec<String>,
}

impl CompiledPattern {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    /// Matches the whole of `path`, returning `(name, value)` pairs for each
    /// parameter.
    pub fn captures<'p>(&self, path: &'p str) -> Option<Vec<(&str, &'p str)>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.names
                .iter()
                .zip(caps.iter().skip(1))
                .filter_map(|(name, m)| m.map(|m| (name.as_str(), m.as_str())))
                .collect(),
        )
    }
}

pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
    let mut source = String::with_capacity(pattern.len() + 8);
    let mut names: Vec<String> = Vec::new();
    source.push('^');

    let mut rest = pattern;
    while !rest.is_empty() {
        // A trailing lone marker is literal text.
        match rest.find(PARAM_MARKER).filter(|&i| i + 1 < rest.len()) {
            Some(start) => {
                source.push_str(&regex::escape(&rest[..start]));

                let after = &rest[start + 1..];
                let end = after.find('/').unwrap_or(after.len());
                let name = &after[..end];

                if name.is_empty() {
                    return Err(PatternError::EmptyParameterName(pattern.to_string()));
                }
                if names.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }

                names.push(name.to_string());
                source.push_str("([^/]+)");
                rest = &after[end..];
            }
            None => {
                source.push_str(&regex::escape(rest));
                rest = "";
            }
        }
    }

    source.push('$');
    let regex = Regex::new(&source)?;
    debug_assert_eq!(regex.captures_len() - 1, names.len());

    Ok(CompiledPattern { regex, names })
}
