//! Noise suppression for the transcript.

use regex::Regex;

use crate::error::ShellScribeError;
use crate::output::Sanitizer;
use crate::Result;

/// Default ignore patterns, tuned for a Kali-style two-line zsh prompt.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"┌──\(.+?\)-\[.*?\]", // prompt header: ┌──(user㉿host)-[~/dir]
    r"└─[$#]",            // prompt continuation: └─$
    r"stty: .*",          // stty warnings from the shell's rc files
    r"^\s*$",             // blank or whitespace-only
    r"\[.*?\] exec:.*",   // internal exec echo markers
];

/// An ordered, immutable set of match-anywhere rules.
#[derive(Debug, Clone)]
pub struct IgnorePatterns {
    patterns: Vec<Regex>,
}

impl IgnorePatterns {
    /// Compile a pattern set. Any invalid pattern is an error.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| ShellScribeError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// A set with no rules; nothing is suppressed except by the logger's
    /// own empty-line check.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Whether any rule matches somewhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for IgnorePatterns {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

/// Decides whether a line is session chrome that must not be recorded.
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    patterns: IgnorePatterns,
}

impl NoiseFilter {
    /// Create a filter over the given pattern set.
    pub fn new(patterns: IgnorePatterns) -> Self {
        Self { patterns }
    }

    /// Sanitize `text` and test it against every ignore pattern.
    pub fn should_ignore(&self, text: &str) -> bool {
        self.patterns.is_match(&Sanitizer::sanitize(text))
    }

    /// The pattern set in use.
    pub fn patterns(&self) -> &IgnorePatterns {
        &self.patterns
    }
}
