//! Inline `# noqa` suppression directives.
//!
//! A line ending in `# noqa` suppresses every issue reported on that line.
//! A line ending in `# noqa: a, @tool, tool:b` suppresses only issues whose
//! code is `a`, issues from `tool`, and issues from `tool` with code `b`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::issue::Issue;

static NOQA_PATTERN: OnceLock<Regex> = OnceLock::new();
static TOKEN_SEPARATOR: OnceLock<Regex> = OnceLock::new();

fn noqa_pattern() -> &'static Regex {
    NOQA_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)#\s*noqa\b(?::\s*(?P<codes>[^#]*))?").expect("valid noqa pattern")
    })
}

fn token_separator() -> &'static Regex {
    TOKEN_SEPARATOR.get_or_init(|| Regex::new(r"[,\s]+").expect("valid separator pattern"))
}

/// What a directive suppresses on its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suppression {
    /// Every issue on the line.
    All,
    /// Issues matching one of the tokens.
    Tokens(Vec<String>),
}

impl Suppression {
    /// Whether this directive covers `issue`.
    pub fn covers(&self, issue: &Issue) -> bool {
        match self {
            Self::All => true,
            Self::Tokens(tokens) => {
                let code = issue.code_str();
                tokens.iter().any(|token| {
                    if let Some(tool) = token.strip_prefix('@') {
                        return tool == issue.tool;
                    }
                    match token.split_once(':') {
                        Some((tool, qualified)) => tool == issue.tool && qualified == code,
                        None => !code.is_empty() && token == code,
                    }
                })
            }
        }
    }
}

/// Per-file map from 1-based line number to its suppression directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionIndex {
    lines: HashMap<u32, Suppression>,
}

impl SuppressionIndex {
    /// Builds an index by scanning `source` line by line.
    pub fn parse(source: &str) -> Self {
        let mut lines = HashMap::new();

        for (idx, text) in source.lines().enumerate() {
            let Some(captures) = noqa_pattern().captures(text) else {
                continue;
            };
            let tokens: Vec<String> = captures
                .name("codes")
                .map(|codes| {
                    token_separator()
                        .split(codes.as_str())
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            let suppression = if tokens.is_empty() {
                Suppression::All
            } else {
                Suppression::Tokens(tokens)
            };
            lines.insert(idx as u32 + 1, suppression);
        }

        Self { lines }
    }

    /// Builds an index from the file at `path`.
    ///
    /// Unreadable files yield an empty index.
    pub fn load(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => Self::parse(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!("Skipping noqa scan of {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Returns the directive on `line`, if any.
    pub fn get(&self, line: u32) -> Option<&Suppression> {
        self.lines.get(&line)
    }

    /// Whether `issue` is suppressed by a directive on its own line.
    pub fn is_suppressed(&self, issue: &Issue) -> bool {
        self.get(issue.line).is_some_and(|s| s.covers(issue))
    }

    /// Number of lines carrying a directive.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no line carries a directive.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
