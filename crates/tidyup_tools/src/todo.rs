//! todo: task markers left in sources.
//!
//! Detects markers like TODO, FIXME and XXX that should be resolved
//! before committing.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | patterns | string[] | ["TODO", "FIXME", "XXX"] | Markers to detect |
//! | ignore-patterns | string[] | [] | Lines containing any of these are skipped |
//! | case-sensitive | boolean | false | Case-sensitive matching |
//!
//! # Example
//!
//! ```json
//! {
//!   "tools": {
//!     "todo": {
//!       "options": { "patterns": ["TODO", "HACK"], "ignore-patterns": ["TODO(#"] }
//!     }
//!   }
//! }
//! ```

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::json;
use tidyup_core::{CodeInfo, Finder, Issue, Result, SeverityClass, Tool, ToolConfig};

use crate::TEXT_FILTERS;
use crate::scan::{column, options, scan_files};

const TOOL_NAME: &str = "todo";

/// Default markers to detect.
const DEFAULT_PATTERNS: &[&str] = &["TODO", "FIXME", "XXX"];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Options {
    /// Markers to detect (default: TODO, FIXME, XXX).
    patterns: Vec<String>,
    /// Substrings that exempt a line.
    ignore_patterns: Vec<String>,
    case_sensitive: bool,
}

impl Options {
    /// Returns the markers to check, using defaults if none specified.
    fn effective_patterns(&self) -> Vec<String> {
        if self.patterns.is_empty() {
            DEFAULT_PATTERNS.iter().map(|s| (*s).to_string()).collect()
        } else {
            self.patterns.clone()
        }
    }

    fn should_ignore(&self, line: &str) -> bool {
        self.ignore_patterns.iter().any(|p| line.contains(p.as_str()))
    }

    /// Builds one expression matching any marker as a whole word.
    fn matcher(&self) -> Result<Regex> {
        let alternatives: Vec<String> = self
            .effective_patterns()
            .iter()
            .map(|p| regex::escape(p))
            .collect();
        let pattern = format!(r"\b(?:{})\b", alternatives.join("|"));
        Ok(RegexBuilder::new(&pattern)
            .case_insensitive(!self.case_sensitive)
            .build()?)
    }
}

/// Task marker detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct Todo;

impl Tool for Todo {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Finds TODO, FIXME and XXX markers"
    }

    fn can_be_used(&self) -> bool {
        true
    }

    fn default_config(&self) -> ToolConfig {
        ToolConfig::with_filters(TEXT_FILTERS.iter().copied()).with_options(json!({
            "patterns": DEFAULT_PATTERNS,
            "ignore-patterns": [],
            "case-sensitive": false,
        }))
    }

    fn all_codes(&self) -> Vec<CodeInfo> {
        vec![CodeInfo::new("todo", "Task marker found")]
    }

    fn execute(&self, finder: &Finder, config: &ToolConfig) -> Result<Vec<Issue>> {
        let options: Options = options(TOOL_NAME, config)?;
        let matcher = options.matcher()?;
        scan_files(TOOL_NAME, finder, config, |path, content| {
            find_markers(path, content, &matcher, &options)
        })
    }
}

fn find_markers(path: &Path, content: &str, matcher: &Regex, options: &Options) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if options.should_ignore(line) {
            continue;
        }
        for m in matcher.find_iter(line) {
            issues.push(
                Issue::new(
                    TOOL_NAME,
                    "todo",
                    format!(
                        "Found '{}' comment. Consider resolving this before committing.",
                        m.as_str()
                    ),
                    path,
                )
                .with_line(index as u32 + 1)
                .with_character(column(line, m.start()))
                .with_severity(SeverityClass::Warning),
            );
        }
    }
    issues
}
