//! whitespace: per-line hygiene checks for text sources.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | max-line-length | integer | 100 | Longest allowed line in characters, `0` disables the check |

use std::path::Path;

use serde::Deserialize;
use serde_json::json;
use tidyup_core::{CodeInfo, Finder, Issue, Result, SeverityClass, Tool, ToolConfig};

use crate::TEXT_FILTERS;
use crate::scan::{column, options, scan_files};

const TOOL_NAME: &str = "whitespace";
const DEFAULT_MAX_LINE_LENGTH: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Options {
    max_line_length: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Trailing whitespace, tab indentation, long lines and file endings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Whitespace;

impl Tool for Whitespace {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Reports whitespace problems in text files"
    }

    fn can_be_used(&self) -> bool {
        true
    }

    fn default_config(&self) -> ToolConfig {
        ToolConfig::with_filters(TEXT_FILTERS.iter().copied())
            .with_options(json!({ "max-line-length": DEFAULT_MAX_LINE_LENGTH }))
    }

    fn all_codes(&self) -> Vec<CodeInfo> {
        vec![
            CodeInfo::new("trailing", "Trailing whitespace"),
            CodeInfo::new("tab-indent", "Indentation contains tabs"),
            CodeInfo::new("line-length", "Line too long"),
            CodeInfo::new("final-newline", "No newline at end of file"),
            CodeInfo::new("blank-eof", "Blank lines at end of file"),
        ]
    }

    fn execute(&self, finder: &Finder, config: &ToolConfig) -> Result<Vec<Issue>> {
        let options: Options = options(TOOL_NAME, config)?;
        scan_files(TOOL_NAME, finder, config, |path, content| {
            check_text(path, content, &options)
        })
    }
}

fn issue(path: &Path, code: &str, message: impl Into<String>, line: usize) -> Issue {
    Issue::new(TOOL_NAME, code, message, path)
        .with_line(line as u32)
        .with_severity(SeverityClass::Convention)
}

fn check_text(path: &Path, content: &str, options: &Options) -> Vec<Issue> {
    let mut issues = Vec::new();
    if content.is_empty() {
        return issues;
    }

    let lines: Vec<&str> = content.lines().collect();
    for (index, line) in lines.iter().enumerate() {
        let number = index + 1;

        let trimmed = line.trim_end_matches([' ', '\t']);
        if trimmed.len() < line.len() {
            issues.push(
                issue(path, "trailing", "Trailing whitespace", number)
                    .with_character(column(line, trimmed.len())),
            );
        }

        let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
        if line[..indent_len].contains('\t') {
            issues.push(
                issue(path, "tab-indent", "Indentation contains tabs", number).with_character(1),
            );
        }

        let width = line.chars().count();
        if options.max_line_length > 0 && width > options.max_line_length {
            issues.push(
                issue(
                    path,
                    "line-length",
                    format!(
                        "Line too long ({} > {} characters)",
                        width, options.max_line_length
                    ),
                    number,
                )
                .with_character(options.max_line_length as u32 + 1),
            );
        }
    }

    if !content.ends_with('\n') {
        issues.push(issue(
            path,
            "final-newline",
            "No newline at end of file",
            lines.len(),
        ));
    } else {
        let blank = lines
            .iter()
            .rev()
            .take_while(|line| line.trim().is_empty())
            .count();
        if blank > 0 {
            let first = lines.len() - blank + 1;
            issues.push(issue(
                path,
                "blank-eof",
                format!("{} blank line(s) at end of file", blank),
                first,
            ));
        }
    }

    issues
}
