//! jsonlint: strict JSON syntax checking.

use std::path::Path;

use serde_json::error::Category;
use tidyup_core::{CodeInfo, Finder, Issue, Result, Tool, ToolConfig};

use crate::scan::scan_files;

const TOOL_NAME: &str = "jsonlint";

/// Parses every `.json` file and reports the first error in each.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLint;

impl Tool for JsonLint {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Checks that JSON documents are well formed"
    }

    fn can_be_used(&self) -> bool {
        true
    }

    fn default_config(&self) -> ToolConfig {
        ToolConfig::with_filters([r"\.json$"])
    }

    fn all_codes(&self) -> Vec<CodeInfo> {
        vec![
            CodeInfo::new("syntax", "Malformed JSON"),
            CodeInfo::new("eof", "Document ends unexpectedly"),
            CodeInfo::new("data", "Value cannot be represented"),
        ]
    }

    fn execute(&self, finder: &Finder, config: &ToolConfig) -> Result<Vec<Issue>> {
        scan_files(TOOL_NAME, finder, config, check_document)
    }
}

fn check_document(path: &Path, content: &str) -> Vec<Issue> {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(_) => Vec::new(),
        Err(e) => {
            let code = match e.classify() {
                Category::Eof => "eof",
                Category::Data => "data",
                Category::Syntax | Category::Io => "syntax",
            };
            let line = u32::try_from(e.line()).ok().filter(|l| *l > 0);
            let column = u32::try_from(e.column()).ok();
            vec![
                Issue::new(TOOL_NAME, code, strip_position(&e.to_string()), path)
                    .with_line(line)
                    .with_character(column),
            ]
        }
    }
}

/// Removes the trailing ` at line N column M` serde_json appends.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(index) => message[..index].to_string(),
        None => message.to_string(),
    }
}
