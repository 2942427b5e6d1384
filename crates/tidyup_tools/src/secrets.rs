//! secrets: credentials committed to the repository.

use std::path::Path;

use regex::Regex;
use tidyup_core::{CodeInfo, Finder, Issue, Result, Tool, ToolConfig};
use tracing::debug;

use crate::scan::{column, scan_files};

const TOOL_NAME: &str = "secrets";

const DETECTORS: &[(&str, &str)] = &[
    ("private key", r"-----BEGIN (?:[A-Z]+ )*PRIVATE KEY-----"),
    ("AWS access key", r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b"),
    ("GitHub token", r"\bgh[pousr]_[A-Za-z0-9]{36,}\b"),
    ("Slack token", r"\bxox[abprs]-[A-Za-z0-9-]{10,}"),
    (
        "hard-coded credential",
        r#"(?i)\b(?:password|passwd|secret|api[_-]?key|auth[_-]?token)\b\s*[:=]\s*["'][^"'\s]{8,}["']"#,
    ),
];

struct Detector {
    description: &'static str,
    pattern: Regex,
}

/// Regex based credential detection.
pub struct Secrets {
    detectors: Vec<Detector>,
}

impl Secrets {
    pub fn new() -> Self {
        Self {
            detectors: DETECTORS
                .iter()
                .filter_map(|&(description, pattern)| {
                    Regex::new(pattern).ok().map(|pattern| Detector {
                        description,
                        pattern,
                    })
                })
                .collect(),
        }
    }

    fn check_text(&self, path: &Path, content: &str) -> Vec<Issue> {
        if content.contains('\0') {
            debug!("Skipping binary file {}", path.display());
            return Vec::new();
        }

        let mut issues = Vec::new();
        for (index, line) in content.lines().enumerate() {
            for detector in &self.detectors {
                if let Some(m) = detector.pattern.find(line) {
                    issues.push(
                        Issue::new(
                            TOOL_NAME,
                            "secret",
                            format!("Possible {} found", detector.description),
                            path,
                        )
                        .with_line(index as u32 + 1)
                        .with_character(column(line, m.start())),
                    );
                }
            }
        }
        issues
    }
}

impl Default for Secrets {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("detectors", &self.detectors.len())
            .finish()
    }
}

impl Tool for Secrets {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Detects credentials and private keys"
    }

    fn can_be_used(&self) -> bool {
        !self.detectors.is_empty()
    }

    fn default_config(&self) -> ToolConfig {
        ToolConfig::default()
    }

    fn all_codes(&self) -> Vec<CodeInfo> {
        vec![CodeInfo::new("secret", "Possible secret found")]
    }

    fn execute(&self, finder: &Finder, config: &ToolConfig) -> Result<Vec<Issue>> {
        scan_files(TOOL_NAME, finder, config, |path, content| {
            self.check_text(path, content)
        })
    }
}
