//! SARIF (Static Analysis Results Interchange Format) report.
//!
//! Implements SARIF 2.1.0 for code scanning integrations. Every tool code is
//! published as a rule with the id `tool/code`.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::collector::Collector;
use crate::error::Result;
use crate::issue::{Issue, SeverityClass};

use super::{Report, ReportContext};

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "tidyup";

/// Renders the cleaned issues of `collector` as a pretty-printed SARIF log.
pub fn generate_sarif(
    collector: &Collector,
    ctx: &ReportContext<'_>,
) -> std::result::Result<String, serde_json::Error> {
    let log = SarifLog::from_issues(&collector.get_issues(None), ctx);
    serde_json::to_string_pretty(&log)
}

/// SARIF 2.1.0 log.
#[derive(Debug, Default)]
pub struct SarifReport;

impl Report for SarifReport {
    fn name(&self) -> &str {
        "sarif"
    }

    fn description(&self) -> &str {
        "SARIF 2.1.0 log for code scanning services"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        writeln!(out, "{}", generate_sarif(collector, ctx)?)?;
        Ok(())
    }
}

fn rule_id(issue: &Issue) -> String {
    match &issue.code {
        Some(code) => format!("{}/{}", issue.tool, code),
        None => issue.tool.clone(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLog {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<Run>,
}

impl SarifLog {
    fn from_issues(issues: &[Issue], ctx: &ReportContext<'_>) -> Self {
        Self {
            schema: SARIF_SCHEMA.to_string(),
            version: SARIF_VERSION.to_string(),
            runs: vec![Run::from_issues(issues, ctx)],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Run {
    tool: Tool,
    results: Vec<SarifResult>,
}

impl Run {
    fn from_issues(issues: &[Issue], ctx: &ReportContext<'_>) -> Self {
        let mut rules: BTreeMap<String, ReportingDescriptor> = BTreeMap::new();
        let results = issues
            .iter()
            .map(|issue| {
                let id = rule_id(issue);
                rules
                    .entry(id.clone())
                    .or_insert_with(|| ReportingDescriptor::new(&id));
                SarifResult::from_issue(issue, id, ctx)
            })
            .collect();

        Self {
            tool: Tool {
                driver: ToolComponent {
                    name: TOOL_NAME.to_string(),
                    version: option_env!("CARGO_PKG_VERSION").map(str::to_string),
                    rules: rules.into_values().collect(),
                },
            },
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    driver: ToolComponent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolComponent {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    rules: Vec<ReportingDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportingDescriptor {
    id: String,
    name: String,
}

impl ReportingDescriptor {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    level: &'static str,
    message: Message,
    locations: Vec<Location>,
}

impl SarifResult {
    fn from_issue(issue: &Issue, rule_id: String, ctx: &ReportContext<'_>) -> Self {
        let level = match issue.severity {
            SeverityClass::Error | SeverityClass::Fatal => "error",
            SeverityClass::Warning => "warning",
            SeverityClass::Refactor | SeverityClass::Convention => "note",
        };

        Self {
            rule_id,
            level,
            message: Message {
                text: issue.message.clone(),
            },
            locations: vec![Location {
                physical_location: PhysicalLocation {
                    artifact_location: ArtifactLocation {
                        uri: ctx.relative(&issue.filename),
                    },
                    region: Region {
                        start_line: issue.line,
                        start_column: issue.character,
                    },
                },
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    physical_location: PhysicalLocation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PhysicalLocation {
    artifact_location: ArtifactLocation,
    region: Region,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactLocation {
    uri: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Region {
    start_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_column: Option<u32>,
}
