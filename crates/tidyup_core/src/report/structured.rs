//! Machine readable reports.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::collector::Collector;
use crate::error::{Result, TidyError};

use super::{Report, ReportContext};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
struct StructuredIssue {
    line: u32,
    character: u32,
    code: String,
    tool: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct StructuredLog {
    tidyup: &'static str,
    issues: BTreeMap<String, Vec<StructuredIssue>>,
}

fn structure(collector: &Collector, ctx: &ReportContext<'_>) -> StructuredLog {
    let issues = collector
        .get_issues_by_file(None)
        .into_iter()
        .map(|(filename, issues)| {
            let issues = issues
                .into_iter()
                .map(|issue| StructuredIssue {
                    line: issue.line,
                    character: issue.character.unwrap_or(0),
                    code: issue.code.unwrap_or_default(),
                    tool: issue.tool,
                    message: issue.message,
                })
                .collect();
            (ctx.relative(&filename), issues)
        })
        .collect();

    StructuredLog {
        tidyup: VERSION,
        issues,
    }
}

/// `{"tidyup": version, "issues": {file: [...]}}`.
#[derive(Debug, Default)]
pub struct JsonReport;

impl Report for JsonReport {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Issues grouped by file as JSON"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let log = structure(collector, ctx);
        serde_json::to_writer_pretty(&mut *out, &log)?;
        writeln!(out)?;
        Ok(())
    }
}

/// The JSON structure as a TOML document.
#[derive(Debug, Default)]
pub struct TomlReport;

impl Report for TomlReport {
    fn name(&self) -> &str {
        "toml"
    }

    fn description(&self) -> &str {
        "Issues grouped by file as TOML"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let document = toml::to_string_pretty(&structure(collector, ctx))
            .map_err(|e| TidyError::report(format!("Cannot serialize TOML: {e}")))?;
        out.write_all(document.as_bytes())?;
        Ok(())
    }
}

/// The JSON structure as a YAML document.
#[derive(Debug, Default)]
pub struct YamlReport;

impl Report for YamlReport {
    fn name(&self) -> &str {
        "yaml"
    }

    fn description(&self) -> &str {
        "Issues grouped by file as YAML"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let document = serde_yaml::to_string(&structure(collector, ctx))
            .map_err(|e| TidyError::report(format!("Cannot serialize YAML: {e}")))?;
        out.write_all(document.as_bytes())?;
        Ok(())
    }
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One CSV record per issue, with a header row.
#[derive(Debug, Default)]
pub struct CsvReport;

impl Report for CsvReport {
    fn name(&self) -> &str {
        "csv"
    }

    fn description(&self) -> &str {
        "One CSV record per issue"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        writeln!(out, "filename,line,character,tool,code,message")?;
        for (filename, issues) in structure(collector, ctx).issues {
            for issue in issues {
                writeln!(
                    out,
                    "{},{},{},{},{},{}",
                    csv_field(&filename),
                    issue.line,
                    issue.character,
                    csv_field(&issue.tool),
                    csv_field(&issue.code),
                    csv_field(&issue.message)
                )?;
            }
        }
        Ok(())
    }
}
