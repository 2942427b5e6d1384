//! Prospector compatible JSON report.

use std::io::Write;

use chrono::Local;
use serde::Serialize;

use crate::collector::Collector;
use crate::error::Result;
use crate::issue::IssueField;

use super::{Report, ReportContext};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Serialize)]
struct Summary<'a> {
    started: String,
    libraries: Vec<String>,
    strictness: &'static str,
    profiles: &'static str,
    tools: &'a [String],
    message_count: usize,
    completed: String,
    time_taken: &'static str,
    formatter: &'static str,
}

#[derive(Debug, Serialize)]
struct Location {
    path: String,
    module: Option<String>,
    function: Option<String>,
    line: u32,
    character: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    source: String,
    code: Option<String>,
    location: Location,
    message: String,
}

#[derive(Debug, Serialize)]
struct ProspectorLog<'a> {
    summary: Summary<'a>,
    messages: Vec<Message>,
}

/// The output format of `prospector --output-format json`.
#[derive(Debug, Default)]
pub struct ProspectorJsonReport;

impl Report for ProspectorJsonReport {
    fn name(&self) -> &str {
        "prospector-json"
    }

    fn description(&self) -> &str {
        "JSON in the format produced by prospector"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let started = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let issues = collector.get_issues(Some(&[
            IssueField::Filename,
            IssueField::Line,
            IssueField::Character,
        ]));

        let messages: Vec<Message> = issues
            .into_iter()
            .map(|issue| Message {
                location: Location {
                    path: ctx.relative(&issue.filename),
                    module: None,
                    function: None,
                    line: issue.line,
                    character: issue.character.unwrap_or(0),
                },
                source: issue.tool,
                code: issue.code,
                message: issue.message,
            })
            .collect();

        let log = ProspectorLog {
            summary: Summary {
                started,
                libraries: Vec::new(),
                strictness: "from profile",
                profiles: "tidyup",
                tools: ctx.tools,
                message_count: messages.len(),
                completed: Local::now().format(TIMESTAMP_FORMAT).to_string(),
                time_taken: "0",
                formatter: "json",
            },
            messages,
        };

        serde_json::to_writer_pretty(&mut *out, &log)?;
        writeln!(out)?;
        Ok(())
    }
}
