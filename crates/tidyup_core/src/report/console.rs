//! Human readable terminal report.

use std::io::Write;

use owo_colors::OwoColorize;

use crate::collector::Collector;
use crate::error::Result;

use super::{Report, ReportContext};

const TAB: &str = "        ";

/// Issues grouped by file, followed by a summary line.
#[derive(Debug, Default)]
pub struct ConsoleReport;

impl Report for ConsoleReport {
    fn name(&self) -> &str {
        "console"
    }

    fn description(&self) -> &str {
        "Grouped, human readable listing for the terminal"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let color = ctx.color;
        let mut total = 0;

        for (filename, issues) in collector.get_issues_by_file(None) {
            total += issues.len();

            let name = ctx.relative(&filename);
            if color {
                writeln!(out, "{} ({})", name.underline(), issues.len())?;
            } else {
                writeln!(out, "{} ({})", name, issues.len())?;
            }

            for issue in &issues {
                let location = format!(
                    "{:>5}{}{:<3} ",
                    issue.line,
                    if issue.character.is_some() { ':' } else { ' ' },
                    issue
                        .character
                        .map(|c| c.to_string())
                        .unwrap_or_default()
                );
                let toolinfo = format!("({}:{})", issue.tool, issue.code_str());

                let (message, separator) = if issue.message.contains('\n') {
                    let pad = format!("\n{}", " ".repeat(location.len()));
                    let message = issue
                        .message
                        .replace('\t', TAB)
                        .lines()
                        .collect::<Vec<_>>()
                        .join(&pad);
                    (message, pad)
                } else {
                    (issue.message.clone(), " ".to_string())
                };

                if color {
                    writeln!(
                        out,
                        "{}{}{}{}",
                        location.dimmed(),
                        message,
                        separator,
                        toolinfo.yellow().dimmed()
                    )?;
                } else {
                    writeln!(out, "{}{}{}{}", location, message, separator, toolinfo)?;
                }
            }

            writeln!(out)?;
        }

        let summary = if total > 0 {
            format!("\u{2717} {} issues found.", total)
        } else {
            "\u{2714} No issues found!".to_string()
        };
        match (color, total > 0) {
            (true, true) => writeln!(out, "{}", summary.yellow().bold())?,
            (true, false) => writeln!(out, "{}", summary.green().bold())?,
            (false, _) => writeln!(out, "{}", summary)?,
        }
        Ok(())
    }
}
