//! Line-oriented reports compatible with other linters' output.

use std::io::Write;

use crate::collector::Collector;
use crate::error::{Result, TidyError};
use crate::issue::{Issue, IssueField};

use super::{Report, ReportContext};

const LOCATION_SORT: &[IssueField] = &[IssueField::Filename, IssueField::Line, IssueField::Character];

/// `file:line:char code@tool message`, like pycodestyle.
#[derive(Debug, Default)]
pub struct PycodestyleReport;

impl Report for PycodestyleReport {
    fn name(&self) -> &str {
        "pycodestyle"
    }

    fn description(&self) -> &str {
        "One line per issue, like pycodestyle"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        for issue in collector.get_issues(Some(LOCATION_SORT)) {
            writeln!(
                out,
                "{}:{}:{} {}@{} {}",
                ctx.relative(&issue.filename),
                issue.line,
                issue.character.unwrap_or(0),
                issue.code_str(),
                issue.tool,
                issue.message
            )?;
        }
        Ok(())
    }
}

/// Pylint's parseable text format, one module header per file.
#[derive(Debug, Default)]
pub struct PylintReport;

impl PylintReport {
    fn module_name(relative: &str) -> String {
        match relative.strip_suffix(".py") {
            Some(root) if !root.is_empty() => root.replace('/', "."),
            _ => relative.to_string(),
        }
    }
}

impl Report for PylintReport {
    fn name(&self) -> &str {
        "pylint"
    }

    fn description(&self) -> &str {
        "Issues grouped by module, like pylint"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        for (filename, issues) in collector.get_issues_by_file(None) {
            writeln!(
                out,
                "************* Module {}",
                Self::module_name(&ctx.relative(&filename))
            )?;
            for issue in issues {
                writeln!(
                    out,
                    "{}:{:>3},{:>2}: {} ({}@{})",
                    issue.severity.letter(),
                    issue.line,
                    issue.character.unwrap_or(1).saturating_sub(1),
                    issue.message,
                    issue.code_str(),
                    issue.tool
                )?;
            }
        }
        Ok(())
    }
}

/// Default template of the custom report.
pub const DEFAULT_CUSTOM_FORMAT: &str = "{filename}:{line}:{character}:{tool}:{code}:{message}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Filename,
    FullFilename,
    Line,
    Character,
    Code,
    Tool,
    Message,
}

/// Parses a `{token}` template. `{{` and `}}` are literal braces.
fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let invalid = |reason: String| {
        TidyError::report(format!("Invalid format for custom report: {}", reason))
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut token = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => token.push(c),
                        None => return Err(invalid("unclosed '{'".to_string())),
                    }
                }
                let segment = match token.as_str() {
                    "filename" => Segment::Filename,
                    "full_filename" => Segment::FullFilename,
                    "line" => Segment::Line,
                    "character" => Segment::Character,
                    "code" => Segment::Code,
                    "tool" => Segment::Tool,
                    "message" => Segment::Message,
                    other => return Err(invalid(format!("Unknown token '{}'", other))),
                };
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
            }
            '}' => return Err(invalid("single '}' encountered".to_string())),
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn render(segments: &[Segment], issue: &Issue, ctx: &ReportContext<'_>) -> String {
    let mut line = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => line.push_str(text),
            Segment::Filename => line.push_str(&ctx.relative(&issue.filename)),
            Segment::FullFilename => line.push_str(&issue.filename.to_string_lossy()),
            Segment::Line => line.push_str(&issue.line.to_string()),
            Segment::Character => line.push_str(&issue.character.unwrap_or(0).to_string()),
            Segment::Code => line.push_str(issue.code_str()),
            Segment::Tool => line.push_str(&issue.tool),
            Segment::Message => line.push_str(&issue.message),
        }
    }
    line
}

/// One line per issue, laid out by the `format` option.
#[derive(Debug, Default)]
pub struct CustomReport;

impl Report for CustomReport {
    fn name(&self) -> &str {
        "custom"
    }

    fn description(&self) -> &str {
        "One line per issue from a user supplied template"
    }

    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let template = ctx
            .config
            .option_str("format")
            .unwrap_or(DEFAULT_CUSTOM_FORMAT);
        let segments = parse_template(template)?;

        for issue in collector.get_issues(Some(LOCATION_SORT)) {
            writeln!(out, "{}", render(&segments, &issue, ctx))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::ReportConfig;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn produce(report: &dyn Report, config: &ReportConfig) -> Result<String> {
        let ctx = ReportContext {
            project_path: Path::new(PROJECT),
            config,
            tools: &[],
            color: false,
        };
        let buffer = super::super::render_report(report, &sample_collector(), &ctx)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_pycodestyle_report() {
        let output = produce(&PycodestyleReport, &ReportConfig::new("pycodestyle")).unwrap();
        insta::assert_snapshot!(output, @r"
        .:1:0 tool@tidyup Tool(s) wrote to stdout:
        hello
        world
        data.json:2:5 syntax@jsonlint Expected value
        src/app.py:1:0 todo@todo TODO found
        src/app.py:3:12 trailing@whitespace Trailing whitespace
        ");
    }

    #[test]
    fn test_pylint_report() {
        let output = produce(&PylintReport, &ReportConfig::new("pylint")).unwrap();
        insta::assert_snapshot!(output, @r"
        ************* Module .
        E:  1, 0: Tool(s) wrote to stdout:
        hello
        world (tool@tidyup)
        ************* Module data.json
        E:  2, 4: Expected value (syntax@jsonlint)
        ************* Module src.app
        E:  1, 0: TODO found (todo@todo)
        E:  3,11: Trailing whitespace (trailing@whitespace)
        ");
    }

    #[test]
    fn test_pylint_report_zero_column() {
        let collector = Collector::new(&crate::config::Config::default());
        let mut issue = Issue::new("x", "y", "Zero column", "/project/a.py").with_line(4);
        issue.character = Some(0);
        collector.add_issue(issue);

        let config = ReportConfig::new("pylint");
        let ctx = ReportContext {
            project_path: Path::new(PROJECT),
            config: &config,
            tools: &[],
            color: false,
        };
        let buffer = super::super::render_report(&PylintReport, &collector, &ctx).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "************* Module a\nE:  4, 0: Zero column (y@x)\n"
        );
    }

    #[test]
    fn test_module_name() {
        assert_eq!(PylintReport::module_name("src/pkg/mod.py"), "src.pkg.mod");
        assert_eq!(PylintReport::module_name("setup.py"), "setup");
        assert_eq!(PylintReport::module_name("data.json"), "data.json");
    }

    #[test]
    fn test_custom_report_default_format() {
        let output = produce(&CustomReport, &ReportConfig::new("custom")).unwrap();
        let last = output.lines().last().unwrap();
        assert_eq!(
            last,
            "src/app.py:3:12:whitespace:trailing:Trailing whitespace"
        );
    }

    #[test]
    fn test_custom_report_with_format() {
        let mut config = ReportConfig::new("custom");
        config.options.insert(
            "format".to_string(),
            serde_json::json!("{{{code}}} {full_filename}@{line}"),
        );
        let output = produce(&CustomReport, &config).unwrap();
        assert!(output.contains("{syntax} /project/data.json@2\n"));
    }

    #[test]
    fn test_custom_report_unknown_token() {
        let mut config = ReportConfig::new("custom");
        config
            .options
            .insert("format".to_string(), serde_json::json!("{severity}"));
        let err = produce(&CustomReport, &config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Report error: Invalid format for custom report: Unknown token 'severity'"
        );
    }

    #[test]
    fn test_parse_template_errors() {
        assert!(parse_template("{line").is_err());
        assert!(parse_template("line}").is_err());
        assert_eq!(
            parse_template("a{{b}}").unwrap(),
            vec![Segment::Literal("a{b}".to_string())]
        );
    }
}
