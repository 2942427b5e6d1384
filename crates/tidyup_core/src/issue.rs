//! Issue types shared by tools, the collector and reports.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tool identity used for issues produced by tidyup itself.
pub const AGGREGATOR_TOOL: &str = "tidyup";

/// Code of self-reported issues describing a whole tool run.
pub const TOOL_REPORT_CODE: &str = "tool";

/// Comparable pylint-style category of an issue, used by report renderers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityClass {
    /// Probable bug.
    #[default]
    Error,
    /// Something that should be reviewed.
    Warning,
    /// Structural smell.
    Refactor,
    /// Style or convention violation.
    Convention,
    /// The analysis itself failed.
    Fatal,
}

impl SeverityClass {
    /// Single-letter form used by pylint-style output.
    pub fn letter(self) -> char {
        match self {
            Self::Error => 'E',
            Self::Warning => 'W',
            Self::Refactor => 'R',
            Self::Convention => 'C',
            Self::Fatal => 'F',
        }
    }
}

/// A finding reported by exactly one tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    /// Name of the tool that found the issue.
    pub tool: String,

    /// Tool-scoped category, if the tool can categorize its findings.
    pub code: Option<String>,

    /// Human readable description.
    pub message: String,

    /// Absolute path of the file the issue was found in.
    pub filename: PathBuf,

    /// 1-based line number.
    pub line: u32,

    /// 1-based column, if known.
    pub character: Option<u32>,

    /// Report category.
    #[serde(default)]
    pub severity: SeverityClass,
}

impl Issue {
    /// Creates a new issue located on the first line of `filename`.
    pub fn new(
        tool: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        filename: impl Into<PathBuf>,
    ) -> Self {
        let code = code.into();
        Self {
            tool: tool.into(),
            code: (!code.is_empty()).then_some(code),
            message: message.into(),
            filename: filename.into(),
            line: 1,
            character: None,
            severity: SeverityClass::Error,
        }
    }

    /// Sets the line number. `None` keeps the default of 1.
    pub fn with_line(mut self, line: impl Into<Option<u32>>) -> Self {
        self.line = line.into().unwrap_or(1);
        self
    }

    /// Sets the column. A column of 0 means unknown.
    pub fn with_character(mut self, character: impl Into<Option<u32>>) -> Self {
        self.character = character.into().filter(|c| *c > 0);
        self
    }

    /// Sets the report category.
    pub fn with_severity(mut self, severity: SeverityClass) -> Self {
        self.severity = severity;
        self
    }

    /// Returns the code, or an empty string when the tool gave none.
    pub fn code_str(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    /// Whether this issue was produced by tidyup itself.
    pub fn is_self_reported(&self) -> bool {
        self.tool == AGGREGATOR_TOOL
    }

    /// Whether this issue describes a whole tool run (crash or stray output).
    pub fn is_tool_report(&self) -> bool {
        self.is_self_reported() && self.code.as_deref() == Some(TOOL_REPORT_CODE)
    }

    /// An unanticipated failure while a tool processed `filename`.
    pub fn unexpected(error: impl fmt::Display, filename: impl Into<PathBuf>) -> Self {
        Self::new(
            AGGREGATOR_TOOL,
            "unexpected",
            format!("Unexpected error ({error})"),
            filename,
        )
        .with_severity(SeverityClass::Fatal)
    }

    /// A file or directory that could not be accessed.
    pub fn access(error: impl fmt::Display, filename: impl Into<PathBuf>) -> Self {
        Self::new(
            AGGREGATOR_TOOL,
            "access",
            format!("Cannot access file ({error})"),
            filename,
        )
        .with_severity(SeverityClass::Fatal)
    }

    /// A file that could not be parsed as expected.
    pub fn parse(
        error: impl fmt::Display,
        filename: impl Into<PathBuf>,
        line: Option<u32>,
        character: Option<u32>,
    ) -> Self {
        Self::new(
            AGGREGATOR_TOOL,
            "parse",
            format!("Unable to parse file ({error})"),
            filename,
        )
        .with_line(line)
        .with_character(character)
        .with_severity(SeverityClass::Fatal)
    }

    /// A problem with a whole tool run, attributed to the project root.
    ///
    /// `details` is appended below the message. `failure` marks the tool as
    /// having crashed rather than merely misbehaved.
    pub fn tool_failure(
        message: impl Into<String>,
        project_path: impl Into<PathBuf>,
        details: Option<&str>,
        failure: bool,
    ) -> Self {
        let mut message = message.into();
        if let Some(details) = details.filter(|d| !d.is_empty()) {
            message = format!("{message}:\n{details}");
        }
        let severity = if failure {
            SeverityClass::Fatal
        } else {
            SeverityClass::Error
        };
        Self::new(AGGREGATOR_TOOL, TOOL_REPORT_CODE, message, project_path).with_severity(severity)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename.display(), self.line)?;
        if let Some(character) = self.character {
            write!(f, ":{character}")?;
        }
        write!(f, " {}@{} {}", self.code_str(), self.tool, self.message)
    }
}

/// An issue attribute usable as a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
    Filename,
    Line,
    Character,
    Tool,
    Code,
    Message,
}

/// Default ordering: filename, line, character, tool, code.
pub const DEFAULT_SORT: &[IssueField] = &[
    IssueField::Filename,
    IssueField::Line,
    IssueField::Character,
    IssueField::Tool,
    IssueField::Code,
];

/// Leaves the issues in the order they were collected.
pub const NO_SORT: &[IssueField] = &[];

impl IssueField {
    /// Compares two issues on this attribute alone.
    ///
    /// Missing columns sort as 0 and missing codes as the empty string.
    pub fn compare(self, a: &Issue, b: &Issue) -> Ordering {
        match self {
            Self::Filename => a.filename.as_os_str().cmp(b.filename.as_os_str()),
            Self::Line => a.line.cmp(&b.line),
            Self::Character => a.character.unwrap_or(0).cmp(&b.character.unwrap_or(0)),
            Self::Tool => a.tool.cmp(&b.tool),
            Self::Code => a.code_str().cmp(b.code_str()),
            Self::Message => a.message.cmp(&b.message),
        }
    }
}

impl FromStr for IssueField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "filename" | "file" => Ok(Self::Filename),
            "line" => Ok(Self::Line),
            "character" | "column" => Ok(Self::Character),
            "tool" => Ok(Self::Tool),
            "code" => Ok(Self::Code),
            "message" => Ok(Self::Message),
            _ => Err(format!("Unknown issue field: {s}")),
        }
    }
}

/// Sorts issues by `fields`, most significant first.
///
/// Applies one stable sort per field from the last to the first, which is
/// equivalent to a single sort on the composite key.
pub fn sort_issues(issues: &mut [Issue], fields: &[IssueField]) {
    for field in fields.iter().rev() {
        issues.sort_by(|a, b| field.compare(a, b));
    }
}

/// Returns the path of `filename` relative to `base` with `/` separators.
///
/// `base` itself is `.`; paths outside of `base` are returned unchanged.
pub fn relative_path(filename: &Path, base: &Path) -> String {
    let Ok(relative) = filename.strip_prefix(base) else {
        return filename.to_string_lossy().into_owned();
    };
    if relative.as_os_str().is_empty() {
        return ".".to_string();
    }
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
