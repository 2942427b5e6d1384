//! Run configuration.
//!
//! Configuration files are JSON with comments. A file is validated against
//! the embedded schema, then merged over the defaults derived from the tool
//! registry, so a file only needs to mention what it changes.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, TidyError};
use crate::issue::Issue;
use crate::tool::ToolRegistry;

const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Project configuration file names, in lookup order.
pub const CONFIG_FILE_NAMES: &[&str] = &[".tidyup.jsonc", ".tidyup.json"];

/// Effective configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Regular expressions of project-relative paths to skip.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Whether to collapse duplicate issues on the same line.
    #[serde(default = "default_true")]
    pub merge_issues: bool,

    /// Number of tools run concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Codes of tidyup's own issues that are never reported.
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Whether `# noqa` directives are honored.
    #[serde(default = "default_true")]
    pub noqa: bool,

    /// Extensions of files scanned for `# noqa` directives.
    #[serde(default = "default_noqa_extensions")]
    pub noqa_extensions: Vec<String>,

    /// Whether `.gitignore` rules prune the file walk.
    #[serde(default)]
    pub respect_gitignore: bool,

    /// Reports to produce after the run.
    #[serde(default = "default_reports")]
    pub reports: Vec<ReportConfig>,

    /// Per-tool configuration, keyed by tool name.
    #[serde(default)]
    pub tools: BTreeMap<String, ToolConfig>,
}

fn default_true() -> bool {
    true
}

/// One less than the number of CPUs, kept between 1 and 4.
pub fn default_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.saturating_sub(1).clamp(1, 4)
}

fn default_noqa_extensions() -> Vec<String> {
    vec!["py".to_string(), "pyi".to_string()]
}

fn default_reports() -> Vec<ReportConfig> {
    vec![ReportConfig::new("console")]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            merge_issues: true,
            workers: default_workers(),
            disabled: Vec::new(),
            noqa: true,
            noqa_extensions: default_noqa_extensions(),
            respect_gitignore: false,
            reports: default_reports(),
            tools: BTreeMap::new(),
        }
    }
}

/// Configuration block for a single tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Whether the tool runs at all.
    #[serde(rename = "use", default = "default_true")]
    pub enabled: bool,

    /// Regular expressions selecting the files the tool examines.
    #[serde(default)]
    pub filters: Vec<String>,

    /// Codes this tool should not report.
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Tool specific options.
    #[serde(default = "empty_object")]
    pub options: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filters: Vec::new(),
            disabled: Vec::new(),
            options: empty_object(),
        }
    }
}

impl ToolConfig {
    /// Creates an enabled block with the given file filters.
    pub fn with_filters<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filters: filters.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the options object.
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Returns an option value, if set.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Drops issues whose code is disabled for this tool.
    pub fn retain_enabled(&self, issues: &mut Vec<Issue>) {
        if self.disabled.is_empty() {
            return;
        }
        let disabled: HashSet<&str> = self.disabled.iter().map(String::as_str).collect();
        issues.retain(|issue| !disabled.contains(issue.code_str()));
    }
}

/// Configuration of one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Registered report name.
    #[serde(rename = "type")]
    pub kind: String,

    /// Output file. Standard output when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Report specific options.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ReportConfig {
    /// Creates a report writing to standard output.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            file: None,
            options: Map::new(),
        }
    }

    /// Sets the output file.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Returns a string option.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

impl Config {
    /// Builds the default configuration, including every registered tool's
    /// default block.
    pub fn defaults(registry: &ToolRegistry) -> Self {
        let tools = registry
            .iter()
            .map(|tool| (tool.name().to_string(), tool.default_config()))
            .collect();
        Self {
            tools,
            ..Self::default()
        }
    }

    /// Parses a JSON-with-comments document and merges it over the defaults.
    pub fn from_jsonc(content: &str, registry: &ToolRegistry) -> Result<Self> {
        let overrides = parse_jsonc(content)?;
        validate(&overrides)?;

        let mut base = serde_json::to_value(Self::defaults(registry))?;
        merge_values(&mut base, overrides);

        let config: Self = serde_json::from_value(base)
            .map_err(|e| TidyError::config(format!("Invalid config: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Loads and merges a configuration file.
    pub fn from_file(path: impl AsRef<Path>, registry: &ToolRegistry) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TidyError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        debug!("Loading configuration from {}", path.display());
        Self::from_jsonc(&content, registry)
    }

    /// Finds the configuration file that applies to `project`.
    ///
    /// The project's own file wins over the user-level file.
    pub fn discover(project: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| project.join(name))
            .find(|path| path.is_file())
            .or_else(|| user_config_path().filter(|path| path.is_file()))
    }

    /// Loads the configuration for `project`, falling back to defaults when
    /// no file is found.
    pub fn for_project(project: &Path, registry: &ToolRegistry) -> Result<Self> {
        match Self::discover(project) {
            Some(path) => Self::from_file(path, registry),
            None => {
                debug!("No configuration file found, using defaults");
                Ok(Self::defaults(registry))
            }
        }
    }

    /// Returns the block for `tool`, if configured.
    pub fn tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.get(name)
    }

    /// Validates values serde cannot.
    pub fn check(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(TidyError::config("workers must be at least 1"));
        }
        Ok(())
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Location of the user-level configuration file.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tidyup").join("config.jsonc"))
}

fn parse_jsonc(content: &str) -> Result<Value> {
    let value = jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
        .map_err(|e| TidyError::config(format!("Failed to parse config: {}", e)))?
        .unwrap_or_else(empty_object);
    Ok(value)
}

fn validate(value: &Value) -> Result<()> {
    let schema = CONFIG_SCHEMA.get_or_init(|| {
        let schema_json: Value =
            serde_json::from_str(SCHEMA_JSON).expect("Invalid embedded config schema");
        Validator::new(&schema_json).expect("Invalid config schema compilation")
    });

    if let Err(e) = schema.validate(value) {
        return Err(TidyError::config(format!(
            "Config validation failed: {} at {}",
            e,
            e.instance_path()
        )));
    }
    Ok(())
}

/// Recursively merges `overlay` into `base`.
///
/// Objects merge key by key; any other value replaces what was there.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.exclude.is_empty());
        assert!(config.merge_issues);
        assert!(config.noqa);
        assert!(config.disabled.is_empty());
        assert!((1..=4).contains(&config.workers));
        assert_eq!(config.reports, vec![ReportConfig::new("console")]);
        assert_eq!(config.noqa_extensions, vec!["py", "pyi"]);
    }

    #[test]
    fn test_from_jsonc_merges_over_defaults() {
        let content = r#"{
            // comments are allowed
            "merge-issues": false,
            "workers": 2,
            "disabled": ["tool"],
            "tools": {
                "custom": { "use": false, "options": { "max": 3 } }
            }
        }"#;

        let config = Config::from_jsonc(content, &ToolRegistry::new()).unwrap();
        assert!(!config.merge_issues);
        assert!(config.noqa);
        assert_eq!(config.workers, 2);
        assert_eq!(config.disabled, vec!["tool"]);

        let custom = config.tool("custom").unwrap();
        assert!(!custom.enabled);
        assert_eq!(custom.options, json!({ "max": 3 }));
    }

    #[test]
    fn test_from_jsonc_empty_document() {
        let config = Config::from_jsonc("", &ToolRegistry::new()).unwrap();
        assert_eq!(config, Config::defaults(&ToolRegistry::new()));
    }

    #[test]
    fn test_report_config_options_are_flattened() {
        let content = r#"{ "reports": [{ "type": "custom", "file": "out.txt", "format": "{line}" }] }"#;
        let config = Config::from_jsonc(content, &ToolRegistry::new()).unwrap();
        let report = &config.reports[0];
        assert_eq!(report.kind, "custom");
        assert_eq!(report.file.as_deref(), Some(Path::new("out.txt")));
        assert_eq!(report.option_str("format"), Some("{line}"));
    }

    #[rstest]
    #[case::unknown_property(r#"{ "merge": true }"#, "Config validation failed")]
    #[case::type_mismatch(r#"{ "noqa": "yes" }"#, "Config validation failed")]
    #[case::zero_workers(r#"{ "workers": 0 }"#, "Config validation failed")]
    #[case::report_without_type(r#"{ "reports": [{ "file": "x" }] }"#, "Config validation failed")]
    #[case::bad_syntax(r#"{ "noqa": "#, "Failed to parse config")]
    fn test_config_errors(#[case] content: &str, #[case] expected: &str) {
        let err = Config::from_jsonc(content, &ToolRegistry::new()).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "Error message '{}' should contain '{}'",
            err,
            expected
        );
    }

    #[test]
    fn test_check_rejects_zero_workers() {
        let config = Config {
            workers: 0,
            ..Config::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_merge_values() {
        let mut base = json!({ "a": { "b": 1, "c": [1, 2] }, "d": true });
        merge_values(&mut base, json!({ "a": { "c": [3] , "e": "x" }, "d": false }));
        assert_eq!(base, json!({ "a": { "b": 1, "c": [3], "e": "x" }, "d": false }));
    }

    #[test]
    fn test_retain_enabled() {
        let config = ToolConfig {
            disabled: vec!["trailing".to_string()],
            ..ToolConfig::default()
        };
        let mut issues = vec![
            Issue::new("whitespace", "trailing", "m", "/a"),
            Issue::new("whitespace", "tab-indent", "m", "/a"),
        ];
        config.retain_enabled(&mut issues);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code_str(), "tab-indent");
    }

    #[test]
    fn test_discover_prefers_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".tidyup.json"), "{}").unwrap();
        std::fs::write(dir.path().join(".tidyup.jsonc"), "{}").unwrap();
        assert_eq!(
            Config::discover(dir.path()),
            Some(dir.path().join(".tidyup.jsonc"))
        );
    }
}
