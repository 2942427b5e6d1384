//! Shared file scanning for the built-in tools.

use std::io;
use std::path::Path;

use rayon::prelude::*;
use serde::de::DeserializeOwned;
use tidyup_core::{Finder, Issue, Result, TidyError, ToolConfig};
use tracing::debug;

/// Deserializes the `options` block of a tool configuration.
pub(crate) fn options<T>(tool: &str, config: &ToolConfig) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if config.options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.options.clone())
        .map_err(|e| TidyError::config(format!("Invalid options for {}: {}", tool, e)))
}

/// Runs `scan` on every file selected by the tool's filters.
///
/// Files are read through the finder's cache. Codes disabled for the tool
/// are dropped from the scan results; read failures are always kept.
pub(crate) fn scan_files<F>(
    tool: &str,
    finder: &Finder,
    config: &ToolConfig,
    scan: F,
) -> Result<Vec<Issue>>
where
    F: Fn(&Path, &str) -> Vec<Issue> + Sync,
{
    let files = finder.files(&config.filters)?;
    debug!("{} scanning {} files", tool, files.len());

    let scanned: Vec<std::result::Result<Vec<Issue>, Issue>> = files
        .par_iter()
        .map(|path| {
            finder
                .read_file(path)
                .map(|content| scan(path, &content))
                .map_err(|e| read_failure(e, path))
        })
        .collect();

    let mut issues = Vec::new();
    let mut failures = Vec::new();
    for result in scanned {
        match result {
            Ok(found) => issues.extend(found),
            Err(failure) => failures.push(failure),
        }
    }

    config.retain_enabled(&mut issues);
    issues.extend(failures);
    Ok(issues)
}

fn read_failure(error: io::Error, path: &Path) -> Issue {
    match error.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => Issue::access(error, path),
        _ => Issue::unexpected(error, path),
    }
}

/// 1-based column of the byte offset `offset` within `line`.
pub(crate) fn column(line: &str, offset: usize) -> u32 {
    line[..offset].chars().count() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default, rename_all = "kebab-case")]
    struct Sample {
        max_width: u32,
    }

    #[test]
    fn test_options_parse() {
        let config = ToolConfig::default().with_options(json!({"max-width": 7}));
        let parsed: Sample = options("sample", &config).unwrap();
        assert_eq!(parsed, Sample { max_width: 7 });
    }

    #[test]
    fn test_options_null_uses_default() {
        let config = ToolConfig::default().with_options(serde_json::Value::Null);
        let parsed: Sample = options("sample", &config).unwrap();
        assert_eq!(parsed, Sample::default());
    }

    #[test]
    fn test_options_invalid_type() {
        let config = ToolConfig::default().with_options(json!({"max-width": "wide"}));
        let err = options::<Sample>("sample", &config).unwrap_err();
        assert!(err.to_string().contains("Invalid options for sample"));
    }

    #[test]
    fn test_read_failure_kinds() {
        let missing = read_failure(io::Error::from(io::ErrorKind::NotFound), Path::new("a"));
        assert_eq!(missing.code_str(), "access");

        let other = read_failure(io::Error::other("boom"), Path::new("a"));
        assert_eq!(other.code_str(), "unexpected");
    }

    #[test]
    fn test_column_counts_characters() {
        assert_eq!(column("abc", 0), 1);
        assert_eq!(column("日本x", "日本".len()), 3);
    }
}
