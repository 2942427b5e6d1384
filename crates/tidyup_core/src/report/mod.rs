//! Report rendering.
//!
//! A report turns the cleaned issues of a [`Collector`] into text. Reports
//! are looked up by name in a [`ReportRegistry`] and configured by the
//! `reports` list of the run configuration.

mod console;
mod prospector;
mod sarif;
mod structured;
mod text;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::collector::Collector;
use crate::config::{Config, ReportConfig};
use crate::error::{Result, TidyError};
use crate::issue::relative_path;

pub use console::ConsoleReport;
pub use prospector::ProspectorJsonReport;
pub use sarif::{SarifReport, generate_sarif};
pub use structured::{CsvReport, JsonReport, TomlReport, YamlReport};
pub use text::{CustomReport, DEFAULT_CUSTOM_FORMAT, PycodestyleReport, PylintReport};

/// Everything a report needs besides the issues.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    /// Root the report paths are made relative to.
    pub project_path: &'a Path,
    /// The report's own configuration block.
    pub config: &'a ReportConfig,
    /// Names of the tools enabled for the run.
    pub tools: &'a [String],
    /// Whether ANSI colors may be used.
    pub color: bool,
}

impl ReportContext<'_> {
    /// `filename` relative to the project root.
    pub fn relative(&self, filename: &Path) -> String {
        relative_path(filename, self.project_path)
    }
}

/// A named output format.
pub trait Report: Send + Sync {
    fn name(&self) -> &str;

    /// One-line summary shown by `tidyup extensions`.
    fn description(&self) -> &str;

    /// Writes the report for `collector` to `out`.
    fn produce(
        &self,
        collector: &Collector,
        ctx: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<()>;
}

/// Writes nothing.
#[derive(Debug, Default)]
pub struct NullReport;

impl Report for NullReport {
    fn name(&self) -> &str {
        "null"
    }

    fn description(&self) -> &str {
        "Produces no output"
    }

    fn produce(&self, _: &Collector, _: &ReportContext<'_>, _: &mut dyn Write) -> Result<()> {
        Ok(())
    }
}

/// Set of known reports, keyed by name.
#[derive(Clone, Default)]
pub struct ReportRegistry {
    reports: BTreeMap<String, Arc<dyn Report>>,
}

impl ReportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every report shipped with tidyup.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(ConsoleReport)
            .register(PycodestyleReport)
            .register(PylintReport)
            .register(CustomReport)
            .register(JsonReport)
            .register(TomlReport)
            .register(YamlReport)
            .register(CsvReport)
            .register(ProspectorJsonReport)
            .register(SarifReport)
            .register(NullReport);
        registry
    }

    pub fn register(&mut self, report: impl Report + 'static) -> &mut Self {
        self.reports
            .insert(report.name().to_string(), Arc::new(report));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Report>> {
        self.reports.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.reports.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Report>> {
        self.reports.values()
    }
}

impl std::fmt::Debug for ReportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRegistry")
            .field("reports", &self.reports.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Renders one report into memory.
pub fn render_report(
    report: &dyn Report,
    collector: &Collector,
    ctx: &ReportContext<'_>,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    report.produce(collector, ctx, &mut buffer)?;
    Ok(buffer)
}

/// Produces every report listed in `config`, in order.
///
/// Reports are written to their configured file, or to standard output.
/// Unknown report types are skipped with a warning. A report that fails
/// writes nothing; the remaining reports still run and the first failure
/// is returned at the end. `on_report_finish` is called after each report
/// that was written.
pub fn execute_reports<F>(
    config: &Config,
    registry: &ReportRegistry,
    project_path: &Path,
    collector: &Collector,
    color: bool,
    mut on_report_finish: F,
) -> Result<()>
where
    F: FnMut(&ReportConfig),
{
    let mut first_error = None;
    let tools: Vec<String> = config
        .tools
        .iter()
        .filter(|(_, tool)| tool.enabled)
        .map(|(name, _)| name.clone())
        .collect();

    for report_config in &config.reports {
        let Some(report) = registry.get(&report_config.kind) else {
            warn!("Unknown report type: {}", report_config.kind);
            continue;
        };

        let ctx = ReportContext {
            project_path,
            config: report_config,
            tools: &tools,
            color: color && report_config.file.is_none(),
        };
        let written = render_report(report.as_ref(), collector, &ctx)
            .and_then(|buffer| write_output(report_config.file.as_deref(), &buffer));

        match written {
            Ok(()) => {
                debug!("Produced {} report", report_config.kind);
                on_report_finish(report_config);
            }
            Err(e) => {
                error!("Failed to produce {} report: {}", report_config.kind, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn write_output(file: Option<&Path>, content: &[u8]) -> Result<()> {
    match file {
        Some(path) => fs::write(path, content).map_err(|e| {
            TidyError::report(format!("Failed to write {}: {}", path.display(), e))
        }),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content)?;
            stdout.flush()?;
            Ok(())
        }
    }
}
