//! # tidyup_core
//!
//! Issue aggregation and tool orchestration engine for tidyup.
//!
//! This crate provides:
//! - The [`Issue`] model and the thread-safe [`Collector`]
//! - `# noqa` suppression parsing
//! - The [`Tool`] interface, its [`ToolRegistry`] and the parallel [`Scheduler`]
//! - Project file discovery
//! - Configuration loading
//! - Report rendering
//!
//! ## Example
//!
//! ```rust,ignore
//! use tidyup_core::{Config, QuietProgress, ReportRegistry, Scheduler, execute_reports};
//!
//! let registry = tidyup_tools::builtin_registry();
//! let config = Config::for_project(path, &registry)?;
//! let collector = Scheduler::new(&registry).run(&config, path, &QuietProgress::new())?;
//!
//! execute_reports(&config, &ReportRegistry::builtin(), path, &collector, false, |_| {})?;
//! println!("{} issues", collector.issue_count(false));
//! ```

pub mod capture;
mod collector;
mod config;
mod error;
pub mod finder;
mod issue;
pub mod noqa;
mod progress;
pub mod report;
mod scheduler;
mod tool;

pub use collector::{CleanSettings, Collector, collapse_runs, merge_issues};
pub use config::{
    CONFIG_FILE_NAMES, Config, ReportConfig, ToolConfig, default_workers, merge_values,
    user_config_path,
};
pub use error::{Result, TidyError};
pub use finder::Finder;
pub use issue::{
    AGGREGATOR_TOOL, DEFAULT_SORT, Issue, IssueField, NO_SORT, SeverityClass, TOOL_REPORT_CODE,
    relative_path, sort_issues,
};
pub use progress::{Progress, ProgressTracker, QuietProgress};
pub use report::{Report, ReportContext, ReportRegistry, execute_reports};
pub use scheduler::{CancellationToken, RunState, Scheduler};
pub use tool::{CodeInfo, Tool, ToolRegistry};
